use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::is_well_formed_product_id;

/// The product details captured inside a cart line. The id is whatever the
/// backend stored; it may be missing or malformed for legacy lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub price: BigDecimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: ProductSnapshot,
    pub quantity: u32,
    pub unit_price: BigDecimal,
    pub subtotal: BigDecimal,
}

impl CartLine {
    /// The product id, only when it is usable for mutations. Lines without a
    /// well-formed id are display-only and never enter the optimistic overlay.
    pub fn mutable_product_id(&self) -> Option<&str> {
        self.product
            .id
            .as_deref()
            .filter(|id| is_well_formed_product_id(id))
    }
}

/// Server-confirmed cart snapshot. The server owns this; the client holds a
/// read-only cached copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    #[serde(default)]
    pub id: String,
    pub items: Vec<CartLine>,
    pub total_amount: BigDecimal,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CartState {
    /// Local stand-in used when a clear succeeds but the server sends no body.
    pub fn empty() -> Self {
        Self {
            id: String::new(),
            items: Vec::new(),
            total_amount: BigDecimal::from(0),
            created_at: None,
            updated_at: None,
        }
    }
}
