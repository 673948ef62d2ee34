use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Catalog product as returned by the unauthenticated browsing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: BigDecimal,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub in_stock: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// One page of the catalog listing: `{data, meta}`, fetched raw because the
/// pagination metadata lives next to `data` rather than inside it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductPage {
    #[serde(default)]
    pub data: Vec<Product>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_listing_page() {
        let page: ProductPage = serde_json::from_str(
            r#"{
                "success": true,
                "data": [{"id": "aaaaaaaaaaaaaaaaaaaaaaaa", "name": "Shirt", "price": 12.99, "inStock": true}],
                "meta": {"total": 41, "page": 2, "limit": 12, "totalPages": 4}
            }"#,
        )
        .expect("valid page");

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.meta.and_then(|m| m.total), Some(41));
    }
}
