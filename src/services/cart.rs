use std::collections::HashMap;

use reqwest::Method;
use serde_json::json;

use crate::domain::cart::CartState;
use crate::error::ClientError;
use crate::gateway::ApiGateway;
use crate::validation::{validate_present, validate_quantity, ValidationError};

/// Reconciles optimistic local quantity edits against the server-owned cart.
///
/// `server_cart` is the last confirmed snapshot; `overlay` maps mutable product
/// ids to the locally desired quantity. Both are owned exclusively here. After
/// any successful fetch the overlay mirrors the server exactly, so the cart
/// always converges to server truth.
pub struct CartService {
    gateway: ApiGateway,
    server_cart: Option<CartState>,
    overlay: HashMap<String, u32>,
}

impl CartService {
    pub fn new(gateway: ApiGateway) -> Self {
        Self {
            gateway,
            server_cart: None,
            overlay: HashMap::new(),
        }
    }

    pub fn server_cart(&self) -> Option<&CartState> {
        self.server_cart.as_ref()
    }

    /// Read-only view of the not-yet-confirmed local edits.
    pub fn overlay(&self) -> &HashMap<String, u32> {
        &self.overlay
    }

    /// What the UI renders for a line: the local edit when one exists, else the
    /// confirmed quantity.
    pub fn line_quantity(&self, product_id: &str) -> Option<u32> {
        if let Some(quantity) = self.overlay.get(product_id) {
            return Some(*quantity);
        }

        self.server_cart
            .as_ref()?
            .items
            .iter()
            .find(|line| line.product.id.as_deref() == Some(product_id))
            .map(|line| line.quantity)
    }

    /// Sum over confirmed lines only; the badge never flashes an uncommitted
    /// total.
    pub fn total_count(&self) -> u32 {
        self.server_cart
            .as_ref()
            .map_or(0, |cart| cart.items.iter().map(|line| line.quantity).sum())
    }

    /// Fetches the authoritative cart and discards any unconfirmed local edits
    /// in its favor. On failure the prior snapshot and overlay stay untouched.
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        self.require_auth()?;
        let cart: CartState = self.gateway.fetch("/api/cart").await?;
        self.adopt(cart);
        Ok(())
    }

    /// Records the user's intent locally, without a network round trip. Only
    /// lines of the last snapshot with a well-formed product id accept edits.
    pub fn set_local_quantity(&mut self, product_id: &str, quantity: i64) -> Result<(), ClientError> {
        let quantity = validate_quantity(quantity)?;
        if !self.is_mutable_line(product_id) {
            return Err(ValidationError::new("productId", "is not an updatable cart line").into());
        }

        self.overlay.insert(product_id.to_string(), quantity);
        Ok(())
    }

    /// Pushes a quantity to the server: an update for `quantity > 0`, a removal
    /// for `quantity == 0`. On success the cart is re-fetched so the overlay
    /// converges to server truth; on failure the overlay keeps the attempted
    /// value so the user can retry. The caller must not issue a second commit
    /// for the same id while one is in flight (the triggering control stays
    /// disabled until this resolves).
    pub async fn commit_quantity(
        &mut self,
        product_id: &str,
        quantity: i64,
    ) -> Result<(), ClientError> {
        self.require_auth()?;
        validate_present("productId", product_id)?;
        let quantity = validate_quantity(quantity)?;

        if self.is_mutable_line(product_id) {
            self.overlay.insert(product_id.to_string(), quantity);
        }

        let result = if quantity == 0 {
            self.gateway
                .send::<serde_json::Value>(
                    Method::DELETE,
                    &format!("/api/cart/items/{product_id}"),
                    None,
                )
                .await
        } else {
            self.gateway
                .send::<serde_json::Value>(
                    Method::PATCH,
                    &format!("/api/cart/items/{product_id}"),
                    Some(json!({ "quantity": quantity })),
                )
                .await
        };

        match result {
            Ok(_) => {
                tracing::debug!(product_id, quantity, "cart line committed");
                self.refresh().await
            }
            Err(err) => {
                tracing::warn!(product_id, quantity, error = %err, "cart mutation failed");
                Err(err)
            }
        }
    }

    /// Adds a product to the cart. The id is sent verbatim — the server owns
    /// validity — and nothing is inserted locally until the server confirms
    /// (the product may not exist or may be out of stock).
    pub async fn add(&mut self, product_id: &str, quantity: u32) -> Result<(), ClientError> {
        self.require_auth()?;
        validate_present("productId", product_id)?;

        self.gateway
            .send::<serde_json::Value>(
                Method::POST,
                "/api/cart/items",
                Some(json!({ "productId": product_id, "quantity": quantity })),
            )
            .await?;

        tracing::debug!(product_id, quantity, "cart line added");
        self.refresh().await
    }

    pub async fn remove(&mut self, product_id: &str) -> Result<(), ClientError> {
        self.commit_quantity(product_id, 0).await
    }

    /// Empties the cart. The backend replies with the emptied cart; when it
    /// does, that body is adopted directly, otherwise the local state is reset
    /// — either way no follow-up fetch is needed. Repeating the call is a
    /// no-op from the user's perspective.
    pub async fn clear(&mut self) -> Result<(), ClientError> {
        self.require_auth()?;

        let cleared: Option<CartState> = self
            .gateway
            .send(Method::DELETE, "/api/cart", None)
            .await?;

        match cleared {
            Some(cart) => self.adopt(cart),
            None => {
                self.overlay.clear();
                self.server_cart = Some(CartState::empty());
            }
        }

        tracing::debug!("cart cleared");
        Ok(())
    }

    fn require_auth(&self) -> Result<(), ClientError> {
        if self.gateway.auth().is_set() {
            Ok(())
        } else {
            Err(ClientError::AuthRequired)
        }
    }

    fn is_mutable_line(&self, product_id: &str) -> bool {
        self.server_cart.as_ref().is_some_and(|cart| {
            cart.items
                .iter()
                .any(|line| line.mutable_product_id() == Some(product_id))
        })
    }

    /// Replaces the snapshot and resets the overlay to mirror its mutable
    /// lines exactly.
    fn adopt(&mut self, cart: CartState) {
        self.overlay = cart
            .items
            .iter()
            .filter_map(|line| {
                line.mutable_product_id()
                    .map(|id| (id.to_string(), line.quantity))
            })
            .collect();
        self.server_cart = Some(cart);
    }
}
