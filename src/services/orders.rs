use chrono::Utc;
use reqwest::Method;
use serde_json::json;

use crate::domain::order::{OrderRecord, PaymentSession};
use crate::error::ClientError;
use crate::gateway::ApiGateway;
use crate::validation::validate_present;

/// Order operations: listing, lookup, checkout, payment initiation and the
/// post-redirect mark-paid mutation. Orders are immutable once created; status
/// transitions are server-authoritative.
#[derive(Clone)]
pub struct OrderService {
    gateway: ApiGateway,
}

impl OrderService {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self) -> Result<Vec<OrderRecord>, ClientError> {
        self.require_auth()?;
        let orders: Option<Vec<OrderRecord>> = self.gateway.fetch("/api/orders").await?;
        Ok(orders.unwrap_or_default())
    }

    pub async fn get(&self, order_id: &str) -> Result<OrderRecord, ClientError> {
        self.require_auth()?;
        validate_present("orderId", order_id)?;
        self.gateway.fetch(&format!("/api/orders/{order_id}")).await
    }

    /// Creates an order from the current server cart. The order captures the
    /// cart lines at this moment; later cart changes do not affect it.
    pub async fn checkout(&self) -> Result<OrderRecord, ClientError> {
        self.require_auth()?;
        let order: OrderRecord = self
            .gateway
            .send(Method::POST, "/api/orders", None)
            .await?;
        tracing::info!(order_id = %order.id, "order created from cart");
        Ok(order)
    }

    /// Asks the backend for a payment-gateway URL for this order. A response
    /// without a URL cannot be acted on and fails the call; the order itself
    /// is left in its prior state.
    pub async fn request_payment(&self, order_id: &str) -> Result<PaymentSession, ClientError> {
        self.require_auth()?;
        validate_present("orderId", order_id)?;

        let session: PaymentSession = self
            .gateway
            .send(Method::POST, &format!("/api/orders/{order_id}/pay"), None)
            .await?;

        if session.payment_url.is_none() {
            return Err(ClientError::Decode("payment URL not returned".to_string()));
        }

        Ok(session)
    }

    /// The deliberate optimistic transition after a successful gateway
    /// redirect. Idempotent on the server side; the caller still confirms the
    /// status with a separate fetch.
    pub async fn mark_paid(&self, order_id: &str, gateway_status: &str) -> Result<(), ClientError> {
        self.require_auth()?;
        validate_present("orderId", order_id)?;

        let body = json!({
            "status": "paid",
            "paymentInfo": {
                "paidAt": Utc::now().to_rfc3339(),
                "status": gateway_status,
            },
        });

        self.gateway
            .send::<serde_json::Value>(
                Method::PATCH,
                &format!("/api/orders/{order_id}/status"),
                Some(body),
            )
            .await?;

        tracing::info!(order_id, "order marked paid");
        Ok(())
    }

    fn require_auth(&self) -> Result<(), ClientError> {
        if self.gateway.auth().is_set() {
            Ok(())
        } else {
            Err(ClientError::AuthRequired)
        }
    }
}
