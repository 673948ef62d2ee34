use url::form_urlencoded;

use crate::domain::product::{Product, ProductPage};
use crate::error::ClientError;
use crate::gateway::ApiGateway;
use crate::validation::validate_present;

/// Catalog listing filters. Everything is optional; the server applies its own
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ProductQuery {
    fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(page) = self.page {
            serializer.append_pair("page", &page.to_string());
        }
        if let Some(limit) = self.limit {
            serializer.append_pair("limit", &limit.to_string());
        }
        if let Some(category) = &self.category {
            serializer.append_pair("category", category);
        }
        if let Some(search) = &self.search {
            serializer.append_pair("search", search);
        }
        serializer.finish()
    }
}

/// Catalog browsing boundary. Unauthenticated; the listing endpoint keeps its
/// pagination metadata next to `data`, so it is fetched raw.
#[derive(Clone)]
pub struct ProductService {
    gateway: ApiGateway,
}

impl ProductService {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, query: &ProductQuery) -> Result<ProductPage, ClientError> {
        let qs = query.to_query_string();
        let path = if qs.is_empty() {
            "/api/products".to_string()
        } else {
            format!("/api/products?{qs}")
        };

        self.gateway.fetch_raw(&path).await
    }

    pub async fn get(&self, product_id: &str) -> Result<Product, ClientError> {
        validate_present("productId", product_id)?;
        self.gateway
            .fetch(&format!("/api/products/{product_id}"))
            .await
    }
}
