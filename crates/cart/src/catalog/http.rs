//! REST client for the catalog and stock API.
//!
//! Uses `reqwest` for HTTP. Caches product records using `moka` (TTL from
//! config); stock levels are never cached because they bound every quantity
//! change.

use std::sync::Arc;

use async_trait::async_trait;
use cartsync_core::{Product, ProductId, StockLevel};
use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use super::{Catalog, CollaboratorError, StockSource};
use crate::config::ApiConfig;

/// Errors that can occur when talking to the catalog API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection refused, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Body of `GET /stock/{id}`. Only the amount is read.
#[derive(Debug, Deserialize)]
struct StockReply {
    #[serde(default)]
    amount: Option<i64>,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the catalog and stock REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and product cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    products: Cache<ProductId, Product>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("token", &self.inner.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let products = Cache::builder()
            .max_capacity(config.cache_capacity)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: with_trailing_slash(config.base_url.clone()),
                token: config.token.clone(),
                products,
            }),
        })
    }

    /// The API base URL, always ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Fetch a product record, from cache when possible.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` on a 404 or an empty body, otherwise any
    /// transport or parse error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        if let Some(product) = self.inner.products.get(&id).await {
            debug!("Product cache hit");
            return Ok(product);
        }

        let url = self.endpoint("products", id)?;
        let product: Product = self
            .get_json(url)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("product {id}")))?;

        self.inner.products.insert(id, product.clone()).await;
        Ok(product)
    }

    /// Fetch the current stock level. Never cached.
    ///
    /// An empty or `null` body, or a record without an `amount`, yields a
    /// level with no amount, which callers read as out of stock. The level
    /// always carries the requested id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` on a 404, otherwise any transport or
    /// parse error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_stock(&self, id: ProductId) -> Result<StockLevel, ApiError> {
        let url = self.endpoint("stock", id)?;
        let amount = self
            .get_json::<StockReply>(url)
            .await?
            .and_then(|reply| reply.amount);
        Ok(StockLevel { id, amount })
    }

    /// Drop a cached product record.
    pub async fn invalidate_product(&self, id: ProductId) {
        self.inner.products.invalidate(&id).await;
    }

    fn endpoint(&self, resource: &str, id: ProductId) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(&format!("{resource}/{id}"))?)
    }

    /// GET a JSON document. `Ok(None)` for an empty or `null` body.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, ApiError> {
        let mut request = self
            .inner
            .client
            .get(url.clone())
            .header("Accept", "application/json");
        if let Some(token) = &self.inner.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url.path().to_string()));
        }

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                url = %url,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Option<T>>(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                url = %url,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog API response"
            );
            ApiError::Parse(e)
        })
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn into_collaborator_error(id: ProductId, err: ApiError) -> CollaboratorError {
    match err {
        ApiError::NotFound(_) => CollaboratorError::NotFound(id),
        other => CollaboratorError::Api(other),
    }
}

#[async_trait]
impl Catalog for ApiClient {
    async fn product(&self, id: ProductId) -> Result<Product, CollaboratorError> {
        self.get_product(id)
            .await
            .map_err(|e| into_collaborator_error(id, e))
    }
}

#[async_trait]
impl StockSource for ApiClient {
    async fn stock(&self, id: ProductId) -> Result<StockLevel, CollaboratorError> {
        self.get_stock(id)
            .await
            .map_err(|e| into_collaborator_error(id, e))
    }
}
