//! REST client for the hosted product catalog.
//!
//! Reads tables through PostgREST at `{base_url}/rest/v1/{table}` using
//! [`reqwest`]. Every request carries the service key both as `apikey` and
//! as a bearer token.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde_json::Value;

use crate::query::CatalogQuery;

/// Table holding conveyor system definitions.
pub const CONVEYOR_SYSTEMS: &str = "conveyor_systems";

/// Table holding component specifications.
pub const COMPONENT_SPECIFICATIONS: &str = "component_specifications";

/// HTTP client for one catalog project.
#[derive(Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Errors from the catalog REST layer.
#[derive(Debug, thiserror::Error)]
pub enum CatalogApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The catalog rejected the service key.
    #[error("Catalog authentication failed")]
    Unauthorized,

    /// Any other non-2xx status.
    #[error("Catalog API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response whose body is not a JSON array of rows.
    #[error("Invalid response from catalog: {0}")]
    InvalidResponse(String),

    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Create a client with its own connection pool.
    ///
    /// * `base_url` - Project URL, e.g. `https://abc.supabase.co`.
    /// * `timeout` - Per-request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url, api_key))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Full URL for reading `table` with `query` applied.
    pub fn table_url(&self, table: &str, query: &CatalogQuery) -> Result<Url, CatalogApiError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{table}", self.base_url))
            .map_err(|e| CatalogApiError::InvalidUrl(e.to_string()))?;
        query.apply(&mut url);
        Ok(url)
    }

    /// Fetch the rows of `table` matching `query`.
    ///
    /// A 404 is treated as "no rows".
    pub async fn fetch_rows(
        &self,
        table: &str,
        query: &CatalogQuery,
    ) -> Result<Vec<Value>, CatalogApiError> {
        let url = self.table_url(table, query)?;
        tracing::debug!(table, url = %url, "Catalog request");

        let response = self
            .client
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        interpret_response(status, &body)
    }
}

/// Map a status and body to rows or an error.
///
/// * 2xx: the body must be a JSON array (an object is wrapped as one row).
/// * 401: [`CatalogApiError::Unauthorized`].
/// * 404: empty list.
/// * anything else: [`CatalogApiError::Api`].
pub fn interpret_response(status: StatusCode, body: &str) -> Result<Vec<Value>, CatalogApiError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(CatalogApiError::Unauthorized);
    }
    if status == StatusCode::NOT_FOUND {
        return Ok(Vec::new());
    }
    if !status.is_success() {
        return Err(CatalogApiError::Api {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(rows)) => Ok(rows),
        Ok(row @ Value::Object(_)) => Ok(vec![row]),
        Ok(other) => Err(CatalogApiError::InvalidResponse(format!(
            "expected a list of rows, got {other}"
        ))),
        Err(e) => Err(CatalogApiError::InvalidResponse(e.to_string())),
    }
}
