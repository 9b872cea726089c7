use std::time::Duration;

use flexlink_catalog::{CatalogApiError, CatalogService, SupabaseClient};
use flexlink_core::wizard::BackwardEditPolicy;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long to wait for the database pool to drain on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Remote product catalog connection.
    pub catalog: CatalogConfig,
    /// What happens to later wizard answers when an earlier step changes.
    pub backward_edit_policy: BackwardEditPolicy,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                 |
    /// |-------------------------------|-------------------------|
    /// | `HOST`                        | `0.0.0.0`               |
    /// | `PORT`                        | `3000`                  |
    /// | `CORS_ORIGINS`                | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`       | `30`                    |
    /// | `WIZARD_BACKWARD_EDIT_POLICY` | `retain`                |
    ///
    /// See [`JwtConfig::from_env`] and [`CatalogConfig::from_env`] for the
    /// remaining variables.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let backward_edit_policy = std::env::var("WIZARD_BACKWARD_EDIT_POLICY")
            .map(|raw| {
                BackwardEditPolicy::from_str_config(&raw)
                    .unwrap_or_else(|e| panic!("WIZARD_BACKWARD_EDIT_POLICY: {e}"))
            })
            .unwrap_or_default();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            catalog: CatalogConfig::from_env(),
            backward_edit_policy,
        }
    }
}

/// Connection settings for the hosted product catalog.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Project URL. `None` runs the catalog offline on built-in data.
    pub url: Option<String>,
    pub api_key: String,
    /// Per-request timeout in seconds (default: `5`).
    pub timeout_secs: u64,
}

/// Default outbound catalog timeout in seconds.
const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 5;

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("url", &self.url)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl CatalogConfig {
    /// Load catalog settings from environment variables.
    ///
    /// | Env Var                | Required | Default |
    /// |------------------------|----------|---------|
    /// | `SUPABASE_URL`         | no       | offline |
    /// | `SUPABASE_ANON_KEY`    | no       | empty   |
    /// | `CATALOG_TIMEOUT_SECS` | no       | `5`     |
    pub fn from_env() -> Self {
        let url = std::env::var("SUPABASE_URL")
            .ok()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        let api_key = std::env::var("SUPABASE_ANON_KEY").unwrap_or_default();

        let timeout_secs: u64 = std::env::var("CATALOG_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_CATALOG_TIMEOUT_SECS.to_string())
            .parse()
            .expect("CATALOG_TIMEOUT_SECS must be a valid u64");

        Self {
            url,
            api_key,
            timeout_secs,
        }
    }

    /// Settings that keep the catalog on its built-in data.
    pub fn offline() -> Self {
        Self {
            url: None,
            api_key: String::new(),
            timeout_secs: DEFAULT_CATALOG_TIMEOUT_SECS,
        }
    }

    /// Build the catalog service these settings describe.
    pub fn build_service(&self) -> Result<CatalogService, CatalogApiError> {
        let client = match &self.url {
            Some(url) => Some(SupabaseClient::new(
                url.clone(),
                self.api_key.clone(),
                Duration::from_secs(self.timeout_secs),
            )?),
            None => None,
        };
        Ok(CatalogService::new(client))
    }
}
