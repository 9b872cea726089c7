use std::sync::Arc;

use flexlink_catalog::CatalogService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: flexlink_db::DbPool,
    /// Server configuration (JWT settings, wizard policy).
    pub config: Arc<ServerConfig>,
    /// Product catalog with caching and static fallback.
    pub catalog: Arc<CatalogService>,
}
