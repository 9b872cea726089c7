//! Public catalog browse endpoints.
//!
//! These pass through to the catalog service, which answers from the
//! remote catalog when it can and from the built-in dataset otherwise.
//! `meta.source` tells the client which one answered.

use axum::extract::{Query, State};
use axum::Json;
use flexlink_catalog::{CatalogSource, ComponentFilters, Listing, SystemFilters};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataWithMeta;
use crate::state::AppState;

/// `meta` block of every catalog response.
#[derive(Debug, Serialize)]
pub struct CatalogMeta<F: Serialize> {
    pub count: usize,
    pub filters: F,
    pub source: CatalogSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Query string of the component search endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub component_type: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// Filters echoed back by endpoints that take none.
#[derive(Debug, Serialize)]
pub struct NoFilters {}

type CatalogResponse<T, F> = Json<DataWithMeta<Vec<T>, CatalogMeta<F>>>;

fn respond<T: Serialize, F: Serialize>(
    listing: Listing<Vec<T>>,
    filters: F,
    query: Option<String>,
) -> CatalogResponse<T, F> {
    Json(DataWithMeta {
        meta: CatalogMeta {
            count: listing.data.len(),
            filters,
            source: listing.source,
            query,
        },
        data: listing.data,
    })
}

/// GET /api/v1/catalog/conveyor-systems
pub async fn conveyor_systems(
    State(state): State<AppState>,
    Query(filters): Query<SystemFilters>,
) -> CatalogResponse<serde_json::Value, SystemFilters> {
    let listing = state.catalog.conveyor_systems(&filters).await;
    respond(listing, filters, None)
}

/// GET /api/v1/catalog/component-specifications
pub async fn component_specifications(
    State(state): State<AppState>,
    Query(filters): Query<ComponentFilters>,
) -> CatalogResponse<serde_json::Value, ComponentFilters> {
    let listing = state.catalog.component_specifications(&filters).await;
    respond(listing, filters, None)
}

/// GET /api/v1/catalog/component-specifications/search?q=
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<CatalogResponse<serde_json::Value, ComponentFilters>> {
    let q = params
        .q
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::BadRequest("Search query is required".to_string()))?;

    let filters = ComponentFilters {
        component_type: params.component_type,
        min_price: params.min_price,
        max_price: params.max_price,
        search: None,
    };
    let listing = state.catalog.search_components(&q, &filters).await;
    tracing::debug!(query = %q, count = listing.data.len(), "Catalog search");
    Ok(respond(listing, filters, Some(q)))
}

/// GET /api/v1/catalog/component-types
pub async fn component_types(
    State(state): State<AppState>,
) -> CatalogResponse<String, NoFilters> {
    let listing = state.catalog.component_type_list().await;
    respond(listing, NoFilters {}, None)
}

/// GET /api/v1/catalog/system-specifications
///
/// System types grouped by category.
pub async fn system_specifications(
    State(state): State<AppState>,
) -> Json<DataWithMeta<flexlink_core::catalog::SystemTypeGroups, CatalogMeta<NoFilters>>> {
    let listing = state.catalog.system_type_groups().await;
    Json(DataWithMeta {
        meta: CatalogMeta {
            count: listing.data.len(),
            filters: NoFilters {},
            source: listing.source,
            query: None,
        },
        data: listing.data,
    })
}
