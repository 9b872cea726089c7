//! Route definitions for the public `/catalog` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::catalog;
use crate::state::AppState;

/// Routes mounted at `/catalog`. No auth required.
///
/// ```text
/// GET /conveyor-systems                  -> conveyor_systems
/// GET /component-specifications          -> component_specifications
/// GET /component-specifications/search   -> search (?q required)
/// GET /component-types                   -> component_types
/// GET /system-specifications             -> system_specifications
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/conveyor-systems", get(catalog::conveyor_systems))
        .route(
            "/component-specifications",
            get(catalog::component_specifications),
        )
        .route("/component-specifications/search", get(catalog::search))
        .route("/component-types", get(catalog::component_types))
        .route("/system-specifications", get(catalog::system_specifications))
}
