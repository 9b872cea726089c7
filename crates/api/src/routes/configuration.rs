//! Route definitions for the `/configurations` resource.

use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::handlers::{configuration, selection};
use crate::state::AppState;

/// Routes mounted at `/configurations`. All require auth.
///
/// ```text
/// GET    /                                     -> index (?limit, offset)
/// POST   /                                     -> create
/// GET    /templates                            -> templates
/// POST   /from-template                        -> from_template
/// GET    /{id}                                 -> show
/// PUT    /{id}                                 -> update
/// DELETE /{id}                                 -> destroy
/// GET    /{id}/export                          -> export (?format=json|csv|pdf)
/// POST   /{id}/duplicate                       -> duplicate
/// PATCH  /{id}/status                          -> update_status
/// GET    /{id}/selections                      -> selection::list
/// POST   /{id}/selections                      -> selection::add
/// PUT    /{id}/selections/{selection_id}         -> selection::update
/// DELETE /{id}/selections/{selection_id}         -> selection::delete
/// POST   /{id}/selections/{selection_id}/select  -> selection::select
/// POST   /{id}/selections/{selection_id}/reject  -> selection::reject
/// POST   /{id}/selections/{selection_id}/pending -> selection::mark_pending
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(configuration::index).post(configuration::create))
        .route("/templates", get(configuration::templates))
        .route("/from-template", post(configuration::from_template))
        .route(
            "/{id}",
            get(configuration::show)
                .put(configuration::update)
                .delete(configuration::destroy),
        )
        .route("/{id}/export", get(configuration::export))
        .route("/{id}/duplicate", post(configuration::duplicate))
        .route("/{id}/status", patch(configuration::update_status))
        .route(
            "/{id}/selections",
            get(selection::list).post(selection::add),
        )
        .route(
            "/{id}/selections/{selection_id}",
            put(selection::update).delete(selection::delete),
        )
        .route(
            "/{id}/selections/{selection_id}/select",
            post(selection::select),
        )
        .route(
            "/{id}/selections/{selection_id}/reject",
            post(selection::reject),
        )
        .route(
            "/{id}/selections/{selection_id}/pending",
            post(selection::mark_pending),
        )
}
