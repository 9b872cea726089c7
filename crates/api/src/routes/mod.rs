pub mod auth;
pub mod catalog;
pub mod configuration;
pub mod dashboard;
pub mod health;
pub mod wizard;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
/// /auth/me                                         current user
///
/// /dashboard                                       stats + recent configurations
///
/// /wizard/session                                  active session (created on demand)
/// /wizard/step/{step}                              show (GET), submit (PATCH)
/// /wizard/step/{step}/data                         clear one step (DELETE)
/// /wizard/summary                                  answers so far
/// /wizard/complete                                 create configuration (POST)
/// /wizard/abandon                                  abandon session (POST)
/// /wizard/restart                                  back to step 1 (POST)
/// /wizard/reset                                    delete session (DELETE)
///
/// /configurations                                  list, create
/// /configurations/templates                        completed configurations
/// /configurations/from-template                    clone a template (POST)
/// /configurations/{id}                             get, update, delete
/// /configurations/{id}/export                      json or csv
/// /configurations/{id}/duplicate                   deep copy (POST)
/// /configurations/{id}/status                      change status (PATCH)
/// /configurations/{id}/selections                  list, add
/// /configurations/{id}/selections/{selection_id}   update, delete
/// /configurations/{id}/selections/{selection_id}/{select,reject,pending}
///
/// /catalog/conveyor-systems                        browse (public)
/// /catalog/component-specifications                browse (public)
/// /catalog/component-specifications/search         search by name (public)
/// /catalog/component-types                         distinct types (public)
/// /catalog/system-specifications                   grouped system types (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/dashboard", dashboard::router())
        .nest("/wizard", wizard::router())
        .nest("/configurations", configuration::router())
        .nest("/catalog", catalog::router())
}
