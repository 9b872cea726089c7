//! Route definitions for the configuration wizard.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::wizard;
use crate::state::AppState;

/// Routes mounted at `/wizard`. All require auth.
///
/// ```text
/// GET    /session            -> get_session
/// GET    /step/{step}        -> show_step
/// PATCH  /step/{step}        -> submit_step
/// DELETE /step/{step}/data   -> clear_step_data
/// GET    /summary            -> summary
/// POST   /complete           -> complete
/// POST   /abandon            -> abandon
/// POST   /restart            -> restart
/// DELETE /reset              -> reset
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", get(wizard::get_session))
        .route(
            "/step/{step}",
            get(wizard::show_step).patch(wizard::submit_step),
        )
        .route("/step/{step}/data", delete(wizard::clear_step_data))
        .route("/summary", get(wizard::summary))
        .route("/complete", post(wizard::complete))
        .route("/abandon", post(wizard::abandon))
        .route("/restart", post(wizard::restart))
        .route("/reset", delete(wizard::reset))
}
