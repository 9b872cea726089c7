//! Handler for the user dashboard.

use axum::extract::State;
use axum::Json;
use flexlink_core::pagination::DASHBOARD_RECENT_LIMIT;
use flexlink_db::models::dashboard::DashboardSummary;
use flexlink_db::repositories::ConfigurationRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/dashboard
///
/// Statistics plus the most recently updated configurations.
pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<DashboardSummary>>> {
    let summary =
        ConfigurationRepo::dashboard(&state.pool, auth.user_id, DASHBOARD_RECENT_LIMIT).await?;
    Ok(Json(DataResponse { data: summary }))
}
