//! Handlers for component selections nested under a configuration.
//!
//! Every mutation recomputes the parent configuration's total inside the
//! repository transaction.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use flexlink_core::error::CoreError;
use flexlink_core::selection::{validate_fields, SelectionFields, SelectionStatus, DEFAULT_CURRENCY};
use flexlink_core::types::DbId;
use flexlink_db::models::component_selection::{
    ComponentSelection, ComponentSelectionView, CreateComponentSelection, NewComponentSelection,
    UpdateComponentSelection,
};
use flexlink_db::repositories::ComponentSelectionRepo;
use serde_json::Value;
use validator::Validate;

use crate::error::{AppError, AppJson, AppResult};
use crate::handlers::configuration::{find_owned, not_found};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

fn selection_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "ComponentSelection",
        id,
    })
}

fn resolve(input: CreateComponentSelection) -> AppResult<NewComponentSelection> {
    let status = input
        .status
        .as_deref()
        .map(SelectionStatus::from_str_db)
        .transpose()?
        .unwrap_or(SelectionStatus::Selected);

    let selection = NewComponentSelection {
        component_type: input.component_type.trim().to_string(),
        component_id: input.component_id.trim().to_string(),
        component_name: input.component_name,
        system_code: input.system_code,
        specifications: input
            .specifications
            .unwrap_or_else(|| Value::Object(Default::default())),
        options: input
            .options
            .unwrap_or_else(|| Value::Object(Default::default())),
        price: input.price,
        currency: input
            .currency
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        quantity: input.quantity.unwrap_or(1),
        notes: input.notes,
        status,
    };

    validate_fields(&SelectionFields {
        component_type: &selection.component_type,
        component_id: &selection.component_id,
        system_code: selection.system_code.as_deref(),
        price: selection.price,
        currency: Some(selection.currency.as_str()),
        quantity: selection.quantity,
    })?;
    Ok(selection)
}

// ---------------------------------------------------------------------------
// GET /configurations/{id}/selections
// ---------------------------------------------------------------------------

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(configuration_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ComponentSelectionView>>>> {
    find_owned(&state, configuration_id, auth.user_id).await?;
    let rows = ComponentSelectionRepo::list_for_configuration(&state.pool, configuration_id).await?;
    Ok(Json(DataResponse {
        data: rows.into_iter().map(Into::into).collect(),
    }))
}

// ---------------------------------------------------------------------------
// POST /configurations/{id}/selections
// ---------------------------------------------------------------------------

/// Add a selection. Currency defaults to USD, quantity to 1.
pub async fn add(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(configuration_id): Path<DbId>,
    AppJson(input): AppJson<CreateComponentSelection>,
) -> AppResult<(StatusCode, Json<DataResponse<ComponentSelectionView>>)> {
    input.validate()?;
    let selection = resolve(input)?;

    let created =
        ComponentSelectionRepo::create(&state.pool, configuration_id, auth.user_id, &selection)
            .await?
            .ok_or_else(|| not_found(configuration_id))?;

    tracing::info!(
        configuration_id,
        selection_id = created.id,
        component_id = %created.component_id,
        "Component selection added"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: created.into(),
        }),
    ))
}

// ---------------------------------------------------------------------------
// PUT /configurations/{id}/selections/{selection_id}
// ---------------------------------------------------------------------------

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((configuration_id, selection_id)): Path<(DbId, DbId)>,
    AppJson(input): AppJson<UpdateComponentSelection>,
) -> AppResult<Json<DataResponse<ComponentSelectionView>>> {
    input.validate()?;
    find_owned(&state, configuration_id, auth.user_id).await?;

    let updated = ComponentSelectionRepo::update(
        &state.pool,
        configuration_id,
        auth.user_id,
        selection_id,
        &input,
    )
    .await?
    .ok_or_else(|| selection_not_found(selection_id))?;

    tracing::info!(configuration_id, selection_id, "Component selection updated");
    Ok(Json(DataResponse {
        data: updated.into(),
    }))
}

// ---------------------------------------------------------------------------
// DELETE /configurations/{id}/selections/{selection_id}
// ---------------------------------------------------------------------------

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((configuration_id, selection_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    find_owned(&state, configuration_id, auth.user_id).await?;
    if !ComponentSelectionRepo::delete(&state.pool, configuration_id, auth.user_id, selection_id)
        .await?
    {
        return Err(selection_not_found(selection_id));
    }
    tracing::info!(configuration_id, selection_id, "Component selection deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// POST /configurations/{id}/selections/{selection_id}/{select|reject|pending}
// ---------------------------------------------------------------------------

async fn transition(
    state: &AppState,
    auth: &AuthUser,
    configuration_id: DbId,
    selection_id: DbId,
    status: SelectionStatus,
) -> AppResult<ComponentSelection> {
    find_owned(state, configuration_id, auth.user_id).await?;
    let updated = ComponentSelectionRepo::transition(
        &state.pool,
        configuration_id,
        auth.user_id,
        selection_id,
        status,
    )
    .await?
    .ok_or_else(|| selection_not_found(selection_id))?;

    tracing::info!(
        configuration_id,
        selection_id,
        status = status.as_str(),
        "Component selection status changed"
    );
    Ok(updated)
}

pub async fn select(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((configuration_id, selection_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<ComponentSelectionView>>> {
    let updated = transition(
        &state,
        &auth,
        configuration_id,
        selection_id,
        SelectionStatus::Selected,
    )
    .await?;
    Ok(Json(DataResponse {
        data: updated.into(),
    }))
}

pub async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((configuration_id, selection_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<ComponentSelectionView>>> {
    let updated = transition(
        &state,
        &auth,
        configuration_id,
        selection_id,
        SelectionStatus::Rejected,
    )
    .await?;
    Ok(Json(DataResponse {
        data: updated.into(),
    }))
}

pub async fn mark_pending(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((configuration_id, selection_id)): Path<(DbId, DbId)>,
) -> AppResult<Json<DataResponse<ComponentSelectionView>>> {
    let updated = transition(
        &state,
        &auth,
        configuration_id,
        selection_id,
        SelectionStatus::Pending,
    )
    .await?;
    Ok(Json(DataResponse {
        data: updated.into(),
    }))
}
