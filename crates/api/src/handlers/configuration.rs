//! Handlers for the `/configurations` resource.
//!
//! Every lookup is scoped to the authenticated user; another user's
//! configuration id answers 404.

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flexlink_core::configuration::{
    duplicate_name, parameterize, template_copy_name, validate_name, with_system_type,
    ConfigurationStatus, TEMPLATE_LIMIT,
};
use flexlink_core::error::CoreError;
use flexlink_core::export::ExportFormat;
use flexlink_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use flexlink_core::pricing::ConfigurationStats;
use flexlink_core::types::DbId;
use flexlink_db::models::component_selection::ComponentSelectionView;
use flexlink_db::models::configuration::{
    Configuration, ConfigurationChanges, ConfigurationDetail, CreateConfiguration,
    CreateFromTemplate, NewConfiguration, UpdateConfiguration, UpdateConfigurationStatus,
};
use flexlink_db::repositories::{ComponentSelectionRepo, ConfigurationRepo};
use serde::Serialize;
use serde_json::Value;
use validator::Validate;

use crate::error::{AppError, AppJson, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::{ExportParams, PaginationParams};
use crate::response::{DataResponse, DataWithMeta};
use crate::state::AppState;

/// Pagination and aggregate figures attached to the configuration index.
#[derive(Debug, Serialize)]
pub struct IndexMeta {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub stats: ConfigurationStats,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Configuration",
        id,
    })
}

/// Load a configuration owned by `user_id`, or 404.
pub(crate) async fn find_owned(
    state: &AppState,
    id: DbId,
    user_id: DbId,
) -> AppResult<Configuration> {
    ConfigurationRepo::find_for_user(&state.pool, id, user_id)
        .await?
        .ok_or_else(|| not_found(id))
}

async fn detail(state: &AppState, configuration: Configuration) -> AppResult<ConfigurationDetail> {
    let rows = ComponentSelectionRepo::list_for_configuration(&state.pool, configuration.id).await?;
    let selections: Vec<ComponentSelectionView> = rows.into_iter().map(Into::into).collect();
    Ok(ConfigurationDetail::new(configuration, selections))
}

fn parse_status(raw: Option<&str>) -> AppResult<Option<ConfigurationStatus>> {
    raw.map(ConfigurationStatus::from_str_db)
        .transpose()
        .map_err(AppError::from)
}

// ---------------------------------------------------------------------------
// GET /configurations
// ---------------------------------------------------------------------------

/// List the user's configurations, most recently updated first.
pub async fn index(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataWithMeta<Vec<Configuration>, IndexMeta>>> {
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let items = ConfigurationRepo::list_for_user(&state.pool, auth.user_id, limit, offset).await?;
    let total = ConfigurationRepo::count_for_user(&state.pool, auth.user_id).await?;
    let stats = ConfigurationRepo::stats_for_user(&state.pool, auth.user_id).await?;

    Ok(Json(DataWithMeta {
        data: items,
        meta: IndexMeta {
            total,
            limit,
            offset,
            stats,
        },
    }))
}

// ---------------------------------------------------------------------------
// GET /configurations/{id}
// ---------------------------------------------------------------------------

pub async fn show(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ConfigurationDetail>>> {
    let configuration = find_owned(&state, id, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: detail(&state, configuration).await?,
    }))
}

// ---------------------------------------------------------------------------
// POST /configurations
// ---------------------------------------------------------------------------

/// Create a configuration. Status defaults to draft.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(input): AppJson<CreateConfiguration>,
) -> AppResult<(StatusCode, Json<DataResponse<ConfigurationDetail>>)> {
    input.validate()?;
    validate_name(&input.name)?;
    let status = parse_status(input.status.as_deref())?.unwrap_or(ConfigurationStatus::Draft);

    let mut specifications = input
        .system_specifications
        .unwrap_or_else(|| Value::Object(Default::default()));
    if let Some(system_type) = input.system_type.as_deref() {
        specifications = with_system_type(specifications, system_type);
    }

    let configuration = ConfigurationRepo::create(
        &state.pool,
        auth.user_id,
        &NewConfiguration {
            name: input.name.trim().to_string(),
            description: input.description,
            status,
            system_specifications: specifications,
        },
    )
    .await?;

    tracing::info!(
        configuration_id = configuration.id,
        user_id = auth.user_id,
        "Configuration created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: detail(&state, configuration).await?,
        }),
    ))
}

// ---------------------------------------------------------------------------
// PUT /configurations/{id}
// ---------------------------------------------------------------------------

/// Partially update a configuration; omitted fields are left unchanged.
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateConfiguration>,
) -> AppResult<Json<DataResponse<ConfigurationDetail>>> {
    input.validate()?;
    if let Some(name) = input.name.as_deref() {
        validate_name(name)?;
    }

    let changes = ConfigurationChanges {
        status: parse_status(input.status.as_deref())?,
        name: input.name.map(|n| n.trim().to_string()),
        description: input.description,
        system_type: input.system_type,
        system_specifications: input.system_specifications,
    };

    let configuration = ConfigurationRepo::update(&state.pool, id, auth.user_id, &changes)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(configuration_id = id, user_id = auth.user_id, "Configuration updated");

    Ok(Json(DataResponse {
        data: detail(&state, configuration).await?,
    }))
}

// ---------------------------------------------------------------------------
// DELETE /configurations/{id}
// ---------------------------------------------------------------------------

/// Delete a configuration and its selections.
pub async fn destroy(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ConfigurationRepo::delete(&state.pool, id, auth.user_id).await? {
        return Err(not_found(id));
    }
    tracing::info!(configuration_id = id, user_id = auth.user_id, "Configuration deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// PATCH /configurations/{id}/status
// ---------------------------------------------------------------------------

pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    AppJson(input): AppJson<UpdateConfigurationStatus>,
) -> AppResult<Json<DataResponse<Configuration>>> {
    let status = ConfigurationStatus::from_str_db(&input.status)?;
    let configuration = ConfigurationRepo::update_status(&state.pool, id, auth.user_id, status)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(
        configuration_id = id,
        status = status.as_str(),
        "Configuration status changed"
    );
    Ok(Json(DataResponse {
        data: configuration,
    }))
}

// ---------------------------------------------------------------------------
// GET /configurations/{id}/export
// ---------------------------------------------------------------------------

/// Export as a JSON document or a CSV attachment.
pub async fn export(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    let format = ExportFormat::parse(params.format.as_deref())?;
    let configuration = find_owned(&state, id, auth.user_id).await?;
    let selections = ComponentSelectionRepo::list_for_configuration(&state.pool, id).await?;
    let document = configuration.to_export(&selections);

    match format {
        ExportFormat::Json => Ok(Json(document).into_response()),
        ExportFormat::Csv => {
            let disposition = format!(
                "attachment; filename=\"{}.csv\"",
                parameterize(&configuration.name)
            );
            Ok((
                [
                    (CONTENT_TYPE, "text/csv".to_string()),
                    (CONTENT_DISPOSITION, disposition),
                ],
                document.to_csv(),
            )
                .into_response())
        }
    }
}

// ---------------------------------------------------------------------------
// POST /configurations/{id}/duplicate
// ---------------------------------------------------------------------------

/// Deep-copy a configuration into a new draft named "<name> (Copy)".
pub async fn duplicate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<(StatusCode, Json<DataResponse<ConfigurationDetail>>)> {
    let copy = ConfigurationRepo::clone_for_user(&state.pool, id, auth.user_id, duplicate_name)
        .await?
        .ok_or_else(|| not_found(id))?;

    tracing::info!(source_id = id, configuration_id = copy.id, "Configuration duplicated");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: detail(&state, copy).await?,
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /configurations/templates, POST /configurations/from-template
// ---------------------------------------------------------------------------

/// The user's completed configurations, most recent first.
pub async fn templates(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Configuration>>>> {
    let templates =
        ConfigurationRepo::list_templates(&state.pool, auth.user_id, TEMPLATE_LIMIT).await?;
    Ok(Json(DataResponse { data: templates }))
}

/// Start a new draft from one of the user's configurations.
pub async fn from_template(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(input): AppJson<CreateFromTemplate>,
) -> AppResult<(StatusCode, Json<DataResponse<ConfigurationDetail>>)> {
    let template_id = input.template_id;
    let copy = ConfigurationRepo::clone_for_user(
        &state.pool,
        template_id,
        auth.user_id,
        template_copy_name,
    )
    .await?
    .ok_or_else(|| not_found(template_id))?;

    tracing::info!(
        template_id,
        configuration_id = copy.id,
        "Configuration created from template"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: detail(&state, copy).await?,
        }),
    ))
}
