//! Handlers for the configuration wizard.
//!
//! Every handler works on the authenticated user's single active session,
//! creating it on first access. Step numbers come from the path as text so
//! that non-numeric and out-of-range values both produce the step-1
//! redirect.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use flexlink_core::catalog::{CatalogComponent, CatalogLookup, SystemSpecOption, SystemTypeGroups};
use flexlink_core::configuration::{name_or_default, ConfigurationStatus};
use flexlink_core::error::CoreError;
use flexlink_core::selection::{SelectionStatus, DEFAULT_CURRENCY, UNTYPED_COMPONENT};
use flexlink_core::wizard::{
    require_completable, FieldErrors, StepAnswer, StepData, WizardSelection, WizardStep,
    WizardSummary, CORRECT_ERRORS_FLASH, TOTAL_STEPS,
};
use flexlink_db::models::component_selection::{ComponentSelectionView, NewComponentSelection};
use flexlink_db::models::configuration::{ConfigurationDetail, NewConfiguration};
use flexlink_db::models::wizard_session::{WizardSession, WizardSessionView};
use flexlink_db::repositories::{ComponentSelectionRepo, WizardSessionRepo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppJson, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, Flash, FlashResponse};
use crate::state::AppState;

/// Summary page the last step hands over to.
pub const SUMMARY_PATH: &str = "/api/v1/wizard/summary";

type SessionTx = sqlx::Transaction<'static, sqlx::Postgres>;

const RESET_NOTICE: &str = "Configuration wizard reset. You can start a new configuration.";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `PATCH /wizard/step/{step}`.
#[derive(Debug, Deserialize)]
pub struct SubmitStepRequest {
    #[serde(default)]
    pub wizard_step: Value,
}

/// Static description of a step plus its position in the wizard.
#[derive(Debug, Serialize)]
pub struct StepInfo {
    pub number: i32,
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub progress_percentage: i32,
    pub total_steps: i32,
    pub next_step: Option<i32>,
    pub previous_step: Option<i32>,
}

impl From<WizardStep> for StepInfo {
    fn from(step: WizardStep) -> Self {
        Self {
            number: step.number(),
            name: step.name(),
            title: step.title(),
            description: step.description(),
            progress_percentage: step.progress_percentage(),
            total_steps: TOTAL_STEPS,
            next_step: step.next().map(WizardStep::number),
            previous_step: step.previous().map(WizardStep::number),
        }
    }
}

/// Catalog data a step offers for selection.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StepOptions {
    SystemTypes {
        system_types: SystemTypeGroups,
    },
    SystemSpecs {
        system_type: Option<String>,
        system_specs: Vec<SystemSpecOption>,
    },
    ComponentTypes {
        component_types: Vec<String>,
    },
    Components {
        component_type: Option<String>,
        components: Vec<CatalogComponent>,
    },
    Summary {
        summary: WizardSummary,
    },
}

/// A step as shown to the client.
#[derive(Debug, Serialize)]
pub struct StepView {
    pub step: StepInfo,
    pub session: WizardSessionView,
    /// The stored answer, or the rejected submission when re-rendering.
    pub step_data: Value,
    pub errors: FieldErrors,
    pub options: StepOptions,
}

/// Result of an accepted step submission.
#[derive(Debug, Serialize)]
pub struct StepAccepted {
    pub session: WizardSessionView,
    pub next_step: Option<i32>,
    pub redirect_to: String,
    /// Later steps whose answers were discarded by the backward-edit policy.
    pub discarded_steps: Vec<i32>,
}

/// Result of completing the wizard.
#[derive(Debug, Serialize)]
pub struct WizardCompleted {
    pub configuration: ConfigurationDetail,
    pub session: WizardSessionView,
    pub redirect_to: String,
}

/// Result of resetting the wizard.
#[derive(Debug, Serialize)]
pub struct WizardReset {
    pub reset: bool,
    pub redirect_to: &'static str,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn step_path(step: WizardStep) -> String {
    format!("/api/v1/wizard/step/{}", step.number())
}

fn no_active_session() -> AppError {
    AppError::Core(CoreError::Validation("No active wizard session".into()))
}

fn session_gone(id: i64) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "WizardSession",
        id,
    })
}

/// Open a transaction holding the row lock of the user's active session,
/// creating the session first if needed.
async fn lock_session(state: &AppState, user_id: i64) -> AppResult<(SessionTx, WizardSession)> {
    let active = WizardSessionRepo::ensure_active(&state.pool, user_id).await?;
    let mut tx = state.pool.begin().await?;
    let session = WizardSessionRepo::lock_active(&mut *tx, active.id)
        .await?
        .ok_or_else(|| session_gone(active.id))?;
    Ok((tx, session))
}

/// Catalog data for `step`, read through the lookup capability.
pub async fn step_options(
    catalog: &dyn CatalogLookup,
    data: &StepData,
    step: WizardStep,
) -> Result<StepOptions, CoreError> {
    let options = match step {
        WizardStep::SystemType => StepOptions::SystemTypes {
            system_types: catalog.system_types().await?,
        },
        WizardStep::SystemSpecifications => {
            let system_type = data.system_type().map(str::to_string);
            let system_specs = match system_type.as_deref() {
                Some(t) => catalog.system_specs(t).await?,
                None => Vec::new(),
            };
            StepOptions::SystemSpecs {
                system_type,
                system_specs,
            }
        }
        WizardStep::ComponentTypes => StepOptions::ComponentTypes {
            component_types: catalog.component_types().await?,
        },
        WizardStep::Review => StepOptions::Summary {
            summary: WizardSummary::build(data),
        },
        selection_step => {
            let component_type = data.component_type_for(selection_step).map(str::to_string);
            let components = match component_type.as_deref() {
                Some(t) => catalog.components_by_type(t).await?,
                None => Vec::new(),
            };
            StepOptions::Components {
                component_type,
                components,
            }
        }
    };
    Ok(options)
}

/// Persisted form of a wizard selection. Values are copied verbatim.
fn to_new_selection(selection: &WizardSelection) -> NewComponentSelection {
    NewComponentSelection {
        component_type: selection
            .component_type
            .clone()
            .unwrap_or_else(|| UNTYPED_COMPONENT.to_string()),
        component_id: selection.component_id.clone(),
        component_name: selection.component_name.clone(),
        system_code: selection.system_code.clone(),
        specifications: Value::Object(Default::default()),
        options: Value::Object(Default::default()),
        price: selection.price,
        currency: selection
            .currency
            .clone()
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        quantity: selection.quantity,
        notes: selection.notes.clone(),
        status: SelectionStatus::Selected,
    }
}

// ---------------------------------------------------------------------------
// GET /wizard/session
// ---------------------------------------------------------------------------

/// Return the active session, starting one at step 1 if needed.
pub async fn get_session(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<WizardSessionView>>> {
    let session = WizardSessionRepo::ensure_active(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: session.into(),
    }))
}

// ---------------------------------------------------------------------------
// GET /wizard/step/{step}
// ---------------------------------------------------------------------------

/// Show one step: its stored answer, recorded errors, and catalog options.
pub async fn show_step(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_step): Path<String>,
) -> AppResult<Json<DataResponse<StepView>>> {
    let step = WizardStep::parse(&raw_step)?;
    let session = WizardSessionRepo::ensure_active(&state.pool, auth.user_id).await?;

    let options = step_options(state.catalog.as_ref(), &session.step_data, step).await?;
    let step_data = session.step_data.answer_json(step);
    let errors = session.errors_for(step).cloned().unwrap_or_default();

    Ok(Json(DataResponse {
        data: StepView {
            step: step.into(),
            session: session.into(),
            step_data,
            errors,
            options,
        },
    }))
}

// ---------------------------------------------------------------------------
// PATCH /wizard/step/{step}
// ---------------------------------------------------------------------------

/// Validate and store a step's answer.
///
/// A rejected payload answers 200 with the submitted data, the field
/// errors, and an error flash; the stored answer and current step are
/// left untouched. The session row stays locked from read to write, so
/// concurrent submissions for other steps are applied one after another.
pub async fn submit_step(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_step): Path<String>,
    AppJson(input): AppJson<SubmitStepRequest>,
) -> AppResult<Response> {
    let step = WizardStep::parse(&raw_step)?;
    let (tx, session) = lock_session(&state, auth.user_id).await?;
    let assigned_type = session
        .step_data
        .component_type_for(step)
        .map(str::to_string);

    match StepAnswer::parse(step, &input.wizard_step, assigned_type.as_deref()) {
        Ok(answer) => accept_step(&state, tx, session, step, answer).await,
        Err(field_errors) => {
            reject_step(&state, tx, session, step, input.wizard_step, field_errors).await
        }
    }
}

async fn accept_step(
    state: &AppState,
    mut tx: SessionTx,
    session: WizardSession,
    step: WizardStep,
    answer: StepAnswer,
) -> AppResult<Response> {
    let mut step_data = session.step_data.0.clone();
    let discarded = step_data.accept(step, answer, state.config.backward_edit_policy)?;

    let mut errors = session.validation_errors.0.clone();
    errors.remove(&step.data_key());
    for later in &discarded {
        errors.remove(&later.data_key());
    }

    let updated =
        WizardSessionRepo::save_step(&mut *tx, session.id, step.number(), &step_data, &errors)
            .await?
            .ok_or_else(|| session_gone(session.id))?;
    tx.commit().await?;

    tracing::info!(
        session_id = %updated.session_id,
        step = step.number(),
        discarded = discarded.len(),
        "Wizard step saved"
    );

    let redirect_to = match step.next() {
        Some(next) => step_path(next),
        None => SUMMARY_PATH.to_string(),
    };
    let accepted = StepAccepted {
        next_step: step.next().map(WizardStep::number),
        redirect_to,
        discarded_steps: discarded.iter().map(|s| s.number()).collect(),
        session: updated.into(),
    };
    Ok(Json(DataResponse { data: accepted }).into_response())
}

async fn reject_step(
    state: &AppState,
    mut tx: SessionTx,
    session: WizardSession,
    step: WizardStep,
    submitted: Value,
    field_errors: FieldErrors,
) -> AppResult<Response> {
    let mut errors = session.validation_errors.0.clone();
    errors.insert(step.data_key(), field_errors.clone());
    let updated = WizardSessionRepo::update_validation_errors(&mut *tx, session.id, &errors)
        .await?
        .ok_or_else(|| session_gone(session.id))?;
    tx.commit().await?;

    tracing::info!(
        session_id = %updated.session_id,
        step = step.number(),
        fields = ?field_errors.keys().collect::<Vec<_>>(),
        "Wizard step rejected"
    );

    let options = step_options(state.catalog.as_ref(), &updated.step_data, step).await?;
    let view = StepView {
        step: step.into(),
        session: updated.into(),
        step_data: submitted,
        errors: field_errors,
        options,
    };
    let body = FlashResponse {
        data: view,
        flash: Flash {
            error: Some(CORRECT_ERRORS_FLASH.to_string()),
            ..Default::default()
        },
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

// ---------------------------------------------------------------------------
// DELETE /wizard/step/{step}/data
// ---------------------------------------------------------------------------

/// Clear one step's stored answer and recorded errors.
pub async fn clear_step_data(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(raw_step): Path<String>,
) -> AppResult<Json<DataResponse<WizardSessionView>>> {
    let step = WizardStep::parse(&raw_step)?;
    let (mut tx, session) = lock_session(&state, auth.user_id).await?;

    let mut step_data = session.step_data.0.clone();
    let cleared = step_data.clear(step);
    let mut errors = session.validation_errors.0.clone();
    errors.remove(&step.data_key());

    let updated = WizardSessionRepo::save_step(
        &mut *tx,
        session.id,
        session.current_step,
        &step_data,
        &errors,
    )
    .await?
    .ok_or_else(|| session_gone(session.id))?;
    tx.commit().await?;

    tracing::info!(
        session_id = %updated.session_id,
        step = step.number(),
        cleared,
        "Wizard step data cleared"
    );

    Ok(Json(DataResponse {
        data: updated.into(),
    }))
}

// ---------------------------------------------------------------------------
// GET /wizard/summary
// ---------------------------------------------------------------------------

/// Summary of the answers so far, recomputed on every request.
pub async fn summary(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<WizardSummary>>> {
    let session = WizardSessionRepo::ensure_active(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: WizardSummary::build(&session.step_data),
    }))
}

// ---------------------------------------------------------------------------
// POST /wizard/complete
// ---------------------------------------------------------------------------

/// Turn the active session into a completed configuration.
pub async fn complete(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<(StatusCode, Json<FlashResponse<WizardCompleted>>)> {
    let session = WizardSessionRepo::find_active_for_user(&state.pool, auth.user_id)
        .await?
        .ok_or_else(no_active_session)?;
    let review = require_completable(session.status()?, &session.step_data)?;

    let configuration = NewConfiguration {
        name: name_or_default(Some(review.configuration_name.as_str()), Utc::now()),
        description: review.description.clone(),
        status: ConfigurationStatus::Completed,
        system_specifications: session.step_data.configuration_specifications(),
    };
    let selections: Vec<NewComponentSelection> =
        session.step_data.selections().map(to_new_selection).collect();

    let (created, completed) =
        WizardSessionRepo::complete(&state.pool, &session, &configuration, &selections)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Conflict(
                    "Wizard session changed or is no longer active".into(),
                ))
            })?;

    tracing::info!(
        session_id = %completed.session_id,
        configuration_id = created.id,
        selections = selections.len(),
        total_price = created.total_price,
        "Wizard completed"
    );

    let rows = ComponentSelectionRepo::list_for_configuration(&state.pool, created.id).await?;
    let views: Vec<ComponentSelectionView> = rows.into_iter().map(Into::into).collect();
    let success = format!("Configuration '{}' completed successfully!", created.name);
    let redirect_to = format!("/api/v1/configurations/{}", created.id);

    Ok((
        StatusCode::CREATED,
        Json(FlashResponse {
            data: WizardCompleted {
                configuration: ConfigurationDetail::new(created, views),
                session: completed.into(),
                redirect_to,
            },
            flash: Flash {
                success: Some(success),
                ..Default::default()
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// POST /wizard/abandon, POST /wizard/restart, DELETE /wizard/reset
// ---------------------------------------------------------------------------

/// Mark the active session abandoned. The next access starts a new one.
pub async fn abandon(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<WizardSessionView>>> {
    let session = WizardSessionRepo::find_active_for_user(&state.pool, auth.user_id)
        .await?
        .ok_or_else(no_active_session)?;
    let abandoned = WizardSessionRepo::abandon(&state.pool, session.id)
        .await?
        .ok_or_else(|| session_gone(session.id))?;

    tracing::info!(session_id = %abandoned.session_id, "Wizard session abandoned");
    Ok(Json(DataResponse {
        data: abandoned.into(),
    }))
}

/// Send the active session back to step 1 with no answers.
pub async fn restart(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<WizardSessionView>>> {
    let session = WizardSessionRepo::ensure_active(&state.pool, auth.user_id).await?;
    let restarted = WizardSessionRepo::restart(&state.pool, session.id)
        .await?
        .ok_or_else(|| session_gone(session.id))?;

    tracing::info!(session_id = %restarted.session_id, "Wizard session restarted");
    Ok(Json(DataResponse {
        data: restarted.into(),
    }))
}

/// Delete the active session. Configurations it produced are kept.
pub async fn reset(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<FlashResponse<WizardReset>>> {
    let reset = WizardSessionRepo::delete_active_for_user(&state.pool, auth.user_id).await?;
    tracing::info!(user_id = auth.user_id, reset, "Wizard reset");

    Ok(Json(FlashResponse {
        data: WizardReset {
            reset,
            redirect_to: "/",
        },
        flash: Flash {
            notice: Some(RESET_NOTICE.to_string()),
            ..Default::default()
        },
    }))
}
