//! Wizard session entity model.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use flexlink_core::error::CoreError;
use flexlink_core::types::{DbId, Timestamp};
use flexlink_core::wizard::{
    progress_percentage, FieldErrors, StepData, StepErrors, WizardStatus, WizardStep, MAX_STEP,
    MIN_STEP, TOTAL_STEPS,
};

/// A row from the `wizard_sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WizardSession {
    pub id: DbId,
    pub session_id: Uuid,
    pub user_id: DbId,
    pub configuration_id: Option<DbId>,
    pub current_step: i32,
    pub step_data: Json<StepData>,
    pub validation_errors: Json<StepErrors>,
    pub status: String,
    pub started_at: Timestamp,
    pub last_activity_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WizardSession {
    pub fn status(&self) -> Result<WizardStatus, CoreError> {
        WizardStatus::from_str_db(&self.status)
    }

    pub fn current_step(&self) -> Result<WizardStep, CoreError> {
        WizardStep::from_number(self.current_step)
    }

    pub fn progress_percentage(&self) -> i32 {
        progress_percentage(self.current_step)
    }

    pub fn next_step(&self) -> Option<i32> {
        (self.current_step < MAX_STEP).then_some(self.current_step + 1)
    }

    pub fn previous_step(&self) -> Option<i32> {
        (self.current_step > MIN_STEP).then_some(self.current_step - 1)
    }

    /// Errors recorded for one step, if any.
    pub fn errors_for(&self, step: WizardStep) -> Option<&FieldErrors> {
        self.validation_errors.get(&step.data_key())
    }

    /// The current step has an answer and no outstanding errors.
    pub fn can_proceed_to_next(&self) -> bool {
        match self.current_step() {
            Ok(step) => self.step_data.has_answer(step) && self.errors_for(step).is_none(),
            Err(_) => false,
        }
    }
}

/// Session plus derived navigation fields, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct WizardSessionView {
    #[serde(flatten)]
    pub session: WizardSession,
    pub total_steps: i32,
    pub progress_percentage: i32,
    pub next_step: Option<i32>,
    pub previous_step: Option<i32>,
    pub can_proceed_to_next: bool,
}

impl From<WizardSession> for WizardSessionView {
    fn from(session: WizardSession) -> Self {
        Self {
            total_steps: TOTAL_STEPS,
            progress_percentage: session.progress_percentage(),
            next_step: session.next_step(),
            previous_step: session.previous_step(),
            can_proceed_to_next: session.can_proceed_to_next(),
            session,
        }
    }
}
