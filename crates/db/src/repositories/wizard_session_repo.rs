//! Repository for the `wizard_sessions` table.
//!
//! A user has at most one `active` session, enforced by the partial unique
//! index `uq_wizard_sessions_active_user`.

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use flexlink_core::types::DbId;
use flexlink_core::wizard::{StepData, StepErrors, MAX_STEP};

use crate::models::component_selection::NewComponentSelection;
use crate::models::configuration::{Configuration, NewConfiguration};
use crate::models::wizard_session::WizardSession;
use crate::repositories::{ComponentSelectionRepo, ConfigurationRepo};

/// Column list for `wizard_sessions` queries.
const COLUMNS: &str = "id, session_id, user_id, configuration_id, current_step, step_data, \
     validation_errors, status, started_at, last_activity_at, completed_at, created_at, updated_at";

/// Provides lifecycle operations for wizard sessions.
pub struct WizardSessionRepo;

impl WizardSessionRepo {
    /// Find the user's active session, if any.
    pub async fn find_active_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<WizardSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM wizard_sessions WHERE user_id = $1 AND status = 'active'"
        );
        sqlx::query_as::<_, WizardSession>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Load an active session and lock its row until the transaction ends.
    ///
    /// Step edits read, modify, and write back the whole `step_data`
    /// document, so they must hold this lock for the duration.
    pub async fn lock_active(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<WizardSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM wizard_sessions WHERE id = $1 AND status = 'active' FOR UPDATE"
        );
        sqlx::query_as::<_, WizardSession>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Return the user's active session, creating one at step 1 if needed.
    ///
    /// Concurrent callers converge on the same row: the insert is a no-op
    /// when an active session already exists, and the lookup that follows
    /// returns the winner.
    pub async fn ensure_active(pool: &PgPool, user_id: DbId) -> Result<WizardSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO wizard_sessions (session_id, user_id) \
             VALUES ($1, $2) \
             ON CONFLICT (user_id) WHERE status = 'active' DO NOTHING \
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, WizardSession>(&query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        if let Some(session) = created {
            tracing::debug!(user_id, session_id = %session.session_id, "Wizard session created");
            return Ok(session);
        }

        Self::find_active_for_user(pool, user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Persist an accepted step: new step data, current step, and the
    /// remaining validation errors. Touches `last_activity_at`.
    ///
    /// Returns `None` if the session is no longer active.
    pub async fn save_step(
        conn: &mut PgConnection,
        id: DbId,
        current_step: i32,
        step_data: &StepData,
        validation_errors: &StepErrors,
    ) -> Result<Option<WizardSession>, sqlx::Error> {
        let query = format!(
            "UPDATE wizard_sessions SET
                current_step = $2,
                step_data = $3,
                validation_errors = $4,
                last_activity_at = NOW()
             WHERE id = $1 AND status = 'active'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WizardSession>(&query)
            .bind(id)
            .bind(current_step)
            .bind(Json(step_data))
            .bind(Json(validation_errors))
            .fetch_optional(&mut *conn)
            .await
    }

    /// Record validation errors for a rejected submission. Step data and
    /// the current step are left untouched.
    pub async fn update_validation_errors(
        conn: &mut PgConnection,
        id: DbId,
        validation_errors: &StepErrors,
    ) -> Result<Option<WizardSession>, sqlx::Error> {
        let query = format!(
            "UPDATE wizard_sessions SET validation_errors = $2, last_activity_at = NOW() \
             WHERE id = $1 AND status = 'active' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WizardSession>(&query)
            .bind(id)
            .bind(Json(validation_errors))
            .fetch_optional(&mut *conn)
            .await
    }

    /// Mark an active session abandoned.
    pub async fn abandon(pool: &PgPool, id: DbId) -> Result<Option<WizardSession>, sqlx::Error> {
        let query = format!(
            "UPDATE wizard_sessions SET status = 'abandoned', last_activity_at = NOW() \
             WHERE id = $1 AND status = 'active' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WizardSession>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Reset an active session to step 1 with no answers or errors.
    ///
    /// Returns `None` if the session is no longer active.
    pub async fn restart(pool: &PgPool, id: DbId) -> Result<Option<WizardSession>, sqlx::Error> {
        let query = format!(
            "UPDATE wizard_sessions SET
                current_step = 1,
                step_data = '{{}}'::jsonb,
                validation_errors = '{{}}'::jsonb,
                last_activity_at = NOW()
             WHERE id = $1 AND status = 'active'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WizardSession>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delete the user's active session. Returns `true` if a row was removed.
    pub async fn delete_active_for_user(pool: &PgPool, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM wizard_sessions WHERE user_id = $1 AND status = 'active'")
                .bind(user_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a session completed and link it to its configuration.
    async fn mark_completed(
        conn: &mut PgConnection,
        id: DbId,
        configuration_id: DbId,
    ) -> Result<Option<WizardSession>, sqlx::Error> {
        let query = format!(
            "UPDATE wizard_sessions SET
                status = 'completed',
                configuration_id = $2,
                current_step = $3,
                completed_at = NOW(),
                last_activity_at = NOW()
             WHERE id = $1 AND status = 'active'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WizardSession>(&query)
            .bind(id)
            .bind(configuration_id)
            .bind(MAX_STEP)
            .fetch_optional(&mut *conn)
            .await
    }

    /// Turn a finished session into a persisted configuration.
    ///
    /// Creates the configuration and its selections, recomputes the total,
    /// and marks the session completed, all in one transaction. Returns
    /// `None` (and writes nothing) if the session is no longer active or
    /// its step data changed after `session` was read.
    pub async fn complete(
        pool: &PgPool,
        session: &WizardSession,
        configuration: &NewConfiguration,
        selections: &[NewComponentSelection],
    ) -> Result<Option<(Configuration, WizardSession)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        match Self::lock_active(&mut *tx, session.id).await? {
            Some(locked) if locked.step_data.0 == session.step_data.0 => {}
            _ => {
                tx.rollback().await?;
                return Ok(None);
            }
        }

        let created = ConfigurationRepo::insert(&mut *tx, session.user_id, configuration).await?;
        for selection in selections {
            ComponentSelectionRepo::insert(&mut *tx, created.id, selection).await?;
        }
        ConfigurationRepo::refresh_total_price(&mut *tx, created.id).await?;

        let Some(completed) = Self::mark_completed(&mut *tx, session.id, created.id).await? else {
            tx.rollback().await?;
            return Ok(None);
        };
        let created = ConfigurationRepo::fetch(&mut *tx, created.id).await?;

        tx.commit().await?;
        Ok(Some((created, completed)))
    }
}
