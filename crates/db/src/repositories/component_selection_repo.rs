//! Repository for the `component_selections` table.
//!
//! Mutations lock the parent configuration and recompute its total in the
//! same transaction. Callers must check configuration ownership first.

use sqlx::{PgConnection, PgPool};
use flexlink_core::selection::SelectionStatus;
use flexlink_core::types::DbId;

use crate::models::component_selection::{
    ComponentSelection, NewComponentSelection, UpdateComponentSelection,
};
use crate::repositories::ConfigurationRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, configuration_id, component_type, component_id, component_name, \
    system_code, specifications, options, price::float8 AS price, currency, quantity, notes, \
    status, selected_at, created_at, updated_at";

/// Provides CRUD and status transitions for component selections.
pub struct ComponentSelectionRepo;

impl ComponentSelectionRepo {
    /// Insert a selection on an existing transaction. Does not touch the
    /// parent total.
    pub async fn insert(
        conn: &mut PgConnection,
        configuration_id: DbId,
        input: &NewComponentSelection,
    ) -> Result<ComponentSelection, sqlx::Error> {
        let query = format!(
            "INSERT INTO component_selections
                (configuration_id, component_type, component_id, component_name, system_code,
                 specifications, options, price, currency, quantity, notes, status, selected_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                     CASE WHEN $12 = 'selected' THEN NOW() END)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ComponentSelection>(&query)
            .bind(configuration_id)
            .bind(&input.component_type)
            .bind(&input.component_id)
            .bind(&input.component_name)
            .bind(&input.system_code)
            .bind(&input.specifications)
            .bind(&input.options)
            .bind(input.price)
            .bind(&input.currency)
            .bind(input.quantity)
            .bind(&input.notes)
            .bind(input.status.as_str())
            .fetch_one(&mut *conn)
            .await
    }

    /// Add a selection to a configuration and recompute its total.
    ///
    /// Returns `None` if the configuration does not exist for this user.
    pub async fn create(
        pool: &PgPool,
        configuration_id: DbId,
        user_id: DbId,
        input: &NewComponentSelection,
    ) -> Result<Option<ComponentSelection>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        if ConfigurationRepo::lock_for_user(&mut *tx, configuration_id, user_id)
            .await?
            .is_none()
        {
            return Ok(None);
        }

        let created = Self::insert(&mut *tx, configuration_id, input).await?;
        ConfigurationRepo::refresh_total_price(&mut *tx, configuration_id).await?;

        tx.commit().await?;
        Ok(Some(created))
    }

    /// Selections of a configuration, grouped by component type.
    pub async fn list_for_configuration(
        pool: &PgPool,
        configuration_id: DbId,
    ) -> Result<Vec<ComponentSelection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM component_selections \
             WHERE configuration_id = $1 \
             ORDER BY component_type, created_at, id"
        );
        sqlx::query_as::<_, ComponentSelection>(&query)
            .bind(configuration_id)
            .fetch_all(pool)
            .await
    }

    /// Update a selection. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if the configuration or selection does not exist.
    pub async fn update(
        pool: &PgPool,
        configuration_id: DbId,
        user_id: DbId,
        id: DbId,
        input: &UpdateComponentSelection,
    ) -> Result<Option<ComponentSelection>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        if ConfigurationRepo::lock_for_user(&mut *tx, configuration_id, user_id)
            .await?
            .is_none()
        {
            return Ok(None);
        }

        let query = format!(
            "UPDATE component_selections SET
                component_type = COALESCE($3, component_type),
                component_id = COALESCE($4, component_id),
                component_name = COALESCE($5, component_name),
                system_code = COALESCE($6, system_code),
                specifications = COALESCE($7, specifications),
                options = COALESCE($8, options),
                price = COALESCE($9, price),
                currency = COALESCE($10, currency),
                quantity = COALESCE($11, quantity),
                notes = COALESCE($12, notes)
             WHERE id = $1 AND configuration_id = $2
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, ComponentSelection>(&query)
            .bind(id)
            .bind(configuration_id)
            .bind(&input.component_type)
            .bind(&input.component_id)
            .bind(&input.component_name)
            .bind(&input.system_code)
            .bind(&input.specifications)
            .bind(&input.options)
            .bind(input.price)
            .bind(&input.currency)
            .bind(input.quantity)
            .bind(&input.notes)
            .fetch_optional(&mut *tx)
            .await?;

        if updated.is_some() {
            ConfigurationRepo::refresh_total_price(&mut *tx, configuration_id).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Remove a selection and recompute the parent total.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(
        pool: &PgPool,
        configuration_id: DbId,
        user_id: DbId,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;
        if ConfigurationRepo::lock_for_user(&mut *tx, configuration_id, user_id)
            .await?
            .is_none()
        {
            return Ok(false);
        }

        let result =
            sqlx::query("DELETE FROM component_selections WHERE id = $1 AND configuration_id = $2")
                .bind(id)
                .bind(configuration_id)
                .execute(&mut *tx)
                .await?;
        let removed = result.rows_affected() > 0;
        if removed {
            ConfigurationRepo::refresh_total_price(&mut *tx, configuration_id).await?;
        }

        tx.commit().await?;
        Ok(removed)
    }

    /// Move a selection to `status`. Selecting stamps `selected_at`.
    ///
    /// Returns `None` if the configuration or selection does not exist.
    pub async fn transition(
        pool: &PgPool,
        configuration_id: DbId,
        user_id: DbId,
        id: DbId,
        status: SelectionStatus,
    ) -> Result<Option<ComponentSelection>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        if ConfigurationRepo::lock_for_user(&mut *tx, configuration_id, user_id)
            .await?
            .is_none()
        {
            return Ok(None);
        }

        let query = format!(
            "UPDATE component_selections SET
                status = $3,
                selected_at = CASE WHEN $3 = 'selected' THEN NOW() ELSE selected_at END
             WHERE id = $1 AND configuration_id = $2
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, ComponentSelection>(&query)
            .bind(id)
            .bind(configuration_id)
            .bind(status.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        if updated.is_some() {
            ConfigurationRepo::refresh_total_price(&mut *tx, configuration_id).await?;
        }

        tx.commit().await?;
        Ok(updated)
    }
}
