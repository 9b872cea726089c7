//! Repository for the `configurations` table.
//!
//! Every write that can change a configuration's selections recomputes
//! `total_price` inside the same transaction, after locking the
//! configuration row.

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use flexlink_core::configuration::{
    completion_timestamp, with_system_type, ConfigurationStatus,
};
use flexlink_core::pricing::{configuration_total, ConfigurationStats, PricedQuantity};
use flexlink_core::types::DbId;

use crate::models::configuration::{Configuration, ConfigurationChanges, NewConfiguration};
use crate::models::dashboard::DashboardSummary;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, name, description, status, \
    total_price::float8 AS total_price, system_specifications, completed_at, \
    created_at, updated_at";

/// Provides CRUD, cloning, and aggregation for configurations.
pub struct ConfigurationRepo;

impl ConfigurationRepo {
    // ── Standard CRUD ────────────────────────────────────────────────

    /// Insert a configuration on an existing connection or transaction.
    ///
    /// `completed_at` is stamped when the initial status is `completed`.
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: DbId,
        input: &NewConfiguration,
    ) -> Result<Configuration, sqlx::Error> {
        let completed_at = completion_timestamp(
            ConfigurationStatus::Draft,
            input.status,
            None,
            Utc::now(),
        );
        let query = format!(
            "INSERT INTO configurations
                (user_id, name, description, status, system_specifications, completed_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Configuration>(&query)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.status.as_str())
            .bind(&input.system_specifications)
            .bind(completed_at)
            .fetch_one(&mut *conn)
            .await
    }

    /// Insert a new configuration with no selections.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &NewConfiguration,
    ) -> Result<Configuration, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::insert(&mut *conn, user_id, input).await
    }

    /// Find a configuration owned by `user_id`.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Configuration>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM configurations WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Configuration>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Re-read a configuration inside a transaction.
    pub async fn fetch(conn: &mut PgConnection, id: DbId) -> Result<Configuration, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM configurations WHERE id = $1");
        sqlx::query_as::<_, Configuration>(&query)
            .bind(id)
            .fetch_one(&mut *conn)
            .await
    }

    /// Lock a configuration row owned by `user_id` for the rest of the
    /// transaction.
    pub async fn lock_for_user(
        conn: &mut PgConnection,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Configuration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM configurations WHERE id = $1 AND user_id = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, Configuration>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await
    }

    /// List a user's configurations, most recently updated first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Configuration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM configurations \
             WHERE user_id = $1 \
             ORDER BY updated_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Configuration>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count a user's configurations.
    pub async fn count_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM configurations WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// A user's completed configurations, most recently completed first.
    pub async fn list_templates(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<Configuration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM configurations \
             WHERE user_id = $1 AND status = 'completed' \
             ORDER BY completed_at DESC NULLS LAST, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Configuration>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update, keeping `completed_at` consistent with the
    /// status and recomputing the total.
    ///
    /// Returns `None` if the configuration does not exist for this user.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        changes: &ConfigurationChanges,
    ) -> Result<Option<Configuration>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(current) = Self::lock_for_user(&mut *tx, id, user_id).await? else {
            return Ok(None);
        };

        let previous = current.status().unwrap_or(ConfigurationStatus::Draft);
        let next = changes.status.unwrap_or(previous);
        let completed_at = completion_timestamp(previous, next, current.completed_at, Utc::now());

        let mut specifications = changes
            .system_specifications
            .clone()
            .unwrap_or_else(|| current.system_specifications.clone());
        if let Some(system_type) = changes.system_type.as_deref() {
            specifications = with_system_type(specifications, system_type);
        }

        sqlx::query(
            "UPDATE configurations SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                status = $4,
                system_specifications = $5,
                completed_at = $6
             WHERE id = $1",
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(next.as_str())
        .bind(&specifications)
        .bind(completed_at)
        .execute(&mut *tx)
        .await?;

        Self::refresh_total_price(&mut *tx, id).await?;
        let updated = Self::fetch(&mut *tx, id).await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Change only the status. Returns `None` if not found for this user.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        status: ConfigurationStatus,
    ) -> Result<Option<Configuration>, sqlx::Error> {
        let changes = ConfigurationChanges {
            status: Some(status),
            ..Default::default()
        };
        Self::update(pool, id, user_id, &changes).await
    }

    /// Delete a configuration and (by cascade) its selections.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM configurations WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Cloning ──────────────────────────────────────────────────────

    /// Deep-copy a configuration and its selections into a new draft.
    ///
    /// `name_for` derives the new name from the source name. Returns `None`
    /// if the source does not exist for this user.
    pub async fn clone_for_user<F>(
        pool: &PgPool,
        source_id: DbId,
        user_id: DbId,
        name_for: F,
    ) -> Result<Option<Configuration>, sqlx::Error>
    where
        F: FnOnce(&str) -> String,
    {
        let mut tx = pool.begin().await?;

        let Some(source) = Self::lock_for_user(&mut *tx, source_id, user_id).await? else {
            return Ok(None);
        };

        let copy = NewConfiguration {
            name: name_for(&source.name),
            description: source.description.clone(),
            status: ConfigurationStatus::Draft,
            system_specifications: source.system_specifications.clone(),
        };
        let created = Self::insert(&mut *tx, user_id, &copy).await?;

        sqlx::query(
            "INSERT INTO component_selections
                (configuration_id, component_type, component_id, component_name, system_code,
                 specifications, options, price, currency, quantity, notes, status, selected_at)
             SELECT $2, component_type, component_id, component_name, system_code,
                    specifications, options, price, currency, quantity, notes, status, selected_at
             FROM component_selections
             WHERE configuration_id = $1
             ORDER BY id",
        )
        .bind(source_id)
        .bind(created.id)
        .execute(&mut *tx)
        .await?;

        Self::refresh_total_price(&mut *tx, created.id).await?;
        let created = Self::fetch(&mut *tx, created.id).await?;

        tx.commit().await?;
        Ok(Some(created))
    }

    // ── Pricing and aggregation ──────────────────────────────────────

    /// Recompute `total_price` from the configuration's selections.
    ///
    /// Must run inside the transaction that changed the selections.
    pub async fn refresh_total_price(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<f64, sqlx::Error> {
        let rows: Vec<(Option<f64>, i32)> = sqlx::query_as(
            "SELECT price::float8, quantity FROM component_selections WHERE configuration_id = $1",
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        let lines: Vec<PricedQuantity> = rows
            .into_iter()
            .map(|(price, quantity)| PricedQuantity { price, quantity })
            .collect();
        let total = configuration_total(&lines);

        sqlx::query("UPDATE configurations SET total_price = $2 WHERE id = $1")
            .bind(id)
            .bind(total)
            .execute(&mut *conn)
            .await?;
        Ok(total)
    }

    /// Statistics across every configuration and selection a user owns.
    pub async fn stats_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<ConfigurationStats, sqlx::Error> {
        let statuses: Vec<(String,)> =
            sqlx::query_as("SELECT status FROM configurations WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(pool)
                .await?;
        let statuses: Vec<ConfigurationStatus> = statuses
            .iter()
            .filter_map(|(s,)| ConfigurationStatus::from_str_db(s).ok())
            .collect();

        let rows: Vec<(Option<f64>, i32)> = sqlx::query_as(
            "SELECT cs.price::float8, cs.quantity
             FROM component_selections cs
             JOIN configurations c ON c.id = cs.configuration_id
             WHERE c.user_id = $1",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        let lines: Vec<PricedQuantity> = rows
            .into_iter()
            .map(|(price, quantity)| PricedQuantity { price, quantity })
            .collect();

        Ok(ConfigurationStats::tally(&statuses, &lines))
    }

    /// Stats plus the most recently updated configurations.
    pub async fn dashboard(
        pool: &PgPool,
        user_id: DbId,
        recent_limit: i64,
    ) -> Result<DashboardSummary, sqlx::Error> {
        let stats = Self::stats_for_user(pool, user_id).await?;
        let recent_configurations = Self::list_for_user(pool, user_id, recent_limit, 0).await?;
        Ok(DashboardSummary {
            stats,
            recent_configurations,
        })
    }
}
