//! Configuration entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use flexlink_core::configuration::{system_type_of, ConfigurationStatus};
use flexlink_core::error::CoreError;
use flexlink_core::export::ConfigurationExport;
use flexlink_core::types::{DbId, Timestamp};

use crate::models::component_selection::{ComponentSelection, ComponentSelectionView};

/// A row from the `configurations` table.
///
/// `total_price` is NUMERIC in the database and read back as `float8`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Configuration {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub total_price: f64,
    pub system_specifications: serde_json::Value,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Configuration {
    pub fn status(&self) -> Result<ConfigurationStatus, CoreError> {
        ConfigurationStatus::from_str_db(&self.status)
    }

    pub fn system_type(&self) -> Option<&str> {
        system_type_of(&self.system_specifications)
    }

    pub fn is_active(&self) -> bool {
        self.status().map(|s| s.is_active()).unwrap_or(false)
    }

    /// Export document for this configuration and its selections.
    pub fn to_export(&self, selections: &[ComponentSelection]) -> ConfigurationExport {
        ConfigurationExport {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            system_type: self.system_type().map(str::to_string),
            status: self.status.clone(),
            total_price: self.total_price,
            created_at: self.created_at,
            updated_at: self.updated_at,
            components: selections.iter().map(ComponentSelection::to_export).collect(),
            specifications: self.system_specifications.clone(),
        }
    }
}

/// DTO for creating a configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateConfiguration {
    #[validate(length(min = 3, max = 200, message = "must be between 3 and 200 characters"))]
    pub name: String,
    pub description: Option<String>,
    /// Defaults to `draft`.
    pub status: Option<String>,
    pub system_type: Option<String>,
    pub system_specifications: Option<serde_json::Value>,
}

/// DTO for updating a configuration. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateConfiguration {
    #[validate(length(min = 3, max = 200, message = "must be between 3 and 200 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub system_type: Option<String>,
    pub system_specifications: Option<serde_json::Value>,
}

/// DTO for `PATCH /configurations/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateConfigurationStatus {
    pub status: String,
}

/// DTO for `POST /configurations/from-template`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFromTemplate {
    pub template_id: DbId,
}

/// Resolved insert payload, produced from a create DTO or a finished wizard.
#[derive(Debug, Clone)]
pub struct NewConfiguration {
    pub name: String,
    pub description: Option<String>,
    pub status: ConfigurationStatus,
    pub system_specifications: serde_json::Value,
}

/// Resolved partial update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ConfigurationStatus>,
    pub system_type: Option<String>,
    pub system_specifications: Option<serde_json::Value>,
}

/// A configuration together with its selections and derived counts.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationDetail {
    #[serde(flatten)]
    pub configuration: Configuration,
    pub system_type: Option<String>,
    /// Number of selection rows.
    pub component_count: i64,
    /// Sum of selection quantities.
    pub total_components: i64,
    pub can_complete: bool,
    pub selections: Vec<ComponentSelectionView>,
}

impl ConfigurationDetail {
    pub fn new(configuration: Configuration, selections: Vec<ComponentSelectionView>) -> Self {
        let component_count = selections.len() as i64;
        let total_components = selections
            .iter()
            .map(|s| i64::from(s.selection.quantity))
            .sum();
        let completed = matches!(configuration.status(), Ok(ConfigurationStatus::Completed));
        Self {
            system_type: configuration.system_type().map(str::to_string),
            can_complete: component_count > 0 && !completed,
            component_count,
            total_components,
            configuration,
            selections,
        }
    }
}
