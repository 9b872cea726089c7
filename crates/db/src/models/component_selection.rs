//! Component selection entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;
use flexlink_core::error::CoreError;
use flexlink_core::export::ComponentExport;
use flexlink_core::pricing::{format_with_currency, LineItem};
use flexlink_core::selection::{display_name, summarize_map, SelectionStatus};
use flexlink_core::types::{DbId, Timestamp};

/// A row from the `component_selections` table.
///
/// `price` is NUMERIC in the database and read back as `float8`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ComponentSelection {
    pub id: DbId,
    pub configuration_id: DbId,
    pub component_type: String,
    pub component_id: String,
    pub component_name: Option<String>,
    pub system_code: Option<String>,
    pub specifications: serde_json::Value,
    pub options: serde_json::Value,
    pub price: Option<f64>,
    pub currency: String,
    pub quantity: i32,
    pub notes: Option<String>,
    pub status: String,
    pub selected_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LineItem for ComponentSelection {
    fn unit_price(&self) -> Option<f64> {
        self.price
    }

    fn quantity(&self) -> i32 {
        self.quantity
    }
}

impl ComponentSelection {
    pub fn status(&self) -> Result<SelectionStatus, CoreError> {
        SelectionStatus::from_str_db(&self.status)
    }

    pub fn price_with_currency(&self) -> String {
        format_with_currency(self.price, &self.currency)
    }

    pub fn total_price_with_currency(&self) -> String {
        format_with_currency(self.price.map(|_| self.line_total()), &self.currency)
    }

    pub fn display_name(&self) -> &str {
        display_name(self.component_name.as_deref(), &self.component_id)
    }

    pub fn specifications_summary(&self) -> String {
        summarize_map(&self.specifications, "No specifications")
    }

    pub fn options_summary(&self) -> String {
        summarize_map(&self.options, "No options")
    }

    pub fn to_export(&self) -> ComponentExport {
        ComponentExport {
            component_type: self.component_type.clone(),
            component_id: self.component_id.clone(),
            component_name: self.component_name.clone(),
            specifications: self.specifications.clone(),
            options: self.options.clone(),
            price: self.price,
            currency: self.currency.clone(),
            quantity: self.quantity,
            total_price: self.line_total(),
            notes: self.notes.clone(),
            status: self.status.clone(),
            selected_at: self.selected_at,
        }
    }
}

/// A selection with its derived display fields, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentSelectionView {
    #[serde(flatten)]
    pub selection: ComponentSelection,
    pub line_total: f64,
    pub display_name: String,
    pub price_with_currency: String,
    pub total_price_with_currency: String,
    pub specifications_summary: String,
    pub options_summary: String,
}

impl From<ComponentSelection> for ComponentSelectionView {
    fn from(selection: ComponentSelection) -> Self {
        Self {
            line_total: selection.line_total(),
            display_name: selection.display_name().to_string(),
            price_with_currency: selection.price_with_currency(),
            total_price_with_currency: selection.total_price_with_currency(),
            specifications_summary: selection.specifications_summary(),
            options_summary: selection.options_summary(),
            selection,
        }
    }
}

/// DTO for adding a selection to a configuration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateComponentSelection {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub component_type: String,
    #[validate(length(min = 1, message = "can't be blank"))]
    pub component_id: String,
    pub component_name: Option<String>,
    #[validate(length(max = 10, message = "is too long (maximum is 10 characters)"))]
    pub system_code: Option<String>,
    pub specifications: Option<serde_json::Value>,
    pub options: Option<serde_json::Value>,
    #[validate(range(
        min = 0.0,
        max = 9_999_999_999.99,
        message = "must be between 0 and 9999999999.99"
    ))]
    pub price: Option<f64>,
    #[validate(length(max = 3, message = "is too long (maximum is 3 characters)"))]
    pub currency: Option<String>,
    #[validate(range(min = 1, message = "must be greater than 0"))]
    pub quantity: Option<i32>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

/// DTO for updating a selection. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateComponentSelection {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub component_type: Option<String>,
    #[validate(length(min = 1, message = "can't be blank"))]
    pub component_id: Option<String>,
    pub component_name: Option<String>,
    #[validate(length(max = 10, message = "is too long (maximum is 10 characters)"))]
    pub system_code: Option<String>,
    pub specifications: Option<serde_json::Value>,
    pub options: Option<serde_json::Value>,
    #[validate(range(
        min = 0.0,
        max = 9_999_999_999.99,
        message = "must be between 0 and 9999999999.99"
    ))]
    pub price: Option<f64>,
    #[validate(length(max = 3, message = "is too long (maximum is 3 characters)"))]
    pub currency: Option<String>,
    #[validate(range(min = 1, message = "must be greater than 0"))]
    pub quantity: Option<i32>,
    pub notes: Option<String>,
}

/// Resolved insert payload for a selection.
#[derive(Debug, Clone)]
pub struct NewComponentSelection {
    pub component_type: String,
    pub component_id: String,
    pub component_name: Option<String>,
    pub system_code: Option<String>,
    pub specifications: serde_json::Value,
    pub options: serde_json::Value,
    pub price: Option<f64>,
    pub currency: String,
    pub quantity: i32,
    pub notes: Option<String>,
    pub status: SelectionStatus,
}
