//! Component selection status and field rules.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::pricing::{fits_amount, line_total, MAX_AMOUNT};

/// Currency label applied when none is supplied.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Component type stored for a selection that names none.
pub const UNTYPED_COMPONENT: &str = "unspecified";

/// Maximum length of an external system code.
pub const SYSTEM_CODE_MAX_LEN: usize = 10;

/// Maximum length of a component type name.
pub const COMPONENT_TYPE_MAX_LEN: usize = 100;

/// Maximum length of a currency label (ISO 4217 codes are 3 letters).
pub const CURRENCY_MAX_LEN: usize = 3;

/// Status values for a component selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStatus {
    Selected,
    Pending,
    Rejected,
}

impl SelectionStatus {
    /// Parse a status string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "selected" => Ok(Self::Selected),
            "pending" => Ok(Self::Pending),
            "rejected" => Ok(Self::Rejected),
            _ => Err(CoreError::Validation(format!(
                "Invalid selection status '{s}'. Must be one of: selected, pending, rejected"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Selected => "selected",
            Self::Pending => "pending",
            Self::Rejected => "rejected",
        }
    }

    /// Selected and pending selections are still in play.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Field values shared by every path that creates or edits a selection.
#[derive(Debug, Clone, Copy)]
pub struct SelectionFields<'a> {
    pub component_type: &'a str,
    pub component_id: &'a str,
    pub system_code: Option<&'a str>,
    pub price: Option<f64>,
    pub currency: Option<&'a str>,
    pub quantity: i32,
}

/// Every rule `fields` breaks, as `(field, message)` pairs.
pub fn field_problems(fields: &SelectionFields<'_>) -> Vec<(&'static str, String)> {
    let mut problems = Vec::new();

    if fields.component_type.trim().is_empty() {
        problems.push(("component_type", "can't be blank".to_string()));
    } else if fields.component_type.chars().count() > COMPONENT_TYPE_MAX_LEN {
        problems.push((
            "component_type",
            format!("is too long (maximum is {COMPONENT_TYPE_MAX_LEN} characters)"),
        ));
    }
    if fields.component_id.trim().is_empty() {
        problems.push(("component_id", "can't be blank".to_string()));
    }
    if let Some(code) = fields.system_code {
        if code.chars().count() > SYSTEM_CODE_MAX_LEN {
            problems.push((
                "system_code",
                format!("is too long (maximum is {SYSTEM_CODE_MAX_LEN} characters)"),
            ));
        }
    }
    if let Some(price) = fields.price {
        if !price.is_finite() || price < 0.0 {
            problems.push(("price", "must be greater than or equal to 0".to_string()));
        } else if !fits_amount(price) {
            problems.push((
                "price",
                format!("must be less than or equal to {MAX_AMOUNT:.2}"),
            ));
        } else if fields.quantity > 0 && !fits_amount(line_total(Some(price), fields.quantity)) {
            problems.push((
                "price",
                format!("multiplied by quantity must be less than or equal to {MAX_AMOUNT:.2}"),
            ));
        }
    }
    if let Some(currency) = fields.currency {
        if currency.chars().count() > CURRENCY_MAX_LEN {
            problems.push((
                "currency",
                format!("is too long (maximum is {CURRENCY_MAX_LEN} characters)"),
            ));
        }
    }
    if fields.quantity <= 0 {
        problems.push(("quantity", "must be greater than 0".to_string()));
    }

    problems
}

/// Validate selection fields, collecting every problem into one message.
pub fn validate_fields(fields: &SelectionFields<'_>) -> Result<(), CoreError> {
    let problems = field_problems(fields);
    if problems.is_empty() {
        return Ok(());
    }
    let message = problems
        .iter()
        .map(|(field, message)| format!("{field} {message}"))
        .collect::<Vec<_>>()
        .join("; ");
    Err(CoreError::Validation(message))
}

/// Render a JSON object as `"k: v, k2: v2"`, or `empty_label` when empty.
pub fn summarize_map(value: &serde_json::Value, empty_label: &str) -> String {
    match value.as_object() {
        Some(map) if !map.is_empty() => map
            .iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => format!("{k}: {s}"),
                other => format!("{k}: {other}"),
            })
            .collect::<Vec<_>>()
            .join(", "),
        _ => empty_label.to_string(),
    }
}

/// The component name when present, otherwise its external id.
pub fn display_name<'a>(component_name: Option<&'a str>, component_id: &'a str) -> &'a str {
    component_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(component_id)
}
