//! Configuration export documents (JSON and CSV).

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Supported `?format=` values for configuration export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Parse the requested format. Missing means JSON.
    ///
    /// PDF is recognised but not produced.
    pub fn parse(format: Option<&str>) -> Result<Self, CoreError> {
        match format.map(|f| f.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            Some(other) => Err(CoreError::Validation(format!(
                "Unsupported export format '{other}'"
            ))),
        }
    }
}

/// One component selection in an export document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentExport {
    pub component_type: String,
    pub component_id: String,
    pub component_name: Option<String>,
    pub specifications: serde_json::Value,
    pub options: serde_json::Value,
    pub price: Option<f64>,
    pub currency: String,
    pub quantity: i32,
    /// Line total (`price * quantity`).
    pub total_price: f64,
    pub notes: Option<String>,
    pub status: String,
    pub selected_at: Option<Timestamp>,
}

/// A configuration with its selections, as exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationExport {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub system_type: Option<String>,
    pub status: String,
    pub total_price: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub components: Vec<ComponentExport>,
    pub specifications: serde_json::Value,
}

impl ConfigurationExport {
    /// Render the document as CSV: a header block, a blank line, then one
    /// row per component.
    pub fn to_csv(&self) -> String {
        let mut lines = vec![
            csv_row(&["Configuration", &self.name]),
            csv_row(&["System Type", self.system_type.as_deref().unwrap_or("")]),
            csv_row(&["Status", &self.status]),
            csv_row(&["Total Price", &format!("{:.2}", self.total_price)]),
            String::new(),
            csv_row(&["Component", "Type", "Quantity", "Price", "Notes"]),
        ];

        for component in &self.components {
            let price = component
                .price
                .map(|p| format!("{p:.2}"))
                .unwrap_or_default();
            lines.push(csv_row(&[
                component.component_name.as_deref().unwrap_or(""),
                &component.component_type,
                &component.quantity.to_string(),
                &price,
                component.notes.as_deref().unwrap_or(""),
            ]));
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or line break.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| csv_escape(f))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use serde_json::json;

    fn document() -> ConfigurationExport {
        let now = Utc::now();
        ConfigurationExport {
            id: 1,
            name: "Line, North".to_string(),
            description: None,
            system_type: Some("belt_conveyor".to_string()),
            status: "completed".to_string(),
            total_price: 250.0,
            created_at: now,
            updated_at: now,
            components: vec![
                ComponentExport {
                    component_type: "motor".to_string(),
                    component_id: "a".to_string(),
                    component_name: Some("Drive \"X\"".to_string()),
                    specifications: json!({}),
                    options: json!({}),
                    price: Some(100.0),
                    currency: "USD".to_string(),
                    quantity: 2,
                    total_price: 200.0,
                    notes: None,
                    status: "selected".to_string(),
                    selected_at: None,
                },
                ComponentExport {
                    component_type: "belt".to_string(),
                    component_id: "b".to_string(),
                    component_name: None,
                    specifications: json!({}),
                    options: json!({}),
                    price: None,
                    currency: "USD".to_string(),
                    quantity: 1,
                    total_price: 0.0,
                    notes: Some("spare".to_string()),
                    status: "pending".to_string(),
                    selected_at: None,
                },
            ],
            specifications: json!({ "system_type": "belt_conveyor" }),
        }
    }

    #[test]
    fn format_defaults_to_json() {
        assert_eq!(ExportFormat::parse(None).unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::parse(Some("CSV")).unwrap(), ExportFormat::Csv);
    }

    #[test]
    fn pdf_is_not_supported() {
        assert_matches!(
            ExportFormat::parse(Some("pdf")),
            Err(CoreError::Validation(ref m)) if m == "Unsupported export format 'pdf'"
        );
        assert!(ExportFormat::parse(Some("xml")).is_err());
    }

    #[test]
    fn csv_layout() {
        let csv = document().to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Configuration,\"Line, North\"");
        assert_eq!(lines[1], "System Type,belt_conveyor");
        assert_eq!(lines[2], "Status,completed");
        assert_eq!(lines[3], "Total Price,250.00");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "Component,Type,Quantity,Price,Notes");
        assert_eq!(lines[6], "\"Drive \"\"X\"\"\",motor,2,100.00,");
        assert_eq!(lines[7], ",belt,1,,spare");
    }

    #[test]
    fn csv_escape_only_quotes_when_needed() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a\nb"), "\"a\nb\"");
    }

    #[test]
    fn json_document_shape() {
        let value = serde_json::to_value(document()).unwrap();
        assert_eq!(value["components"][0]["total_price"], json!(200.0));
        assert_eq!(value["specifications"]["system_type"], "belt_conveyor");
    }
}
