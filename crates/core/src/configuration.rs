//! Configuration status, naming, and lifecycle rules.
//!
//! Used by the repository layer (completion timestamps, clone naming) and
//! by the API layer (status transitions, derived system type).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Minimum configuration name length (characters).
pub const NAME_MIN_LEN: usize = 3;

/// Maximum configuration name length (characters).
pub const NAME_MAX_LEN: usize = 200;

/// Number of completed configurations offered as templates.
pub const TEMPLATE_LIMIT: i64 = 10;

/// JSON key under which the chosen system type is stored in
/// `system_specifications`.
pub const SYSTEM_TYPE_KEY: &str = "system_type";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigurationStatus {
    Draft,
    InProgress,
    Completed,
}

impl ConfigurationStatus {
    /// Parse a status string from the database or a request body.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "draft" => Ok(Self::Draft),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(CoreError::Validation("Invalid status.".to_string())),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Draft and in-progress configurations can still be edited.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Draft | Self::InProgress)
    }
}

/// Compute `completed_at` for a status write.
///
/// The timestamp is stamped when the status transitions into `completed`,
/// kept while it stays completed, and cleared when it leaves completed.
pub fn completion_timestamp(
    previous: ConfigurationStatus,
    next: ConfigurationStatus,
    existing: Option<Timestamp>,
    now: Timestamp,
) -> Option<Timestamp> {
    match (previous, next) {
        (ConfigurationStatus::Completed, ConfigurationStatus::Completed) => existing.or(Some(now)),
        (_, ConfigurationStatus::Completed) => Some(now),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Naming
// ---------------------------------------------------------------------------

/// Validate a configuration name (3 to 200 characters after trimming).
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    let len = name.trim().chars().count();
    if len < NAME_MIN_LEN || len > NAME_MAX_LEN {
        return Err(CoreError::Validation(format!(
            "Name must be between {NAME_MIN_LEN} and {NAME_MAX_LEN} characters"
        )));
    }
    Ok(())
}

/// Truncate a derived name to the maximum length on a char boundary.
fn clamp_name(name: String) -> String {
    if name.chars().count() <= NAME_MAX_LEN {
        name
    } else {
        name.chars().take(NAME_MAX_LEN).collect()
    }
}

/// Name for an explicit duplicate: `"<name> (Copy)"`.
pub fn duplicate_name(source: &str) -> String {
    clamp_name(format!("{source} (Copy)"))
}

/// Name for a configuration created from a template.
pub fn template_copy_name(template: &str) -> String {
    clamp_name(format!("Configuration from {template}"))
}

/// Use the supplied name, or a timestamp-derived default when blank.
pub fn name_or_default(name: Option<&str>, now: Timestamp) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => n.to_string(),
        None => format!("Configuration {}", now.format("%Y%m%d_%H%M%S")),
    }
}

/// Turn a name into a filename-safe slug (`"My Line #2"` -> `"my-line-2"`).
pub fn parameterize(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "configuration".to_string()
    } else {
        slug
    }
}

// ---------------------------------------------------------------------------
// System specifications
// ---------------------------------------------------------------------------

/// Extract the system type recorded in a configuration's specifications.
pub fn system_type_of(system_specifications: &serde_json::Value) -> Option<&str> {
    system_specifications
        .get(SYSTEM_TYPE_KEY)
        .and_then(|v| v.as_str())
}

/// Record `system_type` in a specifications value.
///
/// Objects gain (or overwrite) the key; any other value is nested under
/// `specifications` in a new object.
pub fn with_system_type(specifications: serde_json::Value, system_type: &str) -> serde_json::Value {
    let mut map = match specifications {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("specifications".to_string(), other);
            map
        }
    };
    map.insert(
        SYSTEM_TYPE_KEY.to_string(),
        serde_json::Value::String(system_type.to_string()),
    );
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn status_roundtrip() {
        for status in [
            ConfigurationStatus::Draft,
            ConfigurationStatus::InProgress,
            ConfigurationStatus::Completed,
        ] {
            assert_eq!(
                ConfigurationStatus::from_str_db(status.as_str()).unwrap(),
                status
            );
        }
    }

    #[test]
    fn status_rejects_unknown() {
        let err = ConfigurationStatus::from_str_db("archived").unwrap_err();
        assert!(matches!(err, CoreError::Validation(ref m) if m == "Invalid status."));
    }

    #[test]
    fn active_statuses() {
        assert!(ConfigurationStatus::Draft.is_active());
        assert!(ConfigurationStatus::InProgress.is_active());
        assert!(!ConfigurationStatus::Completed.is_active());
    }

    #[test]
    fn completion_stamped_on_transition() {
        let now = at(1_000);
        let stamped = completion_timestamp(
            ConfigurationStatus::Draft,
            ConfigurationStatus::Completed,
            None,
            now,
        );
        assert_eq!(stamped, Some(now));
    }

    #[test]
    fn completion_kept_while_completed() {
        let earlier = at(10);
        let kept = completion_timestamp(
            ConfigurationStatus::Completed,
            ConfigurationStatus::Completed,
            Some(earlier),
            at(2_000),
        );
        assert_eq!(kept, Some(earlier));
    }

    #[test]
    fn completion_cleared_when_leaving_completed() {
        let cleared = completion_timestamp(
            ConfigurationStatus::Completed,
            ConfigurationStatus::Draft,
            Some(at(10)),
            at(2_000),
        );
        assert_eq!(cleared, None);
    }

    #[test]
    fn validate_name_bounds() {
        assert!(validate_name("ab").is_err());
        assert!(validate_name("abc").is_ok());
        assert!(validate_name(&"x".repeat(200)).is_ok());
        assert!(validate_name(&"x".repeat(201)).is_err());
        assert!(validate_name("   ab   ").is_err());
    }

    #[test]
    fn clone_names() {
        assert_eq!(duplicate_name("Line A"), "Line A (Copy)");
        assert_eq!(template_copy_name("Line A"), "Configuration from Line A");
        assert_eq!(duplicate_name(&"x".repeat(200)).chars().count(), NAME_MAX_LEN);
    }

    #[test]
    fn default_name_uses_timestamp() {
        let now = Utc.with_ymd_and_hms(2025, 7, 31, 13, 45, 55).unwrap();
        assert_eq!(name_or_default(None, now), "Configuration 20250731_134555");
        assert_eq!(name_or_default(Some("  "), now), "Configuration 20250731_134555");
        assert_eq!(name_or_default(Some(" Line 1 "), now), "Line 1");
    }

    #[test]
    fn parameterize_builds_slug() {
        assert_eq!(parameterize("My Line #2"), "my-line-2");
        assert_eq!(parameterize("  Belt -- Conveyor  "), "belt-conveyor");
        assert_eq!(parameterize("###"), "configuration");
    }

    #[test]
    fn system_type_lookup() {
        let specs = json!({ "system_type": "belt_conveyor", "length": 10 });
        assert_eq!(system_type_of(&specs), Some("belt_conveyor"));
        assert_eq!(system_type_of(&json!({})), None);
        assert_eq!(system_type_of(&json!("text")), None);
    }

    #[test]
    fn with_system_type_merges_into_objects() {
        assert_eq!(
            with_system_type(json!({ "length": 10 }), "belt_conveyor"),
            json!({ "length": 10, "system_type": "belt_conveyor" })
        );
        assert_eq!(
            with_system_type(json!(null), "belt_conveyor"),
            json!({ "system_type": "belt_conveyor" })
        );
        assert_eq!(
            with_system_type(json!("A"), "modular_belt"),
            json!({ "specifications": "A", "system_type": "modular_belt" })
        );
    }
}
