//! Normalization of raw catalog rows into the wizard's catalog types.
//!
//! Remote rows are loosely typed: ids arrive as numbers or strings, prices
//! as numbers or numeric strings, and specifications as arrays or objects.

use flexlink_core::catalog::{CatalogComponent, SystemSpecOption, SystemTypeGroups};
use serde_json::{Map, Value};

/// Build a component from a `component_specifications` row.
///
/// Rows without an id are skipped.
pub fn component_from_row(row: &Value) -> Option<CatalogComponent> {
    let obj = row.as_object()?;
    let id = id_field(obj)?;
    let name = text(obj, &["name", "component_name", "model"]).unwrap_or_else(|| id.clone());

    Some(CatalogComponent {
        id,
        name,
        component_type: text(obj, &["component_type"]),
        system_code: text(obj, &["system_code"]),
        description: text(obj, &["description"]),
        price: number(obj, "price"),
        currency: text(obj, &["currency"]),
        brand: text(obj, &["brand", "manufacturer"]),
        specifications: spec_lines(obj.get("specifications")),
        image_url: text(obj, &["image_url"]),
    })
}

/// Build a system specification option from a `conveyor_systems` row.
pub fn system_spec_from_row(row: &Value) -> Option<SystemSpecOption> {
    let obj = row.as_object()?;
    let id = id_field(obj)?;
    let name = text(obj, &["name", "system_name", "system_code"]).unwrap_or_else(|| id.clone());

    Some(SystemSpecOption {
        id,
        name,
        description: text(obj, &["description"]),
        price: number(obj, "price"),
        specifications: spec_lines(obj.get("specifications")),
    })
}

/// Distinct, sorted values of `column` across `rows`. Blank values are
/// dropped.
pub fn distinct_sorted(rows: &[Value], column: &str) -> Vec<String> {
    let mut values: Vec<String> = rows
        .iter()
        .filter_map(|row| row.get(column).and_then(Value::as_str))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    values.sort();
    values.dedup();
    values
}

/// Group `system_type` values by `system_category`, without duplicates.
///
/// Rows with no category land under `"Other"`.
pub fn group_system_types(rows: &[Value]) -> SystemTypeGroups {
    let mut groups = SystemTypeGroups::new();
    for row in rows {
        let Some(system_type) = row.get("system_type").and_then(Value::as_str) else {
            continue;
        };
        let category = row
            .get("system_category")
            .and_then(Value::as_str)
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("Other");
        let entry = groups.entry(category.to_string()).or_default();
        if !entry.iter().any(|t| t == system_type) {
            entry.push(system_type.to_string());
        }
    }
    groups
}

fn id_field(obj: &Map<String, Value>) -> Option<String> {
    match obj.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn spec_lines(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{k}: {s}"),
                other => format!("{k}: {other}"),
            })
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn component_ids_become_strings() {
        let row = json!({
            "id": 42,
            "component_name": "Drive X",
            "component_type": "motor",
            "price": "199.90",
            "manufacturer": "Acme",
            "specifications": { "power": "2kW" }
        });
        let component = component_from_row(&row).unwrap();
        assert_eq!(component.id, "42");
        assert_eq!(component.name, "Drive X");
        assert_eq!(component.price, Some(199.9));
        assert_eq!(component.brand.as_deref(), Some("Acme"));
        assert_eq!(component.specifications, vec!["power: 2kW".to_string()]);
    }

    #[test]
    fn rows_without_id_are_skipped() {
        assert!(component_from_row(&json!({ "name": "x" })).is_none());
        assert!(system_spec_from_row(&json!("not an object")).is_none());
    }

    #[test]
    fn system_spec_falls_back_to_id_for_name() {
        let spec = system_spec_from_row(&json!({ "id": "S1", "price": 10 })).unwrap();
        assert_eq!(spec.name, "S1");
        assert_eq!(spec.price, Some(10.0));
        assert!(spec.specifications.is_empty());
    }

    #[test]
    fn distinct_values_are_sorted_and_unique() {
        let rows = vec![
            json!({ "component_type": "motor" }),
            json!({ "component_type": "belt" }),
            json!({ "component_type": "motor" }),
            json!({ "component_type": null }),
        ];
        assert_eq!(distinct_sorted(&rows, "component_type"), vec!["belt", "motor"]);
    }

    #[test]
    fn system_types_group_by_category() {
        let rows = vec![
            json!({ "system_type": "belt_conveyor", "system_category": "Belt" }),
            json!({ "system_type": "belt_conveyor", "system_category": "Belt" }),
            json!({ "system_type": "modular_belt", "system_category": "Belt" }),
            json!({ "system_type": "screw_conveyor" }),
        ];
        let groups = group_system_types(&rows);
        assert_eq!(groups["Belt"], vec!["belt_conveyor", "modular_belt"]);
        assert_eq!(groups["Other"], vec!["screw_conveyor"]);
    }
}
