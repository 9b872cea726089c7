//! Product catalog capability and the built-in fallback dataset.
//!
//! The wizard depends only on [`CatalogLookup`]. The live implementation
//! (remote REST catalog with caching) lives in `flexlink-catalog`; the
//! [`StaticCatalog`] here answers when the remote catalog is not configured
//! or unavailable.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// System types grouped by category, e.g. `"Belt Conveyors" -> [belt_conveyor, ...]`.
pub type SystemTypeGroups = BTreeMap<String, Vec<String>>;

/// A selectable system specification offered in wizard step 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSpecOption {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub specifications: Vec<String>,
}

/// A catalog component offered in wizard steps 4 to 7.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogComponent {
    pub id: String,
    pub name: String,
    pub component_type: Option<String>,
    pub system_code: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub brand: Option<String>,
    #[serde(default)]
    pub specifications: Vec<String>,
    pub image_url: Option<String>,
}

/// Read-only lookups the wizard needs from the product catalog.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// All system types, grouped by category.
    async fn system_types(&self) -> Result<SystemTypeGroups, CoreError>;

    /// Specification options for one system type.
    async fn system_specs(&self, system_type: &str) -> Result<Vec<SystemSpecOption>, CoreError>;

    /// All distinct component types, sorted.
    async fn component_types(&self) -> Result<Vec<String>, CoreError>;

    /// Components of a single type.
    async fn components_by_type(
        &self,
        component_type: &str,
    ) -> Result<Vec<CatalogComponent>, CoreError>;
}

/// Rails-style humanize: `"belt_conveyor"` -> `"Belt conveyor"`.
pub fn humanize(s: &str) -> String {
    let spaced = s.trim().replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.map(|c| c.to_ascii_lowercase())).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Static fallback dataset
// ---------------------------------------------------------------------------

/// Brand name used by the built-in components.
pub const HOUSE_BRAND: &str = "FlexLink";

/// Built-in catalog data. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

impl StaticCatalog {
    pub fn system_types(&self) -> SystemTypeGroups {
        let mut groups = SystemTypeGroups::new();
        groups.insert(
            "Belt Conveyors".to_string(),
            strings(&["belt_conveyor", "modular_belt", "chain_conveyor"]),
        );
        groups.insert(
            "Roller Conveyors".to_string(),
            strings(&["roller_conveyor", "gravity_roller", "powered_roller"]),
        );
        groups.insert(
            "Specialty Conveyors".to_string(),
            strings(&["screw_conveyor", "pneumatic_conveyor", "overhead_conveyor"]),
        );
        groups
    }

    pub fn system_specs(&self, system_type: &str) -> Vec<SystemSpecOption> {
        let label = humanize(system_type);
        vec![
            SystemSpecOption {
                id: "1".to_string(),
                name: format!("{label} System A"),
                description: Some(format!("Standard {label} configuration")),
                price: Some(2500.0),
                specifications: strings(&["Length: 10m", "Width: 0.5m", "Speed: 0.5 m/s"]),
            },
            SystemSpecOption {
                id: "2".to_string(),
                name: format!("{label} System B"),
                description: Some(format!("Premium {label} configuration")),
                price: Some(3500.0),
                specifications: strings(&["Length: 15m", "Width: 0.6m", "Speed: 0.8 m/s"]),
            },
        ]
    }

    pub fn component_types(&self) -> Vec<String> {
        strings(&["belt", "roller", "motor", "sensor", "controller", "frame", "accessory"])
    }

    pub fn components_by_type(&self, component_type: &str) -> Vec<CatalogComponent> {
        let label = humanize(component_type);
        let make = |id: &str, name: String, description: String, price: f64, brand: &str, specs: &[&str]| {
            CatalogComponent {
                id: id.to_string(),
                name,
                component_type: Some(component_type.to_string()),
                system_code: None,
                description: Some(description),
                price: Some(price),
                currency: Some(crate::selection::DEFAULT_CURRENCY.to_string()),
                brand: Some(brand.to_string()),
                specifications: strings(specs),
                image_url: None,
            }
        };

        vec![
            make(
                "1",
                format!("Standard {label}"),
                format!("High-quality {label} component"),
                150.0,
                HOUSE_BRAND,
                &["Material: Steel", "Size: Standard", "Quality: Premium"],
            ),
            make(
                "2",
                format!("Premium {label}"),
                format!("Premium {label} component with advanced features"),
                250.0,
                HOUSE_BRAND,
                &["Material: Stainless Steel", "Size: Large", "Quality: Premium"],
            ),
            make(
                "3",
                format!("Economy {label}"),
                format!("Cost-effective {label} component"),
                75.0,
                "Generic",
                &["Material: Plastic", "Size: Standard", "Quality: Standard"],
            ),
        ]
    }
}

#[async_trait]
impl CatalogLookup for StaticCatalog {
    async fn system_types(&self) -> Result<SystemTypeGroups, CoreError> {
        Ok(StaticCatalog::system_types(self))
    }

    async fn system_specs(&self, system_type: &str) -> Result<Vec<SystemSpecOption>, CoreError> {
        Ok(StaticCatalog::system_specs(self, system_type))
    }

    async fn component_types(&self) -> Result<Vec<String>, CoreError> {
        Ok(StaticCatalog::component_types(self))
    }

    async fn components_by_type(
        &self,
        component_type: &str,
    ) -> Result<Vec<CatalogComponent>, CoreError> {
        Ok(StaticCatalog::components_by_type(self, component_type))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanize_matches_rails() {
        assert_eq!(humanize("belt_conveyor"), "Belt conveyor");
        assert_eq!(humanize("MOTOR"), "Motor");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn static_system_types_have_three_groups() {
        let groups = StaticCatalog.system_types();
        assert_eq!(groups.len(), 3);
        assert!(groups["Belt Conveyors"].contains(&"belt_conveyor".to_string()));
    }

    #[test]
    fn static_specs_are_named_after_system_type() {
        let specs = StaticCatalog.system_specs("belt_conveyor");
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "Belt conveyor System A");
        assert_eq!(specs[1].price, Some(3500.0));
    }

    #[test]
    fn static_components_cover_three_tiers() {
        let components = StaticCatalog.components_by_type("motor");
        let names: Vec<_> = components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Standard Motor", "Premium Motor", "Economy Motor"]);
        assert!(components
            .iter()
            .all(|c| c.component_type.as_deref() == Some("motor")));
    }

    #[tokio::test]
    async fn static_catalog_implements_lookup() {
        let lookup: &dyn CatalogLookup = &StaticCatalog;
        assert_eq!(lookup.component_types().await.unwrap().len(), 7);
        assert_eq!(lookup.components_by_type("belt").await.unwrap().len(), 3);
    }
}
