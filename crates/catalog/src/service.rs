//! Caching catalog service with static fallback.
//!
//! [`CatalogService`] answers both the wizard (through [`CatalogLookup`])
//! and the pass-through browse endpoints. Remote failures never surface:
//! they are logged at `warn` and the built-in dataset answers instead.
//! Only live results are cached.

use async_trait::async_trait;
use flexlink_core::catalog::{
    humanize, CatalogComponent, CatalogLookup, StaticCatalog, SystemSpecOption, SystemTypeGroups,
};
use flexlink_core::error::CoreError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::cache::{
    TtlCache, LISTING_MAX_ENTRIES, LISTING_TTL, TYPE_LIST_MAX_ENTRIES, TYPE_LIST_TTL,
};
use crate::client::{SupabaseClient, COMPONENT_SPECIFICATIONS, CONVEYOR_SYSTEMS};
use crate::query::CatalogQuery;
use crate::rows::{component_from_row, distinct_sorted, group_system_types, system_spec_from_row};

const COMPONENT_TYPES_KEY: &str = "component_types";
const SYSTEM_GROUPS_KEY: &str = "system_type_groups";

/// Where a catalog answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    Live,
    Fallback,
}

/// A catalog answer tagged with its source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing<T> {
    pub data: T,
    pub source: CatalogSource,
}

impl<T> Listing<T> {
    fn live(data: T) -> Self {
        Self {
            data,
            source: CatalogSource::Live,
        }
    }

    fn fallback(data: T) -> Self {
        Self {
            data,
            source: CatalogSource::Fallback,
        }
    }
}

/// Filters for `GET /catalog/conveyor-systems`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<f64>,
}

impl SystemFilters {
    fn to_query(&self) -> CatalogQuery {
        CatalogQuery::new()
            .eq_opt("system_type", self.system_type.as_deref())
            .eq_opt("system_category", self.system_category.as_deref())
            .range("length", self.min_length, self.max_length)
    }
}

/// Filters for `GET /catalog/component-specifications`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    /// Case-insensitive substring of the component name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ComponentFilters {
    fn to_query(&self) -> CatalogQuery {
        CatalogQuery::new()
            .eq_opt("component_type", self.component_type.as_deref())
            .range("price", self.min_price, self.max_price)
            .contains("name", self.search.as_deref().unwrap_or(""))
    }

    fn matches(&self, component: &CatalogComponent) -> bool {
        let price = component.price.unwrap_or(0.0);
        if self.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| price > max) {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(needle) => component
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        }
    }
}

/// Product catalog backed by the remote REST catalog when configured.
pub struct CatalogService {
    client: Option<SupabaseClient>,
    fallback: StaticCatalog,
    listings: TtlCache<Vec<Value>>,
    component_type_cache: TtlCache<Vec<String>>,
    system_group_cache: TtlCache<SystemTypeGroups>,
}

impl CatalogService {
    /// A service that reads through `client`, or runs offline when `None`.
    pub fn new(client: Option<SupabaseClient>) -> Self {
        Self {
            client,
            fallback: StaticCatalog,
            listings: TtlCache::new(LISTING_TTL, LISTING_MAX_ENTRIES),
            component_type_cache: TtlCache::new(TYPE_LIST_TTL, TYPE_LIST_MAX_ENTRIES),
            system_group_cache: TtlCache::new(TYPE_LIST_TTL, TYPE_LIST_MAX_ENTRIES),
        }
    }

    /// A service that only ever answers from the built-in dataset.
    pub fn offline() -> Self {
        Self::new(None)
    }

    pub fn is_live(&self) -> bool {
        self.client.is_some()
    }

    // ── Browse ───────────────────────────────────────────────────────

    /// Conveyor system rows matching `filters`.
    pub async fn conveyor_systems(&self, filters: &SystemFilters) -> Listing<Vec<Value>> {
        match self.cached_rows(CONVEYOR_SYSTEMS, &filters.to_query()).await {
            Some(rows) => Listing::live(rows),
            None => Listing::fallback(self.fallback_systems(filters)),
        }
    }

    /// Component specification rows matching `filters`.
    pub async fn component_specifications(
        &self,
        filters: &ComponentFilters,
    ) -> Listing<Vec<Value>> {
        match self
            .cached_rows(COMPONENT_SPECIFICATIONS, &filters.to_query())
            .await
        {
            Some(rows) => Listing::live(rows),
            None => Listing::fallback(self.fallback_components(filters)),
        }
    }

    /// Component specifications whose name contains `q`, combined with the
    /// other filters.
    pub async fn search_components(
        &self,
        q: &str,
        filters: &ComponentFilters,
    ) -> Listing<Vec<Value>> {
        let filters = ComponentFilters {
            search: Some(q.to_string()),
            ..filters.clone()
        };
        self.component_specifications(&filters).await
    }

    /// Distinct component types, sorted.
    pub async fn component_type_list(&self) -> Listing<Vec<String>> {
        if let Some(types) = self.component_type_cache.get(COMPONENT_TYPES_KEY).await {
            return Listing::live(types);
        }

        let query = CatalogQuery::new()
            .select("component_type")
            .not_null("component_type");
        match self.fetch(COMPONENT_SPECIFICATIONS, &query).await {
            Some(rows) => {
                let types = distinct_sorted(&rows, "component_type");
                self.component_type_cache
                    .insert(COMPONENT_TYPES_KEY, types.clone())
                    .await;
                Listing::live(types)
            }
            None => Listing::fallback(self.fallback.component_types()),
        }
    }

    /// System types grouped by category.
    pub async fn system_type_groups(&self) -> Listing<SystemTypeGroups> {
        if let Some(groups) = self.system_group_cache.get(SYSTEM_GROUPS_KEY).await {
            return Listing::live(groups);
        }

        let query = CatalogQuery::new()
            .select("system_type,system_category")
            .not_null("system_type");
        match self.fetch(CONVEYOR_SYSTEMS, &query).await {
            Some(rows) => {
                let groups = group_system_types(&rows);
                self.system_group_cache
                    .insert(SYSTEM_GROUPS_KEY, groups.clone())
                    .await;
                Listing::live(groups)
            }
            None => Listing::fallback(self.fallback.system_types()),
        }
    }

    // ── Remote access ────────────────────────────────────────────────

    /// Read rows through the listing cache. `None` means offline or failed.
    async fn cached_rows(&self, table: &'static str, query: &CatalogQuery) -> Option<Vec<Value>> {
        let key = query.cache_key(table);
        if let Some(rows) = self.listings.get(&key).await {
            return Some(rows);
        }
        let rows = self.fetch(table, query).await?;
        self.listings.insert(key, rows.clone()).await;
        Some(rows)
    }

    async fn fetch(&self, table: &'static str, query: &CatalogQuery) -> Option<Vec<Value>> {
        let client = self.client.as_ref()?;
        match client.fetch_rows(table, query).await {
            Ok(rows) => Some(rows),
            Err(e) => {
                tracing::warn!(table, error = %e, "Catalog request failed, using fallback data");
                None
            }
        }
    }

    // ── Fallback data ────────────────────────────────────────────────

    fn fallback_systems(&self, filters: &SystemFilters) -> Vec<Value> {
        let wanted = |field: &Option<String>, value: &str| {
            field
                .as_deref()
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map_or(true, |f| f == value)
        };

        let mut rows = Vec::new();
        for (category, types) in self.fallback.system_types() {
            if !wanted(&filters.system_category, &category) {
                continue;
            }
            for system_type in types {
                if !wanted(&filters.system_type, &system_type) {
                    continue;
                }
                rows.push(json!({
                    "system_type": system_type,
                    "system_category": category,
                    "name": humanize(&system_type),
                }));
            }
        }
        rows
    }

    fn fallback_components(&self, filters: &ComponentFilters) -> Vec<Value> {
        let types = match filters
            .component_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        {
            Some(component_type) => vec![component_type.to_string()],
            None => self.fallback.component_types(),
        };

        types
            .iter()
            .flat_map(|t| self.fallback.components_by_type(t))
            .filter(|c| filters.matches(c))
            .filter_map(|c| serde_json::to_value(c).ok())
            .collect()
    }
}

#[async_trait]
impl CatalogLookup for CatalogService {
    async fn system_types(&self) -> Result<SystemTypeGroups, CoreError> {
        let groups = self.system_type_groups().await.data;
        if groups.is_empty() {
            return Ok(self.fallback.system_types());
        }
        Ok(groups)
    }

    async fn system_specs(&self, system_type: &str) -> Result<Vec<SystemSpecOption>, CoreError> {
        let query = CatalogQuery::new().eq("system_type", system_type);
        let specs: Vec<SystemSpecOption> = self
            .cached_rows(CONVEYOR_SYSTEMS, &query)
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(system_spec_from_row)
            .collect();
        if specs.is_empty() {
            return Ok(self.fallback.system_specs(system_type));
        }
        Ok(specs)
    }

    async fn component_types(&self) -> Result<Vec<String>, CoreError> {
        let types = self.component_type_list().await.data;
        if types.is_empty() {
            return Ok(self.fallback.component_types());
        }
        Ok(types)
    }

    async fn components_by_type(
        &self,
        component_type: &str,
    ) -> Result<Vec<CatalogComponent>, CoreError> {
        let query = CatalogQuery::new().eq("component_type", component_type);
        let components: Vec<CatalogComponent> = self
            .cached_rows(COMPONENT_SPECIFICATIONS, &query)
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(component_from_row)
            .collect();
        if components.is_empty() {
            return Ok(self.fallback.components_by_type(component_type));
        }
        Ok(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable_service() -> CatalogService {
        let client = SupabaseClient::new("http://127.0.0.1:9", "key", Duration::from_secs(1))
            .expect("client builds");
        CatalogService::new(Some(client))
    }

    #[tokio::test]
    async fn offline_service_answers_from_fallback() {
        let service = CatalogService::offline();
        assert!(!service.is_live());

        let types = service.component_type_list().await;
        assert_eq!(types.source, CatalogSource::Fallback);
        assert_eq!(types.data.len(), 7);

        let groups = service.system_type_groups().await;
        assert_eq!(groups.source, CatalogSource::Fallback);
        assert_eq!(groups.data.len(), 3);
    }

    #[tokio::test]
    async fn unreachable_catalog_falls_back() {
        let service = unreachable_service();
        assert!(service.is_live());

        let listing = service
            .component_specifications(&ComponentFilters::default())
            .await;
        assert_eq!(listing.source, CatalogSource::Fallback);
        assert_eq!(listing.data.len(), 21);

        let motors = service.components_by_type("motor").await.unwrap();
        assert_eq!(motors.len(), 3);
        assert_eq!(service.listings.len().await, 0);
    }

    #[tokio::test]
    async fn fallback_components_honour_filters() {
        let service = CatalogService::offline();

        let filters = ComponentFilters {
            component_type: Some("motor".to_string()),
            min_price: Some(100.0),
            ..Default::default()
        };
        let listing = service.component_specifications(&filters).await;
        let names: Vec<&str> = listing
            .data
            .iter()
            .filter_map(|c| c["name"].as_str())
            .collect();
        assert_eq!(names, ["Standard Motor", "Premium Motor"]);

        let found = service
            .search_components("PREMIUM", &ComponentFilters::default())
            .await;
        assert_eq!(found.data.len(), 7);
    }

    #[tokio::test]
    async fn fallback_systems_honour_filters() {
        let service = CatalogService::offline();
        let filters = SystemFilters {
            system_category: Some("Roller Conveyors".to_string()),
            ..Default::default()
        };
        let listing = service.conveyor_systems(&filters).await;
        assert_eq!(listing.data.len(), 3);
        assert!(listing
            .data
            .iter()
            .all(|row| row["system_category"] == "Roller Conveyors"));

        let filters = SystemFilters {
            system_type: Some("belt_conveyor".to_string()),
            ..Default::default()
        };
        let listing = service.conveyor_systems(&filters).await;
        assert_eq!(listing.data, vec![json!({
            "system_type": "belt_conveyor",
            "system_category": "Belt Conveyors",
            "name": "Belt conveyor",
        })]);
    }

    #[tokio::test]
    async fn lookup_uses_static_specs_when_offline() {
        let lookup: &dyn CatalogLookup = &CatalogService::offline();
        let specs = lookup.system_specs("belt_conveyor").await.unwrap();
        assert_eq!(specs[0].name, "Belt conveyor System A");
        assert_eq!(lookup.system_types().await.unwrap().len(), 3);
    }

    #[test]
    fn filters_serialize_without_empty_fields() {
        let filters = ComponentFilters {
            component_type: Some("belt".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&filters).unwrap(),
            json!({ "component_type": "belt" })
        );
    }
}
