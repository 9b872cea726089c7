//! PostgREST filter construction.
//!
//! Each filter becomes one `column=operator.value` query pair:
//!
//! | Filter                | Pair                         |
//! |-----------------------|------------------------------|
//! | equality              | `system_type=eq.belt`        |
//! | membership            | `component_type=in.(a,b)`    |
//! | lower / upper bound   | `price=gte.10`, `price=lte.20` |
//! | case-insensitive like | `name=ilike.*motor*`         |
//! | not null              | `system_type=not.is.null`    |
//!
//! Values are percent-encoded when the pairs are appended to a URL.

use reqwest::Url;

/// An ordered set of PostgREST query pairs for one table read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pairs: Vec<(String, String)>,
}

impl CatalogQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the returned columns (`select=a,b`).
    pub fn select(mut self, columns: &str) -> Self {
        self.pairs.push(("select".to_string(), columns.to_string()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.push(column, format!("eq.{}", value.to_string()));
        self
    }

    /// Membership filter. An empty list adds nothing.
    pub fn in_list<S: AsRef<str>>(mut self, column: &str, values: &[S]) -> Self {
        if values.is_empty() {
            return self;
        }
        let joined = values
            .iter()
            .map(|v| v.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        self.push(column, format!("in.({joined})"));
        self
    }

    /// Inclusive range filter. Each bound is optional.
    pub fn range(mut self, column: &str, min: Option<f64>, max: Option<f64>) -> Self {
        if let Some(min) = min {
            self.push(column, format!("gte.{min}"));
        }
        if let Some(max) = max {
            self.push(column, format!("lte.{max}"));
        }
        self
    }

    /// Case-insensitive substring match.
    pub fn contains(mut self, column: &str, needle: &str) -> Self {
        let needle = needle.trim();
        if !needle.is_empty() {
            self.push(column, format!("ilike.*{needle}*"));
        }
        self
    }

    pub fn not_null(mut self, column: &str) -> Self {
        self.push(column, "not.is.null".to_string());
        self
    }

    /// Apply `eq` only when a value is present.
    pub fn eq_opt(self, column: &str, value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Stable key for caching the result of this query against `table`.
    pub fn cache_key(&self, table: &str) -> String {
        let mut key = table.to_string();
        for (column, filter) in &self.pairs {
            key.push('|');
            key.push_str(column);
            key.push('=');
            key.push_str(filter);
        }
        key
    }

    /// Append the pairs to `url`. An empty query leaves the URL without a
    /// query string.
    pub fn apply(&self, url: &mut Url) {
        if self.pairs.is_empty() {
            return;
        }
        url.query_pairs_mut().extend_pairs(self.pairs.iter());
    }

    fn push(&mut self, column: &str, filter: String) {
        self.pairs.push((column.to_string(), filter));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_for(query: &CatalogQuery) -> Url {
        let mut url = Url::parse("https://catalog.example.com/rest/v1/component_specifications")
            .unwrap();
        query.apply(&mut url);
        url
    }

    #[test]
    fn empty_query_adds_no_query_string() {
        let url = url_for(&CatalogQuery::new());
        assert_eq!(url.query(), None);
        assert!(!url.as_str().contains('?'));
    }

    #[test]
    fn scalar_filters_use_eq() {
        let query = CatalogQuery::new().eq("component_type", "motor");
        assert_eq!(url_for(&query).query(), Some("component_type=eq.motor"));
    }

    #[test]
    fn ranges_emit_one_pair_per_bound() {
        let query = CatalogQuery::new().range("price", Some(10.0), Some(20.5));
        assert_eq!(url_for(&query).query(), Some("price=gte.10&price=lte.20.5"));

        let query = CatalogQuery::new().range("price", None, Some(99.0));
        assert_eq!(query.pairs(), &[("price".to_string(), "lte.99".to_string())]);
    }

    #[test]
    fn membership_values_are_encoded() {
        let query = CatalogQuery::new().in_list("component_type", &["belt", "motor"]);
        assert_eq!(
            url_for(&query).query(),
            Some("component_type=in.%28belt%2Cmotor%29")
        );
        assert!(CatalogQuery::new().in_list::<&str>("x", &[]).is_empty());
    }

    #[test]
    fn reserved_characters_are_escaped() {
        let query = CatalogQuery::new().eq("name", "A&B=C");
        assert_eq!(url_for(&query).query(), Some("name=eq.A%26B%3DC"));
    }

    #[test]
    fn blank_optional_filters_are_skipped() {
        let query = CatalogQuery::new()
            .eq_opt("system_type", None)
            .eq_opt("system_category", Some("  "))
            .contains("name", "");
        assert!(query.is_empty());
    }

    #[test]
    fn select_and_not_null() {
        let query = CatalogQuery::new()
            .select("component_type")
            .not_null("component_type");
        assert_eq!(
            url_for(&query).query(),
            Some("select=component_type&component_type=not.is.null")
        );
    }

    #[test]
    fn cache_key_reflects_filters() {
        let a = CatalogQuery::new().eq("component_type", "motor");
        let b = CatalogQuery::new().eq("component_type", "belt");
        assert_ne!(a.cache_key("t"), b.cache_key("t"));
        assert_eq!(CatalogQuery::new().cache_key("t"), "t");
    }
}
