//! Dashboard read model.

use serde::Serialize;
use flexlink_core::pricing::ConfigurationStats;

use crate::models::configuration::Configuration;

/// Statistics plus the most recently updated configurations for one user.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub stats: ConfigurationStats,
    pub recent_configurations: Vec<Configuration>,
}
