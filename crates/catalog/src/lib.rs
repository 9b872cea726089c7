//! Client for the hosted product catalog (a PostgREST endpoint) plus the
//! caching, fallback-aware [`CatalogService`] the API and wizard use.

pub mod cache;
pub mod client;
pub mod query;
pub mod rows;
pub mod service;

pub use client::{CatalogApiError, SupabaseClient};
pub use query::CatalogQuery;
pub use service::{CatalogService, CatalogSource, ComponentFilters, Listing, SystemFilters};
