pub mod catalog;
pub mod configuration;
pub mod error;
pub mod export;
pub mod pagination;
pub mod pricing;
pub mod selection;
pub mod types;
pub mod user;
pub mod wizard;
