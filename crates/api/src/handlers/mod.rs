pub mod auth;
pub mod catalog;
pub mod configuration;
pub mod dashboard;
pub mod selection;
pub mod wizard;
