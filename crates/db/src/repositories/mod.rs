//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Steps that must share a
//! transaction take `&mut PgConnection` instead.

pub mod component_selection_repo;
pub mod configuration_repo;
pub mod user_repo;
pub mod wizard_session_repo;

pub use component_selection_repo::ComponentSelectionRepo;
pub use configuration_repo::ConfigurationRepo;
pub use user_repo::UserRepo;
pub use wizard_session_repo::WizardSessionRepo;
