//! Data access for the backend. Handlers and services call these functions
//! instead of building queries themselves. Everything is re-exported under
//! `crate::db::services::`.

pub mod settings_service;
pub mod user_service;

pub use settings_service::*;
pub use user_service::*;
