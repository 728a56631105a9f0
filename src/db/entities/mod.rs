//! SeaORM entities for the tables this backend owns.

pub mod site_settings;
pub mod user;
