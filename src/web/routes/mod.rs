pub mod process_routes;
pub mod settings_routes;
