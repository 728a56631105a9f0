pub mod db;
pub mod process_lookup;
pub mod server;
pub mod services;
pub mod web;
