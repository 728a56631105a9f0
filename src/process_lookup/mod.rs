//! Proxy for the external legal-process API ("consulta-processo").
//!
//! A lookup resolves connection parameters from the site settings row, sends a
//! single bounded GET upstream and maps the outcome onto a fixed status
//! taxonomy (see [`LookupError`]). Successful bodies pass through untouched.

pub mod client;
pub mod connection;
pub mod error;

pub use client::{ConnectionTestReport, ConnectionTestStatus, ProcessLookupClient};
pub use connection::{ApiConnection, ProcessQuery, normalize_api_url};
pub use error::LookupError;
