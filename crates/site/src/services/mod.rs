//! Outbound services for the site.
//!
//! # Services
//!
//! - `catalog_login` - Cross-site login against the supplier catalog

pub mod catalog_login;

pub use catalog_login::{CatalogLoginClient, LoginClientError};
