//! Session models for the site.

pub mod session;

pub use session::keys as session_keys;
