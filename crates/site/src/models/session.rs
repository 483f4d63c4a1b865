//! Session-related types.
//!
//! The session carries only the page ID; punch-out state itself lives in the
//! page registry.

/// Session keys.
pub mod keys {
    /// Key for the ID of the visitor's live punch-out page.
    pub const PAGE_ID: &str = "punchout_page_id";
}
