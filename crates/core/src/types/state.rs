//! Session and view states of a punch-out page.

use serde::{Deserialize, Serialize};

/// Whether the visitor is logged in to the supplier catalog.
///
/// There is no transition back to `LoggedOut`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    LoggedOut,
    LoggedIn,
}

impl SessionState {
    /// Returns true once a login has succeeded.
    #[must_use]
    pub const fn is_logged_in(self) -> bool {
        matches!(self, Self::LoggedIn)
    }
}

/// Which punch-out surface is visible.
///
/// The embedded catalog and the cart summary are variants of one enum, so
/// they can never be shown at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    #[default]
    Hidden,
    ShowingEmbeddedCatalog,
    ShowingCartSummary,
}

impl ViewState {
    /// Returns the state as a string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::ShowingEmbeddedCatalog => "showing_embedded_catalog",
            Self::ShowingCartSummary => "showing_cart_summary",
        }
    }
}

impl std::fmt::Display for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
