//! Cross-site login protocol.
//!
//! The supplier exposes `POST /api/cross-site-auth` taking
//! `{ email, password, accountId }`. Its response either carries an
//! `errors` array or anything else; the absence of `errors` is the only
//! success signal.

use serde::Serialize;
use serde_json::Value;

/// Path of the login endpoint, relative to the catalog base URL.
pub const LOGIN_PATH: &str = "/api/cross-site-auth";

/// Message shown when a failure carries no usable text.
pub const GENERIC_LOGIN_FAILURE: &str = "Login failed";

/// JSON body of the login request.
///
/// `account_id` is always serialized, as an empty string when the visitor
/// did not supply one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub account_id: &'a str,
}

/// Result of one login attempt, as seen by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The supplier accepted the credentials.
    Accepted,
    /// The supplier answered with an `errors` array.
    Rejected(String),
    /// The request never produced a usable answer (network, timeout, bad JSON).
    Failed(String),
}

impl LoginOutcome {
    /// Classify a raw response body.
    ///
    /// Malformed JSON becomes [`LoginOutcome::Failed`] carrying the parser's
    /// message.
    #[must_use]
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => Self::from_json(&value),
            Err(e) => Self::Failed(e.to_string()),
        }
    }

    /// Classify a parsed response body.
    ///
    /// An `errors` field that is present and non-null is a rejection whose
    /// message is the first entry's `message`.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value.get("errors") {
            None | Some(Value::Null) => Self::Accepted,
            Some(errors) => Self::Rejected(first_error_message(errors)),
        }
    }

    /// The user-facing error message, if the attempt did not succeed.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Accepted => None,
            Self::Rejected(message) | Self::Failed(message) => Some(message),
        }
    }
}

fn first_error_message(errors: &Value) -> String {
    errors
        .as_array()
        .and_then(|list| list.first())
        .and_then(|first| first.get("message"))
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .unwrap_or(GENERIC_LOGIN_FAILURE)
        .to_string()
}
