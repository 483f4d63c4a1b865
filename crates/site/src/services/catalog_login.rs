//! Supplier catalog login client.
//!
//! Performs the cross-site login against the supplier storefront. Each page
//! gets its own client so the session cookies the supplier sets stay with
//! the visitor who logged in.

use mechanic_shop_core::{Credentials, GENERIC_LOGIN_FAILURE, LOGIN_PATH, LoginOutcome};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::CatalogConfig;

/// Errors that can occur when talking to the catalog login endpoint.
#[derive(Debug, Error)]
pub enum LoginClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Login request timed out")]
    Timeout,

    /// The catalog URL cannot host the login endpoint.
    #[error("Invalid login URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl LoginClientError {
    /// Convert into the outcome shown to the visitor.
    ///
    /// Internal URLs are stripped from transport errors.
    #[must_use]
    pub fn into_outcome(self) -> LoginOutcome {
        let message = match self {
            Self::Timeout => "The catalog login timed out. Please try again.".to_string(),
            Self::Http(e) if e.is_connect() => {
                "Could not reach the catalog login service. Please try again.".to_string()
            }
            Self::Http(e) => e.without_url().to_string(),
            Self::InvalidUrl(_) => GENERIC_LOGIN_FAILURE.to_string(),
        };
        LoginOutcome::Failed(message)
    }
}

/// HTTP client for `POST /api/cross-site-auth`.
#[derive(Debug, Clone)]
pub struct CatalogLoginClient {
    client: reqwest::Client,
    login_url: Url,
}

impl CatalogLoginClient {
    /// Create a client with its own cookie store.
    ///
    /// # Errors
    ///
    /// Returns error if the login URL cannot be built or the HTTP client
    /// fails to build.
    pub fn new(config: &CatalogConfig) -> Result<Self, LoginClientError> {
        let login_url = config.url.join(LOGIN_PATH)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(config.login_timeout)
            .build()?;

        Ok(Self { client, login_url })
    }

    /// The resolved login endpoint.
    #[must_use]
    pub const fn login_url(&self) -> &Url {
        &self.login_url
    }

    /// Submit credentials and classify the answer.
    ///
    /// The response status is not consulted: only the body decides between
    /// acceptance and rejection. A body that is not JSON is a failure.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or timeout.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, LoginClientError> {
        let response = self
            .client
            .post(self.login_url.clone())
            .json(&credentials.login_request())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.bytes().await.map_err(classify)?;
        let outcome = LoginOutcome::from_body(&body);

        tracing::debug!(status = status.as_u16(), ?outcome, "Catalog login answered");
        Ok(outcome)
    }
}

fn classify(e: reqwest::Error) -> LoginClientError {
    if e.is_timeout() {
        LoginClientError::Timeout
    } else {
        LoginClientError::Http(e)
    }
}
