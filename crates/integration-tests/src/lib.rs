//! Integration tests for the Mechanic Shop site.
//!
//! Each test spawns the full site router on an ephemeral port, with a
//! wiremock server standing in for the supplier catalog. A cookie-keeping
//! reqwest client plays the visitor's browser.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mechanic-shop-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::time::Duration;

use mechanic_shop_site::config::{CatalogConfig, SiteConfig};
use mechanic_shop_site::routes::punchout::RelayResponse;
use mechanic_shop_site::state::AppState;
use reqwest::{Client, Response};
use serde_json::{Value, json};
use url::Url;
use wiremock::MockServer;

/// Login timeout used by test sites, short enough for the timeout tests.
pub const TEST_LOGIN_TIMEOUT: Duration = Duration::from_millis(500);

/// A running site plus the mock catalog behind it.
pub struct TestApp {
    /// Base URL of the running site, without a trailing slash
    pub address: String,
    /// Visitor's browser: keeps the session cookie between requests
    pub client: Client,
    /// Mock supplier catalog
    pub catalog: MockServer,
}

impl TestApp {
    /// Spawn a site against a fresh mock catalog.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn a site, adjusting the catalog configuration first.
    pub async fn spawn_with(customize: impl FnOnce(&mut CatalogConfig)) -> Self {
        let catalog = MockServer::start().await;

        let url = Url::parse(&catalog.uri()).expect("mock server URI is a valid URL");
        let mut catalog_config = CatalogConfig::new(url);
        catalog_config.login_timeout = TEST_LOGIN_TIMEOUT;
        customize(&mut catalog_config);

        let state = AppState::new(SiteConfig::with_catalog(catalog_config));
        let app = mechanic_shop_site::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let address = format!(
            "http://{}",
            listener.local_addr().expect("listener has an address")
        );
        tokio::spawn(async move { axum::serve(listener, app).await });

        Self {
            address,
            client: new_browser(),
            catalog,
        }
    }

    /// Origin of the mock catalog, as a browser would report it.
    #[must_use]
    pub fn catalog_origin(&self) -> String {
        self.catalog.uri()
    }

    /// GET a site path.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{path}", self.address))
            .send()
            .await
            .expect("Failed to send GET request")
    }

    /// Load the home page and return its HTML.
    pub async fn home(&self) -> String {
        let resp = self.get("/").await;
        assert!(resp.status().is_success(), "home page failed: {}", resp.status());
        resp.text().await.expect("Failed to read home page")
    }

    /// POST a form and return the page HTML reached after the redirect.
    pub async fn submit(&self, path: &str, form: &[(&str, &str)]) -> String {
        let resp = self
            .client
            .post(format!("{}{path}", self.address))
            .form(form)
            .send()
            .await
            .expect("Failed to submit form");
        assert!(resp.status().is_success(), "{path} failed: {}", resp.status());
        resp.text().await.expect("Failed to read response")
    }

    /// Submit the login form.
    pub async fn login(&self, email: &str, password: &str, account_id: Option<&str>) -> String {
        let mut form = vec![("email", email), ("password", password)];
        if let Some(account_id) = account_id {
            form.push(("account_id", account_id));
        }
        self.submit("/punchout/login", &form).await
    }

    /// Relay a frame message the way the page script does.
    pub async fn relay(&self, origin: &str, data: Value) -> bool {
        let resp = self
            .client
            .post(format!("{}/punchout/messages", self.address))
            .json(&json!({ "origin": origin, "data": data }))
            .send()
            .await
            .expect("Failed to relay message");
        assert!(resp.status().is_success(), "relay failed: {}", resp.status());
        resp.json::<RelayResponse>()
            .await
            .expect("relay response is JSON")
            .changed
    }

    /// Relay a message from the catalog's own origin.
    pub async fn relay_from_catalog(&self, data: Value) -> bool {
        self.relay(&self.catalog_origin(), data).await
    }
}

/// A fresh browser with its own cookie jar.
#[must_use]
pub fn new_browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A catalog login response that accepts the credentials.
#[must_use]
pub fn accepted_body() -> Value {
    json!({ "data": { "crossSiteAuth": { "success": true } } })
}

/// A catalog login response that rejects the credentials.
#[must_use]
pub fn rejected_body(message: &str) -> Value {
    json!({ "errors": [{ "message": message }] })
}

/// A `PUNCH_OUT` message carrying the given cart items.
#[must_use]
pub fn punch_out(cart_items: Value) -> Value {
    json!({ "type": "PUNCH_OUT", "cartItems": cart_items })
}
