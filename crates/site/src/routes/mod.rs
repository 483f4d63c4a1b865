//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page with the punch-out panel
//! GET  /health                    - Health check
//!
//! # Punch-out
//! POST /punchout/login            - Submit catalog credentials (form)
//! POST /punchout/catalog          - Open the embedded catalog
//! POST /punchout/catalog/close    - Close the embedded catalog
//! POST /punchout/cart/close       - Close the cart summary
//! POST /punchout/messages         - Relay a cross-frame message (JSON)
//! ```

pub mod home;
pub mod punchout;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the punch-out routes router.
pub fn punchout_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(punchout::login))
        .route("/catalog", post(punchout::show_catalog))
        .route("/catalog/close", post(punchout::close_catalog))
        .route("/cart/close", post(punchout::close_cart_summary))
        .route("/messages", post(punchout::relay_message))
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Punch-out flow
        .nest("/punchout", punchout_routes())
}
