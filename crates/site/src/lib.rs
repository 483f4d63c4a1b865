//! Mechanic Shop site library.
//!
//! This crate provides the site as a library, allowing the router to be
//! tested end-to-end and reused by the binary.
//!
//! # Architecture
//!
//! - Axum web framework, Askama templates for server-side rendering
//! - One [`pages::Page`] per visitor holds the punch-out controller, its
//!   message channel and a cookie-keeping login client
//! - A small inline script relays the catalog frame's `postMessage` traffic
//!   to `POST /punchout/messages`

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod pages;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::Request, routing::get};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{PageSessionStore, SecurityPolicy};
use crate::state::AppState;

/// Directory of static assets shipped with the crate.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the full application router with its middleware stack.
///
/// Sentry layers are added by the binary, outermost.
pub fn app(state: AppState) -> Router {
    let store = PageSessionStore::new(pages::MAX_PAGES, state.config().page_idle);
    app_with_session_store(state, store)
}

/// Build the application router over a given session store.
pub fn app_with_session_store(state: AppState, store: PageSessionStore) -> Router {
    let session_layer = middleware::session_layer(store, state.config());
    let policy = SecurityPolicy::from_catalog(&state.config().catalog);

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::csp_nonce_middleware))
        .layer(axum::middleware::from_fn_with_state(
            policy,
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
