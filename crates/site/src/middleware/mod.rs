//! HTTP middleware stack for the site.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CSP nonce (generate per-request nonce for the relay script)
//! 5. Security headers (CSP allowing the catalog frame, etc.)
//! 6. Session layer (tower-sessions with in-memory store)

pub mod csp;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use csp::{CspNonce, csp_nonce_middleware};
pub use request_id::request_id_middleware;
pub use security_headers::{SecurityPolicy, security_headers_middleware};
pub use session::{PageSessionStore, session_layer};
