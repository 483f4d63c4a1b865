//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. The only loosening is
//! what the punch-out flow needs: framing the supplier catalog and loading
//! cart images from the supplier.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;
use crate::config::CatalogConfig;

/// Origins the CSP has to admit for the punch-out flow.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    /// Origin of the embedded catalog (`frame-src`)
    pub frame_origin: String,
    /// Origin serving cart item images (`img-src`)
    pub image_origin: String,
}

impl SecurityPolicy {
    /// Derive the policy from the catalog configuration.
    #[must_use]
    pub fn from_catalog(catalog: &CatalogConfig) -> Self {
        Self {
            frame_origin: catalog.origin(),
            image_origin: catalog.image_base_url.origin().ascii_serialization(),
        }
    }

    /// Build the CSP header value.
    ///
    /// ```text
    /// default-src 'none';
    /// script-src 'self' 'nonce-<nonce>';
    /// style-src 'self';
    /// img-src 'self' <image origin>;
    /// connect-src 'self';
    /// frame-src <catalog origin>;
    /// object-src 'none';
    /// base-uri 'self';
    /// form-action 'self';
    /// frame-ancestors 'none'
    /// ```
    #[must_use]
    pub fn content_security_policy(&self, nonce: Option<&str>) -> String {
        let script_src = match nonce {
            Some(nonce) if !nonce.is_empty() => format!("'self' 'nonce-{nonce}'"),
            _ => "'self'".to_string(),
        };

        format!(
            "default-src 'none'; \
             script-src {script_src}; \
             style-src 'self'; \
             img-src 'self' {image}; \
             connect-src 'self'; \
             frame-src {frame}; \
             object-src 'none'; \
             base-uri 'self'; \
             form-action 'self'; \
             frame-ancestors 'none'",
            image = self.image_origin,
            frame = self.frame_origin,
        )
    }
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - The site itself is never framed
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: no-referrer` - Zero referrer leakage
/// - `Content-Security-Policy` - See [`SecurityPolicy::content_security_policy`]
/// - `Permissions-Policy` - Deny sensitive features
/// - `Cache-Control: no-store, max-age=0` - Pages carry per-visitor state
/// - `Cross-Origin-Opener-Policy: same-origin` - Process isolation
/// - `Cross-Origin-Resource-Policy: same-origin` - Resource isolation
///
/// No `Cross-Origin-Embedder-Policy`: `require-corp` would block the
/// supplier frame.
pub async fn security_headers_middleware(
    State(policy): State<SecurityPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let csp = policy.content_security_policy(
        response
            .extensions()
            .get::<CspNonce>()
            .map(CspNonce::value),
    );
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));

    match HeaderValue::from_str(&csp) {
        Ok(value) => {
            headers.insert(CONTENT_SECURITY_POLICY, value);
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid CSP header value; falling back to deny-all");
            headers.insert(
                CONTENT_SECURITY_POLICY,
                HeaderValue::from_static("default-src 'none'"),
            );
        }
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             magnetometer=(), \
             microphone=(), \
             payment=(), \
             usb=()",
        ),
    );

    headers.insert(
        HeaderName::from_static("cache-control"),
        HeaderValue::from_static("no-store, max-age=0"),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}
