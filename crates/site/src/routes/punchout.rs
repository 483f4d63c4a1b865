//! Punch-out route handlers.
//!
//! Form posts follow post/redirect/get: each handler updates the page's
//! controller and redirects back to `/`, where the new state is rendered.
//! The relay endpoint is called by the page script for every cross-frame
//! message the browser receives.

use axum::{Form, Json, extract::State, response::Redirect};
use mechanic_shop_core::{Credentials, FrameMessage, LoginOutcome};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// Login form data.
///
/// No `Debug`: it carries the plain-text password.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Response of the relay endpoint.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelayResponse {
    /// Whether the page state changed, i.e. the page should re-render.
    pub changed: bool,
}

fn back_home() -> Redirect {
    Redirect::to("/")
}

/// Submit catalog credentials.
///
/// POST /punchout/login
///
/// Failures never escape this handler: validation errors, rejections,
/// timeouts and transport errors all end up as the page's error message.
/// A resubmission while a login is in flight is ignored.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let page = state.pages().page_for(&session).await?;
    let controller = page.controller();

    let credentials = match Credentials::new(
        &form.email,
        SecretString::from(form.password),
        form.account_id,
    ) {
        Ok(credentials) => credentials,
        Err(e) => {
            tracing::debug!(page_id = %page.id(), error = %e, "Login form incomplete");
            controller.reject_credentials(&e);
            return Ok(back_home());
        }
    };

    let Some(attempt) = controller.begin_login() else {
        tracing::info!(page_id = %page.id(), "Login already in flight, ignoring resubmission");
        return Ok(back_home());
    };

    add_breadcrumb("punchout", "Catalog login submitted", None);

    let outcome = match page.login_client().login(&credentials).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(page_id = %page.id(), error = %e, "Catalog login request failed");
            e.into_outcome()
        }
    };

    match &outcome {
        LoginOutcome::Accepted => {
            tracing::info!(page_id = %page.id(), "Catalog login accepted");
        }
        LoginOutcome::Rejected(message) => {
            tracing::info!(page_id = %page.id(), reason = %message, "Catalog login rejected");
        }
        LoginOutcome::Failed(message) => {
            tracing::warn!(page_id = %page.id(), reason = %message, "Catalog login failed");
        }
    }

    attempt.finish(&outcome);
    Ok(back_home())
}

/// Open the embedded catalog.
///
/// POST /punchout/catalog
///
/// No-op unless the page is logged in.
#[instrument(skip_all)]
pub async fn show_catalog(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let page = state.pages().page_for(&session).await?;
    if !page.controller().show_catalog() {
        tracing::debug!(page_id = %page.id(), "Show catalog ignored");
    }
    Ok(back_home())
}

/// Close the embedded catalog overlay.
///
/// POST /punchout/catalog/close
#[instrument(skip_all)]
pub async fn close_catalog(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let page = state.pages().page_for(&session).await?;
    page.controller().close_catalog();
    Ok(back_home())
}

/// Close the cart summary.
///
/// POST /punchout/cart/close
#[instrument(skip_all)]
pub async fn close_cart_summary(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect> {
    let page = state.pages().page_for(&session).await?;
    page.controller().close_cart_summary();
    Ok(back_home())
}

/// Relay a cross-frame message onto the page's channel.
///
/// POST /punchout/messages
///
/// Body: `{ "origin": "<event.origin>", "data": <event.data> }`. Messages
/// for an expired or unknown page are dropped. A blank origin is a bad
/// request: the page script always forwards `event.origin`.
#[instrument(skip_all, fields(origin = %message.origin))]
pub async fn relay_message(
    State(state): State<AppState>,
    session: Session,
    Json(message): Json<FrameMessage>,
) -> Result<Json<RelayResponse>> {
    if message.origin.trim().is_empty() {
        return Err(AppError::BadRequest("missing message origin".to_string()));
    }

    let Some(page) = state.pages().existing_page(&session).await? else {
        tracing::debug!("Dropping frame message for a page that is not live");
        return Ok(Json(RelayResponse { changed: false }));
    };

    let changed = page.deliver(&message);
    if changed {
        add_breadcrumb(
            "punchout",
            "Frame message applied",
            Some(&[("origin", message.origin.as_str())]),
        );
    }

    Ok(Json(RelayResponse { changed }))
}
