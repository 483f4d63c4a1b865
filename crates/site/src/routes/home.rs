//! Home page route handler.
//!
//! Renders the marketing page with the punch-out panel in the hero. Which
//! parts of the panel appear is decided entirely by the page's controller
//! state.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use mechanic_shop_core::{CartRow, PunchOutState, SessionState, ViewState, summary_rows};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::CspNonce;
use crate::state::AppState;

// =============================================================================
// Static Content
// =============================================================================

/// A service offered by the shop.
#[derive(Clone)]
pub struct ServiceCard {
    pub title: &'static str,
    pub description: &'static str,
}

/// Services shown below the hero.
const SERVICES: &[ServiceCard] = &[
    ServiceCard {
        title: "Engine Repair",
        description: "Expert diagnostics and repairs for all engine types",
    },
    ServiceCard {
        title: "Brake Service",
        description: "Complete brake system inspection and maintenance",
    },
    ServiceCard {
        title: "Oil Change",
        description: "Quick and professional oil change services",
    },
];

// =============================================================================
// Punch-Out Panel
// =============================================================================

/// Everything the template needs to render the punch-out panel.
#[derive(Clone)]
pub struct PunchOutPanel {
    pub logged_in: bool,
    pub login_in_flight: bool,
    pub error: Option<String>,
    pub show_catalog: bool,
    pub show_cart_summary: bool,
    pub catalog_url: String,
    pub rows: Vec<CartRow>,
}

impl PunchOutPanel {
    /// Project controller state into the panel.
    #[must_use]
    pub fn new(state: &PunchOutState, catalog_url: &str, image_base: &str) -> Self {
        Self {
            logged_in: state.session == SessionState::LoggedIn,
            login_in_flight: state.login_in_flight,
            error: state.error.clone(),
            show_catalog: state.view == ViewState::ShowingEmbeddedCatalog,
            show_cart_summary: state.view == ViewState::ShowingCartSummary,
            catalog_url: catalog_url.to_string(),
            rows: summary_rows(&state.cart_items, image_base),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub panel: PunchOutPanel,
    pub services: &'static [ServiceCard],
    pub nonce: String,
}

/// Display the home page.
#[instrument(skip(state, session, nonce))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<HomeTemplate> {
    let page = state.pages().page_for(&session).await?;
    let catalog = &state.config().catalog;

    let panel = PunchOutPanel::new(
        &page.controller().snapshot(),
        catalog.url.as_str(),
        catalog.image_base_url.as_str(),
    );

    Ok(HomeTemplate {
        panel,
        services: SERVICES,
        nonce,
    })
}
