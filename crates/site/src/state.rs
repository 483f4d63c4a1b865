//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::SiteConfig;
use crate::pages::PageRegistry;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the registry of live punch-out pages.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    pages: PageRegistry,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: SiteConfig) -> Self {
        let pages = PageRegistry::new(config.catalog.clone(), config.page_idle);

        Self {
            inner: Arc::new(AppStateInner { config, pages }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    /// Get a reference to the page registry.
    #[must_use]
    pub fn pages(&self) -> &PageRegistry {
        &self.inner.pages
    }
}
