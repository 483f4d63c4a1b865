//! Live punch-out pages.
//!
//! A [`Page`] is one visitor's instance of the marketing page. It owns the
//! punch-out controller, the page-level message channel the controller is
//! mounted on, and a login client with its own cookie store.
//!
//! Pages live in a [`PageRegistry`] keyed by an ID stored in the visitor's
//! session. Idle pages are evicted; dropping a page drops its subscription,
//! which deregisters the controller from the channel.

use std::sync::Arc;
use std::time::Duration;

use mechanic_shop_core::{FrameMessage, MessageChannel, PunchOutController, Subscription};
use moka::future::Cache;
use tower_sessions::Session;
use uuid::Uuid;

use crate::config::CatalogConfig;
use crate::error::AppError;
use crate::models::session_keys;
use crate::services::{CatalogLoginClient, LoginClientError};

/// Upper bound on concurrently live pages (and their sessions).
pub const MAX_PAGES: u64 = 10_000;

/// One visitor's punch-out page.
pub struct Page {
    id: Uuid,
    controller: Arc<PunchOutController>,
    channel: MessageChannel<FrameMessage>,
    login_client: CatalogLoginClient,
    // Held for its Drop: unmounts the controller when the page goes away.
    listener: Subscription<FrameMessage>,
}

impl Page {
    /// Create a page and mount its controller on a fresh channel.
    ///
    /// # Errors
    ///
    /// Returns error if the login client cannot be built.
    pub fn new(id: Uuid, catalog: &CatalogConfig) -> Result<Self, LoginClientError> {
        let login_client = CatalogLoginClient::new(catalog)?;
        let controller = Arc::new(PunchOutController::new(catalog.trusted_origins()));
        let channel = MessageChannel::new();
        let listener = controller.mount(&channel);

        Ok(Self {
            id,
            controller,
            channel,
            login_client,
            listener,
        })
    }

    /// The page ID stored in the session.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The page's punch-out controller.
    #[must_use]
    pub fn controller(&self) -> &PunchOutController {
        &self.controller
    }

    /// The page's login client.
    #[must_use]
    pub const fn login_client(&self) -> &CatalogLoginClient {
        &self.login_client
    }

    /// The page-level message channel.
    #[must_use]
    pub const fn channel(&self) -> &MessageChannel<FrameMessage> {
        &self.channel
    }

    /// Publish a relayed frame message. Returns true if the page changed.
    pub fn deliver(&self, message: &FrameMessage) -> bool {
        let before = self.controller.revision();
        self.channel.publish(message);
        self.controller.revision() != before
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

/// Registry of live pages with idle expiry.
#[derive(Clone)]
pub struct PageRegistry {
    pages: Cache<Uuid, Arc<Page>>,
    catalog: CatalogConfig,
}

impl PageRegistry {
    /// Create a registry whose pages expire after `idle` without access.
    #[must_use]
    pub fn new(catalog: CatalogConfig, idle: Duration) -> Self {
        let pages = Cache::builder()
            .max_capacity(MAX_PAGES)
            .time_to_idle(idle)
            .build();
        Self { pages, catalog }
    }

    /// Look up a live page by ID.
    pub async fn get(&self, id: Uuid) -> Option<Arc<Page>> {
        self.pages.get(&id).await
    }

    /// Create and register a new page.
    ///
    /// # Errors
    ///
    /// Returns error if the page's login client cannot be built.
    pub async fn create(&self) -> Result<Arc<Page>, LoginClientError> {
        let page = Arc::new(Page::new(Uuid::new_v4(), &self.catalog)?);
        self.pages.insert(page.id(), Arc::clone(&page)).await;
        tracing::debug!(page_id = %page.id(), "Created punch-out page");
        Ok(page)
    }

    /// Drop a page, unmounting its controller once the last handle is gone.
    pub async fn remove(&self, id: Uuid) {
        self.pages.invalidate(&id).await;
    }

    /// The session's page, if it is still live.
    ///
    /// # Errors
    ///
    /// Returns error if the session store fails.
    pub async fn existing_page(&self, session: &Session) -> Result<Option<Arc<Page>>, AppError> {
        let Some(id) = session.get::<Uuid>(session_keys::PAGE_ID).await? else {
            return Ok(None);
        };
        Ok(self.get(id).await)
    }

    /// The session's page, creating one when missing or expired.
    ///
    /// # Errors
    ///
    /// Returns error if the session store fails or the page cannot be built.
    pub async fn page_for(&self, session: &Session) -> Result<Arc<Page>, AppError> {
        if let Some(page) = self.existing_page(session).await? {
            return Ok(page);
        }

        let page = self.create().await?;
        session.insert(session_keys::PAGE_ID, page.id()).await?;
        Ok(page)
    }

    /// Number of live pages (approximate; pending evictions may be counted).
    #[must_use]
    pub fn len(&self) -> u64 {
        self.pages.entry_count()
    }

    /// Whether there are no live pages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mechanic_shop_core::{LoginOutcome, ViewState};
    use serde_json::json;
    use url::Url;

    use super::*;

    fn catalog() -> CatalogConfig {
        CatalogConfig::new(Url::parse("http://localhost:3001/").unwrap())
    }

    #[test]
    fn test_page_mounts_controller() {
        let page = Page::new(Uuid::new_v4(), &catalog()).unwrap();
        assert_eq!(page.channel().listener_count(), 1);
    }

    #[test]
    fn test_deliver_reports_changes() {
        let page = Page::new(Uuid::new_v4(), &catalog()).unwrap();
        page.controller()
            .begin_login()
            .unwrap()
            .finish(&LoginOutcome::Accepted);
        page.controller().show_catalog();

        let unknown = FrameMessage::new("http://localhost:3001", json!({ "type": "UNKNOWN" }));
        assert!(!page.deliver(&unknown));

        let close = FrameMessage::new("http://localhost:3001", json!({ "type": "CLOSE_IFRAME" }));
        assert!(page.deliver(&close));
        assert_eq!(page.controller().snapshot().view, ViewState::Hidden);
    }

    #[test]
    fn test_dropping_page_unmounts_listener() {
        let page = Page::new(Uuid::new_v4(), &catalog()).unwrap();
        let channel = page.channel().clone();
        assert_eq!(channel.listener_count(), 1);

        drop(page);
        assert_eq!(channel.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_registry_create_and_get() {
        let registry = PageRegistry::new(catalog(), Duration::from_secs(60));
        let page = registry.create().await.unwrap();

        let found = registry.get(page.id()).await.unwrap();
        assert!(Arc::ptr_eq(&page, &found));
        assert!(registry.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_registry_remove() {
        let registry = PageRegistry::new(catalog(), Duration::from_secs(60));
        let page = registry.create().await.unwrap();

        registry.remove(page.id()).await;
        assert!(registry.get(page.id()).await.is_none());
        // Handles held by in-flight requests keep the page usable.
        assert_eq!(page.channel().listener_count(), 1);
    }
}
