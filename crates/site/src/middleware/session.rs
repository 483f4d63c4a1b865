//! Session middleware configuration.
//!
//! Sessions only carry the visitor's page ID, so they live in memory next to
//! the pages: a bounded moka cache with the same capacity and idle expiry as
//! the [`PageRegistry`](crate::pages::PageRegistry). A restart drops every
//! page anyway.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore, session_store};

use crate::config::SiteConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "ms_session";

/// In-memory session store that evicts.
///
/// Records go away when idle for longer than the configured time or when
/// the capacity is exceeded; expired records are dropped on load.
#[derive(Debug, Clone)]
pub struct PageSessionStore {
    records: Cache<Id, Record>,
}

impl PageSessionStore {
    /// Create a store holding at most `capacity` sessions.
    #[must_use]
    pub fn new(capacity: u64, idle: Duration) -> Self {
        let records = Cache::builder()
            .max_capacity(capacity)
            .time_to_idle(idle)
            .build();
        Self { records }
    }

    /// Number of stored sessions.
    ///
    /// Approximate until pending evictions have run.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.records.entry_count()
    }

    /// Whether the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply pending evictions now.
    pub async fn run_pending_tasks(&self) {
        self.records.run_pending_tasks().await;
    }
}

#[async_trait]
impl SessionStore for PageSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while self.records.contains_key(&record.id) {
            record.id = Id::default();
        }
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.records.insert(record.id, record.clone()).await;
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let Some(record) = self.records.get(session_id).await else {
            return Ok(None);
        };
        if record.expiry_date > OffsetDateTime::now_utc() {
            Ok(Some(record))
        } else {
            self.records.invalidate(session_id).await;
            Ok(None)
        }
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.records.invalidate(session_id).await;
        Ok(())
    }
}

/// Create the session layer over the given store.
///
/// Sessions expire after the same idle time as pages.
#[must_use]
pub fn session_layer<S: SessionStore + Clone>(
    store: S,
    config: &SiteConfig,
) -> SessionManagerLayer<S> {
    let idle_seconds = i64::try_from(config.page_idle.as_secs()).unwrap_or(i64::MAX);

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(idle_seconds),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
