//! Status registry: the single source of truth for acceptable status codes.
//!
//! Statuses started life as a hardcoded enum and became a data-driven lookup
//! table so a new code can be added without a deployment. The registry caches
//! the table wholesale for a short interval; a stale read within that window
//! is accepted in exchange for skipping a round trip on every validation.
//!
//! A failed load is surfaced as a storage error, never as "always invalid".

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::models::StatusDef;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Storage seam for the registry, mockable in tests.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn load_statuses(&self) -> Result<Vec<StatusDef>, sqlx::Error>;
}

pub struct PgStatusStore {
    pool: PgPool,
}

impl PgStatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn load_statuses(&self) -> Result<Vec<StatusDef>, sqlx::Error> {
        sqlx::query_as::<_, StatusDef>(
            r#"SELECT code, label, sort_order, is_terminal
               FROM campus.lead_statuses
               ORDER BY sort_order, code"#,
        )
        .fetch_all(&self.pool)
        .await
    }
}

struct CacheSlot {
    loaded_at: Instant,
    statuses: Arc<Vec<StatusDef>>,
}

/// Process-wide registry, constructed once and injected where needed.
pub struct StatusRegistry {
    store: Arc<dyn StatusStore>,
    ttl: Duration,
    cache: RwLock<Option<CacheSlot>>,
}

impl StatusRegistry {
    pub fn new(store: Arc<dyn StatusStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            cache: RwLock::new(None),
        }
    }

    /// Ordered list of status definitions, served from cache while fresh.
    pub async fn load_statuses(&self) -> Result<Arc<Vec<StatusDef>>, sqlx::Error> {
        {
            let cache = self.cache.read().await;
            if let Some(slot) = cache.as_ref() {
                if slot.loaded_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(&slot.statuses));
                }
            }
        }
        let mut cache = self.cache.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(slot) = cache.as_ref() {
            if slot.loaded_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&slot.statuses));
            }
        }
        self.reload_into(&mut cache).await
    }

    /// Reload from storage unconditionally, replacing the cache wholesale.
    pub async fn refresh(&self) -> Result<Arc<Vec<StatusDef>>, sqlx::Error> {
        let mut cache = self.cache.write().await;
        self.reload_into(&mut cache).await
    }

    async fn reload_into(
        &self,
        cache: &mut Option<CacheSlot>,
    ) -> Result<Arc<Vec<StatusDef>>, sqlx::Error> {
        let statuses = Arc::new(self.store.load_statuses().await?);
        *cache = Some(CacheSlot {
            loaded_at: Instant::now(),
            statuses: Arc::clone(&statuses),
        });
        Ok(statuses)
    }

    pub async fn is_valid_status(&self, code: &str) -> Result<bool, sqlx::Error> {
        let statuses = self.load_statuses().await?;
        Ok(statuses.iter().any(|s| s.code == code))
    }

    /// Status assigned to a lead at creation: the first registry entry by
    /// sort order, `new` if the table is empty.
    pub async fn initial_status(&self) -> Result<String, sqlx::Error> {
        let statuses = self.load_statuses().await?;
        Ok(statuses
            .first()
            .map(|s| s.code.clone())
            .unwrap_or_else(|| "new".to_string()))
    }
}
