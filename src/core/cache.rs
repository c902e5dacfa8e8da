/// Per-session cache of per-sentence results, kept so a document can be
/// re-smoothed without being analyzed again.

use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::schema::emotion::EmotionVector;

/// Newtype wrapper for session (or request) IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bounded map from session to its most recent per-sentence vectors.
///
/// Storing for a session replaces what it held before. Once `capacity`
/// sessions are held, storing a new one evicts the least recently used.
/// Eviction is applied lazily; `run_pending_tasks` forces it.
#[derive(Debug)]
pub struct ResultCache {
    capacity: usize,
    inner: Cache<SessionId, Arc<Vec<EmotionVector>>>,
}

impl ResultCache {
    /// A cache holding at most `capacity` sessions (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let inner = Cache::builder()
            .max_capacity(capacity as u64)
            .eviction_policy(EvictionPolicy::lru())
            .eviction_listener(
                |session: Arc<SessionId>, _: Arc<Vec<EmotionVector>>, cause: RemovalCause| {
                    if cause.was_evicted() {
                        tracing::warn!("Result cache full, evicted session {}", session);
                    }
                },
            )
            .build();
        tracing::debug!("Result cache initialized with capacity {}", capacity);
        Self { capacity, inner }
    }

    /// Store `per_sentence` for `session`, replacing any earlier result.
    pub fn store(&self, session: SessionId, per_sentence: Vec<EmotionVector>) {
        self.inner.insert(session, Arc::new(per_sentence));
    }

    /// The cached vectors of `session`, marking it as recently used.
    pub fn get(&self, session: SessionId) -> Option<Arc<Vec<EmotionVector>>> {
        self.inner.get(&session)
    }

    pub fn contains(&self, session: SessionId) -> bool {
        self.inner.contains_key(&session)
    }

    pub fn remove(&self, session: SessionId) -> Option<Arc<Vec<EmotionVector>>> {
        self.inner.remove(&session)
    }

    /// Number of cached sessions; exact after `run_pending_tasks`.
    pub fn len(&self) -> usize {
        self.inner.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Apply pending evictions and bookkeeping now.
    pub fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks();
    }
}
