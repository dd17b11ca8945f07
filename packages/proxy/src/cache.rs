//! In-memory TTL cache for successful GET responses.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::upstream::UpstreamResponse;

struct Entry {
    response: UpstreamResponse,
    stored_at: Instant,
}

/// Cached upstream responses keyed by the full forwarded URL.
///
/// Expired entries are dropped on lookup, and every insert sweeps out
/// all expired entries so distinct one-off URLs do not accumulate.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<BTreeMap<String, Entry>>,
}

impl ResponseCache {
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// How long entries stay fresh.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a fresh entry for `url`.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<UpstreamResponse> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let fresh = entries
            .get(url)
            .map(|entry| entry.stored_at.elapsed() < self.ttl)?;
        if fresh {
            return entries.get(url).map(|entry| entry.response.clone());
        }
        entries.remove(url);
        None
    }

    /// Stores `response` for `url`, replacing any older entry.
    pub fn insert(&self, url: String, response: UpstreamResponse) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        let evicted = before - entries.len();
        if evicted > 0 {
            log::debug!("Evicted {evicted} expired cache entries");
        }
        entries.insert(
            url,
            Entry {
                response,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of stored entries, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
