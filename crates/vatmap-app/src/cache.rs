//! Detail record cache.
//!
//! Detail fetches are on-demand and repeated every refresh while a
//! selection is open, so recent records are kept warm. Entries age out
//! and the map is capped so an afternoon of browsing traffic does not
//! grow without bound.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use vatmap_feed::EntityDetail;

const DEFAULT_MAX_ENTRIES: usize = 256;
const DEFAULT_MAX_AGE: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
struct CachedDetail {
    detail: EntityDetail,
    fetched_at: Instant,
}

#[derive(Debug)]
pub struct DetailCache {
    entries: DashMap<i64, CachedDetail>,
    max_entries: usize,
    max_age: Duration,
}

impl Default for DetailCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, DEFAULT_MAX_AGE)
    }
}

impl DetailCache {
    pub fn new(max_entries: usize, max_age: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            max_age,
        }
    }

    pub fn insert(&self, detail: EntityDetail) {
        self.entries.insert(
            detail.id,
            CachedDetail {
                detail,
                fetched_at: Instant::now(),
            },
        );
        self.prune();
    }

    /// Fresh copy of a cached record, `None` once it has aged out.
    pub fn get(&self, id: i64) -> Option<EntityDetail> {
        let entry = self.entries.get(&id)?;
        if entry.fetched_at.elapsed() > self.max_age {
            drop(entry);
            self.entries.remove(&id);
            return None;
        }
        Some(entry.detail.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries, then oldest-first down to the cap.
    fn prune(&self) {
        self.entries
            .retain(|_, entry| entry.fetched_at.elapsed() <= self.max_age);

        let overflow = self.entries.len().saturating_sub(self.max_entries);
        if overflow == 0 {
            return;
        }
        let mut ages: Vec<(i64, Instant)> = self
            .entries
            .iter()
            .map(|entry| (*entry.key(), entry.fetched_at))
            .collect();
        ages.sort_by_key(|(_, fetched_at)| *fetched_at);
        for (id, _) in ages.into_iter().take(overflow) {
            self.entries.remove(&id);
        }
    }
}
