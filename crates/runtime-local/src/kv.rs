use std::{
    collections::BinaryHeap,
    sync::Arc,
    time::{Duration, SystemTime},
};

use bytes::Bytes;
use futures_util::lock::Mutex;
use indexmap::IndexMap;
use runtime::{
    kv::{KvResult, KvStoreInner},
    time::{Clock, SystemClock},
};

/// An in-memory key-value store with per-entry expiration and an optional bound on the number
/// of entries, evicting the least recently used one when full.
pub struct InMemoryKvStore {
    inner: Mutex<StoreInner>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        InMemoryKvStore {
            inner: Mutex::new(StoreInner::new(Arc::new(clock), None)),
        }
    }

    #[must_use]
    pub fn with_capacity_limit(self, limit: usize) -> Self {
        let mut inner = self.inner.into_inner();
        inner.capacity = Some(limit);
        InMemoryKvStore {
            inner: Mutex::new(inner),
        }
    }

    pub async fn len(&self) -> usize {
        let mut inner = self.inner.lock().await;
        let now = inner.clock.now();
        inner.purge(now);
        inner.key_to_entry.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::with_clock(SystemClock)
    }
}

struct StoreInner {
    clock: Arc<dyn Clock>,
    capacity: Option<usize>,
    // insertion order doubles as recency order, most recent last
    key_to_entry: IndexMap<String, StoreEntry>,
    deletion_tasks: BinaryHeap<DeletionTask>,
}

struct StoreEntry {
    bytes: Bytes,
    expires_at: Option<SystemTime>,
}

#[derive(Debug, PartialEq, Eq)]
struct DeletionTask {
    key: String,
    to_delete_at: SystemTime,
}

impl PartialOrd for DeletionTask {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeletionTask {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.to_delete_at.cmp(&other.to_delete_at).reverse()
    }
}

impl StoreInner {
    fn new(clock: Arc<dyn Clock>, capacity: Option<usize>) -> Self {
        StoreInner {
            clock,
            capacity,
            key_to_entry: IndexMap::new(),
            deletion_tasks: BinaryHeap::new(),
        }
    }

    fn purge(&mut self, now: SystemTime) {
        while let Some(task) = self.deletion_tasks.peek() {
            if task.to_delete_at > now {
                break;
            }
            let Some(DeletionTask { key, to_delete_at }) = self.deletion_tasks.pop() else {
                break;
            };
            // The key may have been overwritten since this task was scheduled.
            let expired = self
                .key_to_entry
                .get(&key)
                .is_some_and(|entry| entry.expires_at == Some(to_delete_at));
            if expired {
                self.key_to_entry.shift_remove(&key);
            }
        }
    }

    fn evict_overflow(&mut self) {
        let Some(capacity) = self.capacity else { return };
        while self.key_to_entry.len() > capacity {
            if let Some((key, _)) = self.key_to_entry.shift_remove_index(0) {
                tracing::debug!("Evicting {key} from the in-memory store");
            }
        }
    }
}

#[async_trait::async_trait]
impl KvStoreInner for InMemoryKvStore {
    async fn get(&self, name: &str) -> KvResult<Option<Bytes>> {
        let mut inner = self.inner.lock().await;
        let now = inner.clock.now();
        inner.purge(now);

        let Some((index, _, entry)) = inner.key_to_entry.get_full(name) else {
            return Ok(None);
        };
        let bytes = entry.bytes.clone();
        let last = inner.key_to_entry.len() - 1;
        inner.key_to_entry.move_index(index, last);

        Ok(Some(bytes))
    }

    async fn put(&self, name: &str, bytes: Bytes, expiration_ttl: Option<Duration>) -> KvResult<()> {
        let mut inner = self.inner.lock().await;
        let now = inner.clock.now();
        inner.purge(now);

        let expires_at = expiration_ttl.and_then(|ttl| now.checked_add(ttl));
        if let Some(to_delete_at) = expires_at {
            inner.deletion_tasks.push(DeletionTask {
                key: name.to_string(),
                to_delete_at,
            });
        }

        inner.key_to_entry.shift_remove(name);
        inner
            .key_to_entry
            .insert(name.to_string(), StoreEntry { bytes, expires_at });
        inner.evict_overflow();

        Ok(())
    }

    async fn delete(&self, name: &str) -> KvResult<()> {
        let mut inner = self.inner.lock().await;
        let now = inner.clock.now();
        inner.purge(now);
        inner.key_to_entry.shift_remove(name);
        Ok(())
    }
}
