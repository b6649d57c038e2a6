use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Slot<V> {
    value: Option<V>,
    stored_at: Instant,
}

/// TTL-bounded memoizing store with single-flight get-or-compute,
/// independent of what is being cached. Entries expire lazily on
/// lookup; there is no background sweep.
///
/// Concurrent callers for the same key serialize on that key's slot:
/// the first one computes, the rest wait and get the stored value.
/// Different keys never block each other.
pub struct TtlCache<K, V> {
    ttl: Duration,
    slots: Mutex<HashMap<K, Arc<tokio::sync::Mutex<Slot<V>>>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value for `key` if fresh, otherwise run
    /// `compute` and store its result. At most one computation per key
    /// is in flight at any time.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let slot = {
            let mut slots = self.slots.lock().expect("cache map lock poisoned");
            slots
                .entry(key)
                .or_insert_with(|| {
                    Arc::new(tokio::sync::Mutex::new(Slot {
                        value: None,
                        stored_at: Instant::now(),
                    }))
                })
                .clone()
        };

        let mut guard = slot.lock().await;
        if let Some(value) = &guard.value {
            if guard.stored_at.elapsed() < self.ttl {
                log::debug!("cache hit");
                return value.clone();
            }
            log::debug!("cache entry expired, recomputing");
        }

        let value = compute().await;
        guard.value = Some(value.clone());
        guard.stored_at = Instant::now();
        value
    }

    /// Fresh (non-expired) value for `key`, if present. Does not
    /// wait on an in-flight computation.
    pub fn peek(&self, key: &K) -> Option<V> {
        let slots = self.slots.lock().expect("cache map lock poisoned");
        let slot = slots.get(key)?;
        let guard = slot.try_lock().ok()?;
        match &guard.value {
            Some(value) if guard.stored_at.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }
}
