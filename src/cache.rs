use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};

/// Time source for TTL checks and "today" computations.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

struct Entry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// Keyed cache whose entries expire `ttl` after they were stored.
///
/// An entry is served only while `now - stored_at < ttl`; expired entries
/// are dropped on lookup. Concurrent writers may overwrite each other, which
/// only costs a redundant recomputation.
pub struct ResultCache<V, C: Clock = SystemClock> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    ttl: Duration,
    clock: C,
}

impl<V: Clone, C: Clock> ResultCache<V, C> {
    pub fn new(ttl: Duration, clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if now - entry.stored_at < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                log::debug!("Cache entry {key} expired");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value` under `key`, stamped with the current time.
    pub fn set(&self, key: &str, value: V) -> DateTime<Utc> {
        let stored_at = self.clock.now();
        self.set_at(key, value, stored_at);
        stored_at
    }

    /// Store `value` under `key` with an explicit timestamp, so the entry
    /// expires `ttl` after the moment the value describes.
    pub fn set_at(&self, key: &str, value: V, stored_at: DateTime<Utc>) {
        self.lock().insert(key.to_string(), Entry { value, stored_at });
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
