use crate::lookup::{ReferenceKind, ReferenceTable};

use anyhow::Result;
use chrono::{Duration as TimeDelta, NaiveDateTime};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;
use tracing::debug;

pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Hand-driven clock; clones share the same instant.
#[derive(Clone, Debug)]
pub struct ManualClock(Rc<Cell<NaiveDateTime>>);

impl ManualClock {
    pub fn new(at: NaiveDateTime) -> Self {
        ManualClock(Rc::new(Cell::new(at)))
    }

    pub fn set(&self, at: NaiveDateTime) {
        self.0.set(at);
    }

    pub fn advance(&self, secs: i64) {
        self.0.set(self.0.get() + TimeDelta::seconds(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.0.get()
    }
}

/// Host key/value cache with per-entry time-to-live.
pub trait CacheStore {
    fn get(&self, key: &str) -> Option<ReferenceTable>;
    fn put(&mut self, key: &str, value: ReferenceTable, ttl: Duration);
    fn remove(&mut self, key: &str);
}

#[derive(Debug)]
struct Slot {
    stored_at: NaiveDateTime,
    ttl: Duration,
    value: ReferenceTable,
}

/// In-process [`CacheStore`] whose entries expire against a [`Clock`].
#[derive(Debug, Default)]
pub struct MemoryCache<C: Clock = SystemClock> {
    clock: C,
    slots: HashMap<String, Slot>,
}

impl MemoryCache<SystemClock> {
    pub fn new() -> Self {
        Default::default()
    }
}

impl<C: Clock> MemoryCache<C> {
    pub fn with_clock(clock: C) -> Self {
        MemoryCache {
            clock,
            slots: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<C: Clock> CacheStore for MemoryCache<C> {
    fn get(&self, key: &str) -> Option<ReferenceTable> {
        let slot = self.slots.get(key)?;
        // an instant before `stored_at` means the clock moved back, keep the entry
        let fresh = match (self.clock.now() - slot.stored_at).to_std() {
            Ok(age) => age < slot.ttl,
            Err(_) => true,
        };
        fresh.then(|| slot.value.clone())
    }

    fn put(&mut self, key: &str, value: ReferenceTable, ttl: Duration) {
        self.slots.insert(
            key.to_string(),
            Slot {
                stored_at: self.clock.now(),
                ttl,
                value,
            },
        );
    }

    fn remove(&mut self, key: &str) {
        self.slots.remove(key);
    }
}

/// Memoizes reference-table reads for a fixed time-to-live.
pub struct ReferenceCache<S: CacheStore> {
    store: S,
    ttl: Duration,
}

impl<S: CacheStore> ReferenceCache<S> {
    pub fn new(store: S, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }

    /// Cached table of `kind`, or a fresh one from `load`. Empty reads are
    /// returned but not remembered.
    pub fn get<F>(&mut self, kind: ReferenceKind, load: F) -> Result<ReferenceTable>
    where
        F: FnOnce() -> Result<ReferenceTable>,
    {
        if let Some(table) = self.store.get(kind.cache_key()) {
            debug!(%kind, rows = table.len(), "reference cache hit");
            return Ok(table);
        }

        let table = load()?;
        debug!(%kind, rows = table.len(), "reference cache miss");
        if !table.is_empty() {
            self.store.put(kind.cache_key(), table.clone(), self.ttl);
        }
        Ok(table)
    }

    pub fn invalidate(&mut self) {
        for kind in ReferenceKind::ALL {
            self.store.remove(kind.cache_key());
        }
    }
}
