//! Query cache shared by everything that reads intake data.
//!
//! Reads go through [`QueryCache::fetch`]; mutations call the `invalidate_*` helpers so the
//! next read of an affected key goes back to the store. Invalidation only marks entries
//! stale, it never serializes writers: two concurrent mutations of one form still race at
//! the store and the last write wins.
//!
//! The cache holds at most `max_entries` keys. When a fill goes over that bound, stale and
//! expired entries are dropped first, then the oldest fresh ones.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::intake::domain::{IntakeForm, IntakeId, IntakeScore};
use crate::intake::query::IntakeQuery;

/// Cache keys, mirroring the collection/individual split of the intake tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    IntakeForms(IntakeQuery),
    IntakeForm(IntakeId),
    IntakeScore(IntakeId),
}

#[derive(Debug, Clone)]
pub enum CachedValue {
    Forms(Vec<IntakeForm>),
    Form(Option<IntakeForm>),
    Score(Option<IntakeScore>),
}

/// Values that can live in the cache.
pub trait Cacheable: Clone {
    fn into_cached(self) -> CachedValue;
    fn from_cached(value: &CachedValue) -> Option<Self>;
}

impl Cacheable for Vec<IntakeForm> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Forms(self)
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::Forms(forms) => Some(forms.clone()),
            _ => None,
        }
    }
}

impl Cacheable for Option<IntakeForm> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Form(self)
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::Form(form) => Some(form.clone()),
            _ => None,
        }
    }
}

impl Cacheable for Option<IntakeScore> {
    fn into_cached(self) -> CachedValue {
        CachedValue::Score(self)
    }

    fn from_cached(value: &CachedValue) -> Option<Self> {
        match value {
            CachedValue::Score(score) => Some(score.clone()),
            _ => None,
        }
    }
}

struct CacheEntry {
    value: CachedValue,
    stored_at: Instant,
    stale: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub evictions: u64,
}

pub struct QueryCache {
    entries: DashMap<QueryKey, CacheEntry>,
    config: CacheConfig,
    // bumped on every invalidation; a load that straddles one is not stored
    epoch: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
    evictions: AtomicU64,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            epoch: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        entry.stale || entry.stored_at.elapsed() >= self.config.fresh_for
    }

    /// Fresh cached value for `key`, if any.
    pub fn get<T: Cacheable>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        if self.is_expired(&entry) {
            return None;
        }
        T::from_cached(&entry.value)
    }

    /// Cached value for `key` even when stale.
    pub fn peek<T: Cacheable>(&self, key: &QueryKey) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|entry| T::from_cached(&entry.value))
    }

    pub fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        self.entries.get(key).map(|entry| self.is_expired(&entry))
    }

    pub fn put<T: Cacheable>(&self, key: QueryKey, value: T) {
        self.entries.insert(
            key,
            CacheEntry {
                value: value.into_cached(),
                stored_at: Instant::now(),
                stale: false,
            },
        );
        if self.entries.len() > self.config.max_entries {
            self.evict();
        }
    }

    fn evict(&self) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !self.is_expired(entry));

        let excess = self.entries.len().saturating_sub(self.config.max_entries);
        if excess > 0 {
            let mut by_age: Vec<(QueryKey, Instant)> = self
                .entries
                .iter()
                .map(|entry| (entry.key().clone(), entry.stored_at))
                .collect();
            by_age.sort_by_key(|(_, stored_at)| *stored_at);
            for (key, _) in by_age.into_iter().take(excess) {
                self.entries.remove(&key);
            }
        }

        let evicted = before.saturating_sub(self.entries.len());
        self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
        debug!(evicted, remaining = self.entries.len(), "evicted cache entries");
    }

    /// Mark one key stale. Returns whether an entry existed.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    /// Mark every key matching `predicate` stale and return how many were touched.
    pub fn invalidate_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&QueryKey) -> bool,
    {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        let mut touched = 0;
        for mut entry in self.entries.iter_mut() {
            if predicate(entry.key()) {
                entry.stale = true;
                touched += 1;
            }
        }
        touched
    }

    /// After a form mutation: the form itself and every form collection.
    pub fn invalidate_form(&self, id: &IntakeId) {
        self.invalidate(&QueryKey::IntakeForm(id.clone()));
        self.invalidate_where(|key| matches!(key, QueryKey::IntakeForms(_)));
        debug!(intake_id = %id, "invalidated form queries");
    }

    /// After a score mutation: the score, its form, and every form collection.
    pub fn invalidate_score(&self, form_id: &IntakeId) {
        self.invalidate(&QueryKey::IntakeScore(form_id.clone()));
        self.invalidate_form(form_id);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Serve `key` from cache when fresh, otherwise run `loader`, retrying failed loads up
    /// to the configured read retry count.
    pub async fn fetch<T, E, F, Fut>(&self, key: QueryKey, mut loader: F) -> Result<T, E>
    where
        T: Cacheable,
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let epoch = self.epoch.load(Ordering::Acquire);
        let mut attempt: u8 = 0;
        let value = loop {
            match loader().await {
                Ok(value) => break value,
                Err(err) if attempt < self.config.read_retries => {
                    attempt += 1;
                    warn!(?key, attempt, error = %err, "query failed, retrying");
                }
                Err(err) => return Err(err),
            }
        };

        if self.epoch.load(Ordering::Acquire) == epoch {
            self.put(key, value.clone());
        } else {
            debug!(?key, "skipping cache fill after concurrent invalidation");
        }
        Ok(value)
    }
}
