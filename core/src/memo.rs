//! Memoization of aggregation results.
//!
//! Keys are (SHA-256 of the master table content, parameter string).
//! A hit returns a clone of the stored value; a miss recomputes. Results
//! are pure functions of their key, so a miss is always safe.
//!
//! RULE: A cache holds at most `capacity` entries. Inserting past that
//! evicts the oldest entry first.

use crate::table::MasterTable;
use std::collections::{HashMap, VecDeque};

/// Entries kept per cache unless a capacity is given.
pub const DEFAULT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoKey {
    pub content_hash: String,
    pub params: String,
}

impl MemoKey {
    pub fn new(master: &MasterTable, params: impl Into<String>) -> Self {
        Self {
            content_hash: master.content_hash(),
            params: params.into(),
        }
    }
}

pub struct MemoCache<V> {
    entries: HashMap<MemoKey, V>,
    /// Insertion order, oldest first.
    order: VecDeque<MemoKey>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl<V: Clone> Default for MemoCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> MemoCache<V> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A cache bounded to `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    /// Return the cached value for `key`, or compute and store it.
    /// Errors are returned as-is and never cached.
    pub fn get_or_try_insert<E, F>(&mut self, key: MemoKey, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(v) = self.entries.get(&key) {
            self.hits += 1;
            let short = &key.content_hash[..12.min(key.content_hash.len())];
            log::debug!("memo: hit {short}:{}", key.params);
            return Ok(v.clone());
        }
        self.misses += 1;
        let value = compute()?;
        while self.order.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
