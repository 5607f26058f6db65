// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The three-tier layout cache.
//!
//! Three independent bounded tables with different keys and lifetimes:
//! a session table validated by edge topology alone, a remote-result table
//! validated by full structural hash plus TTL, and a worker-result table
//! keyed by structural hash with the same TTL. Staleness is detected purely
//! by signature mismatch or expiry; stale entries are evicted on read, never
//! surfaced as errors.
//!
//! `CacheService` is a constructed object owned by the dispatcher (or the
//! application's composition root) — deliberately not module-level state.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::config::CacheConfig;
use crate::model::{GraphId, PositionMap};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    signature: String,
    inserted_at: Instant,
    ttl: Option<Duration>,
    seq: u64,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self) -> bool {
        match self.ttl {
            Some(ttl) => self.inserted_at.elapsed() >= ttl,
            None => false,
        }
    }
}

/// Bounded map with oldest-first batch eviction.
///
/// When full, roughly `evict_fraction` of the entries (oldest insertion
/// first, key order as tiebreak) are dropped in one sweep, so long editing
/// sessions cannot grow the tables without bound.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    entries: BTreeMap<K, CacheEntry<V>>,
    capacity: usize,
    evict_fraction: f64,
    next_seq: u64,
}

impl<K: Ord + Clone, V> BoundedCache<K, V> {
    pub fn new(capacity: usize, evict_fraction: f64) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity: capacity.max(1),
            evict_fraction: evict_fraction.clamp(0.0, 1.0),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cached value only if the stored signature matches and the
    /// entry has not expired; otherwise the entry is evicted on the spot.
    pub fn get(&mut self, key: &K, expected_signature: &str) -> Option<&V> {
        let valid = match self.entries.get(key) {
            Some(entry) => entry.signature == expected_signature && !entry.is_expired(),
            None => return None,
        };
        if !valid {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| &entry.value)
    }

    pub fn insert(
        &mut self,
        key: K,
        value: V,
        signature: impl Into<String>,
        ttl: Option<Duration>,
    ) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest_batch();
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            key,
            CacheEntry {
                value,
                signature: signature.into(),
                inserted_at: Instant::now(),
                ttl,
                seq,
            },
        );
    }

    pub fn remove(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict_oldest_batch(&mut self) {
        let batch = ((self.capacity as f64 * self.evict_fraction).ceil() as usize).max(1);

        let mut order: Vec<(u64, K)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.seq, key.clone()))
            .collect();
        order.sort();

        for (_, key) in order.into_iter().take(batch) {
            self.entries.remove(&key);
        }
    }
}

/// All three tables behind one owner with an explicit lifecycle.
#[derive(Debug)]
pub struct CacheService {
    config: CacheConfig,
    session: BoundedCache<GraphId, PositionMap>,
    remote: BoundedCache<GraphId, PositionMap>,
    worker: BoundedCache<String, PositionMap>,
}

impl CacheService {
    pub fn new(config: CacheConfig) -> Self {
        let session = BoundedCache::new(config.session_capacity, config.evict_fraction);
        let remote = BoundedCache::new(config.remote_capacity, config.evict_fraction);
        let worker = BoundedCache::new(config.worker_capacity, config.evict_fraction);
        Self {
            config,
            session,
            remote,
            worker,
        }
    }

    /// Session tier: survives every non-structural edit for the lifetime of
    /// an editing session. Validity is the edge-topology signature *only* —
    /// a title edit that changes a card's estimated width serves stale
    /// geometry until the next structural change. Known trade-off: fixing it
    /// would couple the topology key to dimension inputs and defeat the
    /// table's purpose.
    pub fn get_session(&mut self, graph_id: &GraphId, topology_signature: &str) -> Option<PositionMap> {
        self.session.get(graph_id, topology_signature).cloned()
    }

    pub fn put_session(
        &mut self,
        graph_id: GraphId,
        positions: PositionMap,
        topology_signature: &str,
    ) {
        self.session
            .insert(graph_id, positions, topology_signature, None);
    }

    /// Remote tier: results computed out-of-process, validated by the full
    /// structural hash and aged out by TTL.
    pub fn get_remote(&mut self, graph_id: &GraphId, structural_hash: &str) -> Option<PositionMap> {
        self.remote.get(graph_id, structural_hash).cloned()
    }

    pub fn put_remote(&mut self, graph_id: GraphId, positions: PositionMap, structural_hash: &str) {
        let ttl = Some(self.config.result_ttl);
        self.remote
            .insert(graph_id, positions, structural_hash, ttl);
    }

    /// Worker tier: background-thread results keyed by structural hash, so
    /// an unchanged structure never makes a second round-trip.
    pub fn get_worker(&mut self, structural_hash: &str) -> Option<PositionMap> {
        self.worker
            .get(&structural_hash.to_owned(), structural_hash)
            .cloned()
    }

    pub fn put_worker(&mut self, structural_hash: &str, positions: PositionMap) {
        let ttl = Some(self.config.result_ttl);
        self.worker
            .insert(structural_hash.to_owned(), positions, structural_hash, ttl);
    }

    pub fn invalidate(&mut self, graph_id: &GraphId) {
        self.session.remove(graph_id);
        self.remote.remove(graph_id);
    }

    pub fn dispose_all(&mut self) {
        self.session.clear();
        self.remote.clear();
        self.worker.clear();
    }

    pub fn session_len(&self) -> usize {
        self.session.len()
    }

    pub fn remote_len(&self) -> usize {
        self.remote.len()
    }

    pub fn worker_len(&self) -> usize {
        self.worker.len()
    }
}
