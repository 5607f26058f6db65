// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Compute dispatch.
//!
//! One entry point per structural change. The dispatcher tries, in order:
//! session-cache hit, synchronous composition for small graphs, background
//! result cache, background computation (worker task or remote service)
//! with a bounded wait, and finally a transparent synchronous fallback —
//! the worst case is a full but correct main-thread recomputation, never a
//! user-visible failure.
//!
//! The dispatcher is the single owner of the retained per-graph state and
//! of the cache service; background contexts only ever see serialized
//! payloads and answer over their own channels.

pub mod remote;
pub mod worker;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::cache::CacheService;
use crate::compositor::{compose, ComposeInput};
use crate::config::EngineConfig;
use crate::diff::{GraphDiff, GraphSnapshot};
use crate::model::{GraphId, PositionMap, RequestId, StoryGraph};
use crate::query::{analyze_graph, GraphAnalysis};

pub use remote::{RemoteError, RemoteLayoutRequest, RemoteLayoutResponse, RemoteLayoutService};
pub use worker::{spawn_layout_worker, LayoutReply, LayoutRequest, WorkerHandle};

/// Result of one dispatch: the position map plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    pub positions: PositionMap,
    pub from_cache: bool,
    pub structural_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The structure changed again while this computation was pending; the
    /// stale result was discarded rather than merged.
    Cancelled { structural_hash: String },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled { structural_hash } => {
                write!(f, "pending layout request cancelled for {structural_hash}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

#[derive(Debug)]
struct GraphState {
    snapshot: GraphSnapshot,
    positions: PositionMap,
}

pub struct ComputeDispatcher {
    config: EngineConfig,
    caches: CacheService,
    worker: Option<WorkerHandle>,
    remote: Option<Arc<dyn RemoteLayoutService>>,
    states: BTreeMap<GraphId, GraphState>,
    cancelled: BTreeSet<String>,
    next_request: u64,
}

impl ComputeDispatcher {
    pub fn new(config: EngineConfig) -> Self {
        let caches = CacheService::new(config.cache.clone());
        Self {
            config,
            caches,
            worker: None,
            remote: None,
            states: BTreeMap::new(),
            cancelled: BTreeSet::new(),
            next_request: 0,
        }
    }

    pub fn with_worker(mut self, worker: WorkerHandle) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteLayoutService>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The one synchronous-shape entry point: returns the position map for
    /// the graph's current structure, computing as little as possible.
    pub async fn compute_or_fetch(
        &mut self,
        graph: &StoryGraph,
    ) -> Result<PositionUpdate, DispatchError> {
        let analysis = analyze_graph(graph);
        let snapshot = GraphSnapshot::capture(graph, &analysis);
        let structural_hash = snapshot.structural_hash().to_owned();

        // A fresh request supersedes any earlier cancellation of this hash.
        self.cancelled.remove(&structural_hash);

        // Tier 1: session cache, validated by topology alone. A cached map
        // computed under a wider collapse state may not cover everything
        // now visible (the topology signature ignores collapse markers);
        // such a hit is treated as a miss and recomputed.
        if let Some(cached) = self
            .caches
            .get_session(graph.graph_id(), snapshot.topology_signature())
        {
            if covers_visible(&cached, graph, &analysis) {
                let positions = filter_visible(cached, graph, &analysis);
                tracing::debug!(graph_id = %graph.graph_id(), "session cache hit");
                self.states.insert(
                    graph.graph_id().clone(),
                    GraphState {
                        snapshot,
                        positions: positions.clone(),
                    },
                );
                return Ok(PositionUpdate {
                    positions,
                    from_cache: true,
                    structural_hash,
                });
            }
            tracing::debug!(
                graph_id = %graph.graph_id(),
                "session entry does not cover the visible set, recomputing"
            );
        }

        let visible_count = graph.cards().len().saturating_sub(analysis.hidden.len());

        // Tier 2: small graphs are cheaper to compute than to dispatch.
        if visible_count < self.config.dispatch.small_graph_threshold {
            let positions = self.compose_sync(graph, &analysis, &snapshot);
            return Ok(self.finish(graph, &analysis, snapshot, positions, false));
        }

        // Tier 3: background result caches.
        if let Some(cached) = self.caches.get_worker(&structural_hash) {
            tracing::debug!(graph_id = %graph.graph_id(), "worker result cache hit");
            return Ok(self.finish(graph, &analysis, snapshot, cached, true));
        }

        if let Some(remote) = self.remote.clone() {
            if let Some(cached) = self
                .caches
                .get_remote(graph.graph_id(), &structural_hash)
            {
                tracing::debug!(graph_id = %graph.graph_id(), "remote result cache hit");
                return Ok(self.finish(graph, &analysis, snapshot, cached, true));
            }

            match self.dispatch_remote(&remote, graph, &structural_hash).await {
                Ok(Some(positions)) => {
                    self.caches.put_remote(
                        graph.graph_id().clone(),
                        positions.clone(),
                        &structural_hash,
                    );
                    return Ok(self.finish(graph, &analysis, snapshot, positions, false));
                }
                Ok(None) => {}
                Err(err) => return Err(err),
            }
        } else if let Some(worker) = self.worker.clone() {
            match self
                .dispatch_worker(&worker, graph, &structural_hash)
                .await
            {
                Ok(Some((positions, compute_time_ms))) => {
                    tracing::debug!(
                        graph_id = %graph.graph_id(),
                        compute_time_ms,
                        "background layout complete"
                    );
                    self.caches.put_worker(&structural_hash, positions.clone());
                    return Ok(self.finish(graph, &analysis, snapshot, positions, false));
                }
                Ok(None) => {}
                Err(err) => return Err(err),
            }
        }

        // Tier 4: transparent synchronous fallback.
        let positions = self.compose_sync(graph, &analysis, &snapshot);
        Ok(self.finish(graph, &analysis, snapshot, positions, false))
    }

    /// Marks any in-flight computation for this structure as stale; its
    /// result will be discarded instead of merged.
    pub fn cancel_pending(&mut self, structural_hash: &str) {
        self.cancelled.insert(structural_hash.to_owned());
    }

    pub async fn invalidate(&mut self, graph_id: &GraphId) {
        self.caches.invalidate(graph_id);
        self.states.remove(graph_id);
        if let Some(remote) = self.remote.clone() {
            if let Err(err) = remote.invalidate(graph_id).await {
                tracing::warn!(%graph_id, error = %err, "remote invalidation failed");
            }
        }
    }

    pub fn invalidate_all(&mut self) {
        self.caches.dispose_all();
        self.states.clear();
    }

    /// Remote round trip with the configured bound. `Ok(None)` means "fall
    /// back to synchronous computation".
    async fn dispatch_remote(
        &mut self,
        remote: &Arc<dyn RemoteLayoutService>,
        graph: &StoryGraph,
        structural_hash: &str,
    ) -> Result<Option<PositionMap>, DispatchError> {
        let request = RemoteLayoutRequest {
            graph_id: graph.graph_id().clone(),
            cards: graph.cards().values().cloned().collect(),
            choices: graph.choices().values().cloned().collect(),
            root_card_id: graph.root_card_id().cloned(),
            collapsed: graph.collapsed().iter().cloned().collect(),
            structural_hash: structural_hash.to_owned(),
        };

        let outcome =
            tokio::time::timeout(self.config.dispatch.worker_timeout, remote.compute(request))
                .await;

        if self.cancelled.remove(structural_hash) {
            return Err(DispatchError::Cancelled {
                structural_hash: structural_hash.to_owned(),
            });
        }

        match outcome {
            Ok(Ok(response)) => {
                if response.structural_hash != structural_hash {
                    tracing::warn!(graph_id = %graph.graph_id(), "remote reply hash mismatch, discarding");
                    return Ok(None);
                }
                Ok(Some(response.positions))
            }
            Ok(Err(err)) => {
                tracing::warn!(graph_id = %graph.graph_id(), error = %err, "remote layout failed, computing locally");
                Ok(None)
            }
            Err(_) => {
                tracing::warn!(graph_id = %graph.graph_id(), "remote layout timed out, computing locally");
                Ok(None)
            }
        }
    }

    async fn dispatch_worker(
        &mut self,
        worker: &WorkerHandle,
        graph: &StoryGraph,
        structural_hash: &str,
    ) -> Result<Option<(PositionMap, u64)>, DispatchError> {
        let request_id = self.next_request_id();
        let request = LayoutRequest {
            request_id,
            cards: graph.cards().values().cloned().collect(),
            choices: graph.choices().values().cloned().collect(),
            root_card_id: graph.root_card_id().cloned(),
            collapsed: graph.collapsed().iter().cloned().collect(),
            structural_hash: structural_hash.to_owned(),
        };

        let outcome =
            tokio::time::timeout(self.config.dispatch.worker_timeout, worker.submit(request))
                .await;

        if self.cancelled.remove(structural_hash) {
            return Err(DispatchError::Cancelled {
                structural_hash: structural_hash.to_owned(),
            });
        }

        match outcome {
            Ok(Some(LayoutReply::Positions {
                positions,
                structural_hash: reply_hash,
                compute_time_ms,
                ..
            })) => {
                if reply_hash != structural_hash {
                    tracing::warn!(graph_id = %graph.graph_id(), "worker reply hash mismatch, discarding");
                    return Ok(None);
                }
                Ok(Some((positions, compute_time_ms)))
            }
            Ok(Some(LayoutReply::Error { message, .. })) => {
                tracing::warn!(graph_id = %graph.graph_id(), %message, "worker layout failed, computing locally");
                Ok(None)
            }
            Ok(None) => {
                tracing::warn!(graph_id = %graph.graph_id(), "layout worker unavailable, computing locally");
                Ok(None)
            }
            Err(_) => {
                tracing::warn!(graph_id = %graph.graph_id(), "layout worker timed out, computing locally");
                Ok(None)
            }
        }
    }

    fn compose_sync(
        &mut self,
        graph: &StoryGraph,
        analysis: &GraphAnalysis,
        snapshot: &GraphSnapshot,
    ) -> PositionMap {
        let state = self.states.get(graph.graph_id());
        let diff = GraphDiff::between(
            state.map(|s| &s.snapshot),
            snapshot,
            &self.config.full_layout,
        );
        let outcome = compose(&ComposeInput {
            graph,
            analysis,
            snapshot,
            diff: &diff,
            previous_positions: state.map(|s| &s.positions),
            config: &self.config,
        });
        tracing::debug!(
            graph_id = %graph.graph_id(),
            strategy = ?outcome.strategy,
            nodes = outcome.positions.len(),
            "composed layout"
        );
        outcome.positions
    }

    /// Write-through and retained-state update on every successful path.
    fn finish(
        &mut self,
        graph: &StoryGraph,
        analysis: &GraphAnalysis,
        snapshot: GraphSnapshot,
        positions: PositionMap,
        from_cache: bool,
    ) -> PositionUpdate {
        let positions = filter_visible(positions, graph, analysis);
        let structural_hash = snapshot.structural_hash().to_owned();

        self.caches.put_session(
            graph.graph_id().clone(),
            positions.clone(),
            snapshot.topology_signature(),
        );
        self.states.insert(
            graph.graph_id().clone(),
            GraphState {
                snapshot,
                positions: positions.clone(),
            },
        );

        PositionUpdate {
            positions,
            from_cache,
            structural_hash,
        }
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId::new(format!("req-{}", self.next_request)).expect("request id is non-empty")
    }
}

/// Whether a cached position map has an entry for every currently visible
/// card. Maps computed while more of the graph was collapsed do not.
fn covers_visible(
    positions: &PositionMap,
    graph: &StoryGraph,
    analysis: &GraphAnalysis,
) -> bool {
    graph
        .cards()
        .keys()
        .filter(|card_id| analysis.is_visible(card_id))
        .all(|card_id| positions.contains_key(card_id))
}

/// Positions may only ever name currently visible cards; anything cached
/// from a different collapse state is filtered here.
fn filter_visible(
    mut positions: PositionMap,
    graph: &StoryGraph,
    analysis: &GraphAnalysis,
) -> PositionMap {
    positions.retain(|card_id, _| graph.cards().contains_key(card_id) && analysis.is_visible(card_id));
    positions
}
