// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Background layout worker.
//!
//! The worker runs as an isolated tokio task: requests and replies cross the
//! channel as plain serializable records, never shared references, so there
//! is no shared mutable state to lock. Each request carries a correlation id
//! and is answered over its own oneshot channel.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::compositor::{compose, ComposeInput};
use crate::config::EngineConfig;
use crate::diff::{GraphDiff, GraphSnapshot};
use crate::model::{Card, CardId, Choice, GraphId, PositionMap, RequestId, StoryGraph};
use crate::query::analyze_graph;

/// Full payload for one background layout computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutRequest {
    pub request_id: RequestId,
    pub cards: Vec<Card>,
    pub choices: Vec<Choice>,
    pub root_card_id: Option<CardId>,
    pub collapsed: Vec<CardId>,
    pub structural_hash: String,
}

/// Correlated worker reply: positions or an error record, never a panic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutReply {
    Positions {
        request_id: RequestId,
        positions: PositionMap,
        structural_hash: String,
        compute_time_ms: u64,
    },
    Error {
        request_id: RequestId,
        message: String,
    },
}

struct WorkerMessage {
    request: LayoutRequest,
    reply: oneshot::Sender<LayoutReply>,
}

/// Cheap-to-clone handle to the worker task. Dropping every handle closes
/// the channel and the task drains and exits.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<WorkerMessage>,
}

impl WorkerHandle {
    /// Sends one request and awaits its correlated reply. Fails only when
    /// the worker task is gone; the caller treats that as "background
    /// context unavailable" and falls back to synchronous computation.
    pub async fn submit(&self, request: LayoutRequest) -> Option<LayoutReply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let message = WorkerMessage {
            request,
            reply: reply_tx,
        };
        if self.tx.send(message).await.is_err() {
            return None;
        }
        reply_rx.await.ok()
    }
}

/// Spawns the worker task on the current tokio runtime.
pub fn spawn_layout_worker(config: EngineConfig) -> WorkerHandle {
    let (tx, mut rx) = mpsc::channel::<WorkerMessage>(32);

    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let reply = compute_reply(&config, message.request);
            // A closed reply channel means the requester gave up (timeout or
            // cancellation); the result is simply dropped.
            let _ = message.reply.send(reply);
        }
    });

    WorkerHandle { tx }
}

fn compute_reply(config: &EngineConfig, request: LayoutRequest) -> LayoutReply {
    let started = Instant::now();
    let request_id = request.request_id.clone();
    let structural_hash = request.structural_hash.clone();

    let graph = match rebuild_graph(request) {
        Ok(graph) => graph,
        Err(message) => {
            return LayoutReply::Error {
                request_id,
                message,
            }
        }
    };

    // The worker holds no prior state, so every reply is a full layout over
    // the visible subgraph; results are keyed by full structural hash.
    let analysis = analyze_graph(&graph);
    let snapshot = GraphSnapshot::capture(&graph, &analysis);
    let diff = GraphDiff::between(None, &snapshot, &config.full_layout);
    let outcome = compose(&ComposeInput {
        graph: &graph,
        analysis: &analysis,
        snapshot: &snapshot,
        diff: &diff,
        previous_positions: None,
        config,
    });

    LayoutReply::Positions {
        request_id,
        positions: outcome.positions,
        structural_hash,
        compute_time_ms: started.elapsed().as_millis() as u64,
    }
}

fn rebuild_graph(request: LayoutRequest) -> Result<StoryGraph, String> {
    let graph_id = GraphId::new(format!("bg-{}", request.request_id))
        .map_err(|err| format!("invalid request id: {err}"))?;
    let mut graph = StoryGraph::new(graph_id);
    for card in request.cards {
        graph.insert_card(card);
    }
    for choice in request.choices {
        graph.insert_choice(choice);
    }
    graph.set_root_card_id(request.root_card_id);
    for collapsed in request.collapsed {
        graph.collapsed_mut().insert(collapsed);
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::{spawn_layout_worker, LayoutReply, LayoutRequest};
    use crate::config::EngineConfig;
    use crate::model::{Card, CardId, Choice, ChoiceId, RequestId};

    fn card_id(raw: &str) -> CardId {
        CardId::new(raw).unwrap()
    }

    fn request(id: &str) -> LayoutRequest {
        LayoutRequest {
            request_id: RequestId::new(id).unwrap(),
            cards: vec![
                Card::new(card_id("a"), "Root"),
                Card::new(card_id("b"), "Leaf"),
            ],
            choices: vec![Choice::new(
                ChoiceId::new("e1").unwrap(),
                card_id("a"),
                Some(card_id("b")),
                0,
            )],
            root_card_id: Some(card_id("a")),
            collapsed: Vec::new(),
            structural_hash: "hash-1".to_owned(),
        }
    }

    #[tokio::test]
    async fn worker_replies_with_correlated_positions() {
        let worker = spawn_layout_worker(EngineConfig::default());
        let reply = worker.submit(request("req-1")).await.expect("reply");

        match reply {
            LayoutReply::Positions {
                request_id,
                positions,
                structural_hash,
                ..
            } => {
                assert_eq!(request_id.as_str(), "req-1");
                assert_eq!(structural_hash, "hash-1");
                assert_eq!(positions.len(), 2);
            }
            LayoutReply::Error { message, .. } => panic!("unexpected error: {message}"),
        }
    }

    #[tokio::test]
    async fn worker_serves_sequential_requests_independently() {
        let worker = spawn_layout_worker(EngineConfig::default());
        for idx in 0..3 {
            let reply = worker
                .submit(request(&format!("req-{idx}")))
                .await
                .expect("reply");
            let LayoutReply::Positions { request_id, .. } = reply else {
                panic!("expected positions");
            };
            assert_eq!(request_id.as_str(), format!("req-{idx}"));
        }
    }

    #[test]
    fn request_round_trips_through_serde() {
        let original = request("req-serde");
        let json = serde_json::to_string(&original).unwrap();
        let back: LayoutRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.request_id, original.request_id);
        assert_eq!(back.cards.len(), 2);
        assert_eq!(back.structural_hash, "hash-1");
    }
}
