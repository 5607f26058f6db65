// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{CardId, ChoiceId, StoryGraph};
use crate::query::{ChildList, GraphAnalysis};

/// Immutable structural capture of a graph at one instant.
///
/// Per-card hashes cover id, title *length*, and image presence — never
/// content, so content edits compare equal. All collections are sorted, so
/// two structurally identical graphs hash identically regardless of the
/// order their cards and choices arrived in.
///
/// Snapshots are only comparable when taken under the same node-dimension
/// policy; the engine takes all of them itself, so that holds by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSnapshot {
    card_ids: BTreeSet<CardId>,
    card_hashes: BTreeMap<CardId, String>,
    choice_ids: BTreeSet<ChoiceId>,
    choice_hashes: BTreeMap<ChoiceId, String>,
    /// Per-source signature over the sorted target set: O(1) to compare,
    /// changes exactly when the source's outgoing topology changes.
    adjacency_signatures: BTreeMap<CardId, String>,
    children: BTreeMap<CardId, ChildList>,
    root_card_id: Option<CardId>,
    topology_signature: String,
    structural_hash: String,
}

impl GraphSnapshot {
    pub fn capture(graph: &StoryGraph, analysis: &GraphAnalysis) -> Self {
        let card_ids: BTreeSet<CardId> = graph.cards().keys().cloned().collect();

        let card_hashes: BTreeMap<CardId, String> = graph
            .cards()
            .iter()
            .map(|(card_id, card)| {
                let mut buf = itoa::Buffer::new();
                let mut hash = String::with_capacity(card_id.as_str().len() + 8);
                hash.push_str(card_id.as_str());
                hash.push('|');
                hash.push_str(buf.format(card.title().chars().count()));
                hash.push('|');
                hash.push(if card.has_image() { '1' } else { '0' });
                (card_id.clone(), hash)
            })
            .collect();

        let choice_ids: BTreeSet<ChoiceId> = graph.choices().keys().cloned().collect();

        let choice_hashes: BTreeMap<ChoiceId, String> = graph
            .choices()
            .iter()
            .map(|(choice_id, choice)| (choice_id.clone(), choice_hash(choice)))
            .collect();

        let adjacency_signatures: BTreeMap<CardId, String> = analysis
            .children
            .iter()
            .map(|(source, child_list)| {
                let mut targets: Vec<&str> =
                    child_list.iter().map(|child| child.as_str()).collect();
                targets.sort_unstable();
                (source.clone(), targets.join(","))
            })
            .collect();

        let mut topology_parts: Vec<&String> = choice_hashes.values().collect();
        topology_parts.sort_unstable();
        let topology_signature = topology_parts
            .iter()
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join("|");

        let structural_hash = structural_hash(graph, &card_hashes, &topology_signature);

        Self {
            card_ids,
            card_hashes,
            choice_ids,
            choice_hashes,
            adjacency_signatures,
            children: analysis.children.clone(),
            root_card_id: graph.root_card_id().cloned(),
            topology_signature,
            structural_hash,
        }
    }

    pub fn card_ids(&self) -> &BTreeSet<CardId> {
        &self.card_ids
    }

    pub fn card_hash(&self, card_id: &CardId) -> Option<&str> {
        self.card_hashes.get(card_id).map(String::as_str)
    }

    pub fn choice_ids(&self) -> &BTreeSet<ChoiceId> {
        &self.choice_ids
    }

    pub fn choice_hash(&self, choice_id: &ChoiceId) -> Option<&str> {
        self.choice_hashes.get(choice_id).map(String::as_str)
    }

    pub fn adjacency_signature(&self, source: &CardId) -> Option<&str> {
        self.adjacency_signatures.get(source).map(String::as_str)
    }

    pub fn adjacency_signatures(&self) -> &BTreeMap<CardId, String> {
        &self.adjacency_signatures
    }

    pub fn children(&self) -> &BTreeMap<CardId, ChildList> {
        &self.children
    }

    pub fn root_card_id(&self) -> Option<&CardId> {
        self.root_card_id.as_ref()
    }

    /// Edge-topology-only signature: the session cache's validity key.
    /// Title and content edits leave it untouched.
    pub fn topology_signature(&self) -> &str {
        &self.topology_signature
    }

    /// Full structural hash over ids, titles, choices, root, and collapsed
    /// set. Stable across processes (FNV-1a 64, rendered as hex), so remote
    /// responders can echo it back for correlation.
    pub fn structural_hash(&self) -> &str {
        &self.structural_hash
    }
}

fn choice_hash(choice: &crate::model::Choice) -> String {
    let mut buf = itoa::Buffer::new();
    let target = choice
        .target_card_id()
        .map(|id| id.as_str())
        .unwrap_or("~");
    let mut hash = String::with_capacity(
        choice.source_card_id().as_str().len() + target.len() + 8,
    );
    hash.push_str(choice.source_card_id().as_str());
    hash.push('>');
    hash.push_str(target);
    hash.push('@');
    hash.push_str(buf.format(choice.order_index()));
    hash
}

fn structural_hash(
    graph: &StoryGraph,
    card_hashes: &BTreeMap<CardId, String>,
    topology_signature: &str,
) -> String {
    // BTreeMap/BTreeSet iteration already gives a canonical order.
    let mut canonical = String::new();
    for hash in card_hashes.values() {
        canonical.push_str(hash);
        canonical.push(';');
    }
    canonical.push('#');
    canonical.push_str(topology_signature);
    canonical.push('#');
    canonical.push_str(
        graph
            .root_card_id()
            .map(|id| id.as_str())
            .unwrap_or("~"),
    );
    canonical.push('#');
    for collapsed in graph.collapsed() {
        canonical.push_str(collapsed.as_str());
        canonical.push(';');
    }

    format!("{:016x}", fnv1a_64(canonical.as_bytes()))
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET_BASIS;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}
