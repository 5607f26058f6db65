// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeSet;

use crate::config::FullLayoutPolicy;
use crate::model::{CardId, ChoiceId};
use crate::query::descendants_of;

use super::snapshot::GraphSnapshot;

/// Minimal structural delta between two snapshots. All fields are always
/// present; an empty set means "nothing of that kind changed".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GraphDiff {
    pub added_nodes: BTreeSet<CardId>,
    pub removed_nodes: BTreeSet<CardId>,
    pub modified_nodes: BTreeSet<CardId>,
    pub added_edges: BTreeSet<ChoiceId>,
    pub removed_edges: BTreeSet<ChoiceId>,
    pub modified_edges: BTreeSet<ChoiceId>,
    /// Sources whose outgoing topology changed, sources that lost all their
    /// choices, and parents of newly added nodes: the entry points for
    /// incremental relayout.
    pub affected_subtree_roots: BTreeSet<CardId>,
    pub requires_full_layout: bool,
}

impl GraphDiff {
    /// Cold start included: `previous = None` marks everything added and
    /// forces a full layout.
    pub fn between(
        previous: Option<&GraphSnapshot>,
        current: &GraphSnapshot,
        policy: &FullLayoutPolicy,
    ) -> Self {
        let Some(previous) = previous else {
            return Self {
                added_nodes: current.card_ids().clone(),
                added_edges: current.choice_ids().clone(),
                requires_full_layout: true,
                ..Self::default()
            };
        };

        let mut diff = Self::default();

        for card_id in current.card_ids() {
            if !previous.card_ids().contains(card_id) {
                diff.added_nodes.insert(card_id.clone());
            } else if previous.card_hash(card_id) != current.card_hash(card_id) {
                diff.modified_nodes.insert(card_id.clone());
            }
        }
        for card_id in previous.card_ids() {
            if !current.card_ids().contains(card_id) {
                diff.removed_nodes.insert(card_id.clone());
            }
        }

        for choice_id in current.choice_ids() {
            if !previous.choice_ids().contains(choice_id) {
                diff.added_edges.insert(choice_id.clone());
            } else if previous.choice_hash(choice_id) != current.choice_hash(choice_id) {
                diff.modified_edges.insert(choice_id.clone());
            }
        }
        for choice_id in previous.choice_ids() {
            if !current.choice_ids().contains(choice_id) {
                diff.removed_edges.insert(choice_id.clone());
            }
        }

        // Sources whose adjacency signature changed, and sources that lost
        // their entire fan-out.
        for (source, signature) in current.adjacency_signatures() {
            match previous.adjacency_signature(source) {
                Some(old) if old != signature => {
                    diff.affected_subtree_roots.insert(source.clone());
                }
                _ => {}
            }
        }
        for (source, old_signature) in previous.adjacency_signatures() {
            if old_signature.is_empty() {
                continue;
            }
            let lost_everything = current
                .adjacency_signature(source)
                .map(|sig| sig.is_empty())
                .unwrap_or(false);
            if lost_everything {
                diff.affected_subtree_roots.insert(source.clone());
            }
        }

        // Parents of newly added nodes anchor the insert.
        for (source, child_list) in current.children() {
            if child_list.iter().any(|child| diff.added_nodes.contains(child)) {
                diff.affected_subtree_roots.insert(source.clone());
            }
        }

        diff.requires_full_layout = full_layout_required(previous, current, &diff, policy);
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.modified_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
            && self.modified_edges.is_empty()
    }

    pub fn changed_node_count(&self) -> usize {
        self.added_nodes.len() + self.removed_nodes.len() + self.modified_nodes.len()
    }

    /// Affected roots with nested roots folded away: a root inside another
    /// root's subtree relays out with its ancestor anyway.
    pub fn disjoint_affected_roots(&self, snapshot: &GraphSnapshot) -> Vec<CardId> {
        let mut disjoint: Vec<CardId> = Vec::new();
        'candidates: for candidate in &self.affected_subtree_roots {
            for other in &self.affected_subtree_roots {
                if other == candidate {
                    continue;
                }
                if descendants_of(snapshot.children(), other).contains(candidate)
                    && !descendants_of(snapshot.children(), candidate).contains(other)
                {
                    continue 'candidates;
                }
            }
            disjoint.push(candidate.clone());
        }
        disjoint
    }
}

fn full_layout_required(
    previous: &GraphSnapshot,
    current: &GraphSnapshot,
    diff: &GraphDiff,
    policy: &FullLayoutPolicy,
) -> bool {
    if previous.root_card_id() != current.root_card_id() {
        return true;
    }

    let total = current.card_ids().len().max(1) as f64;
    let affected = (diff.changed_node_count() + diff.affected_subtree_roots.len()) as f64;
    let affected_ratio = affected / total;

    if affected_ratio > policy.affected_ratio {
        return true;
    }

    let disjoint = diff.disjoint_affected_roots(current);
    if disjoint.len() > policy.disjoint_root_limit
        && affected_ratio > policy.disjoint_affected_ratio
    {
        return true;
    }

    if let Some(root) = current.root_card_id() {
        let root_affected = diff.affected_subtree_roots.contains(root);
        let changed_ratio = diff.changed_node_count() as f64 / total;
        if root_affected && changed_ratio > policy.root_subtree_changed_ratio {
            return true;
        }
    }

    false
}

/// Which nodes the next layout pass must touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutScope {
    /// Re-lay-out every visible node.
    Everything,
    /// Only these nodes: the added set plus every descendant of each
    /// affected subtree root.
    Subset(BTreeSet<CardId>),
}

impl LayoutScope {
    pub fn of(diff: &GraphDiff, snapshot: &GraphSnapshot) -> Self {
        if diff.requires_full_layout {
            return Self::Everything;
        }

        let mut scope = diff.added_nodes.clone();
        for root in &diff.affected_subtree_roots {
            scope.extend(descendants_of(snapshot.children(), root));
        }
        Self::Subset(scope)
    }
}
