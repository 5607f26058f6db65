// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use smallvec::SmallVec;

use crate::model::{CardId, StoryGraph};

/// Children of one card, sorted by `(order_index, choice_id)`. Most cards
/// fan out into a handful of choices at most.
pub type ChildList = SmallVec<[CardId; 4]>;

/// Structural facts derived from one pass over the graph.
///
/// Everything downstream (snapshotting, layout ranking, visibility
/// filtering) reads from this instead of re-walking the edge set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GraphAnalysis {
    /// BFS distance from the root. Unreachable cards are absent; the layout
    /// ranks them one past the deepest reachable rank so orphans render at
    /// the far right instead of over the root.
    pub depth: BTreeMap<CardId, u32>,
    pub children: BTreeMap<CardId, ChildList>,
    pub parents: BTreeMap<CardId, ChildList>,
    /// No incoming choice and not the root.
    pub orphans: BTreeSet<CardId>,
    /// No outgoing linked choice.
    pub dead_ends: BTreeSet<CardId>,
    /// Missing title, content, or image.
    pub incomplete: BTreeSet<CardId>,
    /// Outgoing choice count per card, dangling choices included.
    pub outgoing_choice_count: BTreeMap<CardId, u32>,
    /// Strict descendants of collapsed cards. A collapsed card itself stays
    /// visible; everything beneath it does not.
    pub hidden: BTreeSet<CardId>,
}

impl GraphAnalysis {
    pub fn is_visible(&self, card_id: &CardId) -> bool {
        !self.hidden.contains(card_id)
    }
}

/// Single O(nodes + edges) pass: adjacency, BFS depth from the root,
/// orphan/dead-end/incomplete classification, and the hidden set implied by
/// collapsed markers.
pub fn analyze_graph(graph: &StoryGraph) -> GraphAnalysis {
    let mut analysis = GraphAnalysis::default();

    for card_id in graph.cards().keys() {
        analysis.children.insert(card_id.clone(), ChildList::new());
        analysis.parents.insert(card_id.clone(), ChildList::new());
        analysis.outgoing_choice_count.insert(card_id.clone(), 0);
    }

    // Fan-out counting sees every choice with a known source, dangling
    // ones included; unknown endpoints are a data-quality issue to log,
    // never an error.
    for choice in graph.choices().values() {
        let source = choice.source_card_id();
        if !graph.cards().contains_key(source) {
            tracing::warn!(
                choice_id = %choice.choice_id(),
                source = %source,
                "skipping choice with unknown source card"
            );
            continue;
        }
        if let Some(count) = analysis.outgoing_choice_count.get_mut(source) {
            *count += 1;
        }
        if choice.is_dangling() {
            continue;
        }
        if let Some(target) = choice.target_card_id() {
            if !graph.cards().contains_key(target) {
                tracing::warn!(
                    choice_id = %choice.choice_id(),
                    target = %target,
                    "skipping choice with unknown target card"
                );
            }
        }
    }

    // Adjacency comes from the linked choices only, ordered by
    // (source, order_index, choice_id) so child lists come out sorted
    // without a per-node sort afterwards.
    let mut linked: Vec<(&CardId, u32, &crate::model::ChoiceId, &CardId)> = graph
        .linked_choices()
        .filter_map(|choice| {
            choice.target_card_id().map(|target| {
                (
                    choice.source_card_id(),
                    choice.order_index(),
                    choice.choice_id(),
                    target,
                )
            })
        })
        .collect();
    linked.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

    for (source, _order, _choice, target) in &linked {
        analysis
            .children
            .entry((*source).clone())
            .or_default()
            .push((*target).clone());
        analysis
            .parents
            .entry((*target).clone())
            .or_default()
            .push((*source).clone());
    }

    let root = graph.root_card_id();

    for (card_id, card) in graph.cards() {
        let has_parent = analysis
            .parents
            .get(card_id)
            .map(|parents| !parents.is_empty())
            .unwrap_or(false);
        if !has_parent && Some(card_id) != root {
            analysis.orphans.insert(card_id.clone());
        }

        let has_child = analysis
            .children
            .get(card_id)
            .map(|children| !children.is_empty())
            .unwrap_or(false);
        if !has_child {
            analysis.dead_ends.insert(card_id.clone());
        }

        if card.title().trim().is_empty() || !card.has_content() || !card.has_image() {
            analysis.incomplete.insert(card_id.clone());
        }
    }

    if let Some(root) = root {
        analysis.depth = bfs_depths(&analysis.children, root);
    }

    analysis.hidden = hidden_set(&analysis.children, graph.collapsed());

    analysis
}

fn bfs_depths(children: &BTreeMap<CardId, ChildList>, root: &CardId) -> BTreeMap<CardId, u32> {
    let mut depth: BTreeMap<CardId, u32> = BTreeMap::new();
    if !children.contains_key(root) {
        return depth;
    }

    let mut queue: VecDeque<(CardId, u32)> = VecDeque::new();
    depth.insert(root.clone(), 0);
    queue.push_back((root.clone(), 0));

    while let Some((card_id, current)) = queue.pop_front() {
        let next_depth = current.saturating_add(1);
        for child_id in children.get(&card_id).into_iter().flatten() {
            if depth.contains_key(child_id) {
                continue;
            }
            depth.insert(child_id.clone(), next_depth);
            queue.push_back((child_id.clone(), next_depth));
        }
    }

    depth
}

/// Strict descendants of every collapsed card, by recursive descent with a
/// shared visited set so cycles terminate.
fn hidden_set(
    children: &BTreeMap<CardId, ChildList>,
    collapsed: &BTreeSet<CardId>,
) -> BTreeSet<CardId> {
    let mut hidden: BTreeSet<CardId> = BTreeSet::new();

    for collapsed_id in collapsed {
        let mut stack: Vec<CardId> = children
            .get(collapsed_id)
            .into_iter()
            .flatten()
            .cloned()
            .collect();

        while let Some(card_id) = stack.pop() {
            if !hidden.insert(card_id.clone()) {
                continue;
            }
            for child_id in children.get(&card_id).into_iter().flatten() {
                if !hidden.contains(child_id) {
                    stack.push(child_id.clone());
                }
            }
        }
    }

    hidden
}

/// All descendants of `root` including `root` itself, cycle-guarded.
pub fn descendants_of(children: &BTreeMap<CardId, ChildList>, root: &CardId) -> BTreeSet<CardId> {
    let mut seen: BTreeSet<CardId> = BTreeSet::new();
    let mut stack = vec![root.clone()];

    while let Some(card_id) = stack.pop() {
        if !seen.insert(card_id.clone()) {
            continue;
        }
        for child_id in children.get(&card_id).into_iter().flatten() {
            if !seen.contains(child_id) {
                stack.push(child_id.clone());
            }
        }
    }

    seen
}
