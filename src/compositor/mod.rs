// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Incremental composition.
//!
//! Given a diff and the retained position map, pick the cheapest pass that
//! keeps the canvas coherent: a full layout, a per-subtree relayout
//! re-anchored into the retained frame, or a pure geometric insert for one
//! or two new nodes. Untouched nodes keep their positions byte-identical.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::diff::{GraphDiff, GraphSnapshot, LayoutScope};
use crate::layout::{estimate_dimensions, expected_rank_x, layout_hierarchical};
use crate::model::{CardId, NodeDimensions, Position, StoryGraph};
use crate::query::{descendants_of, GraphAnalysis};

/// Which pass actually ran, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeStrategy {
    FullLayout,
    GeometricInsert,
    SubtreeRelayout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposeOutcome {
    pub positions: BTreeMap<CardId, Position>,
    pub strategy: ComposeStrategy,
}

pub struct ComposeInput<'a> {
    pub graph: &'a StoryGraph,
    pub analysis: &'a GraphAnalysis,
    pub snapshot: &'a GraphSnapshot,
    pub diff: &'a GraphDiff,
    pub previous_positions: Option<&'a BTreeMap<CardId, Position>>,
    pub config: &'a EngineConfig,
}

/// How many nodes may change before the geometric shortcut stops applying.
const GEOMETRIC_INSERT_LIMIT: usize = 2;

pub fn compose(input: &ComposeInput<'_>) -> ComposeOutcome {
    let visible = visible_set(input.graph, input.analysis);
    let dims = dimension_map(input.graph, &visible, input.config);

    let previous = input.previous_positions.filter(|map| !map.is_empty());

    let Some(previous) = previous else {
        return full_layout(input, &visible, &dims);
    };
    if input.diff.requires_full_layout {
        return full_layout(input, &visible, &dims);
    }

    let scope = match LayoutScope::of(input.diff, input.snapshot) {
        LayoutScope::Everything => return full_layout(input, &visible, &dims),
        LayoutScope::Subset(scope) => scope,
    };

    // Retain everything still visible; dropped and hidden nodes fall away.
    let mut retained: BTreeMap<CardId, Position> = previous
        .iter()
        .filter(|(card_id, _)| visible.contains(*card_id))
        .map(|(card_id, position)| (card_id.clone(), *position))
        .collect();

    let in_scope: BTreeSet<CardId> = scope
        .iter()
        .filter(|card_id| visible.contains(*card_id))
        .cloned()
        .collect();

    // Expanding a collapsed subtree changes no card and no choice, so the
    // diff is empty while the visible set grows. Anything visible that is
    // neither retained nor in scope would end the pass without a position;
    // that needs a full layout.
    let covered = visible
        .iter()
        .all(|card_id| retained.contains_key(card_id) || in_scope.contains(card_id));
    if !covered {
        return full_layout(input, &visible, &dims);
    }

    if in_scope.is_empty() {
        return ComposeOutcome {
            positions: retained,
            strategy: ComposeStrategy::GeometricInsert,
        };
    }

    if is_pure_insert(input, &in_scope, &retained) {
        geometric_insert(input, &visible, &dims, &in_scope, &mut retained);
        return ComposeOutcome {
            positions: retained,
            strategy: ComposeStrategy::GeometricInsert,
        };
    }

    subtree_relayout(input, &visible, &dims, &in_scope, &mut retained);
    ComposeOutcome {
        positions: retained,
        strategy: ComposeStrategy::SubtreeRelayout,
    }
}

/// The geometric shortcut applies when the change is a 1-2 node insertion:
/// every in-scope node is either newly added or an already-positioned parent
/// of one. Anything wider (retargets, reorders, removals of inner nodes)
/// needs a real layout pass over the subtree.
fn is_pure_insert(
    input: &ComposeInput<'_>,
    in_scope: &BTreeSet<CardId>,
    retained: &BTreeMap<CardId, Position>,
) -> bool {
    let added: Vec<&CardId> = in_scope
        .iter()
        .filter(|card_id| input.diff.added_nodes.contains(*card_id))
        .collect();
    if added.is_empty() || added.len() > GEOMETRIC_INSERT_LIMIT {
        return false;
    }

    in_scope.iter().all(|card_id| {
        if input.diff.added_nodes.contains(card_id) {
            return true;
        }
        let is_parent_of_added = input
            .analysis
            .children
            .get(card_id)
            .into_iter()
            .flatten()
            .any(|child| input.diff.added_nodes.contains(child));
        is_parent_of_added && retained.contains_key(card_id)
    })
}

fn visible_set(graph: &StoryGraph, analysis: &GraphAnalysis) -> BTreeSet<CardId> {
    graph
        .cards()
        .keys()
        .filter(|card_id| analysis.is_visible(card_id))
        .cloned()
        .collect()
}

fn dimension_map(
    graph: &StoryGraph,
    visible: &BTreeSet<CardId>,
    config: &EngineConfig,
) -> BTreeMap<CardId, NodeDimensions> {
    visible
        .iter()
        .filter_map(|card_id| {
            graph
                .cards()
                .get(card_id)
                .map(|card| (card_id.clone(), estimate_dimensions(card.title(), &config.dimensions)))
        })
        .collect()
}

fn full_layout(
    input: &ComposeInput<'_>,
    visible: &BTreeSet<CardId>,
    dims: &BTreeMap<CardId, NodeDimensions>,
) -> ComposeOutcome {
    let positions = layout_hierarchical(
        visible,
        &input.analysis.children,
        &input.analysis.depth,
        dims,
        &input.config.layout,
    );
    ComposeOutcome {
        positions,
        strategy: ComposeStrategy::FullLayout,
    }
}

/// O(1) placement for one or two inserts: each new node lands one rank to
/// the right of its parent, offset down by its sibling index. No layout
/// algorithm runs, so every retained position survives bit-for-bit.
fn geometric_insert(
    input: &ComposeInput<'_>,
    visible: &BTreeSet<CardId>,
    dims: &BTreeMap<CardId, NodeDimensions>,
    in_scope: &BTreeSet<CardId>,
    retained: &mut BTreeMap<CardId, Position>,
) {
    let layout = &input.config.layout;

    for card_id in in_scope {
        if retained.contains_key(card_id) && !input.diff.added_nodes.contains(card_id) {
            continue;
        }

        let node_dims = dims
            .get(card_id)
            .copied()
            .unwrap_or(NodeDimensions { width: 160.0, height: 124.0 });

        let anchor = input
            .analysis
            .parents
            .get(card_id)
            .into_iter()
            .flatten()
            .find_map(|parent| {
                retained
                    .get(parent)
                    .map(|position| (parent.clone(), *position))
            });

        let position = match anchor {
            Some((parent_id, parent_position)) => {
                let parent_dims = dims
                    .get(&parent_id)
                    .copied()
                    .unwrap_or(NodeDimensions { width: 160.0, height: 124.0 });
                let sibling_index = input
                    .analysis
                    .children
                    .get(&parent_id)
                    .into_iter()
                    .flatten()
                    .filter(|child| visible.contains(*child))
                    .position(|child| child == card_id)
                    .unwrap_or(0);
                Position::new(
                    parent_position.x + parent_dims.width + layout.rank_separation,
                    parent_position.y
                        + sibling_index as f64 * (node_dims.height + layout.node_separation),
                )
            }
            None => {
                let rank = input.analysis.depth.get(card_id).copied().unwrap_or(0);
                Position::new(
                    expected_rank_x(rank, input.config.dimensions.max_width, layout),
                    0.0,
                )
            }
        };

        retained.insert(card_id.clone(), position);
    }
}

/// Re-lay-out each disjoint affected subtree on its own, then shift the
/// fragment so its shallowest node lines up beside the already-positioned
/// parent (or at the rank's expected x when there is none), and merge.
/// Fragments are independent, so they lay out in parallel; the merge is
/// sequential in root order and therefore deterministic.
fn subtree_relayout(
    input: &ComposeInput<'_>,
    visible: &BTreeSet<CardId>,
    dims: &BTreeMap<CardId, NodeDimensions>,
    in_scope: &BTreeSet<CardId>,
    retained: &mut BTreeMap<CardId, Position>,
) {
    let roots = input.diff.disjoint_affected_roots(input.snapshot);
    let layout = &input.config.layout;

    let fragments: Vec<(CardId, BTreeMap<CardId, Position>)> = roots
        .par_iter()
        .filter_map(|root| {
            let subtree = descendants_of(&input.analysis.children, root);
            let fragment_nodes: BTreeSet<CardId> = subtree
                .into_iter()
                .filter(|card_id| in_scope.contains(card_id) && visible.contains(card_id))
                .collect();
            if fragment_nodes.is_empty() {
                return None;
            }

            let mut fragment = layout_hierarchical(
                &fragment_nodes,
                &input.analysis.children,
                &input.analysis.depth,
                dims,
                layout,
            );

            let anchor = fragment_nodes
                .iter()
                .min_by_key(|card_id| {
                    (
                        input.analysis.depth.get(*card_id).copied().unwrap_or(u32::MAX),
                        (*card_id).clone(),
                    )
                })
                .cloned()?;
            let anchor_position = *fragment.get(&anchor)?;

            let target = anchor_target(input, dims, retained, &anchor);
            let dx = target.x - anchor_position.x;
            let dy = target.y - anchor_position.y;
            for position in fragment.values_mut() {
                *position = position.translated(dx, dy);
            }

            Some((root.clone(), fragment))
        })
        .collect();

    for (_root, fragment) in fragments {
        for (card_id, position) in fragment {
            retained.insert(card_id, position);
        }
    }
}

/// Where a fragment's shallowest node should sit: beside its positioned
/// parent when one exists, otherwise at the depth-implied column, keeping
/// its previous row if it had one.
fn anchor_target(
    input: &ComposeInput<'_>,
    dims: &BTreeMap<CardId, NodeDimensions>,
    retained: &BTreeMap<CardId, Position>,
    anchor: &CardId,
) -> Position {
    let layout = &input.config.layout;

    let positioned_parent = input
        .analysis
        .parents
        .get(anchor)
        .into_iter()
        .flatten()
        .find_map(|parent| retained.get(parent).map(|position| (parent.clone(), *position)));

    if let Some((parent_id, parent_position)) = positioned_parent {
        let parent_dims = dims
            .get(&parent_id)
            .copied()
            .unwrap_or(NodeDimensions { width: 160.0, height: 124.0 });
        return Position::new(
            parent_position.x + parent_dims.width + layout.rank_separation,
            parent_position.y,
        );
    }

    if let Some(previous) = retained.get(anchor) {
        return *previous;
    }

    let rank = input.analysis.depth.get(anchor).copied().unwrap_or(0);
    Position::new(
        expected_rank_x(rank, input.config.dimensions.max_width, layout),
        0.0,
    )
}

#[cfg(test)]
mod tests;
