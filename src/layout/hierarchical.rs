// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::LayoutConfig;
use crate::model::{CardId, NodeDimensions, Position};
use crate::query::ChildList;

/// Rank-based layered layout over the visible subgraph, left to right.
///
/// Ranks come from the precomputed depth map (unreachable cards rank one past
/// the deepest reachable rank). Within a rank, nodes are pulled toward their
/// parents' rows by branch-aware edge weights, then deoverlapped by a single
/// deterministic top-down sweep.
///
/// Determinism: no iteration over hash maps, every ordering is an explicit
/// sort with an id tiebreak, and floating accumulation happens in one fixed
/// order. Identical inputs produce bit-identical positions.
pub fn layout_hierarchical(
    visible: &BTreeSet<CardId>,
    children: &BTreeMap<CardId, ChildList>,
    depth: &BTreeMap<CardId, u32>,
    dims: &BTreeMap<CardId, NodeDimensions>,
    config: &LayoutConfig,
) -> BTreeMap<CardId, Position> {
    if visible.is_empty() {
        return BTreeMap::new();
    }

    let orphan_rank = depth
        .iter()
        .filter(|(card_id, _)| visible.contains(*card_id))
        .map(|(_, d)| *d)
        .max()
        .map(|d| d.saturating_add(1))
        .unwrap_or(0);

    let rank_of = |card_id: &CardId| -> u32 { depth.get(card_id).copied().unwrap_or(orphan_rank) };

    // Group visible nodes by rank; BTreeSet iteration keeps id order.
    let mut ranks: BTreeMap<u32, Vec<CardId>> = BTreeMap::new();
    for card_id in visible {
        ranks.entry(rank_of(card_id)).or_default().push(card_id.clone());
    }

    let box_of = |card_id: &CardId| -> NodeDimensions {
        dims.get(card_id)
            .copied()
            .unwrap_or(NodeDimensions { width: 160.0, height: 124.0 })
    };

    // Horizontal pass: each rank is one column, sized by its widest node.
    // The gap reserves room for edge fan-out between columns.
    let mut rank_center_x: BTreeMap<u32, f64> = BTreeMap::new();
    let mut cursor_x = 0.0f64;
    for (rank, nodes) in &ranks {
        let rank_width = nodes
            .iter()
            .map(|id| box_of(id).width)
            .fold(0.0f64, f64::max);
        rank_center_x.insert(*rank, cursor_x + rank_width / 2.0);
        cursor_x += rank_width + config.rank_separation + config.edge_separation;
    }

    // Vertical pass: ranks left to right, each node pulled toward the
    // weighted rows its parents suggest, then swept for overlaps.
    let mut center_y: BTreeMap<CardId, f64> = BTreeMap::new();
    let mut positions: BTreeMap<CardId, Position> = BTreeMap::new();

    for (rank, nodes) in &ranks {
        let mut placed: Vec<(CardId, Option<f64>)> = nodes
            .iter()
            .map(|card_id| (card_id.clone(), None))
            .collect();

        if *rank > 0 {
            let pulls = parent_pulls(visible, children, &center_y, &box_of, config);
            for (card_id, desired) in placed.iter_mut() {
                *desired = pulls.get(card_id).copied();
            }
        }

        // Unpulled nodes keep id order after pulled ones.
        placed.sort_by(|(id_a, des_a), (id_b, des_b)| match (des_a, des_b) {
            (Some(a), Some(b)) => a.total_cmp(b).then_with(|| id_a.cmp(id_b)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => id_a.cmp(id_b),
        });

        let mut floor = f64::NEG_INFINITY;
        for (card_id, desired) in placed {
            let half = box_of(&card_id).height / 2.0;
            let lowest_free = if floor == f64::NEG_INFINITY {
                desired.unwrap_or(0.0)
            } else {
                floor + config.node_separation + half
            };
            let center = match desired {
                Some(want) => want.max(lowest_free),
                None => lowest_free,
            };
            floor = center + half;
            center_y.insert(card_id, center);
        }
    }

    for card_id in visible {
        let b = box_of(card_id);
        let cx = rank_center_x
            .get(&rank_of(card_id))
            .copied()
            .unwrap_or(0.0);
        let cy = center_y.get(card_id).copied().unwrap_or(0.0);
        positions.insert(
            card_id.clone(),
            Position::new(cx - b.width / 2.0, cy - b.height / 2.0),
        );
    }

    positions
}

/// Desired center rows for children of already-placed parents.
///
/// For each placed parent, its visible children are stacked in choice order
/// and the stack is shifted so that its pull-weighted centroid lands on the
/// parent's row: the primary branch hugs the parent, the last branch trails.
/// A child with several placed parents averages their suggestions, weighted
/// by each pull.
fn parent_pulls(
    visible: &BTreeSet<CardId>,
    children: &BTreeMap<CardId, ChildList>,
    center_y: &BTreeMap<CardId, f64>,
    box_of: &impl Fn(&CardId) -> NodeDimensions,
    config: &LayoutConfig,
) -> BTreeMap<CardId, f64> {
    let mut sums: BTreeMap<CardId, (f64, f64)> = BTreeMap::new();

    for (parent_id, child_list) in children {
        let Some(parent_center) = center_y.get(parent_id).copied() else {
            continue;
        };
        let fan: Vec<&CardId> = child_list
            .iter()
            .filter(|child| visible.contains(*child))
            .collect();
        if fan.is_empty() {
            continue;
        }

        // Slot centers for the stacked fan, in choice order.
        let mut slots: Vec<f64> = Vec::with_capacity(fan.len());
        let mut cursor = 0.0f64;
        for (idx, child) in fan.iter().enumerate() {
            let h = box_of(child).height;
            if idx == 0 {
                slots.push(0.0);
                cursor = h / 2.0;
            } else {
                let center = cursor + config.node_separation + h / 2.0;
                slots.push(center);
                cursor = center + h / 2.0;
            }
        }

        let weights: Vec<f64> = (0..fan.len())
            .map(|idx| pull_weight(idx, fan.len(), config))
            .collect();
        let weight_total: f64 = weights.iter().sum();
        let centroid: f64 = slots
            .iter()
            .zip(&weights)
            .map(|(slot, weight)| slot * weight)
            .sum::<f64>()
            / weight_total;

        for ((child, slot), weight) in fan.iter().zip(&slots).zip(&weights) {
            let suggestion = parent_center + (slot - centroid);
            let entry = sums.entry((*child).clone()).or_insert((0.0, 0.0));
            entry.0 += suggestion * weight;
            entry.1 += weight;
        }
    }

    sums.into_iter()
        .map(|(card_id, (weighted_sum, weight_total))| (card_id, weighted_sum / weight_total))
        .collect()
}

/// Branch-aware pull weight for the child at `index` of a `fan`-way split.
///
/// One child: neutral. Two children: the first is the primary branch and
/// pulls harder. Three or more: first strongest, last weakest, middle
/// neutral, which fans wide branches out readably instead of arbitrarily.
fn pull_weight(index: usize, fan: usize, config: &LayoutConfig) -> f64 {
    match fan {
        0 | 1 => config.neutral_pull,
        2 => {
            if index == 0 {
                config.primary_pull
            } else {
                config.neutral_pull
            }
        }
        _ => {
            if index == 0 {
                config.primary_pull
            } else if index == fan - 1 {
                config.trailing_pull
            } else {
                config.neutral_pull
            }
        }
    }
}

/// Expected left edge of a rank when no anchor is available, used by the
/// compositor to re-anchor detached fragments.
pub fn expected_rank_x(rank: u32, typical_width: f64, config: &LayoutConfig) -> f64 {
    f64::from(rank) * (typical_width + config.rank_separation + config.edge_separation)
}
