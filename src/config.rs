// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Engine configuration.
//!
//! Everything tunable lives here as plain constructed values; there is no
//! module-level state. `EngineConfig::default()` is the production shape.

use std::time::Duration;

/// Title-to-box estimation knobs. Two snapshots are only comparable when
/// taken under the same dimension policy, so treat this as fixed for the
/// lifetime of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionConfig {
    /// Approximated average glyph width in px (no real text measurement).
    pub avg_char_width: f64,
    /// Horizontal card padding summed across both sides, in px.
    pub horizontal_padding: f64,
    pub min_width: f64,
    pub max_width: f64,
    /// Titles at or below this length take `min_width` outright.
    pub short_title_max_chars: usize,
    /// Titles at or below this length scale toward a two-line target;
    /// longer titles scale toward three lines.
    pub medium_title_max_chars: usize,
    pub header_height: f64,
    pub footer_height: f64,
    pub vertical_padding: f64,
    pub line_height: f64,
    pub min_title_height: f64,
    /// Lines beyond this are assumed visually truncated, not laid out.
    pub max_title_lines: u32,
}

impl Default for DimensionConfig {
    fn default() -> Self {
        Self {
            avg_char_width: 9.6,
            horizontal_padding: 80.0,
            min_width: 160.0,
            max_width: 240.0,
            short_title_max_chars: 10,
            medium_title_max_chars: 30,
            header_height: 40.0,
            footer_height: 36.0,
            vertical_padding: 24.0,
            line_height: 22.0,
            min_title_height: 24.0,
            max_title_lines: 3,
        }
    }
}

/// Spacing and branch-weighting knobs for the hierarchical layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Horizontal gap between ranks, in px.
    pub rank_separation: f64,
    /// Vertical gap between siblings within a rank, in px.
    pub node_separation: f64,
    /// Minimum gap reserved between parallel edges, in px.
    pub edge_separation: f64,
    /// Pull weight of the first child when a card has two or more choices.
    pub primary_pull: f64,
    /// Pull weight of middle children (and of an only child).
    pub neutral_pull: f64,
    /// Pull weight of the last child when a card has three or more choices.
    pub trailing_pull: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_separation: 80.0,
            node_separation: 40.0,
            edge_separation: 20.0,
            primary_pull: 2.0,
            neutral_pull: 1.0,
            trailing_pull: 0.5,
        }
    }
}

/// When a diff forces a full relayout instead of incremental composition.
///
/// The thresholds are empirically chosen; nothing downstream depends on the
/// exact numbers, so they are configuration rather than constants.
#[derive(Debug, Clone, PartialEq)]
pub struct FullLayoutPolicy {
    /// Full layout when (changed nodes + affected roots) / total exceeds this.
    pub affected_ratio: f64,
    /// ... or when more than this many disjoint subtree roots are affected
    /// *and* the affected fraction exceeds `disjoint_affected_ratio`.
    pub disjoint_root_limit: usize,
    pub disjoint_affected_ratio: f64,
    /// ... or when the root's own subtree is affected and changed nodes
    /// exceed this fraction of the total.
    pub root_subtree_changed_ratio: f64,
}

impl Default for FullLayoutPolicy {
    fn default() -> Self {
        Self {
            affected_ratio: 0.4,
            disjoint_root_limit: 3,
            disjoint_affected_ratio: 0.25,
            root_subtree_changed_ratio: 0.3,
        }
    }
}

/// Capacity and lifetime knobs for the three cache tables.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub session_capacity: usize,
    pub remote_capacity: usize,
    pub worker_capacity: usize,
    /// Lifetime of remote/worker results. Session entries never expire by
    /// time; only a topology change invalidates them.
    pub result_ttl: Duration,
    /// Fraction of entries dropped (oldest first) when a table is full.
    pub evict_fraction: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            session_capacity: 32,
            remote_capacity: 32,
            worker_capacity: 64,
            result_ttl: Duration::from_secs(5 * 60),
            evict_fraction: 0.2,
        }
    }
}

/// Where layout work runs.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Graphs with fewer visible nodes than this are computed synchronously
    /// on the calling task.
    pub small_graph_threshold: usize,
    /// A pending background request is rejected after this long.
    pub worker_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            small_graph_threshold: 40,
            worker_timeout: Duration::from_secs(10),
        }
    }
}

/// Bundle handed to the composition root.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    pub dimensions: DimensionConfig,
    pub layout: LayoutConfig,
    pub full_layout: FullLayoutPolicy,
    pub cache: CacheConfig,
    pub dispatch: DispatchConfig,
}
