// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::diff::{GraphDiff, GraphSnapshot};
use crate::model::{Card, CardId, Choice, ChoiceId, GraphId, Position, StoryGraph};
use crate::query::analyze_graph;

use super::{compose, ComposeInput, ComposeOutcome, ComposeStrategy};

fn card_id(raw: &str) -> CardId {
    CardId::new(raw).expect("card id")
}

fn choice_id(raw: &str) -> ChoiceId {
    ChoiceId::new(raw).expect("choice id")
}

fn chain_graph(len: usize) -> StoryGraph {
    let mut graph = StoryGraph::new(GraphId::new("g1").expect("graph id"));
    for idx in 0..len {
        graph.insert_card(Card::new(card_id(&format!("n{idx:03}")), format!("Card {idx}")));
    }
    for idx in 0..len.saturating_sub(1) {
        graph.insert_choice(Choice::new(
            choice_id(&format!("e{idx:03}")),
            card_id(&format!("n{idx:03}")),
            Some(card_id(&format!("n{:03}", idx + 1))),
            0,
        ));
    }
    graph.set_root_card_id(Some(card_id("n000")));
    graph
}

/// One full snapshot/diff/compose step against optional prior state.
fn step(
    graph: &StoryGraph,
    previous: Option<(&GraphSnapshot, &BTreeMap<CardId, Position>)>,
    config: &EngineConfig,
) -> (GraphSnapshot, ComposeOutcome) {
    let analysis = analyze_graph(graph);
    let snapshot = GraphSnapshot::capture(graph, &analysis);
    let diff = GraphDiff::between(previous.map(|(snap, _)| snap), &snapshot, &config.full_layout);
    let outcome = compose(&ComposeInput {
        graph,
        analysis: &analysis,
        snapshot: &snapshot,
        diff: &diff,
        previous_positions: previous.map(|(_, positions)| positions),
        config,
    });
    (snapshot, outcome)
}

#[test]
fn cold_start_runs_a_full_layout() {
    let graph = chain_graph(6);
    let (_, outcome) = step(&graph, None, &EngineConfig::default());
    assert_eq!(outcome.strategy, ComposeStrategy::FullLayout);
    assert_eq!(outcome.positions.len(), 6);
}

#[test]
fn single_leaf_insert_takes_the_geometric_shortcut() {
    let config = EngineConfig::default();
    let graph = chain_graph(50);
    let (snapshot, baseline) = step(&graph, None, &config);
    assert_eq!(baseline.positions.len(), 50);

    let mut edited = graph.clone();
    edited.insert_card(Card::new(card_id("n_new"), "Fresh leaf"));
    edited.insert_choice(Choice::new(
        choice_id("e_new"),
        card_id("n049"),
        Some(card_id("n_new")),
        0,
    ));

    let (_, outcome) = step(&edited, Some((&snapshot, &baseline.positions)), &config);
    assert_eq!(outcome.strategy, ComposeStrategy::GeometricInsert);

    // Every prior position survives bit-for-bit.
    for (id, before) in &baseline.positions {
        let after = outcome.positions.get(id).expect("retained position");
        assert_eq!(before.x.to_bits(), after.x.to_bits(), "{id} moved in x");
        assert_eq!(before.y.to_bits(), after.y.to_bits(), "{id} moved in y");
    }

    // The new leaf sits one rank right of its parent, on the parent's row.
    let parent = baseline.positions.get(&card_id("n049")).expect("parent");
    let inserted = outcome.positions.get(&card_id("n_new")).expect("inserted");
    assert!(inserted.x > parent.x);
    assert_eq!(inserted.y, parent.y);
}

#[test]
fn second_sibling_offsets_by_sibling_index() {
    let config = EngineConfig::default();
    let graph = chain_graph(50);
    let (snapshot, baseline) = step(&graph, None, &config);

    // n049 already got a child in this edit; the second child lands below it.
    let mut edited = graph.clone();
    for (idx, raw) in ["n_a", "n_b"].iter().enumerate() {
        edited.insert_card(Card::new(card_id(raw), "Leaf"));
        edited.insert_choice(Choice::new(
            choice_id(&format!("e_{raw}")),
            card_id("n049"),
            Some(card_id(raw)),
            idx as u32,
        ));
    }

    let (_, outcome) = step(&edited, Some((&snapshot, &baseline.positions)), &config);
    assert_eq!(outcome.strategy, ComposeStrategy::GeometricInsert);

    let first = outcome.positions.get(&card_id("n_a")).expect("first");
    let second = outcome.positions.get(&card_id("n_b")).expect("second");
    assert_eq!(first.x, second.x);
    assert!(second.y > first.y);
}

#[test]
fn branch_burst_relays_out_only_the_subtree() {
    let config = EngineConfig::default();
    let graph = chain_graph(30);
    let (snapshot, baseline) = step(&graph, None, &config);

    let mut edited = graph.clone();
    for idx in 0..3 {
        let raw = format!("m{idx}");
        edited.insert_card(Card::new(card_id(&raw), "Branch"));
        edited.insert_choice(Choice::new(
            choice_id(&format!("f{idx}")),
            card_id("n010"),
            Some(card_id(&raw)),
            (idx + 1) as u32,
        ));
    }

    let (_, outcome) = step(&edited, Some((&snapshot, &baseline.positions)), &config);
    assert_eq!(outcome.strategy, ComposeStrategy::SubtreeRelayout);

    // Nodes before the affected root keep their exact positions.
    for idx in 0..10 {
        let id = card_id(&format!("n{idx:03}"));
        let before = baseline.positions.get(&id).expect("before");
        let after = outcome.positions.get(&id).expect("after");
        assert_eq!(before.x.to_bits(), after.x.to_bits());
        assert_eq!(before.y.to_bits(), after.y.to_bits());
    }

    // The fragment anchors beside the affected root's parent.
    let parent = outcome.positions.get(&card_id("n009")).expect("parent");
    let root = outcome.positions.get(&card_id("n010")).expect("root");
    assert!(root.x > parent.x);
    assert_eq!(root.y, parent.y);

    // All new branches got positions.
    for idx in 0..3 {
        assert!(outcome.positions.contains_key(&card_id(&format!("m{idx}"))));
    }
}

#[test]
fn noop_step_retains_positions_without_layout() {
    let config = EngineConfig::default();
    let graph = chain_graph(12);
    let (snapshot, baseline) = step(&graph, None, &config);
    let (_, outcome) = step(&graph, Some((&snapshot, &baseline.positions)), &config);

    assert_eq!(outcome.positions, baseline.positions);
    assert_eq!(outcome.strategy, ComposeStrategy::GeometricInsert);
}

#[test]
fn hidden_nodes_never_receive_positions() {
    let config = EngineConfig::default();
    let mut graph = chain_graph(8);
    graph.collapsed_mut().insert(card_id("n003"));

    let (_, outcome) = step(&graph, None, &config);
    for idx in 4..8 {
        assert!(
            !outcome.positions.contains_key(&card_id(&format!("n{idx:03}"))),
            "hidden node n{idx:03} has a position"
        );
    }
    // The collapsed card itself stays visible.
    assert!(outcome.positions.contains_key(&card_id("n003")));
}

#[test]
fn expand_after_collapsed_baseline_positions_the_revealed_subtree() {
    let config = EngineConfig::default();
    let mut graph = chain_graph(8);
    graph.collapsed_mut().insert(card_id("n003"));
    let (snapshot, baseline) = step(&graph, None, &config);
    assert_eq!(baseline.positions.len(), 4);

    // Expanding changes no card and no choice; the revealed descendants
    // still need positions.
    let mut expanded = graph.clone();
    expanded.collapsed_mut().remove(&card_id("n003"));
    let (_, outcome) = step(&expanded, Some((&snapshot, &baseline.positions)), &config);
    assert_eq!(outcome.strategy, ComposeStrategy::FullLayout);
    assert_eq!(outcome.positions.len(), 8);
    for idx in 4..8 {
        assert!(outcome.positions.contains_key(&card_id(&format!("n{idx:03}"))));
    }
}

#[test]
fn collapse_edit_drops_hidden_positions_from_retained_state() {
    let config = EngineConfig::default();
    let graph = chain_graph(8);
    let (snapshot, baseline) = step(&graph, None, &config);

    let mut edited = graph.clone();
    edited.collapsed_mut().insert(card_id("n003"));

    let (_, outcome) = step(&edited, Some((&snapshot, &baseline.positions)), &config);
    for idx in 4..8 {
        assert!(!outcome.positions.contains_key(&card_id(&format!("n{idx:03}"))));
    }
    for idx in 0..4 {
        assert!(outcome.positions.contains_key(&card_id(&format!("n{idx:03}"))));
    }
}
