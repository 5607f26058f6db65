// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use fabula::config::EngineConfig;
use fabula::diff::{GraphDiff, GraphSnapshot};
use fabula::query::analyze_graph;

mod fixtures;
mod profiler;

// Benchmark identity (keep stable):
// - Group names in this file: `diff.snapshot`, `diff.between`
// - Case IDs must remain stable across refactors so results stay comparable
//   over time.
fn benches_diff(c: &mut Criterion) {
    let config = EngineConfig::default();

    {
        let mut group = c.benchmark_group("diff.snapshot");

        for (case_id, graph) in [
            ("small", fixtures::story::fixture(fixtures::story::Case::Small)),
            (
                "medium_branching",
                fixtures::story::fixture(fixtures::story::Case::MediumBranching),
            ),
            (
                "large_long_titles",
                fixtures::story::fixture(fixtures::story::Case::LargeLongTitles),
            ),
        ] {
            let analysis = analyze_graph(&graph);
            group.throughput(Throughput::Elements(graph.cards().len() as u64));
            group.bench_function(case_id, |b| {
                b.iter(|| {
                    let snapshot = GraphSnapshot::capture(black_box(&graph), &analysis);
                    black_box(snapshot.structural_hash().len())
                })
            });
        }

        group.finish();
    }

    {
        let mut group = c.benchmark_group("diff.between");

        for (case_id, base) in [
            (
                "medium_branching_leaf",
                fixtures::story::fixture(fixtures::story::Case::MediumBranching),
            ),
            (
                "large_long_titles_leaf",
                fixtures::story::fixture(fixtures::story::Case::LargeLongTitles),
            ),
        ] {
            let base_analysis = analyze_graph(&base);
            let base_snapshot = GraphSnapshot::capture(&base, &base_analysis);

            let edited = fixtures::story::with_appended_leaf(&base);
            let edited_analysis = analyze_graph(&edited);
            let edited_snapshot = GraphSnapshot::capture(&edited, &edited_analysis);

            group.throughput(Throughput::Elements(edited.cards().len() as u64));
            group.bench_function(case_id, |b| {
                b.iter(|| {
                    let diff = GraphDiff::between(
                        Some(black_box(&base_snapshot)),
                        black_box(&edited_snapshot),
                        &config.full_layout,
                    );
                    black_box(diff.added_nodes.len() + diff.affected_subtree_roots.len())
                })
            });
        }

        group.finish();
    }
}

criterion_group! {
    name = benches;
    config = profiler::criterion();
    targets = benches_diff
}
criterion_main!(benches);
