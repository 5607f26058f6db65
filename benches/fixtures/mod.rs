// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use fabula::model::{CardId, ChoiceId};

fn ascii_repeat_to_len(prefix: &str, fill: char, target_len: usize) -> String {
    if prefix.len() >= target_len {
        return prefix[..target_len].to_owned();
    }

    let mut out = String::with_capacity(target_len);
    out.push_str(prefix);
    while out.len() < target_len {
        out.push(fill);
    }
    out
}

fn card_id(index: u32) -> CardId {
    CardId::new(format!("c{index:05}")).expect("card id")
}

fn choice_id(index: u32) -> ChoiceId {
    ChoiceId::new(format!("e{index:05}")).expect("choice id")
}

pub mod story {
    use super::{ascii_repeat_to_len, card_id, choice_id};
    use fabula::model::{Card, Choice, GraphId, StoryGraph};

    #[derive(Debug, Clone, Copy)]
    pub enum Case {
        Small,
        MediumBranching,
        LargeLongTitles,
    }

    pub fn fixture(case: Case) -> StoryGraph {
        match case {
            Case::Small => tree(TreeParams::new(3, 2, 12)),
            Case::MediumBranching => tree(TreeParams::new(5, 3, 18)),
            Case::LargeLongTitles => tree(TreeParams::new(7, 2, 48)),
        }
    }

    #[derive(Debug, Clone, Copy)]
    pub struct TreeParams {
        pub depth: u32,
        pub fan_out: u32,
        pub title_len: usize,
    }

    impl TreeParams {
        pub fn new(depth: u32, fan_out: u32, title_len: usize) -> Self {
            Self {
                depth,
                fan_out,
                title_len,
            }
        }
    }

    /// Complete tree of the given depth and fan-out, breadth-first card
    /// numbering, every title filled to a fixed length.
    pub fn tree(params: TreeParams) -> StoryGraph {
        let mut graph = StoryGraph::new(GraphId::new("bench").expect("graph id"));
        let mut next_card = 0u32;
        let mut next_choice = 0u32;

        let root = card_id(next_card);
        graph.insert_card(Card::new(
            root.clone(),
            ascii_repeat_to_len("Opening", 'a', params.title_len),
        ));
        next_card += 1;

        let mut frontier = vec![root.clone()];
        for _ in 0..params.depth {
            let mut next_frontier = Vec::with_capacity(frontier.len() * params.fan_out as usize);
            for parent in &frontier {
                for order in 0..params.fan_out {
                    let child = card_id(next_card);
                    graph.insert_card(Card::new(
                        child.clone(),
                        ascii_repeat_to_len(&format!("Scene {next_card}"), 'b', params.title_len),
                    ));
                    graph.insert_choice(Choice::new(
                        choice_id(next_choice),
                        parent.clone(),
                        Some(child.clone()),
                        order,
                    ));
                    next_card += 1;
                    next_choice += 1;
                    next_frontier.push(child);
                }
            }
            frontier = next_frontier;
        }

        graph.set_root_card_id(Some(root));
        graph
    }

    /// A single leaf appended under the lexically last card, as an editor
    /// "add choice + card" gesture would produce.
    pub fn with_appended_leaf(base: &StoryGraph) -> StoryGraph {
        let mut graph = base.clone();
        let parent = graph
            .cards()
            .keys()
            .next_back()
            .expect("non-empty fixture")
            .clone();
        let leaf = super::card_id(90_000);
        graph.insert_card(Card::new(leaf.clone(), "Fresh ending"));
        graph.insert_choice(Choice::new(
            super::choice_id(90_000),
            parent,
            Some(leaf),
            0,
        ));
        graph
    }
}
