// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::card::{Card, Choice};
use super::ids::{CardId, ChoiceId, GraphId};

/// The top-level container the engine runs against: one story's cards,
/// choices, designated root, and the set of collapsed (subtree-hiding) cards.
///
/// The graph is owned by the authoring session and refreshed on every edit;
/// the engine only reads it. `BTreeMap`/`BTreeSet` throughout so that every
/// traversal is deterministic regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryGraph {
    graph_id: GraphId,
    cards: BTreeMap<CardId, Card>,
    choices: BTreeMap<ChoiceId, Choice>,
    root_card_id: Option<CardId>,
    collapsed: BTreeSet<CardId>,
}

impl StoryGraph {
    pub fn new(graph_id: GraphId) -> Self {
        Self {
            graph_id,
            cards: BTreeMap::new(),
            choices: BTreeMap::new(),
            root_card_id: None,
            collapsed: BTreeSet::new(),
        }
    }

    pub fn graph_id(&self) -> &GraphId {
        &self.graph_id
    }

    pub fn cards(&self) -> &BTreeMap<CardId, Card> {
        &self.cards
    }

    pub fn cards_mut(&mut self) -> &mut BTreeMap<CardId, Card> {
        &mut self.cards
    }

    pub fn choices(&self) -> &BTreeMap<ChoiceId, Choice> {
        &self.choices
    }

    pub fn choices_mut(&mut self) -> &mut BTreeMap<ChoiceId, Choice> {
        &mut self.choices
    }

    pub fn root_card_id(&self) -> Option<&CardId> {
        self.root_card_id.as_ref()
    }

    pub fn set_root_card_id(&mut self, root_card_id: Option<CardId>) {
        self.root_card_id = root_card_id;
    }

    pub fn collapsed(&self) -> &BTreeSet<CardId> {
        &self.collapsed
    }

    pub fn collapsed_mut(&mut self) -> &mut BTreeSet<CardId> {
        &mut self.collapsed
    }

    pub fn insert_card(&mut self, card: Card) {
        self.cards.insert(card.card_id().clone(), card);
    }

    pub fn insert_choice(&mut self, choice: Choice) {
        self.choices.insert(choice.choice_id().clone(), choice);
    }

    /// Choices that take part in layout: non-dangling, with both endpoints
    /// present in the card set. Anything else is a data-quality issue for the
    /// validation layer, not an error here.
    pub fn linked_choices(&self) -> impl Iterator<Item = &Choice> {
        self.choices.values().filter(|choice| {
            let Some(target) = choice.target_card_id() else {
                return false;
            };
            self.cards.contains_key(choice.source_card_id()) && self.cards.contains_key(target)
        })
    }
}
