// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

use super::ids::{CardId, ChoiceId};

/// A story card as the engine sees it: identity plus the structural fields
/// that influence geometry. Full card content never enters the engine —
/// content edits must not trigger relayout, so only *presence* is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    card_id: CardId,
    title: String,
    has_content: bool,
    has_image: bool,
}

impl Card {
    pub fn new(card_id: CardId, title: impl Into<String>) -> Self {
        Self {
            card_id,
            title: title.into(),
            has_content: false,
            has_image: false,
        }
    }

    pub fn card_id(&self) -> &CardId {
        &self.card_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn has_content(&self) -> bool {
        self.has_content
    }

    pub fn set_has_content(&mut self, has_content: bool) {
        self.has_content = has_content;
    }

    pub fn has_image(&self) -> bool {
        self.has_image
    }

    pub fn set_has_image(&mut self, has_image: bool) {
        self.has_image = has_image;
    }
}

/// A directed choice edge between cards.
///
/// A `None` target is a dangling choice (the author has not linked it yet);
/// dangling choices are excluded from layout but still count toward the
/// source card's outgoing-choice total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    choice_id: ChoiceId,
    source_card_id: CardId,
    target_card_id: Option<CardId>,
    order_index: u32,
}

impl Choice {
    pub fn new(
        choice_id: ChoiceId,
        source_card_id: CardId,
        target_card_id: Option<CardId>,
        order_index: u32,
    ) -> Self {
        Self {
            choice_id,
            source_card_id,
            target_card_id,
            order_index,
        }
    }

    pub fn choice_id(&self) -> &ChoiceId {
        &self.choice_id
    }

    pub fn source_card_id(&self) -> &CardId {
        &self.source_card_id
    }

    pub fn target_card_id(&self) -> Option<&CardId> {
        self.target_card_id.as_ref()
    }

    pub fn set_target_card_id(&mut self, target_card_id: Option<CardId>) {
        self.target_card_id = target_card_id;
    }

    pub fn order_index(&self) -> u32 {
        self.order_index
    }

    pub fn set_order_index(&mut self, order_index: u32) {
        self.order_index = order_index;
    }

    pub fn is_dangling(&self) -> bool {
        self.target_card_id.is_none()
    }
}
