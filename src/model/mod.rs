// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! Cards are nodes, choices are directed edges; a `StoryGraph` bundles one
//! story's structure plus the root and collapsed markers the layout depends on.

pub mod card;
pub mod geometry;
pub mod graph;
pub mod ids;

pub use card::{Card, Choice};
pub use geometry::{NodeDimensions, Position};
pub use graph::StoryGraph;
pub use ids::{CardId, ChoiceId, GraphId, Id, IdError, RequestId};

/// The engine's authoritative output: one top-left position per visible card.
pub type PositionMap = std::collections::BTreeMap<CardId, Position>;
