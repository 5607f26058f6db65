// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Fabula — incremental graph layout for branching narratives.
//!
//! The pipeline per structural change: analyze the graph, snapshot it,
//! diff against the retained snapshot, compose (full, geometric insert, or
//! subtree relayout), all fronted by `dispatch::ComputeDispatcher` and its
//! cache hierarchy. Every stage is deterministic: the same graph always
//! yields the same position map.

pub mod cache;
pub mod compositor;
pub mod config;
pub mod diff;
pub mod dispatch;
pub mod layout;
pub mod model;
pub mod query;

pub use config::EngineConfig;
pub use dispatch::{ComputeDispatcher, DispatchError, PositionUpdate};
pub use model::{Position, PositionMap, StoryGraph};
