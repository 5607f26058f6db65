// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural snapshots and snapshot diffing.
//!
//! A snapshot hashes the graph's structure (never its content); diffing two
//! snapshots yields the minimal changed sets and the subtree roots they
//! invalidate, plus the full-relayout decision.

pub mod diff;
pub mod snapshot;

pub use diff::{GraphDiff, LayoutScope};
pub use snapshot::GraphSnapshot;
