// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural queries over a story graph.
//!
//! One analysis pass feeds everything downstream: snapshot hashing, layout
//! ranking, and collapse-driven visibility.

pub mod graph;

pub use graph::{analyze_graph, descendants_of, ChildList, GraphAnalysis};
