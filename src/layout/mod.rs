// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Node geometry: title-driven box estimation and the rank-based layout pass.

pub mod dimensions;
pub mod hierarchical;

pub use dimensions::estimate_dimensions;
pub use hierarchical::{expected_rank_x, layout_hierarchical};
