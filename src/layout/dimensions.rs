// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Fabula-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Fabula and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Title-driven node box estimation.
//!
//! Pure and deterministic: identical titles always produce identical boxes.
//! Cache validity depends on that, so no real text measurement happens here —
//! width is an average-character-width approximation banded into three
//! regimes (one-line minimum, two-line target, three-line target).

use crate::config::DimensionConfig;
use crate::model::NodeDimensions;

pub fn estimate_dimensions(title: &str, config: &DimensionConfig) -> NodeDimensions {
    let width = estimate_width(title, config);
    let height = estimate_height(title, width, config);
    NodeDimensions::new(width, height)
}

fn estimate_width(title: &str, config: &DimensionConfig) -> f64 {
    let chars = title.chars().count();
    let text_width = chars as f64 * config.avg_char_width;

    let target = if chars <= config.short_title_max_chars {
        config.min_width
    } else if chars <= config.medium_title_max_chars {
        text_width / 2.0 + config.horizontal_padding
    } else {
        text_width / 3.0 + config.horizontal_padding
    };

    round_to_ten(target).clamp(config.min_width, config.max_width)
}

fn estimate_height(title: &str, width: f64, config: &DimensionConfig) -> f64 {
    let chars = title.chars().count();
    let text_width = chars as f64 * config.avg_char_width;
    let available = (width - config.horizontal_padding).max(config.avg_char_width);

    let lines = (text_width / available).ceil().max(1.0) as u32;
    let lines = lines.min(config.max_title_lines);

    let title_height = (f64::from(lines) * config.line_height).max(config.min_title_height);

    config.header_height + title_height + config.footer_height + config.vertical_padding
}

fn round_to_ten(value: f64) -> f64 {
    (value / 10.0).round() * 10.0
}
