//! Document assembly: blocks + style presets → [`DocumentModel`].
//!
//! Pure: no I/O, inputs are not mutated, and the encoder is not invoked.

use crate::config::StyleConfig;
use crate::model::{Block, DocumentModel, HeadingStyle, NumberFormat, NumberingLevel, RunStyle};

/// Number of numbering levels bundled into every document.
pub const NUMBERING_LEVELS: u8 = 3;

pub fn assemble(title: Option<&str>, blocks: Vec<Block>, style: &StyleConfig) -> DocumentModel {
    DocumentModel {
        title: title.map(str::to_string),
        blocks,
        numbering: numbering_levels(style),
        headings: heading_styles(style),
        body: RunStyle {
            font: style.body_font.clone(),
            size: style.body_size_pt * 2,
            bold: false,
        },
        code: RunStyle {
            font: style.code_font.clone(),
            size: style.body_size_pt * 2,
            bold: false,
        },
        header_shading: style.header_shading.trim_start_matches('#').to_uppercase(),
        bullet_indent: style.list_indent,
    }
}

fn numbering_levels(style: &StyleConfig) -> Vec<NumberingLevel> {
    (0..NUMBERING_LEVELS)
        .map(|level| NumberingLevel {
            level,
            format: NumberFormat::for_level(level),
            text: format!("%{}.", level + 1),
            indent: style.list_indent * 2 * (level as u32 + 1),
            hanging: style.list_hanging,
        })
        .collect()
}

fn heading_styles(style: &StyleConfig) -> Vec<HeadingStyle> {
    style
        .heading_sizes_pt
        .iter()
        .zip(1u8..)
        .map(|(size, level)| HeadingStyle {
            level,
            run: RunStyle {
                font: style.body_font.clone(),
                size: size * 2,
                bold: true,
            },
        })
        .collect()
}
