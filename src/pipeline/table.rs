//! Table building: raw cell text → a `Table` block with styled cells.
//!
//! Every header and body cell goes through the inline span parser on its
//! own, so cells support the same formatting as paragraphs. Row widths are
//! not reconciled with the header; ragged rows pass through untouched.

use crate::model::Block;
use crate::pipeline::inline;

pub fn build(header: &[String], rows: &[Vec<String>]) -> Block {
    Block::Table {
        header_cells: header.iter().map(|cell| inline::parse(cell)).collect(),
        rows: rows
            .iter()
            .map(|row| row.iter().map(|cell| inline::parse(cell)).collect())
            .collect(),
    }
}
