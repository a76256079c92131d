//! List materialisation: nested list tokens → flat `ListItem` blocks.
//!
//! Output order is depth-first: an item's block is followed immediately by
//! the blocks of any list nested inside it, then by the item's next
//! sibling. The walk uses an explicit stack, so pathological nesting costs
//! heap, not call-stack frames.
//!
//! Numbering: every ordered list (nested or top-level) draws a fresh
//! numbering instance and counts its items from 1. A nested list never
//! continues its parent's count.

use crate::error::ConversionWarning;
use crate::model::{Block, NumberingRef, Span};
use crate::pipeline::inline;
use crate::token::{ListItemToken, Token};
use tracing::warn;

/// Glyph spans put in front of task items.
pub const CHECKED_GLYPH: &str = "☑ ";
pub const UNCHECKED_GLYPH: &str = "☐ ";

struct Frame<'a> {
    items: &'a [ListItemToken],
    next: usize,
    ordered: bool,
    level: u8,
    instance: Option<u32>,
}

/// Turns list tokens into blocks. Holds the per-document numbering counter.
#[derive(Debug)]
pub struct ListMaterializer {
    max_depth: u8,
    next_instance: u32,
}

impl ListMaterializer {
    pub fn new(max_depth: u8) -> Self {
        Self {
            max_depth,
            next_instance: 0,
        }
    }

    fn frame<'a>(&mut self, items: &'a [ListItemToken], ordered: bool, level: u8) -> Frame<'a> {
        let instance = ordered.then(|| {
            self.next_instance += 1;
            self.next_instance
        });
        Frame {
            items,
            next: 0,
            ordered,
            level: level.min(self.max_depth),
            instance,
        }
    }

    /// Append one `ListItem` block per item (recursively) to `out`.
    pub fn materialize(
        &mut self,
        items: &[ListItemToken],
        ordered: bool,
        level: u8,
        out: &mut Vec<Block>,
        warnings: &mut Vec<ConversionWarning>,
    ) {
        let root = self.frame(items, ordered, level);
        let mut stack = vec![root];

        while let Some(frame) = stack.last_mut() {
            let items = frame.items;
            let Some(item) = items.get(frame.next) else {
                stack.pop();
                continue;
            };
            frame.next += 1;

            let level = frame.level;
            out.push(Block::ListItem {
                level,
                ordered: frame.ordered,
                checked: item.task.then_some(item.checked),
                spans: item_spans(item),
                numbering: frame.instance.map(|instance| NumberingRef {
                    instance,
                    ordinal: frame.next as u32,
                }),
            });

            let mut nested = Vec::new();
            for child in &item.children {
                match child {
                    Token::List { ordered, items } => {
                        nested.push(self.frame(items, *ordered, level.saturating_add(1)));
                    }
                    other => {
                        warn!("Skipping '{}' token inside list item", other.kind());
                        warnings.push(ConversionWarning::UnsupportedToken {
                            kind: other.kind().to_string(),
                        });
                    }
                }
            }
            // Reversed so the first nested list is on top of the stack.
            stack.extend(nested.into_iter().rev());
        }
    }
}

fn item_spans(item: &ListItemToken) -> Vec<Span> {
    let mut spans = Vec::new();
    if item.task {
        let glyph = if item.checked {
            CHECKED_GLYPH
        } else {
            UNCHECKED_GLYPH
        };
        spans.push(Span::Glyph(glyph.to_string()));
    }
    spans.extend(inline::parse(&item.text));
    spans
}
