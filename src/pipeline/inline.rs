//! Inline span parsing: raw text → ordered styled spans.
//!
//! The parser is a single left-to-right scan over an explicit, ordered rule
//! list:
//!
//! | Priority | Rule          | Syntax          |
//! |----------|---------------|-----------------|
//! | 1        | hyperlink     | `[text](url)`   |
//! | 2        | strikethrough | `~~text~~`      |
//! | 3        | bold          | `**text**`      |
//! | 4        | italic        | `*text*`        |
//! | 5        | inline code   | `` `text` ``    |
//!
//! At each cursor position every rule searches for its next match. The
//! match that starts earliest wins; when two start at the same byte the
//! higher-priority rule wins. Text between the cursor and the winning match
//! is emitted as plain text.
//!
//! Matches never nest: the inside of a bold span is not re-scanned for
//! italic or code.
//!
//! An italic marker that touches another `*` is not a marker: `a ** b *c*`
//! keeps the stray `**` as plain text and italicises only `c`.

use crate::model::Span;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    Hyperlink,
    Strikethrough,
    Bold,
    Italic,
    InlineCode,
}

struct InlineRule {
    kind: RuleKind,
    pattern: Regex,
}

/// Rules in priority order. Position in this list is the tie-break.
static RULES: Lazy<Vec<InlineRule>> = Lazy::new(|| {
    [
        (RuleKind::Hyperlink, r#"\[([^\]]+)\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#),
        (RuleKind::Strikethrough, r"~~(.+?)~~"),
        (RuleKind::Bold, r"\*\*(.+?)\*\*"),
        (RuleKind::Italic, r"\*([^*]+)\*"),
        (RuleKind::InlineCode, r"`([^`]+)`"),
    ]
    .into_iter()
    .map(|(kind, src)| InlineRule {
        kind,
        pattern: Regex::new(src).unwrap(),
    })
    .collect()
});

struct Candidate<'t> {
    kind: RuleKind,
    start: usize,
    end: usize,
    caps: Captures<'t>,
}

/// Split `text` into styled spans.
///
/// Total: never fails and never returns an empty list. Text with no markers
/// comes back as a single [`Span::PlainText`].
pub fn parse(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut cursor = 0;

    while cursor < text.len() {
        let Some(found) = next_match(text, cursor) else {
            break;
        };
        if found.start > cursor {
            spans.push(Span::plain(&text[cursor..found.start]));
        }
        spans.push(to_span(found.kind, &found.caps));
        cursor = found.end;
    }

    if cursor < text.len() {
        spans.push(Span::plain(&text[cursor..]));
    }
    if spans.is_empty() {
        spans.push(Span::plain(text));
    }
    spans
}

/// Earliest match at or after `cursor` across all rules.
fn next_match(text: &str, cursor: usize) -> Option<Candidate<'_>> {
    let mut best: Option<Candidate<'_>> = None;
    for rule in RULES.iter() {
        let Some(caps) = find_at(rule, text, cursor) else {
            continue;
        };
        let Some(whole) = caps.get(0) else {
            continue;
        };
        // Strictly earlier only: on a tie the rule seen first keeps the slot.
        if best.as_ref().is_none_or(|b| whole.start() < b.start) {
            best = Some(Candidate {
                kind: rule.kind,
                start: whole.start(),
                end: whole.end(),
                caps,
            });
        }
    }
    best
}

/// First match of `rule` at or after `from`.
///
/// Italic candidates touching another `*` are skipped so that `**` is never
/// split into two italic markers.
fn find_at<'t>(rule: &InlineRule, text: &'t str, mut from: usize) -> Option<Captures<'t>> {
    loop {
        let caps = rule.pattern.captures_at(text, from)?;
        let whole = caps.get(0)?;
        if rule.kind != RuleKind::Italic
            || is_single_star(text.as_bytes(), whole.start(), whole.end())
        {
            return Some(caps);
        }
        from = whole.start() + 1;
    }
}

fn is_single_star(bytes: &[u8], start: usize, end: usize) -> bool {
    let before = start.checked_sub(1).map(|i| bytes[i]);
    let after = bytes.get(end).copied();
    let opens_double = bytes.get(start + 1) == Some(&b'*');
    before != Some(b'*') && after != Some(b'*') && !opens_double
}

fn to_span(kind: RuleKind, caps: &Captures<'_>) -> Span {
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str()).to_string();
    match kind {
        RuleKind::Hyperlink => Span::Hyperlink {
            text: group(1),
            url: group(2),
        },
        RuleKind::Strikethrough => Span::Strikethrough(group(1)),
        RuleKind::Bold => Span::Bold(group(1)),
        RuleKind::Italic => Span::Italic(group(1)),
        RuleKind::InlineCode => Span::InlineCode(group(1)),
    }
}
