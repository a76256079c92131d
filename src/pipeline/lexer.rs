//! Markdown lexing: markdown string → block-level [`Token`] stream.
//!
//! Built on `pulldown-cmark`'s offset iterator. Block structure comes from
//! the parser's events, but inline content is taken as the *raw source
//! slice* covered by those events, so markers like `**` survive into the
//! token text for the span parser to interpret.
//!
//! ## Separators
//!
//! pulldown-cmark has no event for blank lines, so [`Token::Space`] is
//! synthesised between two top-level blocks separated by at least one blank
//! line. Headings, code fences, rules and tables absorb the blank lines that
//! follow them and never produce a separator.

use crate::token::{ListItemToken, Token, TokenKind};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::ops::Range;
use tracing::debug;

/// Strip YAML front matter from the beginning of markdown content.
///
/// Front matter opens with a line that is exactly `---`, has a non-blank
/// line right after it and closes with another `---` line. Anything else
/// starting with `---` is a thematic break and is left alone.
fn strip_frontmatter(markdown: &str) -> &str {
    let mut lines = markdown.split_inclusive('\n');
    let mut offset = match lines.next() {
        Some(first) if first.trim_end() == "---" => first.len(),
        _ => return markdown,
    };
    let mut has_body = false;
    for line in lines {
        offset += line.len();
        let trimmed = line.trim_end();
        if trimmed == "---" {
            return if has_body {
                markdown[offset..].trim_start_matches(['\r', '\n'])
            } else {
                markdown
            };
        }
        if !has_body && trimmed.is_empty() {
            return markdown;
        }
        has_body = true;
    }
    markdown
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

/// Lex `markdown` into block tokens in source order.
pub fn lex(markdown: &str) -> Vec<Token> {
    let src = strip_frontmatter(markdown);
    let mut lexer = Lexer::new(src);
    for (event, range) in Parser::new_ext(src, options()).into_offset_iter() {
        lexer.event(event, range);
    }
    debug!("Lexed {} top-level tokens", lexer.tokens.len());
    lexer.tokens
}

/// Smallest source range covering every inline event seen so far.
#[derive(Debug, Default)]
struct RawSpan {
    range: Option<Range<usize>>,
}

impl RawSpan {
    fn extend(&mut self, r: Range<usize>) {
        self.range = Some(match self.range.take() {
            Some(cur) => cur.start.min(r.start)..cur.end.max(r.end),
            None => r,
        });
    }

    fn take_text(&mut self, src: &str) -> Option<String> {
        self.range.take().map(|r| normalise(&src[r]))
    }
}

#[derive(Debug, Default)]
struct ItemBuilder {
    token: ListItemToken,
    pieces: Vec<String>,
    raw: RawSpan,
}

impl ItemBuilder {
    fn flush(&mut self, src: &str) {
        if let Some(text) = self.raw.take_text(src) {
            if !text.is_empty() {
                self.pieces.push(text);
            }
        }
    }
}

#[derive(Debug)]
enum Container {
    List {
        ordered: bool,
        items: Vec<ListItemToken>,
    },
    Item(ItemBuilder),
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
        row: Vec<String>,
    },
}

#[derive(Debug)]
enum Leaf {
    Paragraph,
    Heading(u8),
    Code(String),
    Html,
    Cell(RawSpan),
}

struct Lexer<'s> {
    src: &'s str,
    tokens: Vec<Token>,
    stack: Vec<Container>,
    leaf: Option<Leaf>,
    /// Nesting depth of the blockquote being skipped over.
    quote_depth: usize,
    last_top: Option<(usize, TokenKind)>,
}

impl<'s> Lexer<'s> {
    fn new(src: &'s str) -> Self {
        Self {
            src,
            tokens: Vec::new(),
            stack: Vec::new(),
            leaf: None,
            quote_depth: 0,
            last_top: None,
        }
    }

    fn event(&mut self, event: Event<'_>, range: Range<usize>) {
        if self.quote_depth > 0 {
            self.inside_quote(&event, range);
            return;
        }

        match event {
            Event::Start(Tag::BlockQuote(_)) => {
                self.flush_item();
                self.quote_depth = 1;
            }
            Event::Start(Tag::Paragraph) => {
                self.flush_item();
                self.leaf = Some(Leaf::Paragraph);
            }
            Event::End(TagEnd::Paragraph) => {
                self.leaf = None;
                let text = normalise(&self.src[range.clone()]);
                if let Some(Container::Item(item)) = self.stack.last_mut() {
                    item.pieces.push(text);
                } else {
                    self.emit(Token::Paragraph { text }, range);
                }
            }
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush_item();
                self.leaf = Some(Leaf::Heading(heading_depth(level)));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(Leaf::Heading(depth)) = self.leaf.take() {
                    let text = heading_text(&self.src[range.clone()]);
                    self.emit(Token::Heading { depth, text }, range);
                }
            }
            Event::Start(Tag::CodeBlock(_)) => {
                self.flush_item();
                self.leaf = Some(Leaf::Code(String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(Leaf::Code(text)) = self.leaf.take() {
                    let text = text.trim_end_matches('\n').to_string();
                    self.emit(Token::Code { text }, range);
                }
            }
            Event::Start(Tag::HtmlBlock) => {
                self.flush_item();
                self.leaf = Some(Leaf::Html);
            }
            Event::End(TagEnd::HtmlBlock) => {
                self.leaf = None;
                let raw = self.src[range.clone()].trim_end().to_string();
                self.emit(Token::Html { raw }, range);
            }
            Event::Start(Tag::List(first)) => {
                self.flush_item();
                self.stack.push(Container::List {
                    ordered: first.is_some(),
                    items: Vec::new(),
                });
            }
            Event::End(TagEnd::List(_)) => {
                if let Some(Container::List { ordered, items }) = self.stack.pop() {
                    self.emit(Token::List { ordered, items }, range);
                }
            }
            Event::Start(Tag::Item) => {
                self.stack.push(Container::Item(ItemBuilder::default()));
            }
            Event::End(TagEnd::Item) => {
                if let Some(Container::Item(mut item)) = self.stack.pop() {
                    item.flush(self.src);
                    item.token.text = item.pieces.join(" ");
                    if let Some(Container::List { items, .. }) = self.stack.last_mut() {
                        items.push(item.token);
                    }
                }
            }
            Event::TaskListMarker(checked) => {
                if let Some(Container::Item(item)) = self.stack.last_mut() {
                    item.token.task = true;
                    item.token.checked = checked;
                }
            }
            Event::Start(Tag::Table(_)) => {
                self.flush_item();
                self.stack.push(Container::Table {
                    header: Vec::new(),
                    rows: Vec::new(),
                    row: Vec::new(),
                });
            }
            Event::End(TagEnd::TableHead) => {
                if let Some(Container::Table { header, row, .. }) = self.stack.last_mut() {
                    *header = std::mem::take(row);
                }
            }
            Event::End(TagEnd::TableRow) => {
                if let Some(Container::Table { rows, row, .. }) = self.stack.last_mut() {
                    rows.push(std::mem::take(row));
                }
            }
            Event::Start(Tag::TableCell) => {
                self.leaf = Some(Leaf::Cell(RawSpan::default()));
            }
            Event::End(TagEnd::TableCell) => {
                let text = match self.leaf.take() {
                    Some(Leaf::Cell(mut raw)) => raw
                        .take_text(self.src)
                        .map(|t| t.replace("\\|", "|"))
                        .unwrap_or_default(),
                    _ => String::new(),
                };
                if let Some(Container::Table { row, .. }) = self.stack.last_mut() {
                    row.push(text);
                }
            }
            Event::End(TagEnd::Table) => {
                if let Some(Container::Table { header, rows, .. }) = self.stack.pop() {
                    self.emit(Token::Table { header, rows }, range);
                }
            }
            Event::Rule => {
                self.flush_item();
                self.emit(Token::HorizontalRule, range);
            }
            Event::Text(text) => {
                if let Some(Leaf::Code(buf)) = &mut self.leaf {
                    buf.push_str(&text);
                } else {
                    self.inline(range);
                }
            }
            Event::Start(_)
            | Event::End(_)
            | Event::Code(_)
            | Event::Html(_)
            | Event::InlineHtml(_)
            | Event::InlineMath(_)
            | Event::DisplayMath(_)
            | Event::FootnoteReference(_)
            | Event::SoftBreak
            | Event::HardBreak => self.inline(range),
        }
    }

    /// Skip everything inside a blockquote; on close, emit its raw text.
    fn inside_quote(&mut self, event: &Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(Tag::BlockQuote(_)) => self.quote_depth += 1,
            Event::End(TagEnd::BlockQuote(_)) => {
                self.quote_depth -= 1;
                if self.quote_depth == 0 {
                    let text = unquote(&self.src[range.clone()]);
                    self.emit(Token::Blockquote { text }, range);
                }
            }
            _ => {}
        }
    }

    /// Record an inline event's source range on whatever is collecting it.
    fn inline(&mut self, range: Range<usize>) {
        match &mut self.leaf {
            Some(Leaf::Cell(raw)) => raw.extend(range),
            Some(_) => {}
            None => {
                if let Some(Container::Item(item)) = self.stack.last_mut() {
                    item.raw.extend(range);
                }
            }
        }
    }

    fn flush_item(&mut self) {
        if let Some(Container::Item(item)) = self.stack.last_mut() {
            item.flush(self.src);
        }
    }

    /// Place a finished block token: into the enclosing list item, or at
    /// top level (preceded by a separator when a blank line came first).
    fn emit(&mut self, token: Token, range: Range<usize>) {
        match self.stack.last_mut() {
            Some(Container::Item(item)) => item.token.children.push(token),
            Some(_) => debug!("Dropping '{}' token inside table or list", token.kind()),
            None => {
                if let Some((prev_end, prev_kind)) = self.last_top {
                    if !absorbs_trailing_blank(prev_kind)
                        && has_blank_line(self.src, prev_end, range.start)
                    {
                        self.tokens.push(Token::Space);
                    }
                }
                self.last_top = Some((range.end, token.kind()));
                self.tokens.push(token);
            }
        }
    }
}

fn absorbs_trailing_blank(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Heading | TokenKind::Code | TokenKind::HorizontalRule | TokenKind::Table
    )
}

fn has_blank_line(src: &str, prev_end: usize, start: usize) -> bool {
    if start <= prev_end {
        return false;
    }
    let mut newlines = src[prev_end..start].matches('\n').count();
    if src[..prev_end].ends_with('\n') {
        newlines += 1;
    }
    newlines >= 2
}

/// Collapse a multi-line raw slice into one line of text.
fn normalise(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Literal heading text: ATX hashes or the setext underline removed.
fn heading_text(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with('#') {
        let body = raw.trim_start_matches('#').trim();
        let without_closing = body.trim_end_matches('#');
        if without_closing.len() != body.len()
            && (without_closing.is_empty() || without_closing.ends_with([' ', '\t']))
        {
            return without_closing.trim_end().to_string();
        }
        return body.to_string();
    }
    let mut lines: Vec<&str> = raw.lines().collect();
    lines.pop();
    normalise(&lines.join("\n"))
}

/// Blockquote body with the `>` markers removed from each line.
fn unquote(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            let mut rest = line.trim_start();
            while let Some(stripped) = rest.strip_prefix('>') {
                rest = stripped.strip_prefix(' ').unwrap_or(stripped).trim_start();
            }
            rest.trim_end()
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str) -> Token {
        Token::Paragraph { text: text.into() }
    }

    #[test]
    fn heading_then_paragraph_has_no_separator() {
        assert_eq!(
            lex("# Title\n\nHello **world**"),
            vec![
                Token::Heading {
                    depth: 1,
                    text: "Title".into()
                },
                para("Hello **world**"),
            ]
        );
    }

    #[test]
    fn paragraphs_are_separated_by_space() {
        assert_eq!(
            lex("one\n\n\n\ntwo\nstill two\n"),
            vec![para("one"), Token::Space, para("two still two")]
        );
    }

    #[test]
    fn heading_keeps_literal_markers() {
        assert_eq!(
            lex("## A **bold** idea ##\n"),
            vec![Token::Heading {
                depth: 2,
                text: "A **bold** idea".into()
            }]
        );
    }

    #[test]
    fn setext_heading() {
        assert_eq!(
            lex("Title\n=====\n"),
            vec![Token::Heading {
                depth: 1,
                text: "Title".into()
            }]
        );
    }

    #[test]
    fn task_list_item() {
        assert_eq!(
            lex("- [x] Done\n- [ ] Todo *soon*\n"),
            vec![Token::List {
                ordered: false,
                items: vec![
                    ListItemToken::task("Done", true),
                    ListItemToken::task("Todo *soon*", false),
                ],
            }]
        );
    }

    #[test]
    fn nested_ordered_list() {
        let tokens = lex("1. one\n2. two\n   1. inner\n3. three\n");
        let Token::List { ordered, items } = &tokens[0] else {
            panic!("expected list, got {tokens:?}");
        };
        assert!(*ordered);
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].text, "two");
        assert_eq!(
            items[1].children,
            vec![Token::List {
                ordered: true,
                items: vec![ListItemToken::new("inner")],
            }]
        );
    }

    #[test]
    fn table_cells_keep_raw_markers() {
        let tokens = lex("| Name | **Score** |\n|---|---|\n| `a` | 10 |\n");
        assert_eq!(
            tokens,
            vec![Token::Table {
                header: vec!["Name".into(), "**Score**".into()],
                rows: vec![vec!["`a`".into(), "10".into()]],
            }]
        );
    }

    #[test]
    fn fenced_code_block() {
        assert_eq!(
            lex("```rust\nfn main() {}\n```\n"),
            vec![Token::Code {
                text: "fn main() {}".into()
            }]
        );
    }

    #[test]
    fn blockquote_lines_are_unquoted() {
        assert_eq!(
            lex("> first *line*\n> second\n"),
            vec![Token::Blockquote {
                text: "first *line*\nsecond".into()
            }]
        );
    }

    #[test]
    fn rule_and_html() {
        let tokens = lex("<div>x</div>\n\n---\n");
        assert!(matches!(tokens[0], Token::Html { .. }));
        assert_eq!(tokens.last(), Some(&Token::HorizontalRule));
    }

    #[test]
    fn frontmatter_is_stripped() {
        assert_eq!(lex("---\ntitle: x\n---\n\nBody\n"), vec![para("Body")]);
    }

    #[test]
    fn leading_rule_is_not_frontmatter() {
        let tokens = lex("---\n\nIntro paragraph\n\n---\n\nBody\n");
        assert_eq!(tokens.first(), Some(&Token::HorizontalRule));
        let content: Vec<_> = tokens
            .into_iter()
            .filter(|t| !matches!(t, Token::Space))
            .collect();
        assert_eq!(
            content,
            vec![
                Token::HorizontalRule,
                para("Intro paragraph"),
                Token::HorizontalRule,
                para("Body"),
            ]
        );
    }

    #[test]
    fn unclosed_frontmatter_is_kept() {
        let tokens = lex("---\ntitle: x\n\nBody\n");
        assert_eq!(tokens.first(), Some(&Token::HorizontalRule));
        assert_eq!(tokens.last(), Some(&para("Body")));
    }

    #[test]
    fn heading_text_variants() {
        assert_eq!(heading_text("# C#"), "C#");
        assert_eq!(heading_text("### Closed ###"), "Closed");
        assert_eq!(heading_text("#"), "");
    }

    #[test]
    fn unquote_nested_markers() {
        assert_eq!(unquote("> > deep\n>\n> shallow"), "deep\n\nshallow");
    }
}
