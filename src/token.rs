//! Block-level markdown tokens consumed by the block transformer.
//!
//! Tokens carry *raw* source text for everything that holds inline content
//! (paragraphs, list items, table cells, blockquotes). Inline markers such
//! as `**` and `[..](..)` are still present; the span parser in
//! [`crate::pipeline::inline`] is what interprets them. Headings are the
//! exception: their text is kept literally and never inline-parsed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of block-level markdown structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Token {
    Heading {
        depth: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    List {
        ordered: bool,
        items: Vec<ListItemToken>,
    },
    /// Only meaningful inside [`Token::List`]; a stray top-level item has
    /// no handler.
    ListItem(ListItemToken),
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Code {
        text: String,
    },
    Blockquote {
        text: String,
    },
    HorizontalRule,
    /// Blank-line separator between two blocks.
    Space,
    Image {
        href: String,
        title: Option<String>,
        text: String,
    },
    Text {
        text: String,
    },
    /// Raw HTML block. Produced by the lexer, not rendered.
    Html {
        raw: String,
    },
}

/// A single list item with its own raw text and nested block tokens.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListItemToken {
    pub text: String,
    /// `true` when the item starts with a `[ ]` / `[x]` marker.
    pub task: bool,
    pub checked: bool,
    pub children: Vec<Token>,
}

impl ListItemToken {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn task(text: impl Into<String>, checked: bool) -> Self {
        Self {
            text: text.into(),
            task: true,
            checked,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Token>) -> Self {
        self.children = children;
        self
    }
}

/// The kind tag of a token, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Heading,
    Paragraph,
    List,
    ListItem,
    Table,
    Code,
    Blockquote,
    HorizontalRule,
    Space,
    Image,
    Text,
    Html,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Heading { .. } => TokenKind::Heading,
            Token::Paragraph { .. } => TokenKind::Paragraph,
            Token::List { .. } => TokenKind::List,
            Token::ListItem(_) => TokenKind::ListItem,
            Token::Table { .. } => TokenKind::Table,
            Token::Code { .. } => TokenKind::Code,
            Token::Blockquote { .. } => TokenKind::Blockquote,
            Token::HorizontalRule => TokenKind::HorizontalRule,
            Token::Space => TokenKind::Space,
            Token::Image { .. } => TokenKind::Image,
            Token::Text { .. } => TokenKind::Text,
            Token::Html { .. } => TokenKind::Html,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Heading => "heading",
            TokenKind::Paragraph => "paragraph",
            TokenKind::List => "list",
            TokenKind::ListItem => "list_item",
            TokenKind::Table => "table",
            TokenKind::Code => "code",
            TokenKind::Blockquote => "blockquote",
            TokenKind::HorizontalRule => "hr",
            TokenKind::Space => "space",
            TokenKind::Image => "image",
            TokenKind::Text => "text",
            TokenKind::Html => "html",
        };
        f.write_str(name)
    }
}
