//! The rich-document model produced by the conversion pipeline.
//!
//! ```text
//! DocumentModel
//!  ├─ blocks: Vec<Block>        render order, one block per source construct
//!  │    └─ spans: Vec<Span>     styled text runs inside a block
//!  ├─ numbering: 3 levels       decimal / lower-letter / lower-roman
//!  ├─ headings: 6 presets       size decreasing from level 1 to 6
//!  └─ body / code run styles
//! ```
//!
//! Everything here is plain owned data. Once a [`DocumentModel`] is handed
//! to an encoder it is read once and dropped; nothing in the crate mutates
//! it after assembly.

use serde::{Deserialize, Serialize};

/// An atomic styled text fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Span {
    PlainText(String),
    Bold(String),
    Italic(String),
    Strikethrough(String),
    InlineCode(String),
    Hyperlink { text: String, url: String },
    /// A decorative glyph such as a task-list checkbox.
    Glyph(String),
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Span::PlainText(text.into())
    }

    /// The visible text of the span, markers stripped.
    pub fn text(&self) -> &str {
        match self {
            Span::PlainText(t)
            | Span::Bold(t)
            | Span::Italic(t)
            | Span::Strikethrough(t)
            | Span::InlineCode(t)
            | Span::Glyph(t) => t,
            Span::Hyperlink { text, .. } => text,
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, Span::PlainText(_))
    }
}

/// Image encodings every downstream encoder must accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpg,
    Gif,
    Bmp,
}

impl ImageFormat {
    /// Match a bare extension (`"jpeg"`, `"PNG"`, …).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpg),
            "gif" => Some(ImageFormat::Gif),
            "bmp" => Some(ImageFormat::Bmp),
            _ => None,
        }
    }

    /// Match a `Content-Type` header value.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let ct = content_type.to_ascii_lowercase();
        if ct.contains("png") {
            Some(ImageFormat::Png)
        } else if ct.contains("jpeg") || ct.contains("jpg") {
            Some(ImageFormat::Jpg)
        } else if ct.contains("gif") {
            Some(ImageFormat::Gif)
        } else if ct.contains("bmp") {
            Some(ImageFormat::Bmp)
        } else {
            None
        }
    }
}

/// Image bytes ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    #[serde(with = "base64_bytes")]
    pub bytes: Vec<u8>,
    /// Pixels. Fixed default, not decoded from the image.
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub alt_text: String,
}

/// Which numbering instance an ordered list item belongs to.
///
/// Every ordered list, nested or not, gets its own `instance`, so a nested
/// list never continues its parent's count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingRef {
    pub instance: u32,
    /// 1-based position inside the list.
    pub ordinal: u32,
}

/// One document-level element, in final render order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading {
        level: u8,
        spans: Vec<Span>,
    },
    Paragraph {
        spans: Vec<Span>,
        /// Space after the paragraph, twentieths of a point.
        spacing_after: u32,
    },
    ListItem {
        level: u8,
        ordered: bool,
        checked: Option<bool>,
        spans: Vec<Span>,
        numbering: Option<NumberingRef>,
    },
    Table {
        header_cells: Vec<Vec<Span>>,
        rows: Vec<Vec<Vec<Span>>>,
    },
    EmbeddedImage(EmbeddedImage),
    ImageFallback {
        url: String,
        alt_text: String,
    },
    BlockQuoteLine {
        spans: Vec<Span>,
    },
    CodeBlock {
        text: String,
    },
    Rule,
    Spacer,
}

/// Marker appended to the link text of an image that could not be embedded.
pub const IMAGE_FALLBACK_MARKER: &str = "(could not embed image)";

impl Block {
    /// Short kind name, used in logs and stats.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Heading { .. } => "heading",
            Block::Paragraph { .. } => "paragraph",
            Block::ListItem { .. } => "list_item",
            Block::Table { .. } => "table",
            Block::EmbeddedImage(_) => "embedded_image",
            Block::ImageFallback { .. } => "image_fallback",
            Block::BlockQuoteLine { .. } => "blockquote_line",
            Block::CodeBlock { .. } => "code_block",
            Block::Rule => "rule",
            Block::Spacer => "spacer",
        }
    }

    /// Spans an encoder should render for an image fallback: a visibly
    /// marked hyperlink to the original URL.
    pub fn fallback_spans(url: &str, alt_text: &str) -> Vec<Span> {
        let label = if alt_text.trim().is_empty() {
            url
        } else {
            alt_text
        };
        vec![Span::Hyperlink {
            text: format!("{label} {IMAGE_FALLBACK_MARKER}"),
            url: url.to_string(),
        }]
    }
}

// ── Styles ───────────────────────────────────────────────────────────────

/// List number formats, one per nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    Decimal,
    LowerLetter,
    LowerRoman,
}

impl NumberFormat {
    /// Format used at a nesting level; cycles past level 2.
    pub fn for_level(level: u8) -> Self {
        match level % 3 {
            0 => NumberFormat::Decimal,
            1 => NumberFormat::LowerLetter,
            _ => NumberFormat::LowerRoman,
        }
    }

    /// Render an ordinal in this format, e.g. `3 → "c"`.
    pub fn render(&self, ordinal: u32) -> String {
        match self {
            NumberFormat::Decimal => ordinal.to_string(),
            NumberFormat::LowerLetter => to_letters(ordinal),
            NumberFormat::LowerRoman => to_roman(ordinal),
        }
    }
}

fn to_letters(mut n: u32) -> String {
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn to_roman(mut n: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut out = String::new();
    for (value, numeral) in TABLE {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

/// Definition of one numbering level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingLevel {
    pub level: u8,
    pub format: NumberFormat,
    /// Level text pattern, `%1.` style.
    pub text: String,
    /// Left indent, twips.
    pub indent: u32,
    /// Hanging indent, twips.
    pub hanging: u32,
}

/// Font and size of a text run. Sizes are in half-points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStyle {
    pub font: String,
    pub size: u32,
    pub bold: bool,
}

/// Preset for one heading level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingStyle {
    pub level: u8,
    pub run: RunStyle,
}

/// The complete, style-annotated document ready for encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentModel {
    pub title: Option<String>,
    pub blocks: Vec<Block>,
    pub numbering: Vec<NumberingLevel>,
    pub headings: Vec<HeadingStyle>,
    pub body: RunStyle,
    pub code: RunStyle,
    /// Hex fill colour for table header cells.
    pub header_shading: String,
    /// Left indent per unordered list level, twips.
    pub bullet_indent: u32,
}

impl DocumentModel {
    /// Heading preset for `level` (1–6), clamped into range.
    pub fn heading_style(&self, level: u8) -> Option<&HeadingStyle> {
        let idx = level.clamp(1, 6) as usize - 1;
        self.headings.get(idx)
    }

    /// Numbering definition used at a list nesting level.
    pub fn numbering_level(&self, level: u8) -> Option<&NumberingLevel> {
        if self.numbering.is_empty() {
            return None;
        }
        self.numbering.get(level as usize % self.numbering.len())
    }

    /// Left indent for a bullet at `level`.
    pub fn bullet_indent_for(&self, level: u8) -> u32 {
        self.bullet_indent * (level as u32 + 1)
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(d)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
