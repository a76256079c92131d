//! Input and output types of the conversion API.

use crate::error::ConversionWarning;
use crate::model::{Block, DocumentModel};
use serde::{Deserialize, Serialize};

/// File stem used when a request carries no usable display name.
pub const DEFAULT_FILE_STEM: &str = "document";

/// One markdown document to convert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Raw markdown source.
    pub markdown: String,

    /// Display name; becomes the document title and the output file stem.
    pub name: Option<String>,
}

impl ConversionRequest {
    pub fn new(markdown: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
            name: None,
        }
    }

    pub fn named(markdown: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            markdown: markdown.into(),
            name: Some(name.into()),
        }
    }

    /// Output file name for an encoder producing `extension`.
    ///
    /// A trailing `.md` / `.markdown` is dropped from the display name and
    /// path separators and control characters are replaced.
    pub fn file_name(&self, extension: &str) -> String {
        let stem = self
            .name
            .as_deref()
            .map(sanitise_stem)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_FILE_STEM.to_string());
        format!("{stem}.{extension}")
    }
}

fn sanitise_stem(name: &str) -> String {
    let name = name.trim();
    let lower = name.to_ascii_lowercase();
    let stem = [".markdown", ".md"]
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map_or(name, |ext| &name[..name.len() - ext.len()]);

    stem.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string()
}

/// The complete result of converting one document.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// Suggested output file name, e.g. `"notes.json"`.
    pub file_name: String,

    /// Encoded document.
    pub bytes: Vec<u8>,

    /// The model the bytes were encoded from.
    pub document: DocumentModel,

    /// Images that fell back to links and tokens that were skipped.
    pub warnings: Vec<ConversionWarning>,

    pub stats: ConversionStats,
}

/// Counters for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub token_count: usize,
    pub block_count: usize,
    pub embedded_images: usize,
    pub image_fallbacks: usize,
    pub skipped_tokens: usize,
    pub output_bytes: usize,
    pub duration_ms: u64,
}

impl ConversionStats {
    pub(crate) fn collect(
        token_count: usize,
        blocks: &[Block],
        warnings: &[ConversionWarning],
        output_bytes: usize,
        duration_ms: u64,
    ) -> Self {
        let count = |pred: fn(&Block) -> bool| blocks.iter().filter(|b| pred(b)).count();
        Self {
            token_count,
            block_count: blocks.len(),
            embedded_images: count(|b| matches!(b, Block::EmbeddedImage(_))),
            image_fallbacks: count(|b| matches!(b, Block::ImageFallback { .. })),
            skipped_tokens: warnings
                .iter()
                .filter(|w| matches!(w, ConversionWarning::UnsupportedToken { .. }))
                .count(),
            output_bytes,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_defaults_to_document() {
        assert_eq!(ConversionRequest::new("# x").file_name("json"), "document.json");
        assert_eq!(
            ConversionRequest::named("# x", "  ").file_name("docx"),
            "document.docx"
        );
    }

    #[test]
    fn file_name_strips_markdown_extension() {
        let req = ConversionRequest::named("", "Release Notes.MD");
        assert_eq!(req.file_name("docx"), "Release Notes.docx");
        let req = ConversionRequest::named("", "guide.markdown");
        assert_eq!(req.file_name("json"), "guide.json");
    }

    #[test]
    fn file_name_replaces_separators() {
        let req = ConversionRequest::named("", "../a/b:c");
        assert_eq!(req.file_name("json"), "_a_b_c.json");
    }

    #[test]
    fn stats_count_images_and_skips() {
        let blocks = vec![
            Block::Rule,
            Block::ImageFallback {
                url: "u".into(),
                alt_text: String::new(),
            },
        ];
        let warnings = vec![ConversionWarning::UnsupportedToken { kind: "html".into() }];
        let stats = ConversionStats::collect(5, &blocks, &warnings, 10, 3);
        assert_eq!(stats.block_count, 2);
        assert_eq!(stats.image_fallbacks, 1);
        assert_eq!(stats.embedded_images, 0);
        assert_eq!(stats.skipped_tokens, 1);
    }
}
