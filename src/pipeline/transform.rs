//! Block transformation: token stream → ordered document blocks.
//!
//! The transformer walks the tokens strictly in source order and routes each
//! one to the component that builds its blocks: the span parser for text,
//! the list materialiser, the table builder, or the image resolver. Image
//! resolution is the only suspension point and is awaited in place, so an
//! image (or its fallback) lands exactly where it was referenced.
//!
//! ## Separators
//!
//! A run of consecutive [`Token::Space`] tokens yields at most one
//! [`Block::Spacer`]: the first space token in a run bumps the counter to 1
//! and emits, later ones only bump it. Any other token resets the counter.
//! No previous-token kind is tracked: only space tokens touch the counter,
//! so a non-zero count already means the previous token was a space.
//!
//! ## Failure isolation
//!
//! Nothing here fails. Images that cannot be embedded become
//! [`Block::ImageFallback`]; tokens without a handler are skipped. Both are
//! recorded as [`ConversionWarning`]s in the output.

use crate::config::ConversionConfig;
use crate::error::ConversionWarning;
use crate::model::{Block, Span};
use crate::pipeline::image::{ImageFetcher, ImageResolver};
use crate::pipeline::list::ListMaterializer;
use crate::pipeline::{inline, table};
use crate::token::{Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// A paragraph consisting of exactly one image reference.
static RE_SOLE_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^!\[([^\]]*)\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)$"#).unwrap()
});

/// Blocks produced by one pass, plus everything that was degraded.
#[derive(Debug, Default)]
pub struct TransformOutput {
    pub blocks: Vec<Block>,
    pub warnings: Vec<ConversionWarning>,
}

/// Convert `tokens` into blocks, resolving images through `resolver`.
pub async fn transform<F: ImageFetcher>(
    tokens: &[Token],
    resolver: &ImageResolver<F>,
    config: &ConversionConfig,
) -> TransformOutput {
    let mut transformer = BlockTransformer::new(resolver, config);
    for token in tokens {
        transformer.push(token).await;
    }
    transformer.finish()
}

/// Per-document transformation state. Never shared between documents.
pub struct BlockTransformer<'r, F> {
    resolver: &'r ImageResolver<F>,
    spacing_after: u32,
    lists: ListMaterializer,
    consecutive_spacers: usize,
    out: TransformOutput,
}

impl<'r, F: ImageFetcher> BlockTransformer<'r, F> {
    pub fn new(resolver: &'r ImageResolver<F>, config: &ConversionConfig) -> Self {
        Self {
            resolver,
            spacing_after: config.paragraph_spacing_after,
            lists: ListMaterializer::new(config.max_list_depth),
            consecutive_spacers: 0,
            out: TransformOutput::default(),
        }
    }

    pub fn finish(self) -> TransformOutput {
        debug!(
            "Transformed into {} blocks ({} warnings)",
            self.out.blocks.len(),
            self.out.warnings.len()
        );
        self.out
    }

    /// Append the blocks for one token.
    pub async fn push(&mut self, token: &Token) {
        if token.kind() == TokenKind::Space {
            self.consecutive_spacers += 1;
            if self.consecutive_spacers <= 1 {
                self.out.blocks.push(Block::Spacer);
            }
            return;
        }
        self.consecutive_spacers = 0;

        match token {
            Token::Heading { depth, text } => {
                self.out.blocks.push(Block::Heading {
                    level: (*depth).clamp(1, 6),
                    spans: vec![Span::plain(text.as_str())],
                });
            }
            Token::Paragraph { text } | Token::Text { text } => {
                if let Some((alt, url)) = sole_image(text) {
                    self.push_image(&url, &alt).await;
                } else {
                    self.push_paragraph(text);
                }
            }
            Token::Image { href, text, .. } => self.push_image(href, text).await,
            Token::List { ordered, items } => {
                self.lists
                    .materialize(items, *ordered, 0, &mut self.out.blocks, &mut self.out.warnings);
            }
            Token::Table { header, rows } => self.out.blocks.push(table::build(header, rows)),
            Token::Code { text } => self.out.blocks.push(Block::CodeBlock { text: text.clone() }),
            Token::Blockquote { text } => {
                for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                    self.out.blocks.push(Block::BlockQuoteLine {
                        spans: inline::parse(line),
                    });
                }
            }
            Token::HorizontalRule => self.out.blocks.push(Block::Rule),
            Token::ListItem(_) | Token::Html { .. } => self.skip(token.kind()),
            Token::Space => {}
        }
    }

    fn push_paragraph(&mut self, text: &str) {
        self.out.blocks.push(Block::Paragraph {
            spans: inline::parse(text),
            spacing_after: self.spacing_after,
        });
    }

    async fn push_image(&mut self, url: &str, alt: &str) {
        match self.resolver.resolve(url, alt).await {
            Ok(image) => self.out.blocks.push(Block::EmbeddedImage(image)),
            Err(reason) => {
                warn!("Rendering fallback link for image {}: {}", url, reason);
                self.out.warnings.push(ConversionWarning::ImageNotEmbedded {
                    url: url.to_string(),
                    reason,
                });
                self.out.blocks.push(Block::ImageFallback {
                    url: url.to_string(),
                    alt_text: alt.to_string(),
                });
            }
        }
    }

    fn skip(&mut self, kind: TokenKind) {
        warn!("No handler for '{}' token; skipping", kind);
        self.out
            .warnings
            .push(ConversionWarning::UnsupportedToken { kind: kind.to_string() });
    }
}

/// `(alt, url)` when the whole text is a single `![alt](url)`.
fn sole_image(text: &str) -> Option<(String, String)> {
    let caps = RE_SOLE_IMAGE.captures(text.trim())?;
    let alt = caps.get(1).map_or("", |m| m.as_str()).to_string();
    let url = caps.get(2)?.as_str().to_string();
    Some((alt, url))
}
