//! # md2doc
//!
//! Convert Markdown into a fully styled rich-document model, ready to hand to
//! a word-processor encoder.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Lex        pulldown-cmark → block tokens carrying raw source text
//!  ├─ 2. Transform  tokens → blocks (inline spans, lists, tables, images)
//!  ├─ 3. Assemble   blocks + style presets → DocumentModel
//!  └─ 4. Encode     DocumentModel → bytes (JSON built in, Encoder trait for more)
//! ```
//!
//! Conversion is fail-soft: images that cannot be fetched or are SVG become
//! fallback links, unknown tokens are skipped, and both are reported in
//! [`ConversionOutput::warnings`]. Only the encoder can fail a conversion.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2doc::{convert, ConversionConfig, ConversionRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let request = ConversionRequest::named("# Title\n\nHello **world**", "notes");
//!     let output = convert(&request, &config).await?;
//!     println!("{} blocks → {}", output.stats.block_count, output.file_name);
//!     for warning in &output.warnings {
//!         eprintln!("warning: {warning}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2doc` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! md2doc = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod token;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, StyleConfig};
pub use convert::{
    convert, convert_batch, convert_batch_with, convert_sync, convert_to_file, convert_with,
    read_request, write_output,
};
pub use error::{ConversionWarning, Md2DocError, NotEmbeddable};
pub use model::{Block, DocumentModel, EmbeddedImage, ImageFormat, NumberingRef, Span};
pub use output::{ConversionOutput, ConversionRequest, ConversionStats};
pub use pipeline::encode::{Encoder, JsonEncoder};
pub use pipeline::image::{FetchedImage, HttpImageFetcher, ImageFetcher, ImageResolver};
pub use pipeline::inline::parse as parse_inline;
pub use pipeline::lexer::lex;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_stream, convert_stream_with, DocumentStream};
pub use token::{ListItemToken, Token};
