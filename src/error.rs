//! Error types for the md2doc library.
//!
//! Three kinds of failure exist and each has its own type:
//!
//! * [`Md2DocError`] (fatal): the conversion cannot produce output at
//!   all (the encoder rejected the model, the input file is unreadable, the
//!   configuration is invalid). Returned as `Err(Md2DocError)` from the
//!   top-level `convert*` functions. No partial output accompanies it.
//!
//! * [`NotEmbeddable`] (soft): an image could not be turned into
//!   embedded bytes. The image resolver returns it as a value instead of
//!   raising, and the block transformer renders a fallback link in place.
//!
//! * [`ConversionWarning`] (soft): a record of everything the pass
//!   degraded or skipped. Stored in [`crate::output::ConversionOutput`] so
//!   callers can inspect fail-soft behaviour without scraping logs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the md2doc library.
#[derive(Debug, Error)]
pub enum Md2DocError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Markdown input could not be read from disk or stdin.
    #[error("Failed to read markdown from '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Encoding errors ───────────────────────────────────────────────────
    /// The encoder could not serialise the finished document model.
    #[error("Encoder '{encoder}' failed: {message}")]
    EncodingFailed { encoder: String, message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the encoded output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why an image reference was rendered as a fallback link instead of
/// being embedded.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum NotEmbeddable {
    /// The URL ends in `.svg`; no fetch was attempted.
    #[error("SVG images cannot be embedded (URL suffix)")]
    SvgUrl,

    /// The server declared an SVG content type.
    #[error("SVG images cannot be embedded (content type '{content_type}')")]
    SvgContentType { content_type: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    /// The request or the body read failed.
    #[error("fetch failed: {detail}")]
    Transport { detail: String },
}

/// A non-fatal event recorded during the block pass.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ConversionWarning {
    /// An image was replaced by a fallback hyperlink.
    #[error("Image '{url}' was not embedded: {reason}")]
    ImageNotEmbedded { url: String, reason: NotEmbeddable },

    /// A token kind with no handler was skipped.
    #[error("Skipped unsupported '{kind}' token")]
    UnsupportedToken { kind: String },
}
