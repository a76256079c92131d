//! Pipeline stages for markdown-to-document conversion.
//!
//! Each submodule implements one transformation step and is testable on its
//! own.
//!
//! ## Data Flow
//!
//! ```text
//! lexer ──▶ transform ──▶ assemble ──▶ encode
//! (tokens)    │  (blocks)   (model)     (bytes)
//!             ├─ inline   text → spans
//!             ├─ list     nested items → flat ListItem blocks
//!             ├─ table    cells → spans
//!             └─ image    URL → embedded bytes or fallback
//! ```
//!
//! 1. [`lexer`]: markdown → [`crate::token::Token`]s via pulldown-cmark,
//!    keeping raw source text so inline markers survive
//! 2. [`transform`]: dispatch each token, in order, to the builders below;
//!    the only stage that awaits (image fetches)
//! 3. [`assemble`]: attach numbering definitions and style presets
//! 4. [`encode`]: serialise through an [`encode::Encoder`]; the only
//!    stage that can fail fatally

pub mod assemble;
pub mod encode;
pub mod image;
pub mod inline;
pub mod lexer;
pub mod list;
pub mod table;
pub mod transform;
