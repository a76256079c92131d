//! Progress-callback trait for batch conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as [`crate::convert::convert_batch`] and
//! [`crate::stream::convert_stream`] work through their documents.
//!
//! # Example
//!
//! ```rust
//! use md2doc::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_document_complete(&self, index: usize, total: usize, block_count: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Document {}/{} done ({} blocks)", index, total, block_count);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch APIs as each document is converted.
///
/// Documents are converted concurrently, so implementations must be
/// `Send + Sync` and protect any shared mutable state. All methods have
/// no-op defaults.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before any document is converted.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when a document's conversion begins.
    ///
    /// # Arguments
    /// * `index`: 1-indexed position of the document in the batch
    /// * `total`: documents in the batch
    /// * `name`: display name, if the request had one
    fn on_document_start(&self, index: usize, total: usize, name: Option<&str>) {
        let _ = (index, total, name);
    }

    /// Called when a document was converted and encoded.
    ///
    /// # Arguments
    /// * `block_count`: blocks in the produced document model
    fn on_document_complete(&self, index: usize, total: usize, block_count: usize) {
        let _ = (index, total, block_count);
    }

    /// Called when a document failed fatally (encoder error).
    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
