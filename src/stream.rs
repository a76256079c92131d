//! Streaming batch API: emit documents as they complete.
//!
//! Unlike [`crate::convert::convert_batch`], which returns only after every
//! document finishes, [`convert_stream`] yields each result as soon as it is
//! encoded. Documents run concurrently, so results may arrive out of order;
//! every item carries the 0-based index of its request.
//!
//! A single document is never streamed in parts.
//!
//! Progress callbacks fire per document; `on_batch_complete` does not, the
//! end of the stream marks completion.

use crate::config::ConversionConfig;
use crate::convert::convert_with;
use crate::error::Md2DocError;
use crate::output::{ConversionOutput, ConversionRequest};
use crate::pipeline::encode::{Encoder, JsonEncoder};
use crate::pipeline::image::{HttpImageFetcher, ImageFetcher};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// One finished document: `(request index, result)`.
pub type DocumentResult = (usize, Result<ConversionOutput, Md2DocError>);

/// A boxed stream of document results.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentResult> + Send>>;

/// Convert `requests`, streaming each document as it is ready.
///
/// Images are fetched over HTTP and documents are encoded with
/// [`JsonEncoder`].
///
/// # Returns
/// - `Ok(DocumentStream)`: one item per request, in completion order
/// - `Err(Md2DocError)`: the HTTP client could not be built
pub fn convert_stream(
    requests: Vec<ConversionRequest>,
    config: &ConversionConfig,
) -> Result<DocumentStream, Md2DocError> {
    let fetcher = HttpImageFetcher::new(&config.user_agent)?;
    Ok(convert_stream_with(
        requests,
        fetcher,
        Arc::new(JsonEncoder::default()),
        config,
    ))
}

/// [`convert_stream`] with a caller-supplied fetcher and encoder.
pub fn convert_stream_with<F>(
    requests: Vec<ConversionRequest>,
    fetcher: F,
    encoder: Arc<dyn Encoder>,
    config: &ConversionConfig,
) -> DocumentStream
where
    F: ImageFetcher + 'static,
{
    let total = requests.len();
    info!("Starting streaming conversion of {} documents", total);

    let fetcher = Arc::new(fetcher);
    let concurrency = config.concurrency.max(1);
    let config = config.clone();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let s = stream::iter(requests.into_iter().enumerate().map(move |(i, request)| {
        let fetcher = Arc::clone(&fetcher);
        let encoder = Arc::clone(&encoder);
        let cfg = config.clone();
        async move {
            let index = i + 1;
            if let Some(ref cb) = cfg.progress_callback {
                cb.on_document_start(index, total, request.name.as_deref());
            }
            let result = convert_with(&request, fetcher, encoder.as_ref(), &cfg).await;
            if let Some(ref cb) = cfg.progress_callback {
                match &result {
                    Ok(output) => cb.on_document_complete(index, total, output.stats.block_count),
                    Err(e) => cb.on_document_error(index, total, &e.to_string()),
                }
            }
            (i, result)
        }
    }))
    .buffer_unordered(concurrency);

    Box::pin(s)
}
