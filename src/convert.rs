//! Eager conversion entry points.
//!
//! Every entry point runs the same four steps per document:
//!
//! ```text
//! lex ──▶ transform ──▶ assemble ──▶ encode
//! ```
//!
//! Only the last step can fail. Everything degraded before it (images that
//! fell back to links, skipped tokens) is reported through
//! [`ConversionOutput::warnings`]. Use [`crate::stream::convert_stream`]
//! instead of [`convert_batch`] when documents should be handed over as soon
//! as each one finishes.

use crate::config::ConversionConfig;
use crate::error::Md2DocError;
use crate::output::{ConversionOutput, ConversionRequest, ConversionStats};
use crate::pipeline::assemble::assemble;
use crate::pipeline::encode::{encode_document, Encoder, JsonEncoder};
use crate::pipeline::image::{HttpImageFetcher, ImageFetcher, ImageResolver};
use crate::pipeline::lexer::lex;
use crate::pipeline::transform::transform;
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert one markdown document, fetching images over HTTP and encoding
/// with [`JsonEncoder`].
///
/// # Errors
/// Returns `Err(Md2DocError)` only when no output can be produced: the HTTP
/// client could not be built or the encoder failed.
pub async fn convert(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2DocError> {
    let fetcher = HttpImageFetcher::new(&config.user_agent)?;
    convert_with(request, fetcher, &JsonEncoder::default(), config).await
}

/// Convert one document with a caller-supplied fetcher and encoder.
///
/// This is the seam a word-processor encoder plugs into.
pub async fn convert_with<F: ImageFetcher>(
    request: &ConversionRequest,
    fetcher: F,
    encoder: &dyn Encoder,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2DocError> {
    let start = Instant::now();
    let name = request.name.as_deref().unwrap_or("<unnamed>");
    info!("Starting conversion: {} ({} bytes)", name, request.markdown.len());

    // ── Step 1: Lex ──────────────────────────────────────────────────────
    let tokens = lex(&request.markdown);
    debug!("Lexed {} tokens", tokens.len());

    // ── Step 2: Transform ────────────────────────────────────────────────
    let resolver = ImageResolver::new(fetcher, config.image_width, config.image_height);
    let transformed = transform(&tokens, &resolver, config).await;

    // ── Step 3: Assemble ─────────────────────────────────────────────────
    let document = assemble(request.name.as_deref(), transformed.blocks, &config.style);

    // ── Step 4: Encode ───────────────────────────────────────────────────
    let bytes = encode_document(encoder, &document)?;

    let stats = ConversionStats::collect(
        tokens.len(),
        &document.blocks,
        &transformed.warnings,
        bytes.len(),
        start.elapsed().as_millis() as u64,
    );

    info!(
        "Conversion complete: {} blocks, {} warnings, {}ms",
        stats.block_count,
        transformed.warnings.len(),
        stats.duration_ms
    );

    Ok(ConversionOutput {
        file_name: request.file_name(encoder.extension()),
        bytes,
        document,
        warnings: transformed.warnings,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2DocError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2DocError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(request, config))
}

/// Convert a document and write the encoded bytes to `output_path`.
///
/// Uses atomic write (temp file in the target directory + rename) so a
/// failed conversion never leaves a partial file behind.
pub async fn convert_to_file(
    request: &ConversionRequest,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Md2DocError> {
    let output = convert(request, config).await?;
    write_output(output_path.as_ref(), output.bytes).await?;
    Ok(output.stats)
}

/// Convert many documents, at most `config.concurrency` at a time.
///
/// Results come back in request order. A fatal error for one document does
/// not affect the others.
pub async fn convert_batch(
    requests: &[ConversionRequest],
    config: &ConversionConfig,
) -> Result<Vec<Result<ConversionOutput, Md2DocError>>, Md2DocError> {
    let fetcher = HttpImageFetcher::new(&config.user_agent)?;
    Ok(convert_batch_with(requests, fetcher, &JsonEncoder::default(), config).await)
}

/// [`convert_batch`] with a caller-supplied fetcher and encoder.
///
/// The fetcher is shared between all in-flight documents.
pub async fn convert_batch_with<F: ImageFetcher>(
    requests: &[ConversionRequest],
    fetcher: F,
    encoder: &dyn Encoder,
    config: &ConversionConfig,
) -> Vec<Result<ConversionOutput, Md2DocError>> {
    let total = requests.len();
    let fetcher = Arc::new(fetcher);
    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_batch_start(total);
    }

    let results: Vec<_> = stream::iter(requests.iter().enumerate().map(|(i, request)| {
        let fetcher = Arc::clone(&fetcher);
        async move {
            let index = i + 1;
            if let Some(cb) = cb {
                cb.on_document_start(index, total, request.name.as_deref());
            }
            let result = convert_with(request, fetcher, encoder, config).await;
            match (&result, cb) {
                (Ok(output), Some(cb)) => {
                    cb.on_document_complete(index, total, output.stats.block_count)
                }
                (Err(e), cb) => {
                    warn!("Document {}/{} failed: {}", index, total, e);
                    if let Some(cb) = cb {
                        cb.on_document_error(index, total, &e.to_string());
                    }
                }
                (Ok(_), None) => {}
            }
            result
        }
    }))
    .buffered(config.concurrency.max(1))
    .collect()
    .await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    info!("Batch complete: {}/{} documents converted", succeeded, total);
    if let Some(cb) = cb {
        cb.on_batch_complete(total, succeeded);
    }
    results
}

// ── File helpers ─────────────────────────────────────────────────────────

/// Read a markdown file into a request named after the file.
pub async fn read_request(path: impl AsRef<Path>) -> Result<ConversionRequest, Md2DocError> {
    let path = path.as_ref();
    let markdown = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Md2DocError::InputReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
    Ok(ConversionRequest { markdown, name })
}

/// Write `bytes` to `path` through a temp file in the same directory.
pub async fn write_output(path: &Path, bytes: Vec<u8>) -> Result<(), Md2DocError> {
    let path = path.to_path_buf();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    tokio::fs::create_dir_all(&parent)
        .await
        .map_err(|e| Md2DocError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    let target = path.clone();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| Md2DocError::Internal(format!("write task panicked: {e}")))?
    .map_err(|e| Md2DocError::OutputWriteFailed {
        path: path.clone(),
        source: e,
    })?;

    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Block;
    use crate::pipeline::image::tests::StubFetcher;

    #[tokio::test]
    async fn convert_with_produces_title_and_file_name() {
        let request = ConversionRequest::named("# Title\n\nHello **world**", "notes.md");
        let output = convert_with(
            &request,
            StubFetcher::default(),
            &JsonEncoder::default(),
            &ConversionConfig::default(),
        )
        .await
        .expect("conversion");
        assert_eq!(output.file_name, "notes.json");
        assert_eq!(output.document.title.as_deref(), Some("notes.md"));
        assert_eq!(output.document.blocks.len(), 2);
        assert!(output.warnings.is_empty());
        assert_eq!(output.stats.output_bytes, output.bytes.len());
    }

    #[tokio::test]
    async fn batch_keeps_request_order() {
        let requests: Vec<_> = (0..6)
            .map(|i| ConversionRequest::named(format!("# Doc {i}"), format!("doc{i}")))
            .collect();
        let config = ConversionConfig::builder().concurrency(3).build().unwrap();
        let results =
            convert_batch_with(&requests, StubFetcher::default(), &JsonEncoder::default(), &config)
                .await;
        let names: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().unwrap().file_name.clone())
            .collect();
        assert_eq!(
            names,
            vec!["doc0.json", "doc1.json", "doc2.json", "doc3.json", "doc4.json", "doc5.json"]
        );
        let Block::Heading { spans, .. } = &results[4].as_ref().unwrap().document.blocks[0] else {
            panic!("expected heading");
        };
        assert_eq!(spans[0].text(), "Doc 4");
    }

    #[tokio::test]
    async fn read_request_names_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guide.md");
        std::fs::write(&path, "# Guide").unwrap();
        let request = read_request(&path).await.unwrap();
        assert_eq!(request.name.as_deref(), Some("guide.md"));
        assert_eq!(request.file_name("json"), "guide.json");

        let err = read_request(dir.path().join("missing.md")).await.unwrap_err();
        assert!(matches!(err, Md2DocError::InputReadFailed { .. }));
    }

    #[tokio::test]
    async fn write_output_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");
        write_output(&path, b"first".to_vec()).await.unwrap();
        write_output(&path, b"second".to_vec()).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
