//! End-to-end tests: markdown in, document model and encoded bytes out.
//!
//! Network access is replaced by an in-memory [`ImageFetcher`], so these run
//! offline and deterministically.

use md2doc::{
    convert_batch_with, convert_with, lex, write_output, Block, ConversionConfig,
    ConversionProgressCallback, ConversionRequest, ConversionWarning, DocumentModel, Encoder,
    FetchedImage, ImageFetcher, ImageFormat, JsonEncoder, Md2DocError, NotEmbeddable, Span,
    Token,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryFetcher {
    images: HashMap<String, FetchedImage>,
    calls: AtomicUsize,
}

impl MemoryFetcher {
    fn serve(mut self, url: &str, content_type: &str, body: &[u8]) -> Self {
        self.images.insert(
            url.to_string(),
            FetchedImage {
                status: 200,
                content_type: Some(content_type.to_string()),
                body: body.to_vec(),
            },
        );
        self
    }
}

impl ImageFetcher for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, NotEmbeddable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.images.get(url) {
            Some(image) => Ok(image.clone()),
            None => Ok(FetchedImage {
                status: 404,
                content_type: None,
                body: Vec::new(),
            }),
        }
    }
}

struct FailingEncoder;

impl Encoder for FailingEncoder {
    fn name(&self) -> &str {
        "docx"
    }
    fn extension(&self) -> &str {
        "docx"
    }
    fn encode(&self, _document: &DocumentModel) -> Result<Vec<u8>, String> {
        Err("unsupported image format".into())
    }
}

async fn run(markdown: &str, fetcher: MemoryFetcher) -> md2doc::ConversionOutput {
    convert_with(
        &ConversionRequest::new(markdown),
        fetcher,
        &JsonEncoder::default(),
        &ConversionConfig::default(),
    )
    .await
    .expect("conversion should succeed")
}

fn list_items(blocks: &[Block]) -> Vec<(u8, Option<u32>, String)> {
    blocks
        .iter()
        .filter_map(|b| match b {
            Block::ListItem {
                level,
                spans,
                numbering,
                ..
            } => Some((
                *level,
                numbering.map(|n| n.ordinal),
                spans.iter().map(Span::text).collect::<String>(),
            )),
            _ => None,
        })
        .collect()
}

// ── Documented examples ──────────────────────────────────────────────────────

#[tokio::test]
async fn heading_then_paragraph() {
    let output = run("# Title\n\nHello **world**", MemoryFetcher::default()).await;
    assert_eq!(
        output.document.blocks,
        vec![
            Block::Heading {
                level: 1,
                spans: vec![Span::plain("Title")],
            },
            Block::Paragraph {
                spans: vec![Span::plain("Hello "), Span::Bold("world".into())],
                spacing_after: 200,
            },
        ]
    );
    assert!(output.warnings.is_empty());
}

#[tokio::test]
async fn checked_task_item() {
    let output = run("- [x] Done", MemoryFetcher::default()).await;
    let Block::ListItem { checked, spans, .. } = &output.document.blocks[0] else {
        panic!("expected list item, got {:?}", output.document.blocks);
    };
    assert_eq!(*checked, Some(true));
    assert!(matches!(spans[0], Span::Glyph(_)));
    assert_eq!(spans[1], Span::plain("Done"));
}

#[tokio::test]
async fn nested_ordered_list_restarts_numbering() {
    let md = "1. one\n2. two\n   1. inner a\n   2. inner b\n3. three\n";
    let output = run(md, MemoryFetcher::default()).await;
    assert_eq!(
        list_items(&output.document.blocks),
        vec![
            (0, Some(1), "one".to_string()),
            (0, Some(2), "two".to_string()),
            (1, Some(1), "inner a".to_string()),
            (1, Some(2), "inner b".to_string()),
            (0, Some(3), "three".to_string()),
        ]
    );
}

#[tokio::test]
async fn failed_image_becomes_fallback_link() {
    let fetcher = MemoryFetcher::default();
    let output = run("![chart](https://img.test/missing.png)", fetcher).await;
    assert_eq!(
        output.document.blocks,
        vec![Block::ImageFallback {
            url: "https://img.test/missing.png".into(),
            alt_text: "chart".into(),
        }]
    );
    let spans = Block::fallback_spans("https://img.test/missing.png", "chart");
    assert!(spans[0].text().contains("chart"));
    assert!(spans[0].text().contains("could not embed"));
    assert!(matches!(
        &output.warnings[0],
        ConversionWarning::ImageNotEmbedded {
            reason: NotEmbeddable::HttpStatus { status: 404 },
            ..
        }
    ));
    assert_eq!(output.stats.image_fallbacks, 1);
}

// ── Images ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn images_embed_in_source_order() {
    let fetcher = MemoryFetcher::default()
        .serve("https://img.test/a.jpeg", "image/jpeg", b"AAAA")
        .serve("https://img.test/b", "image/gif", b"BBBB");
    let md = "Intro\n\n![a](https://img.test/a.jpeg)\n\n![b](https://img.test/b)\n\n![c](https://img.test/c.svg)\n";
    let output = run(md, fetcher).await;

    let kinds: Vec<_> = output
        .document
        .blocks
        .iter()
        .filter(|b| !matches!(b, Block::Spacer))
        .map(Block::kind)
        .collect();
    assert_eq!(
        kinds,
        vec!["paragraph", "embedded_image", "embedded_image", "image_fallback"]
    );

    let images: Vec<_> = output
        .document
        .blocks
        .iter()
        .filter_map(|b| match b {
            Block::EmbeddedImage(img) => Some(img),
            _ => None,
        })
        .collect();
    assert_eq!(images[0].format, ImageFormat::Jpg);
    assert_eq!(images[0].bytes, b"AAAA");
    assert_eq!(images[1].format, ImageFormat::Gif);
    assert_eq!((images[1].width, images[1].height), (400, 300));
    assert_eq!(output.stats.embedded_images, 2);
}

#[tokio::test]
async fn image_size_comes_from_config() {
    let fetcher = MemoryFetcher::default().serve("https://img.test/p.png", "image/png", b"P");
    let config = ConversionConfig::builder().image_size(640, 480).build().unwrap();
    let output = convert_with(
        &ConversionRequest::new("![p](https://img.test/p.png)"),
        fetcher,
        &JsonEncoder::default(),
        &config,
    )
    .await
    .unwrap();
    let Block::EmbeddedImage(img) = &output.document.blocks[0] else {
        panic!("expected embedded image");
    };
    assert_eq!((img.width, img.height), (640, 480));
}

// ── Block kinds ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn mixed_document_block_sequence() {
    let md = "\
## Section

Some *text* with `code`.

> quoted **line**
> second line

```
let x = 1;
```

| Name | Score |
|------|-------|
| **a** | 1 |

---

- bullet
";
    let output = run(md, MemoryFetcher::default()).await;
    let kinds: Vec<_> = output.document.blocks.iter().map(Block::kind).collect();
    assert!(kinds.contains(&"heading"));
    assert!(kinds.contains(&"code_block"));
    assert!(kinds.contains(&"table"));
    assert!(kinds.contains(&"rule"));
    assert_eq!(kinds.iter().filter(|k| **k == "blockquote_line").count(), 2);
    assert_eq!(kinds.last(), Some(&"list_item"));

    let code = output.document.blocks.iter().find_map(|b| match b {
        Block::CodeBlock { text } => Some(text.as_str()),
        _ => None,
    });
    assert_eq!(code.map(str::trim_end), Some("let x = 1;"));

    let Some(Block::Table { header_cells, rows }) = output
        .document
        .blocks
        .iter()
        .find(|b| matches!(b, Block::Table { .. }))
    else {
        panic!("expected table");
    };
    assert_eq!(header_cells.len(), 2);
    assert_eq!(rows[0][0], vec![Span::Bold("a".into())]);
}

#[tokio::test]
async fn html_is_skipped_with_warning() {
    let output = run("<div>raw</div>\n\nAfter\n", MemoryFetcher::default()).await;
    assert!(output
        .warnings
        .iter()
        .any(|w| matches!(w, ConversionWarning::UnsupportedToken { kind } if kind == "html")));
    assert!(output
        .document
        .blocks
        .iter()
        .any(|b| matches!(b, Block::Paragraph { spans, .. } if spans[0].text() == "After")));
    assert_eq!(output.stats.skipped_tokens, 1);
}

#[tokio::test]
async fn blank_line_runs_give_one_spacer() {
    let output = run("one\n\n\n\n\ntwo\n", MemoryFetcher::default()).await;
    let spacers = output
        .document
        .blocks
        .iter()
        .filter(|b| matches!(b, Block::Spacer))
        .count();
    assert_eq!(spacers, 1);
}

#[test]
fn lexer_keeps_inline_markers() {
    let tokens = lex("Hello **world** and [a link](https://x.test)\n");
    assert_eq!(
        tokens,
        vec![Token::Paragraph {
            text: "Hello **world** and [a link](https://x.test)".into()
        }]
    );
}

// ── Encoding ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn json_output_is_the_model() {
    let output = run("# Title", MemoryFetcher::default()).await;
    let decoded: DocumentModel = serde_json::from_slice(&output.bytes).expect("valid model JSON");
    assert_eq!(decoded, output.document);
    assert_eq!(output.file_name, "document.json");
}

#[tokio::test]
async fn encoder_failure_is_fatal() {
    let err = convert_with(
        &ConversionRequest::new("# x"),
        MemoryFetcher::default(),
        &FailingEncoder,
        &ConversionConfig::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Md2DocError::EncodingFailed { .. }));
    assert!(err.to_string().contains("unsupported image format"));
}

// ── Batch ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl ConversionProgressCallback for RecordingCallback {
    fn on_batch_start(&self, total: usize) {
        self.events.lock().unwrap().push(format!("start {total}"));
    }
    fn on_document_error(&self, index: usize, _total: usize, _error: &str) {
        self.events.lock().unwrap().push(format!("error {index}"));
    }
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {success_count}/{total}"));
    }
}

#[tokio::test]
async fn batch_reports_progress_and_keeps_order() {
    let callback = Arc::new(RecordingCallback::default());
    let config = ConversionConfig::builder()
        .concurrency(2)
        .progress_callback(callback.clone())
        .build()
        .unwrap();
    let requests = vec![
        ConversionRequest::named("# A", "a.md"),
        ConversionRequest::named("# B", "b.md"),
        ConversionRequest::named("# C", "c.md"),
    ];
    let results =
        convert_batch_with(&requests, MemoryFetcher::default(), &JsonEncoder::default(), &config)
            .await;
    let names: Vec<_> = results
        .into_iter()
        .map(|r| r.unwrap().file_name)
        .collect();
    assert_eq!(names, vec!["a.json", "b.json", "c.json"]);

    let events = callback.events.lock().unwrap().clone();
    assert_eq!(events.first().map(String::as_str), Some("start 3"));
    assert_eq!(events.last().map(String::as_str), Some("done 3/3"));
}

#[tokio::test]
async fn output_written_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let output = run("Body text", MemoryFetcher::default()).await;
    let path = dir.path().join(&output.file_name);
    write_output(&path, output.bytes.clone()).await.unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), output.bytes);
}
