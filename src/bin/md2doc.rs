//! CLI binary for md2doc.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and writes the encoded documents.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use md2doc::{
    convert_batch_with, convert_with, lex, read_request, write_output, ConversionConfig,
    ConversionOutput, ConversionProgressCallback, ConversionRequest, HttpImageFetcher,
    JsonEncoder, ProgressCallback,
};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar across the batch, one log line per
/// document. Documents may finish out of order.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    fn on_document_start(&self, _index: usize, _total: usize, name: Option<&str>) {
        self.bar.set_message(name.unwrap_or("<stdin>").to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, block_count: usize) {
        self.bar.println(format!(
            "  {} Document {:>3}/{:<3}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{block_count:>5} blocks")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Document {:>3}/{:<3}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} documents converted",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents converted  ({} failed)",
                red("✘"),
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one file, model JSON to stdout
  md2doc notes.md

  # Convert to a file
  md2doc notes.md -o notes.json

  # Convert many files into a directory
  md2doc docs/*.md --output-dir build/

  # Read from stdin with a display name
  cat README.md | md2doc - --name readme -o readme.json

  # Inspect the token stream
  md2doc --tokens notes.md

ENVIRONMENT VARIABLES:
  MD2DOC_OUTPUT_DIR     Default output directory
  MD2DOC_IMAGE_WIDTH    Width given to embedded images
  MD2DOC_IMAGE_HEIGHT   Height given to embedded images
  MD2DOC_CONCURRENCY    Documents converted at once
  MD2DOC_BODY_FONT      Body font family
  RUST_LOG              Overrides the log filter
"#;

/// Convert Markdown files into styled document models.
#[derive(Parser, Debug)]
#[command(
    name = "md2doc",
    version,
    about = "Convert Markdown files into styled rich-document models",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown files to convert; `-` reads stdin.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Write the document to this file (single input only).
    #[arg(short, long, env = "MD2DOC_OUTPUT", conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Write each document into this directory under its own file name.
    #[arg(long, env = "MD2DOC_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Display name for a single input (used for the title and file name).
    #[arg(long)]
    name: Option<String>,

    /// Width given to embedded images.
    #[arg(long, env = "MD2DOC_IMAGE_WIDTH", default_value_t = 400)]
    image_width: u32,

    /// Height given to embedded images.
    #[arg(long, env = "MD2DOC_IMAGE_HEIGHT", default_value_t = 300)]
    image_height: u32,

    /// Number of documents converted concurrently.
    #[arg(short, long, env = "MD2DOC_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Body font family.
    #[arg(long, env = "MD2DOC_BODY_FONT", default_value = "Calibri")]
    body_font: String,

    /// Body font size in points.
    #[arg(long, env = "MD2DOC_BODY_SIZE", default_value_t = 11)]
    body_size: u32,

    /// Spacing after paragraphs, in twentieths of a point.
    #[arg(long, env = "MD2DOC_PARAGRAPH_SPACING", default_value_t = 200)]
    paragraph_spacing: u32,

    /// Deepest list level kept before clamping.
    #[arg(long, env = "MD2DOC_MAX_LIST_DEPTH", default_value_t = 8)]
    max_list_depth: u8,

    /// Compact JSON instead of pretty-printed.
    #[arg(long, env = "MD2DOC_COMPACT")]
    compact: bool,

    /// Print the lexed token stream as JSON and exit.
    #[arg(long)]
    tokens: bool,

    /// Disable progress bar.
    #[arg(long, env = "MD2DOC_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2DOC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2DOC_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let batch = cli.inputs.len() > 1;
    let show_progress = batch && !cli.quiet && !cli.no_progress && !cli.tokens;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if batch && cli.output.is_some() {
        anyhow::bail!("--output takes a single input; use --output-dir for several");
    }
    if batch && cli.name.is_some() {
        anyhow::bail!("--name takes a single input");
    }

    // ── Read inputs ──────────────────────────────────────────────────────
    let mut requests = Vec::with_capacity(cli.inputs.len());
    for input in &cli.inputs {
        requests.push(read_input(input).await?);
    }
    if let (Some(name), Some(request)) = (&cli.name, requests.first_mut()) {
        request.name = Some(name.clone());
    }

    // ── Token dump ───────────────────────────────────────────────────────
    if cli.tokens {
        let dump: Vec<_> = requests.iter().map(|r| lex(&r.markdown)).collect();
        let json = if batch {
            serde_json::to_string_pretty(&dump)
        } else {
            serde_json::to_string_pretty(&dump[0])
        }
        .context("Failed to serialise tokens")?;
        println!("{json}");
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let fetcher = HttpImageFetcher::new(&config.user_agent).context("Failed to set up HTTP")?;
    let encoder = JsonEncoder {
        pretty: !cli.compact,
    };

    // ── Run conversion ───────────────────────────────────────────────────
    if !batch {
        let request = &requests[0];
        let output = convert_with(request, fetcher, &encoder, &config)
            .await
            .context("Conversion failed")?;
        report_warnings(&output, cli.quiet);

        match (&cli.output, &cli.output_dir) {
            (Some(path), _) => write_document(path, &output, cli.quiet).await?,
            (None, Some(dir)) => {
                write_document(&dir.join(&output.file_name), &output, cli.quiet).await?
            }
            (None, None) => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle
                    .write_all(&output.bytes)
                    .context("Failed to write to stdout")?;
                handle.write_all(b"\n").ok();
            }
        }
        return Ok(());
    }

    let dir = cli.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let results = convert_batch_with(&requests, fetcher, &encoder, &config).await;
    let mut failed = 0;
    for (request, result) in requests.iter().zip(results) {
        match result {
            Ok(output) => {
                report_warnings(&output, cli.quiet);
                write_document(&dir.join(&output.file_name), &output, cli.quiet || show_progress)
                    .await?;
            }
            Err(e) => {
                failed += 1;
                if !show_progress {
                    eprintln!(
                        "{} {}: {}",
                        red("✗"),
                        request.name.as_deref().unwrap_or("<stdin>"),
                        e
                    );
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} documents failed", requests.len());
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .image_size(cli.image_width, cli.image_height)
        .concurrency(cli.concurrency)
        .body_font(cli.body_font.clone(), cli.body_size)
        .paragraph_spacing_after(cli.paragraph_spacing)
        .max_list_depth(cli.max_list_depth);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Read a file path, or stdin for `-`.
async fn read_input(input: &str) -> Result<ConversionRequest> {
    if input == "-" {
        let mut markdown = String::new();
        io::stdin()
            .read_to_string(&mut markdown)
            .context("Failed to read stdin")?;
        return Ok(ConversionRequest::new(markdown));
    }
    read_request(input)
        .await
        .with_context(|| format!("Failed to read {input}"))
}

async fn write_document(path: &Path, output: &ConversionOutput, quiet: bool) -> Result<()> {
    write_output(path, output.bytes.clone())
        .await
        .context("Failed to write output")?;
    if !quiet {
        eprintln!(
            "{}  {} blocks  {}ms  →  {}",
            green("✔"),
            output.stats.block_count,
            output.stats.duration_ms,
            bold(&path.display().to_string()),
        );
    }
    Ok(())
}

fn report_warnings(output: &ConversionOutput, quiet: bool) {
    if quiet {
        return;
    }
    for warning in &output.warnings {
        eprintln!(
            "  {} {}  {}",
            yellow("⚠"),
            dim(&output.file_name),
            warning
        );
    }
}
