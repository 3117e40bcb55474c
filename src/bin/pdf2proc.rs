//! CLI binary for pdf2proc.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2proc::{
    extract, extract_to_file, inspect, ExtractionConfig, ExtractionProgressCallback,
    PageSelection, ProgressCallback,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar as pages parse.
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Running record count for the bar's message line.
    records: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically
    /// by `on_extraction_start` (called before any pages are parsed).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_extraction_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            records: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
    }

    fn on_page_complete(&self, _pages_done: usize, _total_pages: usize, page_records: usize) {
        let total = self.records.fetch_add(page_records, Ordering::SeqCst) + page_records;
        self.bar.set_message(format!("{total} records"));
        self.bar.inc(1);
    }

    fn on_extraction_complete(&self, total_pages: usize, total_records: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} records from {} pages",
            green("✔"),
            bold(&total_records.to_string()),
            total_pages
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic extraction (JSON records to stdout)
  pdf2proc report.pdf

  # Write records to a file
  pdf2proc report.pdf -o records.json

  # Specific pages, longer overdue threshold
  pdf2proc --pages 1-5 --threshold-days 45 report.pdf

  # Custom vocabulary and looser row clustering
  pdf2proc --vocabulary tipos.md --tolerance 8 report.pdf

  # Recalibrated column cut points for a different layout family
  pdf2proc --columns 90,220,400,500,600,690,780 report.pdf

  # Extract from URL
  pdf2proc https://example.org/relatorio-2025.pdf -o records.json

  # Inspect PDF metadata (no parsing)
  pdf2proc --inspect-only report.pdf

  # Full envelope with stats and per-page grouping
  pdf2proc --json report.pdf > output.json

OUTPUT:
  By default the record array is printed as pretty JSON. With --json the
  full envelope (records, per-page grouping, document metadata, run stats)
  is printed instead. Rows without a leading process number (headers, page
  banners) are skipped and counted in the stats, never errors.

ENVIRONMENT VARIABLES:
  PDF2PROC_OUTPUT          Default for -o/--output
  PDF2PROC_TOLERANCE       Default for --tolerance
  PDF2PROC_THRESHOLD_DAYS  Default for --threshold-days
  PDF2PROC_VOCABULARY      Default for --vocabulary
  PDF2PROC_PAGES           Default for --pages
  PDFIUM_LIB_PATH          Path to an existing libpdfium
"#;

/// Extract structured process records from tabular process-report PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2proc",
    version,
    about = "Extract structured process records from tabular process-report PDFs",
    long_about = "Extract structured process records from municipal process-report PDFs \
(local files or URLs). Reconstructs table rows and columns from positioned text, \
canonicalises truncated request-type labels against a reference vocabulary, and \
flags overdue in-progress processes.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write JSON records to this file instead of stdout.
    #[arg(short, long, env = "PDF2PROC_OUTPUT")]
    output: Option<PathBuf>,

    /// Vertical row-clustering tolerance in page position units.
    #[arg(long, env = "PDF2PROC_TOLERANCE", default_value_t = 6.0)]
    tolerance: f64,

    /// Column cut points: seven comma-separated numbers.
    #[arg(
        long,
        env = "PDF2PROC_COLUMNS",
        long_help = "Seven comma-separated cut points partitioning the page width into the \
          eight column buckets. Defaults to the calibration of the reference layout \
          (85,213,388,484,580,676,772)."
    )]
    columns: Option<String>,

    /// Days after opening before an in-progress process counts as overdue.
    #[arg(long, env = "PDF2PROC_THRESHOLD_DAYS", default_value_t = 30)]
    threshold_days: i64,

    /// Path to a canonical request-type vocabulary (bullet-list text file).
    #[arg(long, env = "PDF2PROC_VOCABULARY")]
    vocabulary: Option<PathBuf>,

    /// Reference date (YYYY-MM-DD) for the overdue rule; defaults to today.
    #[arg(long, env = "PDF2PROC_REFERENCE_DATE")]
    reference_date: Option<chrono::NaiveDate>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2PROC_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2PROC_PASSWORD")]
    password: Option<String>,

    /// Output the full envelope (records, pages, metadata, stats) as JSON.
    #[arg(long, env = "PDF2PROC_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2PROC_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2PROC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2PROC_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2PROC_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        // The bar (or silence) is the feedback channel; keep stderr clean.
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).await.context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run extraction ───────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        let stats = extract_to_file(&cli.input, output_path, &config)
            .await
            .context("Extraction failed")?;

        if !cli.quiet {
            eprintln!(
                "{}  {} records  {} rows skipped  {}ms  →  {}",
                if stats.rejected_rows == 0 {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                bold(&stats.accepted_records.to_string()),
                stats.rejected_rows,
                stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
            eprintln!(
                "   {} pages parsed  /  {} empty  /  {} request types canonicalised",
                dim(&stats.processed_pages.to_string()),
                dim(&stats.empty_pages.to_string()),
                dim(&stats.resolved_types.to_string()),
            );
        }
    } else {
        let output = extract(&cli.input, &config)
            .await
            .context("Extraction failed")?;

        let json = if cli.json {
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        } else {
            serde_json::to_string_pretty(&output.records)
                .context("Failed to serialise records")?
        };

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(json.as_bytes())
            .context("Failed to write to stdout")?;
        handle.write_all(b"\n").ok();

        if !cli.quiet {
            eprintln!(
                "Extracted {} records from {}/{} pages in {}ms ({} rows skipped)",
                output.stats.accepted_records,
                output.stats.processed_pages,
                output.stats.total_pages,
                output.stats.total_duration_ms,
                output.stats.rejected_rows,
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let pages = parse_pages(&cli.pages)?;

    let mut builder = ExtractionConfig::builder()
        .row_tolerance(cli.tolerance)
        .overdue_threshold_days(cli.threshold_days)
        .pages(pages)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref list) = cli.columns {
        builder = builder.column_boundaries(parse_columns(list)?);
    }
    if let Some(ref path) = cli.vocabulary {
        builder = builder.vocabulary_path(path);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(date) = cli.reference_date {
        builder = builder.reference_date(date);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--columns` into the seven cut points.
fn parse_columns(s: &str) -> Result<[f64; 7]> {
    let values: Vec<f64> = s
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .context(format!("Invalid column boundary: '{}'", p.trim()))
        })
        .collect::<Result<Vec<_>>>()?;

    let array: [f64; 7] = values
        .try_into()
        .map_err(|v: Vec<f64>| anyhow::anyhow!("Expected 7 column boundaries, got {}", v.len()))?;

    Ok(array)
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!(
                "Invalid page range '{}-{}': start must be <= end",
                start,
                end
            );
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .context(format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        for &p in &pages {
            if p < 1 {
                anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
            }
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}
