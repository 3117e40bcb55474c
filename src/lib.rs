//! # pdf2proc
//!
//! Extract structured process records from tabular municipal process-report
//! PDFs.
//!
//! ## Why this crate?
//!
//! Plain-text PDF extraction (pdftotext and friends) flattens a report table
//! into lines whose column boundaries are gone, so fields can only be carved
//! back out with brittle anchor regexes. Instead this crate reads the
//! *positioned* words pdfium reports for each page and reconstructs the
//! table geometrically: words cluster into rows by vertical position, rows
//! split into semantic columns by calibrated cut points, and the truncated
//! free-text "request type" column is reconciled against a canonical
//! vocabulary with a hybrid prefix/fuzzy matcher.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file or download from URL
//!  ├─ 2. Words    positioned word tokens via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Rows     cluster tokens into table lines (jitter-tolerant)
//!  ├─ 4. Columns  split each row into eight semantic buckets
//!  ├─ 5. Fields   typed values: identifier, dates, status, integers
//!  ├─ 6. Resolve  canonicalise truncated request types (prefix + fuzzy)
//!  └─ 7. Output   ordered ProcessRecord sequence + per-run stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2proc::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let output = extract("report.pdf", &config).await?;
//!     for record in &output.records {
//!         println!("{}  {}  {}", record.id, record.status, record.request_type);
//!     }
//!     eprintln!(
//!         "{} records, {} rows rejected",
//!         output.stats.accepted_records, output.stats.rejected_rows
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Malformed input never fails the run
//!
//! Rows without a leading process number are skipped (and counted), dates
//! that do not parse disable the overdue computation for that record only,
//! unknown status keywords map to `DESCONHECIDO`, and a missing vocabulary
//! asset turns canonicalisation into passthrough. The only fatal errors are
//! an unreadable document and an invalid configuration — see
//! [`error::ExtractError`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2proc` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! pdf2proc = { version = "0.4", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod resolver;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, PageSelection};
pub use error::ExtractError;
pub use extract::{
    extract, extract_from_bytes, extract_sync, extract_to_file, inspect, parse_tokens,
};
pub use output::{
    DocumentMetadata, ExtractionOutput, ExtractionStats, PageRecords, ProcessRecord, Status,
};
pub use pipeline::columns::{ColumnBucket, ColumnLayout};
pub use pipeline::words::Token;
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use resolver::Resolver;
pub use stream::{extract_stream, RecordStream};
