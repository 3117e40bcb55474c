//! Eager (full-document) extraction entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module provides the simpler API: parse every selected page, then
//! return the fully materialized [`ExtractionOutput`]. Use
//! [`crate::stream::extract_stream`] instead when you want pages
//! progressively — for example to persist records while a long document is
//! still being parsed.
//!
//! The extraction itself is strictly sequential, page by page, row by row:
//! the output order (pages in document order, rows top-to-bottom) is part of
//! the engine's contract and is what makes two runs over the same document
//! byte-identical.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::{DocumentMetadata, ExtractionOutput, ExtractionStats, PageRecords, ProcessRecord};
use crate::pipeline::columns::{ColumnBucket, ColumnLayout};
use crate::pipeline::words::Token;
use crate::pipeline::{delay, fields, input, rows, words};
use crate::progress;
use crate::resolver::Resolver;
use chrono::{Local, NaiveDate};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Extract process records from a PDF file or URL.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Extraction configuration
///
/// # Returns
/// `Ok(ExtractionOutput)` with every accepted record in page/row order.
/// Rejected rows and empty pages are counted in `output.stats`, never
/// errors.
///
/// # Errors
/// Returns `Err(ExtractError)` only for fatal conditions: unreadable or
/// corrupt source document, wrong password, invalid configuration, or an
/// empty page selection. No partial results are returned in those cases.
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Step 2: Validate the column layout before touching the document ──
    let layout = ColumnLayout::from_config(config)?;

    // ── Step 3: Extract metadata ─────────────────────────────────────────
    let metadata = words::extract_metadata(&pdf_path, config.password.as_deref()).await?;
    let total_pages = metadata.page_count;
    info!("PDF has {} pages", total_pages);

    // ── Step 4: Compute page indices ─────────────────────────────────────
    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        return Err(ExtractError::PageOutOfRange {
            page: 0,
            total: total_pages,
        });
    }
    debug!("Selected {} pages for extraction", page_indices.len());

    // Fire on_extraction_start now that we know how many pages will
    // actually be parsed (page_indices.len()), not the full document count.
    if let Some(ref cb) = config.progress_callback {
        progress::fire(|| cb.on_extraction_start(page_indices.len()));
    }

    // ── Step 5: Pull positioned words ────────────────────────────────────
    let words_start = Instant::now();
    let page_tokens =
        words::load_words(&pdf_path, config.password.as_deref(), &page_indices).await?;
    let words_duration_ms = words_start.elapsed().as_millis() as u64;
    info!(
        "Extracted words for {} pages in {}ms",
        page_tokens.len(),
        words_duration_ms
    );

    // ── Step 6: Load the canonical vocabulary ────────────────────────────
    let resolver = Resolver::from_config(config.vocabulary_path.as_deref());
    debug!("Loaded {} canonical request types", resolver.len());

    // ── Step 7: Parse pages, in document order ───────────────────────────
    let today = reference_date(config);
    let parse_start = Instant::now();
    let selected = page_tokens.len();

    let mut pages: Vec<PageRecords> = Vec::with_capacity(selected);
    let mut empty_pages = 0;
    let mut resolved_types = 0;

    for (done, (idx, tokens)) in page_tokens.into_iter().enumerate() {
        if tokens.is_empty() {
            empty_pages += 1;
        }
        let (page, resolved_on_page) = parse_page(
            idx + 1,
            tokens,
            &layout,
            &resolver,
            today,
            config.overdue_threshold_days,
            config.row_tolerance,
        );
        resolved_types += resolved_on_page;

        if let Some(ref cb) = config.progress_callback {
            progress::fire(|| cb.on_page_complete(done + 1, selected, page.records.len()));
        }
        pages.push(page);
    }
    let parse_duration_ms = parse_start.elapsed().as_millis() as u64;

    // ── Step 8: Assemble the output sequence ─────────────────────────────
    let records: Vec<ProcessRecord> = pages
        .iter()
        .flat_map(|p| p.records.iter().cloned())
        .collect();
    let rejected_rows = pages.iter().map(|p| p.rejected_rows).sum();

    let stats = ExtractionStats {
        total_pages,
        processed_pages: selected,
        empty_pages,
        accepted_records: records.len(),
        rejected_rows,
        resolved_types,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        words_duration_ms,
        parse_duration_ms,
    };

    info!(
        "Extraction complete: {} records from {}/{} pages, {}ms total",
        stats.accepted_records, selected, total_pages, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        progress::fire(|| cb.on_extraction_complete(selected, stats.accepted_records));
    }

    Ok(ExtractionOutput {
        records,
        pages,
        metadata,
        stats,
    })
}

/// Extract records and write them to a JSON file.
///
/// The file contains the record array only; use [`extract`] and serialise
/// [`ExtractionOutput`] yourself if you need the stats envelope. Uses atomic
/// write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, ExtractError> {
    let output = extract(input_str, config).await?;
    let path = output_path.as_ref();

    let json = serde_json::to_vec_pretty(&output.records)
        .map_err(|e| ExtractError::Internal(format!("serialising records: {e}")))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ExtractError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &json)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, config))
}

/// Extract records from PDF bytes in memory.
///
/// pdfium needs a file-system path, so the bytes are written to a managed
/// [`tempfile`] that is cleaned up automatically on return or panic. This is
/// the recommended API when the PDF arrives from an upload handler, a
/// database blob, or a network stream rather than a file on disk.
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    use std::io::Write;

    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `extract` returns
    extract(&path, config).await
}

/// Extract PDF metadata without parsing any records.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, ExtractError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    let pdf_path = resolved.path().to_path_buf();
    words::extract_metadata(&pdf_path, None).await
}

/// Parse pre-extracted page tokens into records, bypassing the PDF backend.
///
/// `pages` carries `(page_index_0based, tokens)` in document order — the
/// same shape the built-in word source produces. Useful for callers with
/// their own positioned-word source, and for testing the table
/// reconstruction without a document.
pub fn parse_tokens(
    pages: Vec<(usize, Vec<Token>)>,
    config: &ExtractionConfig,
) -> Result<Vec<PageRecords>, ExtractError> {
    let layout = ColumnLayout::from_config(config)?;
    let resolver = Resolver::from_config(config.vocabulary_path.as_deref());
    let today = reference_date(config);

    Ok(pages
        .into_iter()
        .map(|(idx, tokens)| {
            parse_page(
                idx + 1,
                tokens,
                &layout,
                &resolver,
                today,
                config.overdue_threshold_days,
                config.row_tolerance,
            )
            .0
        })
        .collect())
}

/// Page-parsing entry shared with the streaming API.
pub(crate) fn parse_tokens_with(
    page_idx: usize,
    tokens: Vec<Token>,
    layout: &ColumnLayout,
    resolver: &Resolver,
    today: NaiveDate,
    threshold_days: i64,
    row_tolerance: f64,
) -> PageRecords {
    parse_page(
        page_idx + 1,
        tokens,
        layout,
        resolver,
        today,
        threshold_days,
        row_tolerance,
    )
    .0
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// The date records are judged against: pinned by configuration, or today.
fn reference_date(config: &ExtractionConfig) -> NaiveDate {
    config
        .reference_date
        .unwrap_or_else(|| Local::now().date_naive())
}

/// Reconstruct one page: rows, buckets, fields, records.
///
/// Returns the page's records plus the number of request types the resolver
/// rewrote (for stats).
fn parse_page(
    page_num: usize,
    tokens: Vec<Token>,
    layout: &ColumnLayout,
    resolver: &Resolver,
    today: NaiveDate,
    threshold_days: i64,
    row_tolerance: f64,
) -> (PageRecords, usize) {
    let mut records = Vec::new();
    let mut rejected_rows = 0;
    let mut resolved_types = 0;

    for row in rows::cluster_rows(tokens, row_tolerance) {
        let text = layout.split_row(&row);
        match fields::extract_fields(&text) {
            Some(row_fields) => {
                let (record, was_resolved) =
                    assemble_record(row_fields, resolver, today, threshold_days);
                if was_resolved {
                    resolved_types += 1;
                }
                records.push(record);
            }
            None => {
                rejected_rows += 1;
                debug!(
                    "Page {}: rejected row (identifier bucket: '{}')",
                    page_num,
                    text.bucket(ColumnBucket::Identifier)
                );
            }
        }
    }

    (
        PageRecords {
            page_num,
            records,
            rejected_rows,
        },
        resolved_types,
    )
}

/// Compose one record from its typed fields.
///
/// The resolver and the overdue rule are applied here, once, so a record is
/// immutable from the moment it exists.
fn assemble_record(
    row_fields: fields::RowFields,
    resolver: &Resolver,
    today: NaiveDate,
    threshold_days: i64,
) -> (ProcessRecord, bool) {
    let request_type = resolver.resolve(&row_fields.request_type_raw);
    let was_resolved = request_type != row_fields.request_type_raw;

    let (is_overdue, computed_overdue_days) = delay::evaluate(
        row_fields.status,
        row_fields.opening_date,
        today,
        threshold_days,
    );

    (
        ProcessRecord {
            id: row_fields.id,
            contributor: row_fields.contributor,
            opening_date: row_fields.opening_date,
            opening_date_text: row_fields.opening_date_text,
            year: row_fields.year,
            status: row_fields.status,
            current_sector: row_fields.current_sector,
            request_type,
            reported_overdue_days: row_fields.reported_overdue_days,
            computed_overdue_days,
            is_overdue,
        },
        was_resolved,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Status;

    fn tok(text: &str, x0: f64, top: f64) -> Token {
        Token {
            text: text.to_string(),
            x0,
            x1: x0 + 15.0,
            top,
            bottom: top + 10.0,
        }
    }

    fn config() -> ExtractionConfig {
        ExtractionConfig::builder()
            .reference_date(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap())
            .build()
            .unwrap()
    }

    /// A realistic table row: identifier, contributor, date pair, status,
    /// sector, truncated request type, days column.
    fn sample_row(top: f64) -> Vec<Token> {
        vec![
            tok("000277", 28.0, top),
            tok("-", 52.0, top + 1.0),
            tok("2025", 60.0, top),
            tok("MARIA", 90.0, top),
            tok("DA", 118.0, top),
            tok("SILVA", 130.0, top),
            tok("29/12/2025", 220.0, top),
            tok("/", 265.0, top),
            tok("29/12/2025", 272.0, top),
            tok("DEFERIDO", 400.0, top),
            tok("DIRETORIA", 490.0, top),
            tok("ALVARA", 585.0, top),
            tok("DE", 615.0, top),
            tok("FUNCIONAMENTO", 625.0, top),
            tok("-", 648.0, top),
            tok("BAI", 655.0, top),
            tok("0", 790.0, top),
        ]
    }

    #[test]
    fn end_to_end_row_becomes_one_record() {
        let pages = vec![(0usize, sample_row(324.0))];
        let result = parse_tokens(pages, &config()).unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].page_num, 1);
        assert_eq!(result[0].records.len(), 1);
        assert_eq!(result[0].rejected_rows, 0);

        let record = &result[0].records[0];
        assert_eq!(record.id, "000277 - 2025");
        assert_eq!(record.year, "2025");
        assert_eq!(record.contributor, "MARIA DA SILVA");
        assert_eq!(record.status, Status::Deferido);
        assert_eq!(
            record.opening_date,
            NaiveDate::from_ymd_opt(2025, 12, 29)
        );
        // DEFERIDO is settled: never overdue, whatever the dates say.
        assert!(!record.is_overdue);
        assert_eq!(record.computed_overdue_days, 0);
        // Truncated type resolves against the bundled vocabulary.
        assert_eq!(record.request_type, "ALVARÁ DE FUNCIONAMENTO - BAIXO RISCO");
    }

    #[test]
    fn banner_rows_are_rejected_not_fatal() {
        let banner = vec![
            tok("PAGE", 30.0, 100.0),
            tok("3", 60.0, 100.0),
            tok("PREFEITURA", 300.0, 100.0),
        ];
        let pages = vec![(0usize, banner)];
        let result = parse_tokens(pages, &config()).unwrap();
        assert_eq!(result[0].records.len(), 0);
        assert_eq!(result[0].rejected_rows, 1);
    }

    #[test]
    fn empty_page_contributes_zero_records() {
        let pages = vec![(0usize, Vec::new()), (1usize, sample_row(200.0))];
        let result = parse_tokens(pages, &config()).unwrap();
        assert_eq!(result.len(), 2);
        assert!(result[0].records.is_empty());
        assert_eq!(result[1].records.len(), 1);
    }

    #[test]
    fn overdue_rule_applies_to_andamento_rows() {
        // Opened 45 days before the pinned reference date, still in progress.
        let top = 150.0;
        let row = vec![
            tok("000300", 28.0, top),
            tok("-", 52.0, top),
            tok("2025", 60.0, top),
            tok("JOSE", 90.0, top),
            tok("01/12/2025", 220.0, top),
            tok("ANDAMENTO", 400.0, top),
        ];
        let result = parse_tokens(vec![(0, row)], &config()).unwrap();
        let record = &result[0].records[0];
        assert_eq!(record.status, Status::Andamento);
        assert!(record.is_overdue);
        assert_eq!(record.computed_overdue_days, 15);
    }

    #[test]
    fn rows_emit_in_top_to_bottom_order() {
        let mut tokens = sample_row(400.0);
        tokens.extend(sample_row(200.0));
        let result = parse_tokens(vec![(0, tokens)], &config()).unwrap();
        assert_eq!(result[0].records.len(), 2);
        // Same id on both rows; order is positional, no deduplication.
        assert_eq!(result[0].records[0].id, result[0].records[1].id);
    }

    #[test]
    fn invalid_layout_is_fatal() {
        let mut config = config();
        config.column_boundaries = [85.0, 85.0, 388.0, 484.0, 580.0, 676.0, 772.0];
        let result = parse_tokens(vec![(0, sample_row(100.0))], &config);
        assert!(matches!(result, Err(ExtractError::InvalidConfig(_))));
    }
}
