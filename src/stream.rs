//! Streaming extraction API: emit pages as they are parsed.
//!
//! ## Why stream?
//!
//! A 300-page report yields thousands of records. A stream-based API lets
//! callers persist or display each page's records immediately instead of
//! buffering the entire document, which matters when the consumer is a
//! database writer or an HTTP response.
//!
//! Unlike the eager [`crate::extract::extract`] which returns only after all
//! pages finish, [`extract_stream`] yields one [`PageRecords`] per selected
//! page, strictly in document order — the record-order contract holds for
//! the streaming API too.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::PageRecords;
use crate::pipeline::columns::ColumnLayout;
use crate::pipeline::{input, words};
use crate::resolver::Resolver;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-page results.
pub type RecordStream = Pin<Box<dyn Stream<Item = PageRecords> + Send>>;

/// Extract process records, streaming pages as they are parsed.
///
/// Pages are emitted in document order. Parsing happens lazily as the
/// stream is polled; the positioned words are pulled from the PDF up front
/// (pdfium cannot be driven incrementally across await points), so the
/// stream itself never fails — all fatal conditions surface before the
/// stream is returned.
///
/// # Returns
/// - `Ok(RecordStream)` — one [`PageRecords`] per selected page
/// - `Err(ExtractError)` — fatal error (file not found, corrupt PDF,
///   invalid configuration, empty page selection)
pub async fn extract_stream(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<RecordStream, ExtractError> {
    let input_str = input_str.as_ref();
    info!("Starting streaming extraction: {}", input_str);

    // ── Resolve input ────────────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Validate layout ──────────────────────────────────────────────────
    let layout = ColumnLayout::from_config(config)?;

    // ── Extract metadata for page count ──────────────────────────────────
    let metadata = words::extract_metadata(&pdf_path, config.password.as_deref()).await?;
    let total_pages = metadata.page_count;

    // ── Compute page indices ─────────────────────────────────────────────
    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        return Err(ExtractError::PageOutOfRange {
            page: 0,
            total: total_pages,
        });
    }

    // ── Pull positioned words ────────────────────────────────────────────
    let page_tokens =
        words::load_words(&pdf_path, config.password.as_deref(), &page_indices).await?;

    // ── Build the stream ─────────────────────────────────────────────────
    let resolver = Arc::new(Resolver::from_config(config.vocabulary_path.as_deref()));
    let today = config
        .reference_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let threshold_days = config.overdue_threshold_days;
    let row_tolerance = config.row_tolerance;

    let s = stream::iter(page_tokens.into_iter()).map(move |(idx, tokens)| {
        crate::extract::parse_tokens_with(
            idx,
            tokens,
            &layout,
            &resolver,
            today,
            threshold_days,
            row_tolerance,
        )
    });

    Ok(Box::pin(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_type_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<RecordStream>();
    }
}
