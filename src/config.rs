//! Configuration types for process-record extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads, serialise them for logging, and
//! diff two runs to understand why their outputs differ.
//!
//! The defaults encode the calibration of the source document family: a row
//! tolerance of 6 position units and seven column cut points measured off the
//! table header of the reference layout. Documents from a different layout
//! family need their own boundaries — nothing here is auto-detected.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default vertical clustering tolerance, in page position units.
pub const DEFAULT_ROW_TOLERANCE: f64 = 6.0;

/// Default column cut points, calibrated against the reference header row.
///
/// The eight buckets are the half-open intervals `[0, 85)`, `[85, 213)`,
/// `[213, 388)`, `[388, 484)`, `[484, 580)`, `[580, 676)`, `[676, 772)`,
/// and `[772, ∞)`.
pub const DEFAULT_COLUMN_BOUNDARIES: [f64; 7] = [85.0, 213.0, 388.0, 484.0, 580.0, 676.0, 772.0];

/// Default number of days after opening before an in-progress process is
/// considered overdue.
pub const DEFAULT_OVERDUE_THRESHOLD_DAYS: i64 = 30;

/// Configuration for a process-record extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2proc::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .row_tolerance(8.0)
///     .overdue_threshold_days(45)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Maximum vertical distance between a token and a row group's key for
    /// the token to join that row. Default: 6.0 position units.
    ///
    /// The tolerance is a fixed absolute value, not proportional to font
    /// size. Documents rendered with larger vertical variance need a larger
    /// value; raising it too far merges adjacent table lines.
    pub row_tolerance: f64,

    /// The seven column cut points partitioning the page width into eight
    /// semantic buckets. Must be finite and strictly increasing; validated
    /// by [`ExtractionConfigBuilder::build`].
    pub column_boundaries: [f64; 7],

    /// Days after the opening date before an `ANDAMENTO` process counts as
    /// overdue. Default: 30.
    pub overdue_threshold_days: i64,

    /// Path to a canonical request-type vocabulary asset. When `None`, the
    /// vocabulary bundled with the crate is used. When the path cannot be
    /// read the resolver degrades to passthrough for the whole run.
    pub vocabulary_path: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// The date against which `days_since_opening` is measured. `None` means
    /// "today in local time", resolved once per run so every record in a
    /// document is judged against the same date. Pin this for reproducible
    /// test runs.
    pub reference_date: Option<NaiveDate>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page progress callback. Side channel only: never affects
    /// extraction results, and panics from it are swallowed.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            row_tolerance: DEFAULT_ROW_TOLERANCE,
            column_boundaries: DEFAULT_COLUMN_BOUNDARIES,
            overdue_threshold_days: DEFAULT_OVERDUE_THRESHOLD_DAYS,
            vocabulary_path: None,
            password: None,
            pages: PageSelection::default(),
            reference_date: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("row_tolerance", &self.row_tolerance)
            .field("column_boundaries", &self.column_boundaries)
            .field("overdue_threshold_days", &self.overdue_threshold_days)
            .field("vocabulary_path", &self.vocabulary_path)
            .field("pages", &self.pages)
            .field("reference_date", &self.reference_date)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn row_tolerance(mut self, tolerance: f64) -> Self {
        self.config.row_tolerance = tolerance;
        self
    }

    pub fn column_boundaries(mut self, boundaries: [f64; 7]) -> Self {
        self.config.column_boundaries = boundaries;
        self
    }

    pub fn overdue_threshold_days(mut self, days: i64) -> Self {
        self.config.overdue_threshold_days = days;
        self
    }

    pub fn vocabulary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.vocabulary_path = Some(path.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn reference_date(mut self, date: NaiveDate) -> Self {
        self.config.reference_date = Some(date);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// The column boundaries must be finite and strictly increasing so the
    /// eight bucket intervals partition `[0, ∞)` with no gaps or overlaps,
    /// and the row tolerance must be a finite positive number.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if !c.row_tolerance.is_finite() || c.row_tolerance <= 0.0 {
            return Err(ExtractError::InvalidConfig(format!(
                "row tolerance must be a positive number, got {}",
                c.row_tolerance
            )));
        }
        if c.column_boundaries.iter().any(|b| !b.is_finite()) {
            return Err(ExtractError::InvalidConfig(
                "column boundaries must be finite".into(),
            ));
        }
        if c.column_boundaries[0] <= 0.0 {
            return Err(ExtractError::InvalidConfig(
                "first column boundary must be greater than 0".into(),
            ));
        }
        if c.column_boundaries.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ExtractError::InvalidConfig(format!(
                "column boundaries must be strictly increasing, got {:?}",
                c.column_boundaries
            )));
        }
        if c.overdue_threshold_days < 0 {
            return Err(ExtractError::InvalidConfig(format!(
                "overdue threshold must be ≥ 0 days, got {}",
                c.overdue_threshold_days
            )));
        }
        Ok(self.config)
    }
}

/// Specifies which pages of the PDF to parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Parse all pages (default).
    #[default]
    All,
    /// Parse a single page (1-indexed).
    Single(usize),
    /// Parse a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Parse specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed
    /// page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds() {
        let config = ExtractionConfig::builder().build().unwrap();
        assert_eq!(config.row_tolerance, DEFAULT_ROW_TOLERANCE);
        assert_eq!(config.column_boundaries, DEFAULT_COLUMN_BOUNDARIES);
        assert_eq!(config.overdue_threshold_days, 30);
    }

    #[test]
    fn rejects_non_increasing_boundaries() {
        let result = ExtractionConfig::builder()
            .column_boundaries([85.0, 213.0, 213.0, 484.0, 580.0, 676.0, 772.0])
            .build();
        assert!(matches!(result, Err(ExtractError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_non_finite_boundary() {
        let result = ExtractionConfig::builder()
            .column_boundaries([85.0, 213.0, f64::NAN, 484.0, 580.0, 676.0, 772.0])
            .build();
        assert!(matches!(result, Err(ExtractError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_tolerance() {
        let result = ExtractionConfig::builder().row_tolerance(0.0).build();
        assert!(matches!(result, Err(ExtractError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_negative_threshold() {
        let result = ExtractionConfig::builder().overdue_threshold_days(-1).build();
        assert!(matches!(result, Err(ExtractError::InvalidConfig(_))));
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(PageSelection::Single(3).to_indices(5), vec![2]);
        assert_eq!(PageSelection::Single(6).to_indices(5), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 4).to_indices(5), vec![1, 2, 3]);
        assert_eq!(
            PageSelection::Set(vec![1, 3, 5]).to_indices(5),
            vec![0, 2, 4]
        );
        assert_eq!(
            PageSelection::Set(vec![3, 1, 3]).to_indices(5),
            vec![0, 2] // deduplicated and sorted
        );
    }
}
