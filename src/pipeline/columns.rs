//! Column classification: map row tokens onto the eight semantic buckets.
//!
//! The source reports print a fixed-width table; each semantic field lives in
//! a known horizontal band. The seven cut points partition the page width
//! into eight half-open intervals `[0,b1), [b1,b2), …, [b7,∞)`, so every
//! possible `x0` lands in exactly one bucket — no gaps, no overlaps. The cut
//! points come from a one-time header-row calibration and are configuration,
//! not something detected per document.

use super::words::Token;
use crate::config::ExtractionConfig;
use crate::error::ExtractError;

/// The eight semantic columns of the process-report table.
///
/// `Title` carries display-only text in the source layout; classifying it
/// keeps that text out of the `RequestType` bucket, but it contributes no
/// record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnBucket {
    Identifier,
    Contributor,
    Dates,
    Status,
    CurrentSector,
    RequestType,
    Title,
    DaysOverdue,
}

impl ColumnBucket {
    /// All buckets, left to right.
    pub const ALL: [ColumnBucket; 8] = [
        ColumnBucket::Identifier,
        ColumnBucket::Contributor,
        ColumnBucket::Dates,
        ColumnBucket::Status,
        ColumnBucket::CurrentSector,
        ColumnBucket::RequestType,
        ColumnBucket::Title,
        ColumnBucket::DaysOverdue,
    ];

    fn index(self) -> usize {
        match self {
            ColumnBucket::Identifier => 0,
            ColumnBucket::Contributor => 1,
            ColumnBucket::Dates => 2,
            ColumnBucket::Status => 3,
            ColumnBucket::CurrentSector => 4,
            ColumnBucket::RequestType => 5,
            ColumnBucket::Title => 6,
            ColumnBucket::DaysOverdue => 7,
        }
    }
}

/// The validated horizontal partition of the page.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    boundaries: [f64; 7],
}

impl ColumnLayout {
    /// Build a layout from seven cut points.
    ///
    /// The cut points must be finite, positive, and strictly increasing —
    /// otherwise the intervals would not partition the page width.
    pub fn new(boundaries: [f64; 7]) -> Result<Self, ExtractError> {
        if boundaries.iter().any(|b| !b.is_finite()) || boundaries[0] <= 0.0 {
            return Err(ExtractError::InvalidConfig(format!(
                "column boundaries must be finite and positive, got {:?}",
                boundaries
            )));
        }
        if boundaries.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ExtractError::InvalidConfig(format!(
                "column boundaries must be strictly increasing, got {:?}",
                boundaries
            )));
        }
        Ok(Self { boundaries })
    }

    /// Layout from a validated configuration.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        Self::new(config.column_boundaries)
    }

    /// The bucket whose half-open interval contains `x0`.
    pub fn bucket_for(&self, x0: f64) -> ColumnBucket {
        for (i, boundary) in self.boundaries.iter().enumerate() {
            if x0 < *boundary {
                return ColumnBucket::ALL[i];
            }
        }
        ColumnBucket::DaysOverdue
    }

    /// Classify a sorted row into per-bucket text.
    ///
    /// Tokens are space-joined in row order, so the classifier assumes the
    /// caller already sorted the row by `x0` (the reconstructor does).
    pub fn split_row(&self, row: &[Token]) -> RowText {
        let mut fields: [String; 8] = Default::default();
        for token in row {
            let field = &mut fields[self.bucket_for(token.x0).index()];
            if !field.is_empty() {
                field.push(' ');
            }
            field.push_str(&token.text);
        }
        RowText { fields }
    }
}

/// One row's text, split by bucket.
#[derive(Debug, Clone, Default)]
pub struct RowText {
    fields: [String; 8],
}

impl RowText {
    /// The space-joined text of one bucket (may be empty).
    pub fn bucket(&self, bucket: ColumnBucket) -> &str {
        &self.fields[bucket.index()]
    }

    /// Construct directly from per-bucket strings, left to right. Used by
    /// tests and by callers that bring their own classifier.
    pub fn from_fields(fields: [String; 8]) -> Self {
        Self { fields }
    }
}
