//! Field extraction: turn one row's bucket text into typed values.
//!
//! Every extractor here is forgiving by contract — the only condition that
//! drops a row is an Identifier bucket that does not start with a digit
//! (headers, page banners, footer lines). Everything else degrades:
//! a missing year leaves `year` empty, an unparseable date disables the
//! delay computation, an unknown status keyword maps to
//! [`Status::Desconhecido`], a non-numeric days column reads as 0.

use super::columns::{ColumnBucket, RowText};
use crate::output::Status;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// `<digits> - <4-digit year>` at the start of the Identifier bucket.
static RE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*-\s*(\d{4})\b").unwrap());

/// A `dd/mm/yyyy` date anywhere in a bucket.
static RE_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}").unwrap());

/// Status keywords, longest first so that the longest match wins
/// (`INDEFERIDO` must be tested before `DEFERIDO`, which it contains).
const STATUS_KEYWORDS: [(&str, Status); 10] = [
    ("AGUARDANDO PAGAMENTO", Status::AguardandoPagamento),
    ("EM DILIGENCIA", Status::EmDiligencia),
    ("ENCERRAMENTO", Status::Encerramento),
    ("INDEFERIDO", Status::Indeferido),
    ("ANDAMENTO", Status::Andamento),
    ("CANCELADO", Status::Cancelado),
    ("PENDENCIA", Status::Pendencia),
    ("DEFERIDO", Status::Deferido),
    ("SUSPENSO", Status::Suspenso),
    ("RETORNO", Status::Retorno),
];

/// The typed fields of one accepted row, before canonicalisation and the
/// delay rule are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFields {
    pub id: String,
    pub year: String,
    pub contributor: String,
    pub opening_date: Option<NaiveDate>,
    pub opening_date_text: String,
    pub status: Status,
    pub current_sector: String,
    pub request_type_raw: String,
    pub reported_overdue_days: i64,
}

/// Extract typed fields from a classified row.
///
/// Returns `None` when the row fails the single acceptance gate: the
/// Identifier bucket must begin with an ASCII digit. All other buckets may
/// be empty.
pub fn extract_fields(row: &RowText) -> Option<RowFields> {
    let identifier = row.bucket(ColumnBucket::Identifier).trim();
    if !identifier.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }

    let year = RE_IDENTIFIER
        .captures(identifier)
        .map(|caps| caps[2].to_string())
        .unwrap_or_default();

    let (opening_date_text, opening_date) = parse_opening_date(row.bucket(ColumnBucket::Dates));

    Some(RowFields {
        id: identifier.to_string(),
        year,
        contributor: clean_contributor(row.bucket(ColumnBucket::Contributor)),
        opening_date,
        opening_date_text,
        status: detect_status(row.bucket(ColumnBucket::Status)),
        current_sector: row.bucket(ColumnBucket::CurrentSector).trim().to_string(),
        request_type_raw: row.bucket(ColumnBucket::RequestType).trim().to_string(),
        reported_overdue_days: parse_reported_days(row.bucket(ColumnBucket::DaysOverdue)),
    })
}

/// Strip a `dd/mm/yyyy` date fused onto the contributor text.
///
/// Some renderings merge the end of the contributor column with the start of
/// the dates column into a single token (`"JOSE SANTOS29/12/2025"`). Only
/// the prefix before the first date survives.
fn clean_contributor(text: &str) -> String {
    match RE_DATE.find(text) {
        Some(m) => text[..m.start()].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// First `dd/mm/yyyy` in the Dates bucket, as `(original_text, parsed)`.
///
/// The bucket usually prints an opening/closing pair (`"29/12/2025 /
/// 29/12/2025"`); the opening date comes first. A missing or invalid first
/// date yields `("", None)` — the record is still emitted, it just cannot
/// be flagged overdue.
fn parse_opening_date(text: &str) -> (String, Option<NaiveDate>) {
    let Some(m) = RE_DATE.find(text) else {
        return (String::new(), None);
    };
    match NaiveDate::parse_from_str(m.as_str(), "%d/%m/%Y") {
        Ok(date) => (m.as_str().to_string(), Some(date)),
        Err(_) => (String::new(), None),
    }
}

/// Longest status keyword contained in the bucket text, case-insensitive.
fn detect_status(text: &str) -> Status {
    let upper = text.to_uppercase();
    STATUS_KEYWORDS
        .iter()
        .find(|(keyword, _)| upper.contains(keyword))
        .map(|(_, status)| *status)
        .unwrap_or(Status::Desconhecido)
}

/// Integer-parse the DaysOverdue bucket; anything non-numeric reads as 0.
fn parse_reported_days(text: &str) -> i64 {
    text.trim().parse().unwrap_or(0)
}
