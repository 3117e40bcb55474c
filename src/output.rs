//! Output types: the extracted records and everything reported around them.
//!
//! [`ProcessRecord`] is the unit of emission — one per accepted table row,
//! immutable once assembled. The surrounding types ([`PageRecords`],
//! [`ExtractionOutput`], [`ExtractionStats`], [`DocumentMetadata`]) carry the
//! page grouping, run statistics, and document properties so callers can
//! inspect partial quality (how many rows were rejected, how many pages were
//! empty) without re-running the extraction.
//!
//! All types serialise with `serde` so the CLI's `--json` mode and any
//! downstream persistence layer get a stable wire shape for free.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing status of a municipal process, as printed in the report's
/// Status column.
///
/// Serialised in the keyword form the documents use (`"EM DILIGENCIA"`,
/// `"AGUARDANDO PAGAMENTO"`) so round-tripping a record through JSON
/// preserves exactly what a reader of the PDF would see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "ANDAMENTO")]
    Andamento,
    #[serde(rename = "ENCERRAMENTO")]
    Encerramento,
    #[serde(rename = "DEFERIDO")]
    Deferido,
    #[serde(rename = "INDEFERIDO")]
    Indeferido,
    #[serde(rename = "SUSPENSO")]
    Suspenso,
    #[serde(rename = "CANCELADO")]
    Cancelado,
    #[serde(rename = "RETORNO")]
    Retorno,
    #[serde(rename = "EM DILIGENCIA")]
    EmDiligencia,
    #[serde(rename = "PENDENCIA")]
    Pendencia,
    #[serde(rename = "AGUARDANDO PAGAMENTO")]
    AguardandoPagamento,
    /// The Status column carried no recognised keyword.
    #[serde(rename = "DESCONHECIDO")]
    Desconhecido,
}

impl Status {
    /// The keyword printed in the document for this status.
    pub fn keyword(&self) -> &'static str {
        match self {
            Status::Andamento => "ANDAMENTO",
            Status::Encerramento => "ENCERRAMENTO",
            Status::Deferido => "DEFERIDO",
            Status::Indeferido => "INDEFERIDO",
            Status::Suspenso => "SUSPENSO",
            Status::Cancelado => "CANCELADO",
            Status::Retorno => "RETORNO",
            Status::EmDiligencia => "EM DILIGENCIA",
            Status::Pendencia => "PENDENCIA",
            Status::AguardandoPagamento => "AGUARDANDO PAGAMENTO",
            Status::Desconhecido => "DESCONHECIDO",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One extracted process record.
///
/// Assembled once per accepted table row and never mutated afterwards.
/// `id` is unique within a single document only — callers that accumulate
/// records across uploads decide their own merge/upsert policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Composite identifier as printed: `"<number> - <year>"`.
    pub id: String,

    /// Contributor (requester) name, cleaned of fused date artifacts.
    pub contributor: String,

    /// Opening date, when the Dates column carried a parseable `dd/mm/yyyy`.
    pub opening_date: Option<NaiveDate>,

    /// Opening date exactly as printed; empty when missing or unparseable.
    pub opening_date_text: String,

    /// Four-digit year derived from `id`; empty when the suffix did not match.
    pub year: String,

    /// Processing status from the Status column.
    pub status: Status,

    /// Sector currently holding the process.
    pub current_sector: String,

    /// Request type, canonicalised against the reference vocabulary when a
    /// confident match exists, otherwise the column text unchanged.
    pub request_type: String,

    /// Days overdue as printed in the report's last column (0 when absent).
    pub reported_overdue_days: i64,

    /// Days past the configured threshold, computed from the opening date.
    /// Always 0 for records that are not overdue.
    pub computed_overdue_days: i64,

    /// True only for `ANDAMENTO` records whose opening date lies more than
    /// the configured threshold in the past.
    pub is_overdue: bool,
}

/// Records reconstructed from a single page, in top-to-bottom row order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecords {
    /// 1-indexed page number in the source document.
    pub page_num: usize,

    /// Accepted records in row order.
    pub records: Vec<ProcessRecord>,

    /// Rows whose Identifier column did not start with a digit (headers,
    /// footers, page banners). Counted here, logged at `debug` level.
    pub rejected_rows: usize,
}

/// The complete result of extracting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Every accepted record, pages concatenated in document order.
    pub records: Vec<ProcessRecord>,

    /// The same records grouped per page, for callers that care about
    /// provenance.
    pub pages: Vec<PageRecords>,

    /// Document properties read from the PDF metadata dictionary.
    pub metadata: DocumentMetadata,

    /// Run statistics.
    pub stats: ExtractionStats,
}

/// Statistics describing an extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the source document.
    pub total_pages: usize,

    /// Pages actually parsed (after page selection).
    pub processed_pages: usize,

    /// Parsed pages that yielded no tokens at all.
    pub empty_pages: usize,

    /// Rows accepted and emitted as records.
    pub accepted_records: usize,

    /// Rows rejected by the leading-digit gate.
    pub rejected_rows: usize,

    /// Records whose request type was rewritten to a canonical vocabulary
    /// entry (prefix or fuzzy match, as opposed to passthrough).
    pub resolved_types: usize,

    /// Wall-clock duration of the whole run in milliseconds.
    pub total_duration_ms: u64,

    /// Time spent pulling positioned words out of the PDF.
    pub words_duration_ms: u64,

    /// Time spent on row/column reconstruction and field extraction.
    pub parse_duration_ms: u64,
}

/// Document metadata extracted from the PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
    pub is_encrypted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serialises_as_document_keyword() {
        let json = serde_json::to_string(&Status::EmDiligencia).unwrap();
        assert_eq!(json, "\"EM DILIGENCIA\"");
        let json = serde_json::to_string(&Status::AguardandoPagamento).unwrap();
        assert_eq!(json, "\"AGUARDANDO PAGAMENTO\"");
    }

    #[test]
    fn status_round_trips() {
        for s in [
            Status::Andamento,
            Status::Encerramento,
            Status::Deferido,
            Status::Indeferido,
            Status::Suspenso,
            Status::Cancelado,
            Status::Retorno,
            Status::EmDiligencia,
            Status::Pendencia,
            Status::AguardandoPagamento,
            Status::Desconhecido,
        ] {
            let json = serde_json::to_string(&s).unwrap();
            let back: Status = serde_json::from_str(&json).unwrap();
            assert_eq!(s, back);
        }
    }

    #[test]
    fn record_serialises_dates_both_ways() {
        let record = ProcessRecord {
            id: "000277 - 2025".into(),
            contributor: "MARIA DA SILVA".into(),
            opening_date: NaiveDate::from_ymd_opt(2025, 12, 29),
            opening_date_text: "29/12/2025".into(),
            year: "2025".into(),
            status: Status::Deferido,
            current_sector: "DIRETORIA DE ARRECADAÇÃO".into(),
            request_type: "CERTIDÃO NEGATIVA DE DÉBITOS".into(),
            reported_overdue_days: 0,
            computed_overdue_days: 0,
            is_overdue: false,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["opening_date"], "2025-12-29");
        assert_eq!(json["opening_date_text"], "29/12/2025");
        assert_eq!(json["status"], "DEFERIDO");
    }
}
