//! Positioned-word source: pull word tokens with coordinates out of a PDF.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling while pdfium walks the text objects.
//!
//! ## Coordinate system
//!
//! pdfium reports character boxes with the origin at the *bottom-left* of the
//! page. The column calibration and row clustering downstream were measured
//! in a top-left-origin system (`top` grows downward), so every box is
//! flipped against the page height here, once, at the source. Everything
//! after this module can reason in a single coordinate family.
//!
//! ## Word assembly
//!
//! pdfium exposes characters, not words. Characters are accumulated into one
//! [`Token`] until a whitespace character, a horizontal jump larger than the
//! join tolerance, or a vertical drift larger than the line tolerance ends
//! the word. The tolerances match the extraction settings the source
//! documents were calibrated with and stay internal to this module — word
//! segmentation is the source's concern, not the table reconstructor's.

use crate::error::ExtractError;
use crate::output::DocumentMetadata;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Horizontal gap (position units) beyond which two characters belong to
/// different words.
const WORD_JOIN_TOLERANCE: f64 = 3.0;

/// Vertical drift (position units) beyond which two characters belong to
/// different words.
const WORD_LINE_TOLERANCE: f64 = 3.0;

/// A positioned unit of extracted text.
///
/// `top`/`bottom` grow downward from the top edge of the page; `x0`/`x1`
/// grow rightward from the left edge. Immutable once produced — the engine
/// only reads tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    pub bottom: f64,
}

/// A single character box in flipped (top-left-origin) coordinates.
struct CharBox {
    ch: char,
    x0: f64,
    x1: f64,
    top: f64,
    bottom: f64,
}

/// Extract positioned word tokens for the selected pages.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
///
/// # Returns
/// A vector of `(page_index_0based, tokens)` tuples in selection order.
/// A page whose text layer cannot be read contributes an empty token list
/// (and a warning) rather than failing the document.
pub async fn load_words(
    pdf_path: &Path,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<(usize, Vec<Token>)>, ExtractError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());
    let indices = page_indices.to_vec();

    tokio::task::spawn_blocking(move || load_words_blocking(&path, pwd.as_deref(), &indices))
        .await
        .map_err(|e| ExtractError::Internal(format!("Word extraction task panicked: {}", e)))?
}

/// Blocking implementation of word extraction.
fn load_words_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<(usize, Vec<Token>)>, ExtractError> {
    let pdfium = Pdfium::default();
    let document = load_document(&pdfium, pdf_path, password)?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;

    let mut results = Vec::with_capacity(page_indices.len());

    for &idx in page_indices {
        if idx >= total_pages {
            warn!(
                "Skipping page {} (out of range, total={})",
                idx + 1,
                total_pages
            );
            continue;
        }

        let page = pages.get(idx as u16).map_err(|e| ExtractError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("page {}: {:?}", idx + 1, e),
        })?;

        let tokens = match page.text() {
            Ok(text_page) => {
                let page_height = page.height().value as f64;
                let chars = collect_chars(&text_page, page_height);
                assemble_tokens(&chars)
            }
            Err(e) => {
                // A page without a readable text layer contributes nothing;
                // the rest of the document still parses.
                warn!("Page {}: no readable text layer ({:?})", idx + 1, e);
                Vec::new()
            }
        };

        debug!("Page {}: {} word tokens", idx + 1, tokens.len());
        results.push((idx, tokens));
    }

    Ok(results)
}

/// Open a document, mapping pdfium's error soup onto the input taxonomy.
fn load_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, ExtractError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ExtractError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                ExtractError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            ExtractError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Collect character boxes from a page's text layer, flipping the vertical
/// axis so `top` grows downward.
fn collect_chars(text_page: &PdfPageText, page_height: f64) -> Vec<CharBox> {
    let mut chars = Vec::new();
    for ch in text_page.chars().iter() {
        let Some(unicode) = ch.unicode_char() else {
            continue;
        };
        let Ok(bounds) = ch.loose_bounds() else {
            continue;
        };
        chars.push(CharBox {
            ch: unicode,
            x0: bounds.left.value as f64,
            x1: bounds.right.value as f64,
            top: page_height - bounds.top.value as f64,
            bottom: page_height - bounds.bottom.value as f64,
        });
    }
    chars
}

/// Accumulate character boxes into word tokens.
///
/// Characters arrive in pdfium's text order. A word ends at whitespace, at a
/// horizontal jump larger than [`WORD_JOIN_TOLERANCE`] (forward or backward —
/// a backward jump is a new line), or at a vertical drift larger than
/// [`WORD_LINE_TOLERANCE`].
fn assemble_tokens(chars: &[CharBox]) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut current: Option<Token> = None;

    for c in chars {
        if c.ch.is_whitespace() {
            if let Some(token) = current.take() {
                tokens.push(token);
            }
            continue;
        }

        let Some(token) = current.as_mut() else {
            current = Some(char_token(c));
            continue;
        };

        let gap = c.x0 - token.x1;
        let drift = (c.top - token.top).abs();
        if gap.abs() > WORD_JOIN_TOLERANCE || drift > WORD_LINE_TOLERANCE {
            tokens.push(std::mem::replace(token, char_token(c)));
        } else {
            token.text.push(c.ch);
            token.x1 = token.x1.max(c.x1);
            token.top = token.top.min(c.top);
            token.bottom = token.bottom.max(c.bottom);
        }
    }

    if let Some(token) = current {
        tokens.push(token);
    }
    tokens
}

fn char_token(c: &CharBox) -> Token {
    Token {
        text: c.ch.to_string(),
        x0: c.x0,
        x1: c.x1,
        top: c.top,
        bottom: c.bottom,
    }
}

/// Extract document metadata from a PDF without parsing records.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, ExtractError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| ExtractError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// Blocking implementation of metadata extraction.
fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, ExtractError> {
    let pdfium = Pdfium::default();
    let document = load_document(&pdfium, pdf_path, password)?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
        is_encrypted: false, // pdfium doesn't readily expose this after opening
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cb(ch: char, x0: f64, x1: f64, top: f64) -> CharBox {
        CharBox {
            ch,
            x0,
            x1,
            top,
            bottom: top + 10.0,
        }
    }

    #[test]
    fn adjacent_chars_form_one_token() {
        let chars = [cb('0', 30.0, 36.0, 100.0), cb('1', 36.5, 42.0, 100.0)];
        let tokens = assemble_tokens(&chars);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "01");
        assert_eq!(tokens[0].x0, 30.0);
        assert_eq!(tokens[0].x1, 42.0);
    }

    #[test]
    fn whitespace_splits_tokens() {
        let chars = [
            cb('A', 30.0, 36.0, 100.0),
            cb(' ', 36.0, 40.0, 100.0),
            cb('B', 40.0, 46.0, 100.0),
        ];
        let tokens = assemble_tokens(&chars);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "A");
        assert_eq!(tokens[1].text, "B");
    }

    #[test]
    fn wide_gap_splits_tokens() {
        let chars = [cb('A', 30.0, 36.0, 100.0), cb('B', 60.0, 66.0, 100.0)];
        let tokens = assemble_tokens(&chars);
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn backward_jump_starts_new_token() {
        // Line wrap: next char starts far left of the current word's end.
        let chars = [
            cb('A', 500.0, 506.0, 100.0),
            cb('B', 506.5, 512.0, 100.0),
            cb('C', 30.0, 36.0, 100.0),
        ];
        let tokens = assemble_tokens(&chars);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "AB");
        assert_eq!(tokens[1].text, "C");
    }

    #[test]
    fn vertical_drift_splits_tokens() {
        let chars = [cb('A', 30.0, 36.0, 100.0), cb('B', 36.5, 42.0, 108.0)];
        let tokens = assemble_tokens(&chars);
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn kerned_overlap_still_joins() {
        // Slight negative gap from kerning must not split the word.
        let chars = [cb('V', 30.0, 38.0, 100.0), cb('A', 36.5, 44.0, 100.0)];
        let tokens = assemble_tokens(&chars);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "VA");
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(assemble_tokens(&[]).is_empty());
    }
}
