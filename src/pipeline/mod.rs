//! Pipeline stages for process-record extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the word-source backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ words ──▶ rows ──▶ columns ──▶ fields ──▶ delay
//! (URL/path) (pdfium)  (cluster) (buckets)  (typed)   (overdue rule)
//! ```
//!
//! 1. [`input`]   — canonicalise the user-supplied path or URL to a local file
//! 2. [`words`]   — pull positioned word tokens out of each page; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`rows`]    — cluster tokens into logical table rows, tolerant of
//!    vertical rendering jitter
//! 4. [`columns`] — assign tokens to the eight semantic column buckets by
//!    horizontal position
//! 5. [`fields`]  — parse each bucket into its typed field (identifier,
//!    date, status, integers)
//! 6. [`delay`]   — apply the configurable overdue rule
//!
//! Data flows strictly downward: no stage depends on a later one. Request
//! type canonicalisation ([`crate::resolver`]) and record assembly
//! ([`crate::extract`]) sit above this module.

pub mod columns;
pub mod delay;
pub mod fields;
pub mod input;
pub mod rows;
pub mod words;
