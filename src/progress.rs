//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! an event after each page is parsed.
//!
//! The callback is a pure side channel: its presence or absence never changes
//! the extracted records, and the engine invokes every method through
//! `std::panic::catch_unwind` so a misbehaving callback cannot abort the run.
//! Implementations must be `Send + Sync` because the engine hands the
//! callback across the `spawn_blocking` boundary.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Called by the extraction pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before any page is parsed.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages that will be processed
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after each page completes.
    ///
    /// # Arguments
    /// * `pages_done`  — pages parsed so far (1-based running count)
    /// * `total_pages` — total pages selected for this run
    /// * `page_records` — records the page just contributed
    fn on_page_complete(&self, pages_done: usize, total_pages: usize, page_records: usize) {
        let _ = (pages_done, total_pages, page_records);
    }

    /// Called once after every page has been parsed.
    fn on_extraction_complete(&self, total_pages: usize, total_records: usize) {
        let _ = (total_pages, total_records);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in
/// [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

/// Invoke a callback method, swallowing any panic it raises.
///
/// Extraction must always complete regardless of what the host application's
/// callback does, so panics are caught and dropped here rather than unwinding
/// through the engine.
pub(crate) fn fire(f: impl FnOnce()) {
    let _ = catch_unwind(AssertUnwindSafe(f));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        pages: AtomicUsize,
        started_total: AtomicUsize,
        completed_records: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_extraction_start(&self, total_pages: usize) {
            self.started_total.store(total_pages, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _done: usize, _total: usize, _page_records: usize) {
            self.pages.fetch_add(1, Ordering::SeqCst);
        }

        fn on_extraction_complete(&self, _total_pages: usize, total_records: usize) {
            self.completed_records.store(total_records, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(3);
        cb.on_page_complete(1, 3, 40);
        cb.on_extraction_complete(3, 120);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            pages: AtomicUsize::new(0),
            started_total: AtomicUsize::new(0),
            completed_records: AtomicUsize::new(0),
        };

        tracker.on_extraction_start(2);
        tracker.on_page_complete(1, 2, 10);
        tracker.on_page_complete(2, 2, 12);
        tracker.on_extraction_complete(2, 22);

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.pages.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completed_records.load(Ordering::SeqCst), 22);
    }

    #[test]
    fn fire_swallows_panics() {
        struct PanickyCallback;
        impl ExtractionProgressCallback for PanickyCallback {
            fn on_page_complete(&self, _: usize, _: usize, _: usize) {
                panic!("host application bug");
            }
        }

        let cb: ProgressCallback = Arc::new(PanickyCallback);
        fire(|| cb.on_page_complete(1, 1, 0));
        // still alive — the panic was contained
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ExtractionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_extraction_start(10);
        cb.on_page_complete(1, 10, 5);
    }
}
