//! Progress-callback trait for analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to receive
//! events while documents are prepared and the model is queried. The CLI uses
//! it to drive a spinner; a GUI would use it to disable the analyse button.
//!
//! # Example
//!
//! ```rust
//! use exam_oracle::{AnalysisConfig, AnalysisProgressCallback};
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! impl AnalysisProgressCallback for Logger {
//!     fn on_document_prepared(&self, index: usize, total: usize, name: &str, parts: usize) {
//!         eprintln!("{index}/{total} {name}: {parts} part(s)");
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(Logger) as Arc<dyn AnalysisProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the analysis pipeline as it runs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Documents are prepared concurrently, so
/// `on_document_prepared` may be called from several threads.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called once before any document is prepared.
    fn on_analysis_start(&self, documents: usize) {
        let _ = documents;
    }

    /// Called when a document has been turned into inline parts.
    ///
    /// # Arguments
    /// * `index` — 1-indexed position of the document
    /// * `total` — number of documents
    /// * `name`  — display name of the document
    /// * `parts` — inline parts it contributed (PDF pages or 1 for an image)
    fn on_document_prepared(&self, index: usize, total: usize, name: &str, parts: usize) {
        let _ = (index, total, name, parts);
    }

    /// Called just before the single model request is sent.
    fn on_request_sent(&self, parts: usize) {
        let _ = parts;
    }

    /// Called once when the analysis has finished, successfully or not.
    fn on_analysis_complete(&self, success: bool) {
        let _ = success;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        prepared: AtomicUsize,
        parts: AtomicUsize,
        completed_ok: AtomicUsize,
    }

    impl AnalysisProgressCallback for TrackingCallback {
        fn on_document_prepared(&self, _index: usize, _total: usize, _name: &str, parts: usize) {
            self.prepared.fetch_add(1, Ordering::SeqCst);
            self.parts.fetch_add(parts, Ordering::SeqCst);
        }

        fn on_analysis_complete(&self, success: bool) {
            if success {
                self.completed_ok.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_analysis_start(2);
        cb.on_document_prepared(1, 2, "winter-2022.pdf", 4);
        cb.on_request_sent(5);
        cb.on_analysis_complete(false);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_document_prepared(1, 2, "a.pdf", 3);
        tracker.on_document_prepared(2, 2, "b.png", 1);
        tracker.on_analysis_complete(true);

        assert_eq!(tracker.prepared.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.parts.load(Ordering::SeqCst), 4);
        assert_eq!(tracker.completed_ok.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_analysis_start(1);
        cb.on_request_sent(1);
    }
}
