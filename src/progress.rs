//! Progress-callback trait for batch generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to receive
//! events while [`crate::generate::generate_batch`] works through its prompts.
//!
//! # Example
//!
//! ```rust
//! use pixelprompt::{GenerationProgressCallback, GenerationConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_prompt_complete(&self, index: usize, total: usize, pixel_count: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Prompt {}/{} done ({} pixels)", index + 1, total, pixel_count);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(counter as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by batch generation as it processes each prompt.
///
/// Implementations must be `Send + Sync`: prompts run concurrently, so
/// `on_prompt_start`, `on_prompt_complete` and `on_prompt_error` may be called
/// from different tasks at the same time. All methods default to no-ops.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once before any prompt is sent.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called just before the model request for a prompt.
    ///
    /// # Arguments
    /// * `index` — 0-indexed position of the prompt in the batch
    /// * `total` — batch size
    fn on_prompt_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a prompt produced a grid.
    ///
    /// # Arguments
    /// * `index`       — 0-indexed position of the prompt
    /// * `total`       — batch size
    /// * `pixel_count` — number of pixels in the composed grid
    fn on_prompt_complete(&self, index: usize, total: usize, pixel_count: usize) {
        let _ = (index, total, pixel_count);
    }

    /// Called when a prompt failed fatally.
    fn on_prompt_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after every prompt has been attempted.
    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let _ = (total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        successes: AtomicUsize,
    }

    impl GenerationProgressCallback for TrackingCallback {
        fn on_prompt_start(&self, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_prompt_complete(&self, _index: usize, _total: usize, _pixel_count: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_prompt_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total: usize, success_count: usize) {
            self.successes.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_prompt_start(0, 2);
        cb.on_prompt_complete(0, 2, 140);
        cb.on_prompt_error(1, 2, "timeout");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_prompt_start(0, 2);
        tracker.on_prompt_complete(0, 2, 150);
        tracker.on_prompt_start(1, 2);
        tracker.on_prompt_error(1, 2, "no structured pixel data");
        tracker.on_batch_complete(2, 1);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.successes.load(Ordering::SeqCst), 1);
    }
}
