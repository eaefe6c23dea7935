//! Progress-callback trait for the remote generation step.
//!
//! The completion call is the only slow step of an update: a full resume
//! round-trip through a large model routinely takes a minute. Inject an
//! [`Arc<dyn SyncProgressCallback>`] via
//! [`crate::config::SyncConfigBuilder::progress_callback`] to be told when
//! generation starts, retries, and finishes. The CLI uses it to drive a
//! spinner; the library itself never draws anything.
//!
//! # Example
//!
//! ```rust
//! use resume_sync::{SyncConfig, SyncProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct RetryCounter {
//!     retries: AtomicUsize,
//! }
//!
//! impl SyncProgressCallback for RetryCounter {
//!     fn on_generation_retry(&self, attempt: u32, max_attempts: u32, _error: &str) {
//!         self.retries.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("attempt {attempt}/{max_attempts} failed, retrying");
//!     }
//! }
//!
//! let config = SyncConfig::builder()
//!     .progress_callback(Arc::new(RetryCounter { retries: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the update flow around the remote completion call.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait SyncProgressCallback: Send + Sync {
    /// Called once before the first attempt of an uncached request.
    ///
    /// # Arguments
    /// * `prompt_chars` — total characters across all request messages
    fn on_generation_start(&self, prompt_chars: usize) {
        let _ = prompt_chars;
    }

    /// Called after a transient failure, before the backoff sleep.
    ///
    /// # Arguments
    /// * `attempt`      — 1-indexed attempt that just failed
    /// * `max_attempts` — the configured retry budget
    /// * `error`        — human-readable failure description
    fn on_generation_retry(&self, attempt: u32, max_attempts: u32, error: &str) {
        let _ = (attempt, max_attempts, error);
    }

    /// Called when a response is available, from the remote endpoint or the cache.
    ///
    /// # Arguments
    /// * `response_chars` — characters in the raw response
    /// * `cached`         — `true` when no remote call was made
    fn on_generation_complete(&self, response_chars: usize, cached: bool) {
        let _ = (response_chars, cached);
    }

    /// Called when generation fails for good.
    fn on_generation_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl SyncProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SyncConfig`].
pub type ProgressCallback = Arc<dyn SyncProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        retries: AtomicUsize,
        cached: AtomicUsize,
        errors: AtomicUsize,
    }

    impl SyncProgressCallback for TrackingCallback {
        fn on_generation_start(&self, _prompt_chars: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_generation_retry(&self, _attempt: u32, _max_attempts: u32, _error: &str) {
            self.retries.fetch_add(1, Ordering::SeqCst);
        }

        fn on_generation_complete(&self, _response_chars: usize, cached: bool) {
            if cached {
                self.cached.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_generation_error(&self, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_generation_start(10);
        cb.on_generation_retry(1, 3, "503");
        cb.on_generation_complete(42, false);
        cb.on_generation_error("boom");
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_generation_start(100);
        tracker.on_generation_retry(1, 3, "rate limited");
        tracker.on_generation_retry(2, 3, "rate limited");
        tracker.on_generation_complete(5000, false);
        tracker.on_generation_complete(5000, true);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.retries.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.cached.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 0);
    }
}
