//! # Global configuration.
//!
//! Provides [`Config`] centralized settings shared by the [`Scheduler`](crate::Scheduler),
//! the dispatch primitive and the graceful application runner.
//!
//! ## Sentinel values
//! - `grace = 0s` → do not wait for remaining units after the application exits

use std::time::Duration;

/// What to do with an async callback triggered while no runtime is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AsyncFallback {
    /// Log a warning and skip the callback (no handle is produced).
    #[default]
    Skip,
    /// Drive the future to completion on a private current-thread runtime.
    ///
    /// This blocks the dispatching thread for the duration of the callback.
    Inline,
}

/// Global configuration.
///
/// ## Field semantics
/// - `async_fallback`: policy for async callbacks when the scheduler is detached
/// - `grace`: maximum wait for outstanding units after the application's `main` exits
///   (`0s` = don't wait)
///
/// Synchronous callbacks always run inline when the scheduler is detached; they have
/// no cancellation semantics to lose.
#[derive(Clone, Debug)]
pub struct Config {
    /// Policy for async callbacks triggered without an active runtime.
    pub async_fallback: AsyncFallback,

    /// Maximum time to wait for outstanding units during graceful shutdown.
    ///
    /// When the application's `main` settles, every remaining unit is cancelled
    /// and awaited for at most `grace`. Units still running afterwards are
    /// reported by `RuntimeError::GraceExceeded`.
    pub grace: Duration,
}

impl Config {
    /// Returns the shutdown grace period as an `Option`.
    ///
    /// - `None` → don't wait
    /// - `Some(d)` → wait at most `d`
    #[inline]
    pub fn grace_period(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `async_fallback = AsyncFallback::Skip`
    /// - `grace = 30s`
    fn default() -> Self {
        Self {
            async_fallback: AsyncFallback::Skip,
            grace: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_grace_means_no_wait() {
        let cfg = Config {
            grace: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.grace_period(), None);
        assert_eq!(
            Config::default().grace_period(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn async_callbacks_are_skipped_by_default() {
        assert_eq!(Config::default().async_fallback, AsyncFallback::Skip);
    }
}
