//! # Dispatch primitive.
//!
//! [`trigger_callback`] turns an [`Invocable`] plus arguments into work on a [`Scheduler`].
//!
//! ## Flow
//! ```text
//! Wrapped(cb) ──► cb.trigger(scheduler, args)
//!
//! Async(f) ──► scheduler active? ── yes ──► schedule(f(args))          → Scheduled(unit)
//!                               └── no ──► Config::async_fallback
//!                                            ├─ Skip   → warn!, Skipped
//!                                            └─ Inline → block on private rt → Inline(res)
//!
//! Sync(f)  ──► scheduler active? ── yes ──► offload(|| f(args))        → Scheduled(unit)
//!                               └── no ──► f(args) in the caller       → Inline(res)
//! ```
//!
//! ## Rules
//! - Fire-and-forget: no retries, failures stay inside the returned [`Triggered`].
//! - Panics of inline calls are caught and reported as [`CallbackError::Panicked`].

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::warn;

use crate::callbacks::args::Args;
use crate::callbacks::invocable::Invocable;
use crate::config::AsyncFallback;
use crate::core::{Scheduler, Unit, block_on_private};
use crate::error::CallbackError;

/// What happened when an invocable was triggered.
#[derive(Debug)]
pub enum Triggered {
    /// Running as a unit on the scheduler.
    Scheduled(Unit),
    /// Ran to completion in the caller (no active scheduler).
    Inline(Result<(), CallbackError>),
    /// Not run: async invocable with no active scheduler and `AsyncFallback::Skip`.
    Skipped,
}

impl Triggered {
    /// The scheduled unit, if any.
    pub fn unit(&self) -> Option<&Unit> {
        match self {
            Triggered::Scheduled(unit) => Some(unit),
            _ => None,
        }
    }

    /// True if the invocable was skipped.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Triggered::Skipped)
    }

    /// Waits for the outcome. Returns `None` for a skipped trigger.
    pub async fn settled(self) -> Option<Result<(), CallbackError>> {
        match self {
            Triggered::Scheduled(unit) => Some(unit.settled().await),
            Triggered::Inline(res) => Some(res),
            Triggered::Skipped => None,
        }
    }
}

/// Triggers `invocable` with `args` on `scheduler`.
///
/// ## Example
/// ```rust
/// use callvisor::{Args, Config, Invocable, Scheduler, Triggered, trigger_callback};
///
/// let scheduler = Scheduler::detached(Config::default());
/// let f = Invocable::sync_fn("check", |args: Args| {
///     assert_eq!(args.get(0), Some(&"foo".into()));
///     Ok(())
/// });
///
/// let res = trigger_callback(&scheduler, &f, Args::new().arg("foo"));
/// assert!(matches!(res, Triggered::Inline(Ok(()))));
/// ```
pub fn trigger_callback(scheduler: &Scheduler, invocable: &Invocable, args: Args) -> Triggered {
    match invocable {
        Invocable::Wrapped(cb) => cb.trigger(scheduler, args),
        Invocable::Async { name, f } => {
            if scheduler.is_active() {
                return scheduler
                    .schedule(&**name, f(args))
                    .map_or(Triggered::Skipped, Triggered::Scheduled);
            }
            match scheduler.config().async_fallback {
                AsyncFallback::Skip => {
                    warn!(callback = %name, "callback triggered without a running runtime, skipping");
                    Triggered::Skipped
                }
                AsyncFallback::Inline => Triggered::Inline(block_on_private(f(args))),
            }
        }
        Invocable::Sync { name, f } => {
            if scheduler.is_active() {
                let f = f.clone();
                return scheduler
                    .offload(&**name, move || f(args))
                    .map_or(Triggered::Skipped, Triggered::Scheduled);
            }
            let res = catch_unwind(AssertUnwindSafe(|| f(args)))
                .unwrap_or_else(|panic| Err(CallbackError::from_panic(panic)));
            Triggered::Inline(res)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::Callback;
    use crate::config::Config;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    fn counting_async(name: &'static str) -> (Invocable, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let f = Invocable::async_fn(name, move |_args| {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CallbackError>(())
            }
        });
        (f, count)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sync_function_is_offloaded() {
        let scheduler = Scheduler::current(Config::default());
        let (tx, rx) = std::sync::mpsc::channel();
        let f = Invocable::sync_fn("blocking", move |args| {
            tx.send(args).map_err(|e| CallbackError::failed(e.to_string()))
        });

        let res = trigger_callback(&scheduler, &f, Args::new().arg("foo").kwarg("bar", "baz"));
        assert!(res.unit().is_some());
        assert_eq!(res.settled().await, Some(Ok(())));
        assert_eq!(
            rx.recv().unwrap(),
            Args::new().arg("foo").kwarg("bar", "baz")
        );
    }

    #[tokio::test]
    async fn async_function_is_scheduled() {
        let scheduler = Scheduler::current(Config::default());
        let (f, count) = counting_async("coroutine");

        let res = trigger_callback(&scheduler, &f, Args::new().arg("foo"));
        let unit = res.unit().cloned().unwrap();
        assert_eq!(unit.name(), "coroutine");
        assert_eq!(unit.settled().await, Ok(()));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn wrapped_callback_delegates() {
        let scheduler = Scheduler::current(Config::default());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let f = Invocable::async_fn("forward", move |args| {
            let tx = tx.clone();
            async move { tx.send(args).map_err(|e| CallbackError::failed(e.to_string())) }
        });
        let cb = Callback::new(f, Args::new().arg("foo").kwarg("bar", "baz"));

        let res = trigger_callback(&scheduler, &cb.into(), Args::new().kwarg("not_ignored", true));
        assert_eq!(res.settled().await, Some(Ok(())));
        assert_eq!(
            rx.recv().await.unwrap(),
            Args::new()
                .arg("foo")
                .kwarg("bar", "baz")
                .kwarg("not_ignored", true)
        );
    }

    #[test]
    #[traced_test]
    fn async_without_runtime_is_skipped_with_warning() {
        let scheduler = Scheduler::detached(Config::default());
        let (f, count) = counting_async("hello");

        let res = trigger_callback(&scheduler, &f, Args::new());
        assert!(res.is_skipped());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(logs_contain("callback triggered without a running runtime"));
        assert!(logs_contain("hello"));
    }

    #[test]
    fn async_without_runtime_can_run_inline() {
        let scheduler = Scheduler::detached(Config {
            async_fallback: AsyncFallback::Inline,
            ..Config::default()
        });
        let (f, count) = counting_async("hello");

        let res = trigger_callback(&scheduler, &f, Args::new());
        assert!(matches!(res, Triggered::Inline(Ok(()))));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sync_without_runtime_runs_inline_and_contains_panics() {
        let scheduler = Scheduler::detached(Config::default());
        let ok = Invocable::sync_fn("ok", |_| Ok(()));
        let boom = Invocable::sync_fn("boom", |_| panic!("inline kaboom"));

        assert!(matches!(
            trigger_callback(&scheduler, &ok, Args::new()),
            Triggered::Inline(Ok(()))
        ));
        assert!(matches!(
            trigger_callback(&scheduler, &boom, Args::new()),
            Triggered::Inline(Err(CallbackError::Panicked { .. }))
        ));
    }
}
