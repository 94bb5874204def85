//! # Callback: an invocable plus bound arguments.
//!
//! A [`Callback`] is immutable after construction. Two callbacks are equal when they
//! wrap the same invocable with the same bound arguments and trigger mode, which is
//! what lets the registry deregister and look up callbacks by value.
//!
//! ## Trigger modes
//! - [`TriggerMode::Merge`]: call-time arguments are merged with the bound ones
//!   (see [`Args`] for the rule).
//! - [`TriggerMode::Simple`]: call-time arguments are discarded; only bound ones are used.

use crate::callbacks::args::Args;
use crate::callbacks::invocable::Invocable;
use crate::callbacks::trigger::{Triggered, trigger_callback};
use crate::core::Scheduler;

/// How call-time arguments are treated when a callback fires.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriggerMode {
    /// Prepend call-time positionals, let call-time named values win.
    #[default]
    Merge,
    /// Ignore call-time arguments entirely.
    Simple,
}

/// An invocable with bound arguments.
///
/// ## Example
/// ```rust
/// use callvisor::{Args, Callback, Invocable};
///
/// let f = Invocable::sync_fn("greet", |_args: Args| Ok(()));
/// let cb = Callback::new(f.clone(), Args::new().arg("world"));
///
/// assert_eq!(cb, Callback::new(f.clone(), Args::new().arg("world")));
/// assert_ne!(cb, Callback::from(f));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Callback {
    invocable: Invocable,
    bound: Args,
    mode: TriggerMode,
}

impl Callback {
    /// Creates a merging callback.
    pub fn new(invocable: Invocable, bound: Args) -> Self {
        Self {
            invocable,
            bound,
            mode: TriggerMode::Merge,
        }
    }

    /// Creates a callback that ignores call-time arguments.
    pub fn simple(invocable: Invocable, bound: Args) -> Self {
        Self {
            invocable,
            bound,
            mode: TriggerMode::Simple,
        }
    }

    /// The wrapped invocable.
    pub fn invocable(&self) -> &Invocable {
        &self.invocable
    }

    /// Bound arguments.
    pub fn bound(&self) -> &Args {
        &self.bound
    }

    /// Trigger mode.
    pub fn mode(&self) -> TriggerMode {
        self.mode
    }

    /// Fires the callback with call-time `args` on `scheduler`.
    pub fn trigger(&self, scheduler: &Scheduler, args: Args) -> Triggered {
        let args = match self.mode {
            TriggerMode::Merge => args.merged_over(&self.bound),
            TriggerMode::Simple => self.bound.clone(),
        };
        trigger_callback(scheduler, &self.invocable, args)
    }
}

impl From<Invocable> for Callback {
    fn from(invocable: Invocable) -> Self {
        Callback::new(invocable, Args::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recorder() -> (Invocable, Arc<Mutex<Vec<Args>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let f = Invocable::sync_fn("recorder", move |args| {
            sink.lock().push(args);
            Ok(())
        });
        (f, calls)
    }

    #[test]
    fn merge_prepends_call_time_arguments() {
        let scheduler = Scheduler::detached(Config::default());
        let (f, calls) = recorder();
        let cb = Callback::new(f, Args::new().arg("foo").kwarg("bar", "baz"));

        cb.trigger(&scheduler, Args::new().arg("first").kwarg("not_ignored", true));

        assert_eq!(
            *calls.lock(),
            vec![
                Args::new()
                    .arg("first")
                    .arg("foo")
                    .kwarg("bar", "baz")
                    .kwarg("not_ignored", true)
            ]
        );
    }

    #[test]
    fn simple_trigger_ignores_call_time_arguments() {
        let scheduler = Scheduler::detached(Config::default());
        let (f, calls) = recorder();
        let cb = Callback::simple(f, Args::new().arg("foo").kwarg("bar", "baz"));

        cb.trigger(&scheduler, Args::new().kwarg("ignored", true));

        assert_eq!(*calls.lock(), vec![cb.bound().clone()]);
    }

    #[test]
    fn nested_callbacks_merge_at_every_level() {
        let scheduler = Scheduler::detached(Config::default());
        let (f, calls) = recorder();
        let inner = Callback::new(f, Args::new().arg("inner").kwarg("k", "inner"));
        let outer = Callback::new(inner.into(), Args::new().arg("outer").kwarg("k", "outer"));

        outer.trigger(&scheduler, Args::new().arg("call"));

        assert_eq!(
            *calls.lock(),
            vec![
                Args::new()
                    .arg("call")
                    .arg("outer")
                    .arg("inner")
                    .kwarg("k", "outer")
            ]
        );
    }

    #[test]
    fn mode_takes_part_in_equality() {
        let (f, _) = recorder();
        assert_ne!(
            Callback::new(f.clone(), Args::new()),
            Callback::simple(f, Args::new())
        );
    }
}
