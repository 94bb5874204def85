//! # Callback registry: event type → ordered callbacks.
//!
//! [`CallbackRegistry`] maps event-type keys to buckets of [`Callback`]s and fires them
//! on [`dispatch`](CallbackRegistry::dispatch).
//!
//! ## Architecture
//! ```text
//! producer ──► dispatch(Some(key), args)
//!                 │
//!                 ├─ key in table?  ── yes ──► bucket(key)        (even if empty)
//!                 │                 └─ no  ──► bucket(None)       (default, if any)
//!                 │
//!                 └─► for cb in bucket (registration order):
//!                        cb.trigger(scheduler, args.clone())  ──► independent unit
//! ```
//!
//! ## Rules
//! - Buckets keep insertion order; that order is the trigger order.
//! - The default bucket (key `None`) is consulted only when the key is absent.
//! - Registering the same callback twice yields two triggers per event.
//! - Deregistering something that isn't there is a no-op.
//! - `dispatch` never awaits callbacks and never reports their failures.
//! - The table lock is released before any callback is triggered.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use parking_lot::RwLock;
use tracing::debug;

use crate::callbacks::args::Args;
use crate::callbacks::callback::Callback;
use crate::core::Scheduler;

/// Registry of callbacks keyed by event type, with a default bucket under `None`.
///
/// ## Example
/// ```rust
/// use callvisor::{Args, CallbackRegistry, Config, Invocable, Scheduler};
///
/// let registry = CallbackRegistry::new(Scheduler::detached(Config::default()));
/// let on_start = Invocable::sync_fn("on_start", |_args: Args| Ok(()));
///
/// registry.register(Some("start"), on_start.clone());
/// assert!(registry.exists(Some("start"), on_start.clone()));
///
/// registry.dispatch(Some("start"), Args::new().arg("now"));
///
/// registry.deregister(Some("start"), on_start.clone());
/// assert!(!registry.exists(Some("start"), on_start));
/// ```
pub struct CallbackRegistry<K> {
    table: RwLock<HashMap<Option<K>, Vec<Callback>>>,
    scheduler: Scheduler,
}

impl<K> CallbackRegistry<K>
where
    K: Eq + Hash + Clone + Debug,
{
    /// Creates an empty registry dispatching on `scheduler`.
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            table: RwLock::new(HashMap::new()),
            scheduler,
        }
    }

    /// Creates a registry seeded with initial buckets.
    ///
    /// Buckets are appended in iteration order, so a key may appear more than once.
    pub fn with_callbacks<I>(scheduler: Scheduler, callbacks: I) -> Self
    where
        I: IntoIterator<Item = (Option<K>, Vec<Callback>)>,
    {
        let registry = Self::new(scheduler);
        {
            let mut table = registry.table.write();
            for (event, bucket) in callbacks {
                table.entry(event).or_default().extend(bucket);
            }
        }
        registry
    }

    /// Scheduler callbacks are dispatched on.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Appends `callback` to the bucket for `event`, creating the bucket if needed.
    ///
    /// Raw [`Invocable`](crate::Invocable)s are wrapped into a [`Callback`] with no bound arguments.
    pub fn register(&self, event: Option<K>, callback: impl Into<Callback>) {
        let callback = callback.into();
        debug!(event = ?event, callback = callback.invocable().name(), "registered callback");
        self.table.write().entry(event).or_default().push(callback);
    }

    /// Removes the first callback equal to `callback` from the bucket for `event`.
    ///
    /// Returns `true` if something was removed. Missing buckets and callbacks are ignored.
    ///
    /// Functions compare by handle: deregister with a clone of the registered
    /// [`Invocable`](crate::Invocable). Wrapping the same `fn` again with
    /// `Invocable::sync_fn` produces a new handle that matches nothing.
    pub fn deregister(&self, event: Option<K>, callback: impl Into<Callback>) -> bool {
        let callback = callback.into();
        let mut table = self.table.write();
        let Some(bucket) = table.get_mut(&event) else {
            return false;
        };
        match bucket.iter().position(|cb| *cb == callback) {
            Some(idx) => {
                bucket.remove(idx);
                debug!(event = ?event, callback = callback.invocable().name(), "deregistered callback");
                true
            }
            None => false,
        }
    }

    /// True if an equal callback is in the bucket for exactly `event` (no default fallback).
    ///
    /// As with [`deregister`](Self::deregister), look up with a clone of the registered
    /// [`Invocable`](crate::Invocable).
    pub fn exists(&self, event: Option<K>, callback: impl Into<Callback>) -> bool {
        let callback = callback.into();
        self.table
            .read()
            .get(&event)
            .is_some_and(|bucket| bucket.contains(&callback))
    }

    /// Callbacks that a dispatch for `event` would trigger.
    ///
    /// The bucket for `event` if the key is present (even if empty), otherwise the
    /// default bucket, otherwise nothing.
    pub fn callbacks(&self, event: Option<K>) -> Vec<Callback> {
        let table = self.table.read();
        table
            .get(&event)
            .or_else(|| table.get(&None))
            .cloned()
            .unwrap_or_default()
    }

    /// Triggers every callback resolved for `event` with `args`, in registration order.
    ///
    /// Returns immediately; outcomes are only observable inside each callback's own unit.
    pub fn dispatch(&self, event: Option<K>, args: Args) {
        let callbacks = self.callbacks(event.clone());
        debug!(event = ?event, callbacks = callbacks.len(), "dispatching event");
        for cb in &callbacks {
            let _ = cb.trigger(&self.scheduler, args.clone());
        }
    }
}

impl<K: Debug> Debug for CallbackRegistry<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("table", &*self.table.read())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
