//! # callvisor
//!
//! **Callvisor** is a small event-callback dispatch library for tokio.
//!
//! Producers register callbacks under event-type keys and fire them with
//! arguments; each callback runs as an independent unit on a [`Scheduler`].
//! Shutdown helpers cancel every outstanding unit, on demand or when a
//! termination signal arrives.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  producer                         producer
//!     │ dispatch(Some(key), args)      │ dispatch(None, args)
//!     ▼                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  CallbackRegistry<K>                                              │
//! │  - Option<K> ──► [Callback, ...]   (None = default bucket)        │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   Callback::trigger  Callback::trigger  Callback::trigger   (bound args merged)
//!        │                  │                  │
//!        └──────────────────┼──────────────────┘
//!                           ▼
//!                 trigger_callback(scheduler, invocable, args)
//!                           │
//!                           ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scheduler                                                        │
//! │  - tokio Handle (optional)                                        │
//! │  - unit table (all_scheduled)                                     │
//! │  - armed signal listeners                                         │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!      Unit               Unit               Unit      (cancel / settled / outcome)
//!        ▲
//!        │ cancel()
//! cancel_all_tasks ◄── schedule ◄── signal listener (SIGINT, SIGTERM, extra)
//! ```
//!
//! ### Shutdown
//! ```text
//! SIGTERM ──► listener ──► schedule(cancel_all_tasks) ──► cancel every unit
//!                                                          except the canceller
//!                                                          └─► await each settlement
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / functions                        |
//! |-------------------|-------------------------------------------------------------------|----------------------------------------------|
//! | **Dispatch**      | Fire one invocable with arguments, fire-and-forget.               | [`trigger_callback`], [`Triggered`]          |
//! | **Callbacks**     | Invocable plus bound arguments, merge or simple trigger mode.     | [`Callback`], [`Invocable`], [`Args`]        |
//! | **Registry**      | Event-keyed buckets with a default bucket.                        | [`CallbackRegistry`]                         |
//! | **Scheduling**    | Explicit runtime handle and cancellable units.                    | [`Scheduler`], [`Unit`]                      |
//! | **Shutdown**      | Cancel outstanding units, on demand or on termination signals.    | [`cancel_all_tasks`], `cancel_tasks_on_termination` |
//! | **Application**   | Run a long-lived body with signal handling and a bounded drain.   | `GracefulApp`, `Application`                 |
//! | **Errors**        | Typed errors for callbacks, signals and the runner.               | [`CallbackError`], [`SignalError`], [`RuntimeError`] |
//! | **Configuration** | Detached-runtime fallback and shutdown grace.                     | [`Config`], [`AsyncFallback`]                |
//!
//! Signal handling and the application runner are available on unix only.
//!
//! ## Example
//! ```rust
//! use callvisor::{Args, CallbackError, CallbackRegistry, Config, Invocable, Scheduler};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let scheduler = Scheduler::current(Config::default());
//!     let registry = CallbackRegistry::new(scheduler.clone());
//!
//!     let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//!     let on_login = Invocable::async_fn("on_login", move |args: Args| {
//!         let tx = tx.clone();
//!         async move {
//!             tx.send(args).map_err(|e| CallbackError::failed(e.to_string()))
//!         }
//!     });
//!
//!     registry.register(Some("login"), on_login);
//!     registry.dispatch(Some("login"), Args::new().arg("alice"));
//!
//!     let args = rx.recv().await.unwrap();
//!     assert_eq!(args.get(0), Some(&"alice".into()));
//!
//!     callvisor::cancel_all_tasks(&scheduler, &[]).await;
//! }
//! ```
mod callbacks;
mod config;
mod core;
mod error;
mod shutdown;

// ---- Public re-exports ----

pub use callbacks::{
    Args, AsyncFn, Callback, CallbackRegistry, Invocable, SyncFn, TriggerMode, Triggered, Value,
    trigger_callback,
};
pub use config::{AsyncFallback, Config};
pub use core::{Executed, Scheduler, Unit, UnitId, execute_async};
pub use error::{CallbackError, RuntimeError, SignalError};
pub use shutdown::cancel_all_tasks;

// Unix only: signal handling and the graceful application runner.
#[cfg(unix)]
pub use shutdown::{Application, GracefulApp, Signal, SignalSpec, cancel_tasks_on_termination};
