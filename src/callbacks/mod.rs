//! # Event callbacks.
//!
//! ## Architecture
//! ```text
//! CallbackRegistry<K>
//!   table: Option<K> ──► [Callback, Callback, ...]   (None = default bucket)
//!        │
//!        └─ dispatch(event, args)
//!              ├─ resolve bucket (event, else default bucket)
//!              └─ for each Callback: trigger(scheduler, args)
//!                                        │
//!                      merge bound args ◄┘ (TriggerMode::Merge)
//!                                        ▼
//!                               trigger_callback(scheduler, invocable, args)
//!                                        ├─ Async   → schedule
//!                                        ├─ Sync    → offload
//!                                        └─ Wrapped → nested Callback::trigger
//! ```
//!
//! Internal modules:
//! - [`args`]: positional and named call arguments;
//! - [`invocable`]: what a callback invokes (sync fn, async fn, nested callback);
//! - [`callback`]: invocable plus bound arguments;
//! - [`trigger`]: the dispatch primitive;
//! - [`registry`]: event-keyed callback table.

mod args;
mod callback;
mod invocable;
mod registry;
mod trigger;

pub use args::{Args, Value};
pub use callback::{Callback, TriggerMode};
pub use invocable::{AsyncFn, Invocable, SyncFn};
pub use registry::CallbackRegistry;
pub use trigger::{Triggered, trigger_callback};
