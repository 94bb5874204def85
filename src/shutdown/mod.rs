//! # Shutdown helpers.
//!
//! - [`cancel_all_tasks`]: cancel every outstanding unit and wait for it to settle;
//! - [`cancel_tasks_on_termination`]: run the above on `SIGINT`, `SIGTERM` and extra signals (unix);
//! - [`GracefulApp`]: run an [`Application`] with termination handling and a bounded drain (unix).

mod cancel;
#[cfg(unix)]
mod app;
#[cfg(unix)]
mod signals;

pub use cancel::cancel_all_tasks;

#[cfg(unix)]
pub use app::{Application, GracefulApp};
#[cfg(unix)]
pub use nix::sys::signal::Signal;
#[cfg(unix)]
pub use signals::{SignalSpec, cancel_tasks_on_termination};
