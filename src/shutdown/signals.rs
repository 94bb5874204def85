//! # Cancel outstanding units on termination signals.
//!
//! [`cancel_tasks_on_termination`] installs listeners for `SIGINT`, `SIGTERM` and any extra
//! signals. When one fires, the listener schedules [`cancel_all_tasks`] as a **new unit**
//! instead of running it inline.
//!
//! ## Flow
//! ```text
//! extra: [SignalSpec]  ──► resolve each (Signal | code | name)   ── any invalid ──► Err, nothing armed
//!                              │
//!                              ▼
//!            {SIGINT, SIGTERM} ∪ extra (deduplicated)
//!                              │
//!                              ├─► open tokio signal stream per signal   ── refused ──► Err, nothing armed
//!                              │                                         ── no driver ──► Err, nothing armed
//!                              │
//!                              └─► spawn listener per signal, replacing any previous one
//!                                     loop { recv() → schedule(cancel_all_tasks) }
//! ```
//!
//! ## States
//! ```text
//! idle ──arm──► armed(S) ──signal──► cancelling ──all settled──► idle-after-drain
//!                  ▲                                                 │
//!                  └────────────── listeners stay installed ─────────┘
//! ```
//! There is no disarm; re-arming replaces the listener of each signal in the new set
//! and keeps listeners of other signals.

use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::str::FromStr;

use nix::sys::signal::Signal;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, info};

use crate::core::Scheduler;
use crate::error::SignalError;
use crate::shutdown::cancel::cancel_all_tasks;

/// A signal given as a value, a numeric code, or a symbolic name (`"SIGABRT"`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignalSpec {
    /// Already-resolved signal.
    Signal(Signal),
    /// Numeric signal code.
    Code(i32),
    /// Symbolic name such as `"SIGHUP"`.
    Name(String),
}

impl SignalSpec {
    /// Normalizes the input to a [`Signal`].
    ///
    /// ## Example
    /// ```rust
    /// use callvisor::{Signal, SignalSpec};
    ///
    /// assert_eq!(SignalSpec::from("SIGABRT").resolve().unwrap(), Signal::SIGABRT);
    /// assert_eq!(SignalSpec::from(6).resolve().unwrap(), Signal::SIGABRT);
    /// assert!(SignalSpec::from("FOOBAR").resolve().is_err());
    /// assert!(SignalSpec::from(9999).resolve().is_err());
    /// ```
    pub fn resolve(&self) -> Result<Signal, SignalError> {
        match self {
            SignalSpec::Signal(sig) => Ok(*sig),
            SignalSpec::Code(code) => {
                Signal::try_from(*code).map_err(|_| SignalError::InvalidCode { code: *code })
            }
            SignalSpec::Name(name) => {
                Signal::from_str(name).map_err(|_| SignalError::UnknownName { name: name.clone() })
            }
        }
    }
}

impl From<Signal> for SignalSpec {
    fn from(sig: Signal) -> Self {
        SignalSpec::Signal(sig)
    }
}

impl From<i32> for SignalSpec {
    fn from(code: i32) -> Self {
        SignalSpec::Code(code)
    }
}

impl From<&str> for SignalSpec {
    fn from(name: &str) -> Self {
        SignalSpec::Name(name.to_string())
    }
}

impl From<String> for SignalSpec {
    fn from(name: String) -> Self {
        SignalSpec::Name(name)
    }
}

/// Arms `SIGINT`, `SIGTERM` and every `extra` signal so that receiving any of them
/// cancels all outstanding units of `scheduler` (see [`cancel_all_tasks`]).
///
/// Returns the armed signal set. Invalid input or an OS refusal aborts the call
/// before any listener is installed.
///
/// ## Example
/// ```rust
/// use callvisor::{Config, Scheduler, Signal, cancel_tasks_on_termination};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let scheduler = Scheduler::current(Config::default());
///     let armed = cancel_tasks_on_termination(&scheduler, ["SIGHUP"]).unwrap();
///     assert_eq!(armed, vec![Signal::SIGHUP, Signal::SIGINT, Signal::SIGTERM]);
/// }
/// ```
pub fn cancel_tasks_on_termination<I, S>(
    scheduler: &Scheduler,
    extra: I,
) -> Result<Vec<Signal>, SignalError>
where
    I: IntoIterator<Item = S>,
    S: Into<SignalSpec>,
{
    let runtime = scheduler.runtime().ok_or(SignalError::SchedulerInactive)?;

    let mut wanted = BTreeSet::from([Signal::SIGINT, Signal::SIGTERM]);
    for spec in extra {
        wanted.insert(spec.into().resolve()?);
    }

    let streams = {
        let _ctx = runtime.enter();
        wanted
            .iter()
            .map(|&sig| {
                // tokio panics instead of erroring when the runtime has no signal driver.
                catch_unwind(AssertUnwindSafe(|| signal(SignalKind::from_raw(sig as i32))))
                    .map_err(|_| SignalError::DriverUnavailable {
                        signal: sig.as_str(),
                    })?
                    .map(|stream| (sig, stream))
                    .map_err(|source| SignalError::Registration {
                        signal: sig.as_str(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    for (sig, mut stream) in streams {
        let weak = scheduler.downgrade();
        let listener = runtime.spawn(async move {
            while stream.recv().await.is_some() {
                let Some(scheduler) = weak.upgrade() else {
                    break;
                };
                info!(signal = sig.as_str(), "termination signal received, cancelling outstanding units");
                let target = scheduler.clone();
                scheduler.schedule("cancel_all_tasks", async move {
                    let cancelled = cancel_all_tasks(&target, &[]).await;
                    debug!(cancelled, "outstanding units settled");
                    Ok(())
                });
            }
        });
        scheduler.arm_signal(sig as i32, sig.as_str(), listener);
    }

    Ok(wanted.into_iter().collect())
}
