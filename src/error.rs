//! Error types used by callvisor.
//!
//! This module defines three error enums:
//!
//! - [`CallbackError`] — outcome of a single triggered callback (failure, panic, cancellation).
//! - [`SignalError`] — raised while arming termination-signal handlers.
//! - [`RuntimeError`] — raised by the graceful application runner.
//!
//! All of them provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by a triggered callback.
///
/// These never cross [`CallbackRegistry::dispatch`](crate::CallbackRegistry::dispatch);
/// they are only observable through the [`Triggered`](crate::Triggered) handle or a
/// [`Unit`](crate::Unit) outcome.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// The callback body returned an error.
    #[error("callback failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The callback body panicked; the panic was contained to its own unit.
    #[error("callback panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The unit was cancelled before the callback finished.
    #[error("callback cancelled")]
    Cancelled,
}

impl CallbackError {
    /// Shorthand for [`CallbackError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        CallbackError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use callvisor::CallbackError;
    ///
    /// assert_eq!(CallbackError::failed("boom").as_label(), "callback_failed");
    /// assert_eq!(CallbackError::Cancelled.as_label(), "callback_cancelled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CallbackError::Failed { .. } => "callback_failed",
            CallbackError::Panicked { .. } => "callback_panicked",
            CallbackError::Cancelled => "callback_cancelled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CallbackError::Failed { error } => format!("error: {error}"),
            CallbackError::Panicked { info } => format!("panic: {info}"),
            CallbackError::Cancelled => "unit cancelled".to_string(),
        }
    }

    /// True for the expected outcome of a cancelled unit.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CallbackError::Cancelled)
    }

    /// Renders a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let info = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        CallbackError::Panicked { info }
    }
}

/// # Errors produced while arming termination-signal handlers.
///
/// Specification errors are returned before any handler is installed.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SignalError {
    /// A symbolic name that does not denote a signal on this platform.
    #[error("invalid signal name {name}")]
    UnknownName {
        /// The offending input.
        name: String,
    },

    /// A numeric code that does not denote a signal on this platform.
    #[error("invalid signal code {code}")]
    InvalidCode {
        /// The offending input.
        code: i32,
    },

    /// The scheduler has no runtime to host signal listeners.
    #[error("no active runtime to install signal handlers on")]
    SchedulerInactive,

    /// The scheduler's runtime was built without the IO/signal driver.
    #[error("no signal driver on the runtime to install a handler for {signal}")]
    DriverUnavailable {
        /// Signal name.
        signal: &'static str,
    },

    /// The OS refused to install a handler (e.g. SIGKILL).
    #[error("failed to install handler for {signal}: {source}")]
    Registration {
        /// Signal name.
        signal: &'static str,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl SignalError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use callvisor::SignalError;
    ///
    /// let err = SignalError::InvalidCode { code: 9999 };
    /// assert_eq!(err.as_label(), "signal_invalid_code");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SignalError::UnknownName { .. } => "signal_unknown_name",
            SignalError::InvalidCode { .. } => "signal_invalid_code",
            SignalError::SchedulerInactive => "signal_scheduler_inactive",
            SignalError::DriverUnavailable { .. } => "signal_driver_unavailable",
            SignalError::Registration { .. } => "signal_registration_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SignalError::UnknownName { name } => format!("unknown signal name: {name}"),
            SignalError::InvalidCode { code } => format!("invalid signal code: {code}"),
            SignalError::SchedulerInactive => "scheduler has no runtime".to_string(),
            SignalError::DriverUnavailable { signal } => {
                format!("runtime has no signal driver (enable_all / enable_io) for {signal}")
            }
            SignalError::Registration { signal, source } => {
                format!("registration of {signal} refused: {source}")
            }
        }
    }

    /// True when the input itself was malformed (as opposed to an environment failure).
    pub fn is_invalid_specification(&self) -> bool {
        matches!(
            self,
            SignalError::UnknownName { .. } | SignalError::InvalidCode { .. }
        )
    }
}

/// # Errors produced by the graceful application runner.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Units were still running after the grace period.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the units that did not settle in time.
        stuck: Vec<String>,
    },

    /// Termination handlers could not be armed.
    #[error("failed to arm termination handlers: {0}")]
    Signals(#[from] SignalError),

    /// A runtime could not be built for the blocking entry point.
    #[error("failed to build runtime: {0}")]
    Build(#[source] std::io::Error),

    /// The application's `main` returned an error.
    #[error("application failed: {0}")]
    Application(#[source] CallbackError),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use callvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signals(_) => "runtime_signals",
            RuntimeError::Build(_) => "runtime_build",
            RuntimeError::Application(_) => "runtime_application_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck units={stuck:?}")
            }
            RuntimeError::Signals(e) => e.as_message(),
            RuntimeError::Build(e) => format!("runtime build: {e}"),
            RuntimeError::Application(e) => e.as_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_are_rendered() {
        let err = CallbackError::from_panic(Box::new("static boom"));
        assert_eq!(
            err,
            CallbackError::Panicked {
                info: "static boom".into()
            }
        );

        let err = CallbackError::from_panic(Box::new(String::from("owned boom")));
        assert_eq!(err.as_message(), "panic: owned boom");

        let err = CallbackError::from_panic(Box::new(42u8));
        assert_eq!(err.as_message(), "panic: unknown panic");
    }

    #[test]
    fn specification_errors_are_classified() {
        assert!(SignalError::UnknownName { name: "FOOBAR".into() }.is_invalid_specification());
        assert!(SignalError::InvalidCode { code: 9999 }.is_invalid_specification());
        assert!(!SignalError::SchedulerInactive.is_invalid_specification());
    }

    #[test]
    fn signal_errors_name_the_offending_input() {
        let err = SignalError::UnknownName { name: "FOOBAR".into() };
        assert_eq!(err.to_string(), "invalid signal name FOOBAR");
        let err = SignalError::InvalidCode { code: 9999 };
        assert!(err.to_string().contains("9999"));
    }
}
