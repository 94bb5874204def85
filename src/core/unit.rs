//! # Scheduled unit handle.
//!
//! A [`Unit`] is a cheap, cloneable view of one piece of in-flight work owned by a
//! [`Scheduler`](crate::Scheduler). It lets callers observe completion, request
//! cooperative cancellation and await settlement from any number of places.
//!
//! ## States
//! ```text
//! running ──► Ok(())                        (completed)
//!         ├─► Err(CallbackError::Failed)    (body returned an error)
//!         ├─► Err(CallbackError::Panicked)  (body panicked, contained)
//!         └─► Err(CallbackError::Cancelled) (token fired before completion)
//! ```
//!
//! ## Rules
//! - The outcome is written exactly once, by the scheduler's wrapper future.
//! - `cancel()` only fires the token; the unit settles at its next suspension point.
//! - A unit dropped by a shutting-down runtime settles as `Cancelled`.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::CallbackError;

/// Process-unique identifier of a scheduled unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(pub(crate) u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

pub(crate) type Outcome = Option<Result<(), CallbackError>>;

/// Handle to a unit of work scheduled on a [`Scheduler`](crate::Scheduler).
#[derive(Clone)]
pub struct Unit {
    id: UnitId,
    name: Arc<str>,
    token: CancellationToken,
    outcome: watch::Receiver<Outcome>,
}

impl Unit {
    pub(crate) fn new(
        id: UnitId,
        name: Arc<str>,
        token: CancellationToken,
        outcome: watch::Receiver<Outcome>,
    ) -> Self {
        Self {
            id,
            name,
            token,
            outcome,
        }
    }

    /// Identifier of this unit.
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Name of the invocable this unit runs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requests cooperative cancellation.
    ///
    /// Idempotent. Has no effect on a unit that already settled.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once the unit has settled (completed, failed, panicked or cancelled).
    pub fn is_finished(&self) -> bool {
        self.outcome().is_some()
    }

    /// True if the unit settled because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.outcome(), Some(Err(CallbackError::Cancelled)))
    }

    /// Returns the outcome if the unit has settled.
    pub fn outcome(&self) -> Option<Result<(), CallbackError>> {
        let outcome = self.outcome.borrow().clone();
        match outcome {
            Some(res) => Some(res),
            None if self.outcome.has_changed().is_err() => Some(Err(CallbackError::Cancelled)),
            None => None,
        }
    }

    /// Waits until the unit settles and returns its outcome.
    ///
    /// Can be awaited from several clones concurrently.
    pub async fn settled(&self) -> Result<(), CallbackError> {
        let mut rx = self.outcome.clone();
        match rx.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone().unwrap_or(Err(CallbackError::Cancelled)),
            // Sender dropped without an outcome: the runtime discarded the unit.
            Err(_) => Err(CallbackError::Cancelled),
        }
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Unit {}
