//! # Cancel every outstanding unit.
//!
//! ```text
//! all_scheduled() ─► skip: caller's own unit, ignored units, settled units
//!                 ─► cancel() each remaining unit
//!                 ─► await settled() each (Cancelled is expected and swallowed)
//! ```

use tracing::debug;

use crate::core::{Scheduler, Unit};
use crate::error::CallbackError;

/// Cancels every unit scheduled on `scheduler` except the caller's own unit and
/// `ignored`, then waits until each of them has settled.
///
/// Returns how many units were cancelled. Safe to call with nothing outstanding.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use callvisor::{Config, Scheduler, cancel_all_tasks};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let scheduler = Scheduler::current(Config::default());
///     let unit = scheduler
///         .schedule("forever", async {
///             tokio::time::sleep(Duration::from_secs(3600)).await;
///             Ok(())
///         })
///         .unwrap();
///
///     assert_eq!(cancel_all_tasks(&scheduler, &[]).await, 1);
///     assert!(unit.is_cancelled());
/// }
/// ```
pub async fn cancel_all_tasks(scheduler: &Scheduler, ignored: &[Unit]) -> usize {
    let own = Scheduler::current_unit();
    let targets: Vec<Unit> = scheduler
        .all_scheduled()
        .into_iter()
        .filter(|u| Some(u.id()) != own)
        .filter(|u| !ignored.contains(u))
        .filter(|u| !u.is_finished())
        .collect();

    // Cancel everything first so units wind down concurrently.
    for unit in &targets {
        debug!(unit = %unit.id(), name = unit.name(), "cancelling unit");
        unit.cancel();
    }

    for unit in &targets {
        match unit.settled().await {
            Ok(()) | Err(CallbackError::Cancelled) => {}
            Err(e) => {
                debug!(unit = %unit.id(), name = unit.name(), error = %e, "unit settled with error during cancellation")
            }
        }
    }
    targets.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::time::Duration;

    fn forever(scheduler: &Scheduler, name: &'static str) -> Unit {
        scheduler
            .schedule(name, async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            })
            .unwrap()
    }

    #[tokio::test]
    async fn cancels_everything_but_ignored_units() {
        let scheduler = Scheduler::current(Config::default());
        let ignored = forever(&scheduler, "ignored");
        let victim = forever(&scheduler, "victim");
        assert!(!(victim.is_finished() || victim.is_cancelled()));

        let cancelled = cancel_all_tasks(&scheduler, std::slice::from_ref(&ignored)).await;

        assert_eq!(cancelled, 1);
        assert!(victim.is_cancelled());
        assert!(!(ignored.is_finished() || ignored.is_cancelled()));
        assert_eq!(scheduler.all_scheduled(), vec![ignored.clone()]);

        ignored.cancel();
        let _ = ignored.settled().await;
    }

    #[tokio::test]
    async fn nothing_outstanding_is_a_noop() {
        let scheduler = Scheduler::current(Config::default());
        assert_eq!(cancel_all_tasks(&scheduler, &[]).await, 0);

        let detached = Scheduler::detached(Config::default());
        assert_eq!(cancel_all_tasks(&detached, &[]).await, 0);
    }

    #[tokio::test]
    async fn caller_unit_is_never_cancelled() {
        let scheduler = Scheduler::current(Config::default());
        let victim = forever(&scheduler, "victim");

        let s = scheduler.clone();
        let canceller = scheduler
            .schedule("canceller", async move {
                cancel_all_tasks(&s, &[]).await;
                Ok(())
            })
            .unwrap();

        assert_eq!(canceller.settled().await, Ok(()));
        assert!(victim.is_cancelled());
    }

    #[tokio::test]
    async fn settled_units_are_left_alone() {
        let scheduler = Scheduler::current(Config::default());
        let done = scheduler.schedule("done", async { Ok(()) }).unwrap();
        assert_eq!(done.settled().await, Ok(()));

        assert_eq!(cancel_all_tasks(&scheduler, &[]).await, 0);
        assert_eq!(done.outcome(), Some(Ok(())));
    }
}
