//! # Graceful application runner.
//!
//! [`GracefulApp`] runs an [`Application`]'s `main` as a unit with termination handlers
//! armed, then drains whatever is still outstanding.
//!
//! ## Lifecycle
//! ```text
//! run()  ──► build multi-thread runtime ──► serve(scheduler)
//!
//! serve(scheduler):
//!   ├─► cancel_tasks_on_termination(scheduler)        (SIGINT, SIGTERM)
//!   ├─► schedule(app.main())                          → main unit
//!   ├─► main unit settles:
//!   │     ├─ Ok / Cancelled (signal) → clean stop
//!   │     └─ Failed / Panicked       → RuntimeError::Application
//!   └─► drain: cancel_all_tasks within the scheduler's Config::grace
//!         └─ timeout → RuntimeError::GraceExceeded { stuck }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::runtime::Builder;
use tracing::{debug, info};

use crate::config::Config;
use crate::core::Scheduler;
use crate::error::{CallbackError, RuntimeError, SignalError};
use crate::shutdown::cancel::cancel_all_tasks;
use crate::shutdown::signals::{SignalSpec, cancel_tasks_on_termination};

/// # Long-running application body.
///
/// `main` runs as a scheduled unit; a termination signal cancels it at its next
/// suspension point.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use callvisor::{Application, CallbackError};
///
/// struct Server;
///
/// #[async_trait]
/// impl Application for Server {
///     fn name(&self) -> &str { "server" }
///
///     async fn main(&self) -> Result<(), CallbackError> {
///         // accept connections...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Application: Send + Sync + 'static {
    /// Human-readable name (unit name and logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Runs until the application is done or cancelled.
    async fn main(&self) -> Result<(), CallbackError>;
}

/// Runs an [`Application`] with termination handling and a bounded final drain.
///
/// The drain is bounded by the `grace` of the scheduler the application is served on.
pub struct GracefulApp<A> {
    app: Arc<A>,
    cfg: Config,
}

impl<A: Application> GracefulApp<A> {
    /// Wraps `app`. `cfg` configures the scheduler built by [`run`](Self::run).
    pub fn new(app: A, cfg: Config) -> Self {
        Self {
            app: Arc::new(app),
            cfg,
        }
    }

    /// Blocking entry point: builds a multi-thread runtime and serves on it.
    pub fn run(self) -> Result<(), RuntimeError> {
        let rt = Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(RuntimeError::Build)?;
        let scheduler = Scheduler::new(rt.handle().clone(), self.cfg.clone());
        rt.block_on(self.serve(&scheduler))
    }

    /// Runs the application on an existing scheduler, draining within its `Config::grace`.
    pub async fn serve(&self, scheduler: &Scheduler) -> Result<(), RuntimeError> {
        cancel_tasks_on_termination(scheduler, Vec::<SignalSpec>::new())?;

        let app = Arc::clone(&self.app);
        let name = app.name().to_string();
        let main = scheduler
            .schedule(name.clone(), async move { app.main().await })
            .ok_or(SignalError::SchedulerInactive)?;
        info!(app = %name, "application started");

        let outcome = main.settled().await;
        self.drain(scheduler).await?;

        match outcome {
            Ok(()) => {
                info!(app = %name, "application finished");
                Ok(())
            }
            Err(CallbackError::Cancelled) => {
                info!(app = %name, "application cancelled");
                Ok(())
            }
            Err(e) => Err(RuntimeError::Application(e)),
        }
    }

    /// Cancels every remaining unit, waiting at most the scheduler's `Config::grace`.
    async fn drain(&self, scheduler: &Scheduler) -> Result<(), RuntimeError> {
        let Some(grace) = scheduler.config().grace_period() else {
            for unit in scheduler.all_scheduled() {
                unit.cancel();
            }
            return Ok(());
        };

        match tokio::time::timeout(grace, cancel_all_tasks(scheduler, &[])).await {
            Ok(cancelled) => {
                debug!(cancelled, "drained outstanding units");
                Ok(())
            }
            Err(_elapsed) => {
                let stuck = scheduler
                    .all_scheduled()
                    .iter()
                    .map(|u| u.name().to_string())
                    .collect();
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Quick;

    #[async_trait]
    impl Application for Quick {
        fn name(&self) -> &str {
            "quick"
        }

        async fn main(&self) -> Result<(), CallbackError> {
            Ok(())
        }
    }

    struct Broken;

    #[async_trait]
    impl Application for Broken {
        async fn main(&self) -> Result<(), CallbackError> {
            Err(CallbackError::failed("bad config"))
        }
    }

    /// Schedules a sibling unit on the same scheduler, then exits.
    struct Spawner {
        scheduler: Scheduler,
        sibling: tokio::sync::Mutex<Option<crate::Unit>>,
    }

    #[async_trait]
    impl Application for Spawner {
        async fn main(&self) -> Result<(), CallbackError> {
            let unit = self.scheduler.schedule("sibling", async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            });
            *self.sibling.lock().await = unit;
            Ok(())
        }
    }

    #[tokio::test]
    async fn finished_application_stops_cleanly() {
        let scheduler = Scheduler::current(Config::default());
        let app = GracefulApp::new(Quick, Config::default());
        app.serve(&scheduler).await.unwrap();
        assert_eq!(scheduler.armed_signals(), ["SIGINT", "SIGTERM"]);
    }

    #[tokio::test]
    async fn application_failure_is_reported() {
        let scheduler = Scheduler::current(Config::default());
        let err = GracefulApp::new(Broken, Config::default())
            .serve(&scheduler)
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "runtime_application_failed");
        assert!(err.to_string().contains("bad config"));
    }

    #[tokio::test]
    async fn leftover_units_are_cancelled() {
        let scheduler = Scheduler::current(Config::default());
        let app = GracefulApp::new(
            Spawner {
                scheduler: scheduler.clone(),
                sibling: tokio::sync::Mutex::new(None),
            },
            Config::default(),
        );

        app.serve(&scheduler).await.unwrap();

        let sibling = app.app.sibling.lock().await.clone().unwrap();
        assert!(sibling.is_cancelled());
        assert!(scheduler.all_scheduled().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stuck_units_exceed_grace() {
        let scheduler = Scheduler::current(Config {
            grace: Duration::from_millis(50),
            ..Config::default()
        });

        // Occupies a worker without yielding, so cancellation can't reach it.
        let (started, running) = tokio::sync::oneshot::channel();
        scheduler
            .schedule("stubborn", async move {
                let _ = started.send(());
                std::thread::sleep(Duration::from_millis(500));
                Ok(())
            })
            .unwrap();
        running.await.unwrap();

        // The app's own config (30s grace) only applies to `run`.
        let err = GracefulApp::new(Quick, Config::default())
            .serve(&scheduler)
            .await
            .unwrap_err();
        match err {
            RuntimeError::GraceExceeded { grace, stuck } => {
                assert_eq!(grace, Duration::from_millis(50));
                assert_eq!(stuck, ["stubborn"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn zero_grace_cancels_without_waiting() {
        let scheduler = Scheduler::current(Config {
            grace: Duration::ZERO,
            ..Config::default()
        });
        let leftover = scheduler
            .schedule("leftover", async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            })
            .unwrap();

        GracefulApp::new(Quick, Config::default())
            .serve(&scheduler)
            .await
            .unwrap();
        assert_eq!(leftover.settled().await, Err(CallbackError::Cancelled));
    }

    #[test]
    fn blocking_entry_point_builds_its_own_runtime() {
        GracefulApp::new(Quick, Config::default()).run().unwrap();
    }
}
