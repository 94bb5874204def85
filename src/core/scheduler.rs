//! # Scheduler: explicit handle to the cooperative task runtime.
//!
//! [`Scheduler`] wraps an optional tokio [`Handle`] together with a table of every
//! unit it has scheduled. It is threaded explicitly into every component that can
//! dispatch work (registry, signal handlers, application runner); nothing looks up
//! an ambient runtime at call time.
//!
//! ## Architecture
//! ```text
//! schedule(name, fut) ──► Unit{id, token, outcome}  ──► units table
//!        │
//!        └─► runtime.spawn(CURRENT_UNIT.scope(id, wrapper))
//!                    wrapper:
//!                      select! {
//!                        token.cancelled()        → Err(Cancelled)
//!                        catch_unwind(fut)        → Ok / Err(Failed) / Err(Panicked)
//!                      }
//!                      remove from units table → publish outcome
//!        (a task dropped unpolled, e.g. by a shut-down runtime, still leaves the table)
//!
//! offload(name, f) ──► runtime.spawn_blocking(f) ──► schedule(name, join)
//! ```
//!
//! ## Rules
//! - A detached scheduler (`runtime = None`) schedules nothing: `schedule`/`offload`
//!   return `None` and callers apply their own fallback.
//! - `all_scheduled()` lists units that have not settled yet, in scheduling order.
//! - Cancellation is cooperative: the wrapper observes the token at the unit's
//!   suspension points. Blocking work already running on the worker pool is not
//!   interrupted; its unit settles as cancelled regardless.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::unit::{Unit, UnitId};
use crate::error::CallbackError;

/// Global unit sequence; ids are unique across schedulers.
static UNIT_SEQ: AtomicU64 = AtomicU64::new(1);

tokio::task_local! {
    static CURRENT_UNIT: UnitId;
}

/// Listener task installed for one OS signal.
struct ArmedSignal {
    name: &'static str,
    listener: JoinHandle<()>,
}

/// Removes a unit from the table when its task future is dropped, polled or not.
struct TableSlot {
    table: Weak<Inner>,
    id: UnitId,
}

impl Drop for TableSlot {
    fn drop(&mut self) {
        if let Some(inner) = self.table.upgrade() {
            inner.units.lock().remove(&self.id);
        }
    }
}

struct Inner {
    runtime: Option<Handle>,
    cfg: Config,
    units: Mutex<HashMap<UnitId, Unit>>,
    signals: Mutex<BTreeMap<i32, ArmedSignal>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        for armed in self.signals.get_mut().values() {
            armed.listener.abort();
        }
    }
}

/// Cloneable handle to the cooperative task runtime plus its unit table.
///
/// ## Example
/// ```rust
/// use callvisor::{Config, Scheduler};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let scheduler = Scheduler::current(Config::default());
///     assert!(scheduler.is_active());
///
///     let unit = scheduler
///         .schedule("hello", async { Ok(()) })
///         .expect("runtime is active");
///     assert_eq!(unit.settled().await, Ok(()));
/// }
/// ```
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Creates a scheduler that spawns on the given runtime.
    pub fn new(runtime: Handle, cfg: Config) -> Self {
        Self::build(Some(runtime), cfg)
    }

    /// Creates a scheduler bound to the runtime of the calling context, or a
    /// detached one if there is none.
    pub fn current(cfg: Config) -> Self {
        Self::build(Handle::try_current().ok(), cfg)
    }

    /// Creates a scheduler with no runtime.
    ///
    /// Sync callbacks run inline; async callbacks follow [`Config::async_fallback`].
    pub fn detached(cfg: Config) -> Self {
        Self::build(None, cfg)
    }

    fn build(runtime: Option<Handle>, cfg: Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                runtime,
                cfg,
                units: Mutex::new(HashMap::new()),
                signals: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// True if units can be scheduled.
    pub fn is_active(&self) -> bool {
        self.inner.runtime.is_some()
    }

    /// The runtime handle, if any.
    pub fn runtime(&self) -> Option<&Handle> {
        self.inner.runtime.as_ref()
    }

    /// Configuration this scheduler was built with.
    pub fn config(&self) -> &Config {
        &self.inner.cfg
    }

    /// Id of the unit the caller is running inside, if it is a scheduled unit.
    pub fn current_unit() -> Option<UnitId> {
        CURRENT_UNIT.try_with(|id| *id).ok()
    }

    /// Schedules `fut` as a new concurrently-running unit.
    ///
    /// Returns `None` if the scheduler is detached.
    pub fn schedule<F>(&self, name: impl Into<Arc<str>>, fut: F) -> Option<Unit>
    where
        F: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        let runtime = self.inner.runtime.as_ref()?;
        let id = UnitId(UNIT_SEQ.fetch_add(1, Ordering::Relaxed));
        let token = CancellationToken::new();
        let (tx, rx) = watch::channel(None);
        let unit = Unit::new(id, name.into(), token.clone(), rx);

        // Registered before spawning so a fast unit cannot settle before it is listed.
        self.inner.units.lock().insert(id, unit.clone());

        let slot = TableSlot {
            table: Arc::downgrade(&self.inner),
            id,
        };
        let wrapper = async move {
            let res = tokio::select! {
                biased;
                _ = token.cancelled() => Err(CallbackError::Cancelled),
                r = AssertUnwindSafe(fut).catch_unwind() => {
                    r.unwrap_or_else(|panic| Err(CallbackError::from_panic(panic)))
                }
            };
            drop(slot);
            let _ = tx.send(Some(res));
        };
        runtime.spawn(CURRENT_UNIT.scope(id, wrapper));
        Some(unit)
    }

    /// Runs the synchronous `f` on the runtime's blocking worker pool as a new unit.
    ///
    /// Returns `None` if the scheduler is detached.
    pub fn offload<F>(&self, name: impl Into<Arc<str>>, f: F) -> Option<Unit>
    where
        F: FnOnce() -> Result<(), CallbackError> + Send + 'static,
    {
        let runtime = self.inner.runtime.as_ref()?;
        let join = runtime.spawn_blocking(f);
        self.schedule(name, async move {
            match join.await {
                Ok(res) => res,
                Err(e) if e.is_panic() => Err(CallbackError::from_panic(e.into_panic())),
                Err(_) => Err(CallbackError::Cancelled),
            }
        })
    }

    /// Every unit scheduled here that has not settled yet, in scheduling order.
    pub fn all_scheduled(&self) -> Vec<Unit> {
        let units = self.inner.units.lock();
        let mut pending: Vec<Unit> = units
            .values()
            .filter(|u| !u.is_finished())
            .cloned()
            .collect();
        pending.sort_unstable_by_key(Unit::id);
        pending
    }

    /// Names of the signals with an installed listener, ordered by signal number.
    pub fn armed_signals(&self) -> Vec<&'static str> {
        self.inner.signals.lock().values().map(|s| s.name).collect()
    }

    /// Installs (or replaces) the listener for one signal.
    pub(crate) fn arm_signal(&self, code: i32, name: &'static str, listener: JoinHandle<()>) {
        let previous = self
            .inner
            .signals
            .lock()
            .insert(code, ArmedSignal { name, listener });
        if let Some(previous) = previous {
            previous.listener.abort();
        }
    }

    pub(crate) fn downgrade(&self) -> WeakScheduler {
        WeakScheduler(Arc::downgrade(&self.inner))
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("active", &self.is_active())
            .field("pending", &self.inner.units.lock().len())
            .field("cfg", &self.inner.cfg)
            .finish()
    }
}

/// Non-owning scheduler reference held by long-lived listeners.
#[derive(Clone)]
pub(crate) struct WeakScheduler(Weak<Inner>);

impl WeakScheduler {
    pub(crate) fn upgrade(&self) -> Option<Scheduler> {
        self.0.upgrade().map(|inner| Scheduler { inner })
    }
}
