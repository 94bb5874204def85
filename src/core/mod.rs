//! Runtime core: the scheduler capability everything else is built on.
//!
//! Internal modules:
//! - [`scheduler`]: explicit handle to the tokio runtime plus the table of scheduled units;
//! - [`unit`]: cloneable handle to one scheduled unit (cancel, observe, await);
//! - [`bridge`]: running futures from synchronous code.

mod bridge;
mod scheduler;
mod unit;

pub use bridge::{Executed, execute_async};
pub use scheduler::Scheduler;
pub use unit::{Unit, UnitId};

pub(crate) use bridge::block_on_private;
