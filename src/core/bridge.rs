//! # Bridging synchronous code and futures.
//!
//! - [`execute_async`] runs a future from code that may or may not be inside a runtime.
//! - [`block_on_private`] drives a future to completion on a throwaway runtime, used by
//!   [`AsyncFallback::Inline`](crate::AsyncFallback::Inline).

use std::future::Future;

use tokio::runtime::{Builder, Handle};
use tokio::task::JoinHandle;

use crate::error::CallbackError;

/// Result of [`execute_async`].
#[derive(Debug)]
pub enum Executed<T> {
    /// A runtime was active; the future runs as a task.
    Spawned(JoinHandle<T>),
    /// No runtime was active; the future ran to completion.
    Completed(T),
}

/// Runs `fut` as a task on the current runtime, or to completion on a fresh
/// current-thread runtime if the caller is not inside one.
///
/// ## Example
/// ```rust
/// use callvisor::{execute_async, Executed};
///
/// let out = execute_async(async { 40 + 2 }).unwrap();
/// assert!(matches!(out, Executed::Completed(42)));
/// ```
pub fn execute_async<F>(fut: F) -> std::io::Result<Executed<F::Output>>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => Ok(Executed::Spawned(handle.spawn(fut))),
        Err(_) => {
            let rt = Builder::new_current_thread().enable_all().build()?;
            Ok(Executed::Completed(rt.block_on(fut)))
        }
    }
}

/// Drives a callback future to completion on a private runtime, blocking the caller.
///
/// The runtime lives on a scoped thread so this is safe to call from inside
/// another runtime's context.
pub(crate) fn block_on_private<F>(fut: F) -> Result<(), CallbackError>
where
    F: Future<Output = Result<(), CallbackError>> + Send,
{
    std::thread::scope(|scope| {
        let worker = scope.spawn(move || {
            let rt = Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| CallbackError::failed(format!("private runtime: {e}")))?;
            rt.block_on(fut)
        });
        worker.join().unwrap_or_else(|panic| Err(CallbackError::from_panic(panic)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawns_inside_a_runtime() {
        match execute_async(async { "spawned" }).unwrap() {
            Executed::Spawned(join) => assert_eq!(join.await.unwrap(), "spawned"),
            Executed::Completed(_) => panic!("expected a spawned task"),
        }
    }

    #[test]
    fn completes_outside_a_runtime() {
        let out = execute_async(async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            7
        })
        .unwrap();
        assert!(matches!(out, Executed::Completed(7)));
    }

    #[tokio::test]
    async fn private_runtime_works_inside_another_runtime() {
        let res = block_on_private(async {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            Err(CallbackError::failed("inner"))
        });
        assert_eq!(res, Err(CallbackError::failed("inner")));
    }
}
