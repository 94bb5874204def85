//! # Invocable: what a callback actually runs.
//!
//! [`Invocable`] is a closed set of callable shapes, classified once at construction:
//! - [`Invocable::sync_fn`]: a blocking function, offloaded to the blocking pool when triggered;
//! - [`Invocable::async_fn`]: a function producing a future, scheduled as a new unit;
//! - a wrapped [`Callback`], whose own trigger is used (arguments are re-merged).
//!
//! ## Equality
//! Function variants are equal only when they share the same function handle
//! (clones of one `Invocable`). Wrapped callbacks compare structurally.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::callbacks::args::Args;
use crate::callbacks::callback::Callback;
use crate::error::CallbackError;

/// Shared synchronous callback body.
pub type SyncFn = Arc<dyn Fn(Args) -> Result<(), CallbackError> + Send + Sync>;

/// Shared asynchronous callback body.
pub type AsyncFn = Arc<dyn Fn(Args) -> BoxFuture<'static, Result<(), CallbackError>> + Send + Sync>;

/// A callable value: sync function, async function, or another [`Callback`].
#[derive(Clone)]
pub enum Invocable {
    /// Blocking function.
    Sync {
        /// Name used in logs and unit names.
        name: Cow<'static, str>,
        /// Function body.
        f: SyncFn,
    },
    /// Function returning a future.
    Async {
        /// Name used in logs and unit names.
        name: Cow<'static, str>,
        /// Function body.
        f: AsyncFn,
    },
    /// Another callback; triggering delegates to it.
    Wrapped(Box<Callback>),
}

impl Invocable {
    /// Wraps a synchronous function.
    ///
    /// ## Example
    /// ```rust
    /// use callvisor::{Args, Invocable};
    ///
    /// let print = Invocable::sync_fn("print", |args: Args| {
    ///     println!("{:?}", args.positional());
    ///     Ok(())
    /// });
    /// assert_eq!(print.name(), "print");
    /// assert!(!print.is_async());
    /// ```
    pub fn sync_fn<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Args) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        Invocable::Sync {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    /// Wraps a function that creates a new future per call.
    ///
    /// ## Example
    /// ```rust
    /// use callvisor::{Args, CallbackError, Invocable};
    ///
    /// let hello = Invocable::async_fn("hello", |_args: Args| async {
    ///     Ok::<_, CallbackError>(())
    /// });
    /// assert!(hello.is_async());
    /// ```
    pub fn async_fn<F, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        let f: AsyncFn = Arc::new(
            move |args: Args| -> BoxFuture<'static, Result<(), CallbackError>> {
                Box::pin(f(args))
            },
        );
        Invocable::Async {
            name: name.into(),
            f,
        }
    }

    /// Name of the underlying function.
    pub fn name(&self) -> &str {
        match self {
            Invocable::Sync { name, .. } | Invocable::Async { name, .. } => name,
            Invocable::Wrapped(cb) => cb.invocable().name(),
        }
    }

    /// True if the innermost function is asynchronous.
    pub fn is_async(&self) -> bool {
        match self {
            Invocable::Sync { .. } => false,
            Invocable::Async { .. } => true,
            Invocable::Wrapped(cb) => cb.invocable().is_async(),
        }
    }
}

impl From<Callback> for Invocable {
    fn from(cb: Callback) -> Self {
        Invocable::Wrapped(Box::new(cb))
    }
}

fn same_handle<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl PartialEq for Invocable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Invocable::Sync { f: a, .. }, Invocable::Sync { f: b, .. }) => same_handle(a, b),
            (Invocable::Async { f: a, .. }, Invocable::Async { f: b, .. }) => same_handle(a, b),
            (Invocable::Wrapped(a), Invocable::Wrapped(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Invocable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocable::Sync { name, .. } => write!(f, "Sync({name})"),
            Invocable::Async { name, .. } => write!(f, "Async({name})"),
            Invocable::Wrapped(cb) => f.debug_tuple("Wrapped").field(cb).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Invocable {
        Invocable::sync_fn("noop", |_| Ok(()))
    }

    #[test]
    fn functions_compare_by_handle() {
        let a = noop();
        assert_eq!(a, a.clone());
        // Same name, different function handle.
        assert_ne!(a, noop());
    }

    #[test]
    fn wrapped_callback_is_not_its_function() {
        let f = noop();
        let wrapped = Invocable::from(Callback::from(f.clone()));
        assert_ne!(wrapped, f);
        assert_eq!(wrapped, Invocable::from(Callback::from(f.clone())));
        assert_eq!(wrapped.name(), "noop");
    }

    #[test]
    fn classification_sees_through_wrapping() {
        let hello = Invocable::async_fn("hello", |_| async { Ok::<_, CallbackError>(()) });
        let wrapped = Invocable::from(Callback::from(hello));
        assert!(wrapped.is_async());
        assert_eq!(format!("{:?}", noop()), "Sync(noop)");
    }
}
