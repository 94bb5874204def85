//! # Call arguments.
//!
//! [`Args`] carries the positional and named arguments of one callback invocation.
//! Values are [`serde_json::Value`]s, so bound arguments compare structurally.
//!
//! ## Merge rule
//! ```text
//! call-time:  positional [c1, c2]   named {k: x}
//! bound:      positional [b1]       named {k: y, j: z}
//! merged:     positional [c1, c2, b1]
//!             named      {j: z, k: x}     (call-time keys win)
//! ```

use std::collections::BTreeMap;

pub use serde_json::Value;

/// Positional plus named arguments.
///
/// ## Example
/// ```rust
/// use callvisor::Args;
///
/// let args = Args::new().arg("foo").kwarg("bar", "baz");
/// assert_eq!(args.get(0), Some(&"foo".into()));
/// assert_eq!(args.named_value("bar"), Some(&"baz".into()));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    named: BTreeMap<String, Value>,
}

impl Args {
    /// Empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a named argument, replacing any previous value under `key`.
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(key.into(), value.into());
        self
    }

    /// Positional arguments in order.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Named arguments, ordered by key.
    pub fn named(&self) -> &BTreeMap<String, Value> {
        &self.named
    }

    /// Positional argument at `idx`.
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.positional.get(idx)
    }

    /// Named argument under `key`.
    pub fn named_value(&self, key: &str) -> Option<&Value> {
        self.named.get(key)
    }

    /// True if there are neither positional nor named arguments.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Merges these call-time arguments with `bound` ones.
    ///
    /// Call-time positionals come first; call-time named values override bound ones.
    pub(crate) fn merged_over(self, bound: &Args) -> Args {
        let mut positional = self.positional;
        positional.extend(bound.positional.iter().cloned());

        let mut named = bound.named.clone();
        named.extend(self.named);

        Args { positional, named }
    }
}

impl<V: Into<Value>> FromIterator<V> for Args {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self {
            positional: iter.into_iter().map(Into::into).collect(),
            named: BTreeMap::new(),
        }
    }
}
