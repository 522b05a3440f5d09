//! Per-call arguments for parameterized bindings.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::registry::Instance;

/// A string-keyed bag of type-erased values handed to
/// [`bind_with`](crate::container::Container::bind_with) factories.
///
/// # Examples
/// ```
/// use tartib_container::parameters::Parameters;
///
/// let params = Parameters::new()
///     .with("connection", String::from("replica"))
///     .with("timeout_ms", 250u64);
///
/// assert_eq!(params.get::<String>("connection").map(String::as_str), Some("replica"));
/// assert_eq!(params.get::<u64>("timeout_ms"), Some(&250));
/// assert_eq!(params.get::<u32>("timeout_ms"), None);
/// ```
#[derive(Clone, Default)]
pub struct Parameters {
    values: HashMap<String, Instance>,
}

impl Parameters {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds or replaces a value.
    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.values.insert(name.into(), Arc::new(value));
    }

    /// Returns the value under `name` if it exists and is a `T`.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.values.get(name)?.downcast_ref::<T>()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Parameters").field("names", &names).finish()
    }
}
