//! Binding registry: the key → recipe half of the container.
//!
//! The registry maps a [`BindingKey`] to a [`Binding`]: a factory, a
//! parameterized factory, or a pre-built instance, plus its [`Scope`].

use std::any::Any;
use std::error::Error;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::container::Container;
use crate::key::BindingKey;
use crate::parameters::Parameters;
use crate::scope::Scope;

/// A resolved, type-erased value.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Error type returned by user factories.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// A factory that needs nothing but the container.
///
/// # Why `Arc` and not `Box`?
/// The recipe is cloned out of the map before it runs, so the map's shard
/// lock is never held while user code executes.
pub type FactoryFn = Arc<dyn Fn(&Container) -> Result<Instance, BoxError> + Send + Sync>;

/// A factory that also receives per-call [`Parameters`].
pub type ParameterizedFactoryFn =
    Arc<dyn Fn(&Container, &Parameters) -> Result<Instance, BoxError> + Send + Sync>;

/// How a binding produces its value.
#[derive(Clone)]
pub(crate) enum Concrete {
    Factory(FactoryFn),
    Parameterized(ParameterizedFactoryFn),
    Instance(Instance),
}

impl Concrete {
    fn kind(&self) -> &'static str {
        match self {
            Concrete::Factory(_) => "factory",
            Concrete::Parameterized(_) => "parameterized factory",
            Concrete::Instance(_) => "instance",
        }
    }
}

/// Registration entry for a single key.
#[derive(Clone)]
pub(crate) struct Binding {
    pub concrete: Concrete,
    pub scope: Scope,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("concrete", &self.concrete.kind())
            .field("scope", &self.scope)
            .finish()
    }
}

/// Stores all bindings.
///
/// Safe to mutate through `&self` from several threads; entries live until
/// the registry is dropped.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    bindings: DashMap<BindingKey, Binding>,
}

impl Registry {
    /// Stores a binding, replacing any previous one under the same key.
    ///
    /// Returns `true` if a binding was replaced.
    pub fn insert(&self, key: BindingKey, binding: Binding) -> bool {
        debug!(key = %key, scope = %binding.scope, kind = binding.concrete.kind(), "Bound");
        self.bindings.insert(key, binding).is_some()
    }

    /// Looks up a binding, cloning it out of the map.
    pub fn get(&self, key: &str) -> Option<Binding> {
        self.bindings.get(key).map(|entry| entry.value().clone())
    }

    /// Returns true if `key` is bound.
    pub fn contains(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    /// Returns the number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Returns every bound key, sorted.
    pub fn registered_keys(&self) -> Vec<BindingKey> {
        let mut keys: Vec<_> = self.bindings.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }
}
