//! Service providers: self-contained modules with a two-phase lifecycle.
//!
//! A provider binds its services during `register` and wires them to
//! collaborators during `boot`. Providers that need an ordering declare a
//! [`Relationship`].
//!
//! # Examples
//! ```rust
//! use tartib_container::prelude::*;
//!
//! struct CacheProvider;
//!
//! impl ServiceProvider for CacheProvider {
//!     fn register(&self, app: &Application) {
//!         app.singleton("cache", |_| Ok(String::from("memory")));
//!     }
//!
//!     fn relationship(&self) -> Option<Relationship> {
//!         Some(Relationship::new().binds(["cache"]).depends_on([keys::CONFIG]))
//!     }
//! }
//! ```

use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::application::Application;
use crate::key::BindingKey;

/// A module that contributes bindings to an [`Application`].
///
/// The repository calls `register` on every provider before it calls `boot`
/// on any of them, each at most once.
///
/// # Design Philosophy
/// Split registrations by concern and let the declared [`Relationship`]
/// decide the order, instead of hand-maintaining a list:
///
/// ```rust,ignore
/// repository.add(vec![
///     Arc::new(MailProvider) as Arc<dyn ServiceProvider>,
///     Arc::new(QueueProvider),
///     Arc::new(ConfigProvider),
/// ]);
/// ```
pub trait ServiceProvider: Send + Sync + 'static {
    /// Bind services into the container.
    fn register(&self, app: &Application);

    /// Wire services once every provider has registered.
    fn boot(&self, _app: &Application) {}

    /// Ordering constraints for this provider.
    ///
    /// `None` means the provider takes no part in the dependency graph and
    /// runs after every provider that does, in the order it was added.
    fn relationship(&self) -> Option<Relationship> {
        None
    }

    /// Human-readable name for logs and cycle reports.
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Identity used for de-duplication: one entry per concrete type.
    ///
    /// Not meant to be overridden.
    fn provider_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}

/// Shared handle to a provider.
pub type ProviderRef = Arc<dyn ServiceProvider>;

/// An ordered list of providers.
pub type ProviderList = Vec<ProviderRef>;

impl fmt::Debug for dyn ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceProvider").field(&self.name()).finish()
    }
}

/// Declared graph edges of one provider.
///
/// - `bindings`: keys this provider owns
/// - `dependencies`: keys whose owners must run first
/// - `provide_for`: keys whose owners must run after this provider
///
/// `provide_for` is the reverse spelling of `dependencies`: a provider `P`
/// with `provide_for = ["queue"]` orders exactly as if the owner of `queue`
/// had listed one of `P`'s bindings as a dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub bindings: Vec<BindingKey>,
    pub dependencies: Vec<BindingKey>,
    pub provide_for: Vec<BindingKey>,
}

impl Relationship {
    /// Creates an empty relationship.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds owned bindings.
    pub fn binds<K: Into<BindingKey>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.bindings.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Adds dependencies.
    pub fn depends_on<K: Into<BindingKey>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.dependencies.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Adds keys whose owners must come after this provider.
    pub fn provides_for<K: Into<BindingKey>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
        self.provide_for.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Returns `true` if this relationship orders against other providers.
    pub fn has_edges(&self) -> bool {
        !self.dependencies.is_empty() || !self.provide_for.is_empty()
    }
}
