//! # The Container
//!
//! Stores bindings and resolves them on demand.
//!
//! # Architecture
//! ```text
//!  bind / bind_with / singleton / instance
//!                  │
//!                  ▼
//!   Registry (key → Binding)      instances (key → SharedSlot)
//!                  │                         ▲
//!                  └──── make / make_with ───┘  (shared bindings only)
//! ```
//!
//! # Examples
//! ```rust
//! use tartib_container::prelude::*;
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserRepository {
//!     db: Arc<Database>,
//! }
//!
//! let container = Container::new();
//! container.singleton("db", |_| {
//!     Ok(Database { url: "postgres://localhost".into() })
//! });
//! container.bind("users", |c| {
//!     let db = c.make_as::<Database>("db")?;
//!     Ok(UserRepository { db })
//! });
//!
//! let users = container.make_as::<UserRepository>("users").expect("Failed to resolve");
//! assert_eq!(users.db.url, "postgres://localhost");
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tartib_support::rendering::suggest_similar;
use tracing::{error, trace};

use crate::config::ConfigRepository;
use crate::error::{BindingNotFoundError, ContainerError, Result};
use crate::key::{BindingKey, keys};
use crate::parameters::Parameters;
use crate::registry::{Binding, BoxError, Concrete, FactoryFn, Instance, Registry};
use crate::scope::Scope;

const MAX_SUGGESTIONS: usize = 3;

/// Thread-safe binding container.
///
/// Every method takes `&self`; bindings may be added while other threads
/// resolve.
///
/// # Shared bindings
/// A shared binding resolves through a per-key [`OnceCell`]. Concurrent first
/// resolutions of the same key run the factory exactly once and every caller
/// gets the same `Arc`. A factory that fails leaves the cell empty, so the
/// next `make` retries. A factory that resolves its own key deadlocks.
#[derive(Default)]
pub struct Container {
    registry: Registry,
    instances: DashMap<BindingKey, Arc<SharedSlot>>,
}

/// Cached value of a shared binding, tagged with the factory that fills it.
///
/// A slot whose factory is no longer the bound one belongs to a replaced
/// binding and is never served.
struct SharedSlot {
    factory: FactoryFn,
    value: OnceCell<Instance>,
}

impl SharedSlot {
    fn new(factory: &FactoryFn) -> Self {
        Self {
            factory: Arc::clone(factory),
            value: OnceCell::new(),
        }
    }

    fn serves(&self, factory: &FactoryFn) -> bool {
        Arc::ptr_eq(&self.factory, factory)
    }
}

impl Container {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ──

    /// Bind a factory that runs on every [`make`](Self::make).
    pub fn bind<T, F>(&self, key: impl Into<BindingKey>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.store(
            key.into(),
            Scope::Transient,
            Concrete::Factory(Arc::new(move |c: &Container| {
                Ok(Arc::new(factory(c)?) as Instance)
            })),
        );
    }

    /// Bind a factory that receives per-call [`Parameters`].
    ///
    /// Never cached. Through [`make`](Self::make) it receives an empty
    /// parameter set.
    pub fn bind_with<T, F>(&self, key: impl Into<BindingKey>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container, &Parameters) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.store(
            key.into(),
            Scope::Transient,
            Concrete::Parameterized(Arc::new(move |c: &Container, params: &Parameters| {
                Ok(Arc::new(factory(c, params)?) as Instance)
            })),
        );
    }

    /// Bind a factory whose first successful result is cached.
    pub fn singleton<T, F>(&self, key: impl Into<BindingKey>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.store(
            key.into(),
            Scope::Singleton,
            Concrete::Factory(Arc::new(move |c: &Container| {
                Ok(Arc::new(factory(c)?) as Instance)
            })),
        );
    }

    /// Bind a pre-built value.
    pub fn instance<T: Any + Send + Sync>(&self, key: impl Into<BindingKey>, value: T) {
        self.store(key.into(), Scope::Singleton, Concrete::Instance(Arc::new(value)));
    }

    fn store(&self, key: BindingKey, scope: Scope, concrete: Concrete) {
        self.registry.insert(key.clone(), Binding { concrete, scope });
        self.instances.remove(key.as_str());
    }

    // ── Resolution ──

    /// Resolve `key`.
    ///
    /// # Errors
    /// - [`ContainerError::BindingNotFound`] if `key` is not bound
    /// - [`ContainerError::Factory`] with the factory's own error
    pub fn make(&self, key: impl AsRef<str>) -> Result<Instance> {
        let key = key.as_ref();
        trace!(key, "Resolving");

        let binding = self.binding(key)?;
        match binding.concrete {
            Concrete::Instance(value) => Ok(value),
            Concrete::Factory(factory) if binding.scope.is_shared() => {
                let slot = self.shared_slot(key, &factory);
                let value = slot
                    .value
                    .get_or_try_init(|| factory(self))
                    .map_err(ContainerError::Factory)?;
                Ok(Arc::clone(value))
            }
            Concrete::Factory(factory) => factory(self).map_err(ContainerError::Factory),
            Concrete::Parameterized(factory) => {
                factory(self, &Parameters::new()).map_err(ContainerError::Factory)
            }
        }
    }

    /// Resolve `key` with per-call parameters.
    ///
    /// Never reads or writes the shared-instance cache. Plain factories run
    /// without the parameters; literal instances are returned as-is.
    pub fn make_with(&self, key: impl AsRef<str>, parameters: &Parameters) -> Result<Instance> {
        let key = key.as_ref();
        trace!(key, ?parameters, "Resolving with parameters");

        match self.binding(key)?.concrete {
            Concrete::Instance(value) => Ok(value),
            Concrete::Factory(factory) => factory(self).map_err(ContainerError::Factory),
            Concrete::Parameterized(factory) => {
                factory(self, parameters).map_err(ContainerError::Factory)
            }
        }
    }

    /// Resolve `key` and downcast to `T`.
    ///
    /// ```rust,ignore
    /// let db: Arc<Database> = container.make_as::<Database>("db")?;
    /// ```
    ///
    /// # Errors
    /// As [`make`](Self::make), plus [`ContainerError::TypeMismatch`].
    pub fn make_as<T: Any + Send + Sync>(&self, key: impl AsRef<str>) -> Result<Arc<T>> {
        let key = key.as_ref();
        downcast(key, self.make(key)?)
    }

    /// [`make_with`](Self::make_with) followed by a downcast to `T`.
    pub fn make_with_as<T: Any + Send + Sync>(
        &self,
        key: impl AsRef<str>,
        parameters: &Parameters,
    ) -> Result<Arc<T>> {
        let key = key.as_ref();
        downcast(key, self.make_with(key, parameters)?)
    }

    /// Typed accessor: resolve and downcast, logging failures.
    ///
    /// Returns `None` when the binding is missing, its factory fails or it
    /// holds another type. Callers must treat `None` as "facade unavailable".
    pub fn make_typed<T: Any + Send + Sync>(&self, key: impl AsRef<str>) -> Option<Arc<T>> {
        let key = key.as_ref();
        match self.make_as::<T>(key) {
            Ok(value) => Some(value),
            Err(err) => {
                error!(key, error = %err, "Typed resolution failed");
                None
            }
        }
    }

    /// The configuration facade bound under [`keys::CONFIG`].
    pub fn make_config(&self) -> Option<Arc<dyn ConfigRepository>> {
        self.make_typed::<Arc<dyn ConfigRepository>>(keys::CONFIG)
            .map(|config| Arc::clone(config.as_ref()))
    }

    // ── Introspection ──

    /// Returns `true` if `key` is bound.
    pub fn bound(&self, key: impl AsRef<str>) -> bool {
        self.registry.contains(key.as_ref())
    }

    /// Returns `true` if `key` has a cached shared instance.
    pub fn resolved(&self, key: impl AsRef<str>) -> bool {
        let key = key.as_ref();
        let Some(Binding {
            concrete: Concrete::Factory(factory),
            ..
        }) = self.registry.get(key)
        else {
            return false;
        };
        self.instances
            .get(key)
            .is_some_and(|slot| slot.serves(&factory) && slot.value.get().is_some())
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Drop cached shared instances so the next `make` rebuilds them.
    ///
    /// An empty `keys` drops every cached instance. Values bound with
    /// [`instance`](Self::instance) are bindings, not cache entries, and stay.
    pub fn fresh(&self, keys: &[&str]) {
        if keys.is_empty() {
            trace!("Dropping all cached instances");
            self.instances.clear();
            return;
        }
        for key in keys {
            trace!(key, "Dropping cached instance");
            self.instances.remove(*key);
        }
    }

    // ── Internal ──

    fn binding(&self, key: &str) -> Result<Binding> {
        self.registry.get(key).ok_or_else(|| {
            let registered = self.registry.registered_keys();
            let available: Vec<&str> = registered.iter().map(BindingKey::as_str).collect();
            ContainerError::BindingNotFound(BindingNotFoundError {
                key: BindingKey::from(key.to_owned()),
                suggestions: suggest_similar(key, &available, MAX_SUGGESTIONS),
            })
        })
    }

    // The slot is cloned out so no map guard is held while the factory runs.
    fn shared_slot(&self, key: &str, factory: &FactoryFn) -> Arc<SharedSlot> {
        if let Some(slot) = self.instances.get(key) {
            if slot.serves(factory) {
                return Arc::clone(slot.value());
            }
        }
        let mut slot = self
            .instances
            .entry(BindingKey::from(key.to_owned()))
            .or_insert_with(|| Arc::new(SharedSlot::new(factory)));
        if !slot.serves(factory) {
            // left behind by a resolution that raced a rebind
            *slot = Arc::new(SharedSlot::new(factory));
        }
        Arc::clone(slot.value())
    }
}

fn downcast<T: Any + Send + Sync>(key: &str, instance: Instance) -> Result<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| ContainerError::TypeMismatch {
            key: BindingKey::from(key.to_owned()),
            expected: type_name::<T>(),
        })
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registered", &self.registry.len())
            .field("resolved", &self.instances.len())
            .finish()
    }
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn resolve_instance() {
        let container = Container::new();
        container.instance("answer", 42i32);

        let value = container.make_as::<i32>("answer").unwrap();
        assert_eq!(*value, 42);

        let again = container.make_as::<i32>("answer").unwrap();
        assert!(Arc::ptr_eq(&value, &again));
    }

    #[test]
    fn resolve_not_bound() {
        let container = Container::new();
        container.instance("tartib.cache", 1u8);

        match container.make("tartib.cach").unwrap_err() {
            ContainerError::BindingNotFound(e) => {
                assert_eq!(e.key.as_str(), "tartib.cach");
                assert_eq!(e.suggestions, vec!["tartib.cache".to_string()]);
            }
            other => panic!("Expected BindingNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn singleton_factory_called_once() {
        let counter = Arc::new(AtomicU32::new(0));

        let container = Container::new();
        container.singleton("db", {
            let counter = counter.clone();
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(String::from("postgres://localhost"))
            }
        });

        let a = container.make("db").unwrap();
        let b = container.make("db").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(container.resolved("db"));
    }

    #[test]
    fn bind_runs_factory_every_time() {
        let counter = Arc::new(AtomicU32::new(0));

        let container = Container::new();
        container.bind("ticket", {
            let counter = counter.clone();
            move |_| Ok(counter.fetch_add(1, Ordering::SeqCst))
        });

        let a = container.make_as::<u32>("ticket").unwrap();
        let b = container.make_as::<u32>("ticket").unwrap();
        let c = container.make_as::<u32>("ticket").unwrap();

        assert_eq!((*a, *b, *c), (0, 1, 2));
        assert!(!container.resolved("ticket"));
    }

    #[test]
    fn factory_error_is_returned_untouched_and_not_cached() {
        let attempts = Arc::new(AtomicU32::new(0));

        let container = Container::new();
        container.singleton("flaky", {
            let attempts = attempts.clone();
            move |_| {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err("connection refused".into());
                }
                Ok(7u8)
            }
        });

        let err = container.make("flaky").unwrap_err();
        assert!(matches!(err, ContainerError::Factory(_)));
        assert_eq!(err.to_string(), "connection refused");
        assert!(!container.resolved("flaky"));

        let value = container.make_as::<u8>("flaky").unwrap();
        assert_eq!(*value, 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn make_with_passes_parameters() {
        let container = Container::new();
        container.bind_with("greeting", |_, params| {
            let name = params.get::<String>("name").cloned().unwrap_or_default();
            Ok(format!("hello {name}"))
        });

        let params = Parameters::new().with("name", String::from("tartib"));
        let greeting = container.make_with_as::<String>("greeting", &params).unwrap();
        assert_eq!(greeting.as_str(), "hello tartib");

        // through make: empty parameters
        let plain = container.make_as::<String>("greeting").unwrap();
        assert_eq!(plain.as_str(), "hello ");
    }

    #[test]
    fn make_with_bypasses_shared_cache() {
        let counter = Arc::new(AtomicU32::new(0));

        let container = Container::new();
        container.singleton("conn", {
            let counter = counter.clone();
            move |_| Ok(counter.fetch_add(1, Ordering::SeqCst))
        });

        let params = Parameters::new();
        let a = container.make_with("conn", &params).unwrap();
        let b = container.make_with("conn", &params).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!container.resolved("conn"));

        // the cache was never populated, so make runs the factory again
        let cached = container.make_as::<u32>("conn").unwrap();
        assert_eq!(*cached, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn make_with_ignores_existing_cache() {
        let container = Container::new();
        container.singleton("conn", |_| Ok(String::from("pooled")));

        let cached = container.make("conn").unwrap();
        let fresh = container.make_with("conn", &Parameters::new()).unwrap();
        assert!(!Arc::ptr_eq(&cached, &fresh));
    }

    #[test]
    fn make_with_not_bound() {
        let container = Container::new();
        let result = container.make_with("missing", &Parameters::new());
        assert!(matches!(result, Err(ContainerError::BindingNotFound(_))));
    }

    #[test]
    fn resolve_with_dependency() {
        let container = Container::new();
        container.instance("dsn", String::from("postgres://localhost"));
        container.bind("dsn.bytes", |c| {
            let dsn = c.make_as::<String>("dsn")?;
            Ok(dsn.as_bytes().to_vec())
        });

        let bytes = container.make_as::<Vec<u8>>("dsn.bytes").unwrap();
        assert_eq!(bytes.as_slice(), b"postgres://localhost");
    }

    #[test]
    fn missing_dependency_propagates_through_factory() {
        let container = Container::new();
        container.bind("repo", |c| {
            let db = c.make_as::<String>("db")?;
            Ok(db.len())
        });

        let err = container.make("repo").unwrap_err();
        assert!(err.to_string().contains("Binding not found: db"));
    }

    #[test]
    fn make_as_wrong_type() {
        let container = Container::new();
        container.instance("port", 5432u16);

        match container.make_as::<String>("port").unwrap_err() {
            ContainerError::TypeMismatch { key, expected } => {
                assert_eq!(key.as_str(), "port");
                assert!(expected.contains("String"));
            }
            other => panic!("Expected TypeMismatch, got: {other:?}"),
        }
    }

    #[test]
    fn make_typed_returns_none_on_failure() {
        let container = Container::new();
        container.instance("port", 5432u16);

        assert!(container.make_typed::<String>("port").is_none());
        assert!(container.make_typed::<u16>("missing").is_none());
        assert_eq!(container.make_typed::<u16>("port").as_deref(), Some(&5432));
    }

    #[test]
    fn make_config_absent() {
        let container = Container::new();
        assert!(container.make_config().is_none());
    }

    #[test]
    fn rebinding_drops_cached_instance() {
        let container = Container::new();
        container.singleton("driver", |_| Ok("redis"));
        assert_eq!(*container.make_as::<&str>("driver").unwrap(), "redis");

        container.singleton("driver", |_| Ok("memory"));
        assert_eq!(*container.make_as::<&str>("driver").unwrap(), "memory");
    }

    #[test]
    fn slot_of_replaced_factory_is_not_served() {
        let container = Container::new();
        container.singleton("driver", |_| Ok("redis"));
        container.make("driver").unwrap();
        let stale = container
            .instances
            .get("driver")
            .map(|slot| Arc::clone(slot.value()))
            .unwrap();

        container.singleton("driver", |_| Ok("memory"));
        // a resolution of the old binding finishing after the rebind
        container.instances.insert(BindingKey::new("driver"), stale);

        assert!(!container.resolved("driver"));
        assert_eq!(*container.make_as::<&str>("driver").unwrap(), "memory");
        assert!(container.resolved("driver"));
        assert_eq!(*container.make_as::<&str>("driver").unwrap(), "memory");
    }

    #[test]
    fn rebinding_while_resolving_never_serves_old_value() {
        const ROUNDS: usize = 200;
        let container = Container::new();
        container.singleton("driver", |_| Ok(0usize));

        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..ROUNDS {
                    let _ = container.make("driver");
                }
            });
            for round in 1..=ROUNDS {
                container.singleton("driver", move |_| Ok(round));
                assert_eq!(*container.make_as::<usize>("driver").unwrap(), round);
            }
        });
    }

    #[test]
    fn fresh_rebuilds_singletons() {
        let counter = Arc::new(AtomicU32::new(0));

        let container = Container::new();
        container.instance("literal", 1u8);
        container.singleton("session", {
            let counter = counter.clone();
            move |_| Ok(counter.fetch_add(1, Ordering::SeqCst))
        });

        assert_eq!(*container.make_as::<u32>("session").unwrap(), 0);
        container.fresh(&["session"]);
        assert_eq!(*container.make_as::<u32>("session").unwrap(), 1);
        container.fresh(&[]);
        assert_eq!(*container.make_as::<u32>("session").unwrap(), 2);

        assert_eq!(*container.make_as::<u8>("literal").unwrap(), 1);
    }

    #[test]
    fn concurrent_singleton_resolution_runs_factory_once() {
        const THREADS: usize = 8;
        let counter = Arc::new(AtomicU32::new(0));

        let container = Container::new();
        container.singleton("pool", {
            let counter = counter.clone();
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(5));
                Ok(String::from("pool"))
            }
        });

        let barrier = Barrier::new(THREADS);
        let resolved: Vec<Instance> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        container.make("pool").unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(resolved.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn debug_display() {
        let container = Container::new();
        container.instance("a", 1i32);
        container.instance("b", String::from("x"));

        let debug = format!("{container:?}");
        assert!(debug.contains("Container"));
        assert!(debug.contains("registered: 2"));
        assert_eq!(container.len(), 2);
        assert!(!container.is_empty());
    }
}
