//! Configuration facade consumed by provider loading.
//!
//! Loading configuration files is the host's job. The repository only needs
//! something that answers `get(key)`, bound under [`keys::CONFIG`](crate::key::keys::CONFIG).

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// A type-erased configuration value.
pub type ConfigValue = Arc<dyn Any + Send + Sync>;

/// Config key holding the application's [`ProviderList`](crate::provider::ProviderList).
pub const PROVIDERS_KEY: &str = "app.providers";

/// Read access to application configuration.
pub trait ConfigRepository: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<ConfigValue>;
}

/// In-memory [`ConfigRepository`].
///
/// # Examples
/// ```
/// use tartib_container::config::{ConfigRepository, MemoryConfig};
///
/// let config = MemoryConfig::new();
/// config.set("app.name", String::from("tartib"));
///
/// let name = config.get("app.name").unwrap();
/// assert_eq!(name.downcast_ref::<String>().map(String::as_str), Some("tartib"));
/// ```
#[derive(Default)]
pub struct MemoryConfig {
    values: RwLock<HashMap<String, ConfigValue>>,
}

impl MemoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.values.write().insert(key.into(), Arc::new(value));
    }

    /// Removes the value under `key`.
    pub fn forget(&self, key: &str) {
        self.values.write().remove(key);
    }
}

impl ConfigRepository for MemoryConfig {
    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.values.read().get(key).cloned()
    }
}

impl fmt::Debug for MemoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryConfig")
            .field("keys", &self.values.read().len())
            .finish()
    }
}
