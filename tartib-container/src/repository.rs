//! Provider repository: ordering and the register/boot lifecycle.
//!
//! ```text
//!  add(providers) ──> sorted order (cached until the next add)
//!                          │
//!        register(app) ────┤  unregistered ──> registered
//!        boot(app) ────────┘  registered   ──> booted
//! ```
//!
//! Each transition happens at most once per provider for the lifetime of the
//! repository; only [`reset`](ProviderRepository::reset) forgets them.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::Application;
use crate::config::{ConfigRepository, PROVIDERS_KEY};
use crate::error::ProviderError;
use crate::graph::ProviderGraph;
use crate::key::keys;
use crate::provider::{ProviderList, ProviderRef, Relationship};

/// Lifecycle flags of one provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderState {
    pub registered: bool,
    pub booted: bool,
}

/// A sorted provider order, shared between calls until invalidated.
pub type ProviderOrder = Arc<[ProviderRef]>;

/// Serializable view of one provider, for listings and diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSnapshot {
    pub name: &'static str,
    pub registered: bool,
    pub booted: bool,
    pub relationship: Option<Relationship>,
}

/// Owns the known providers and drives them through register and boot.
///
/// Meant for a single bootstrap thread: every mutating method takes
/// `&mut self`.
#[derive(Default)]
pub struct ProviderRepository {
    providers: ProviderList,
    states: HashMap<TypeId, ProviderState>,
    sorted: Option<ProviderOrder>,
    configured: Option<ProviderList>,
}

impl ProviderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds providers. A provider whose type is already known is skipped.
    ///
    /// Invalidates the cached order when at least one provider is new.
    pub fn add(&mut self, providers: impl IntoIterator<Item = ProviderRef>) {
        let before = self.providers.len();
        for provider in providers {
            let id = provider.provider_id();
            if self.states.contains_key(&id) {
                debug!(provider = provider.name(), "Provider already added, skipping");
                continue;
            }
            debug!(provider = provider.name(), "Added provider");
            self.states.insert(id, ProviderState::default());
            self.providers.push(provider);
        }
        if self.providers.len() != before {
            self.sorted = None;
        }
    }

    /// Calls `register` on every provider not registered yet, in dependency
    /// order, and returns the full order.
    ///
    /// # Panics
    /// If the providers' relationships are circular.
    pub fn register(&mut self, app: &Application) -> ProviderOrder {
        let order = self.sorted();
        for provider in order.iter() {
            if self.state(provider).registered {
                continue;
            }
            provider.register(app);
            self.state_mut(provider).registered = true;
            info!(provider = provider.name(), "Registered provider");
        }
        order
    }

    /// Calls `boot` on every registered, not yet booted provider, in
    /// dependency order. Unregistered providers are skipped.
    ///
    /// # Panics
    /// If the providers' relationships are circular.
    pub fn boot(&mut self, app: &Application) {
        let order = self.sorted();
        for provider in order.iter() {
            let state = self.state(provider);
            if !state.registered || state.booted {
                continue;
            }
            provider.boot(app);
            self.state_mut(provider).booted = true;
            info!(provider = provider.name(), "Booted provider");
        }
    }

    /// Providers currently marked booted.
    pub fn get_booted(&self) -> ProviderList {
        self.providers
            .iter()
            .filter(|provider| self.state(provider).booted)
            .cloned()
            .collect()
    }

    /// The dependency order, computed on first use after an `add`.
    ///
    /// # Panics
    /// If the providers' relationships are circular. Use
    /// [`try_sorted`](Self::try_sorted) to handle that case.
    pub fn sorted(&mut self) -> ProviderOrder {
        match self.try_sorted() {
            Ok(order) => order,
            Err(err) => panic!("{err}"),
        }
    }

    /// Like [`sorted`](Self::sorted), returning the cycle as an error.
    ///
    /// # Errors
    /// [`ProviderError::CycleDetected`] if the relationships are circular.
    pub fn try_sorted(&mut self) -> Result<ProviderOrder, ProviderError> {
        if let Some(order) = &self.sorted {
            return Ok(Arc::clone(order));
        }

        let order: ProviderOrder = ProviderGraph::build(&self.providers).sort()?.into();
        info!(providers = order.len(), "Sorted providers");
        self.sorted = Some(Arc::clone(&order));
        Ok(order)
    }

    /// Lifecycle flags of `provider`, if it was added.
    pub fn state_of(&self, provider: &ProviderRef) -> Option<ProviderState> {
        self.states.get(&provider.provider_id()).copied()
    }

    /// One entry per provider, in dependency order.
    ///
    /// # Panics
    /// If the providers' relationships are circular.
    pub fn snapshot(&mut self) -> Vec<ProviderSnapshot> {
        self.sorted()
            .iter()
            .map(|provider| {
                let state = self.state(provider);
                ProviderSnapshot {
                    name: provider.name(),
                    registered: state.registered,
                    booted: state.booted,
                    relationship: provider.relationship(),
                }
            })
            .collect()
    }

    // ── Configured providers ──

    /// The provider list stored in configuration under
    /// [`PROVIDERS_KEY`](crate::config::PROVIDERS_KEY).
    ///
    /// Read once and cached. Without a config facade, or when the value is
    /// not a [`ProviderList`], logs a warning and returns an empty list.
    pub fn load_from_config(&mut self, app: &Application) -> ProviderList {
        if let Some(configured) = &self.configured {
            return configured.clone();
        }

        match configured_providers(app) {
            Ok(providers) => {
                debug!(count = providers.len(), "Loaded providers from configuration");
                self.configured = Some(providers.clone());
                providers
            }
            Err(err) => {
                warn!(error = %err, "Falling back to an empty provider list");
                Vec::new()
            }
        }
    }

    /// Replaces the cached configured list.
    pub fn set_configured(&mut self, providers: ProviderList) {
        self.configured = Some(providers);
    }

    /// Forgets the cached configured list; the next load reads config again.
    pub fn reset_configured_cache(&mut self) {
        self.configured = None;
    }

    /// Forgets everything: providers, their states, both caches.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // ── Internal ──

    fn state(&self, provider: &ProviderRef) -> ProviderState {
        self.state_of(provider).unwrap_or_default()
    }

    fn state_mut(&mut self, provider: &ProviderRef) -> &mut ProviderState {
        self.states.entry(provider.provider_id()).or_default()
    }
}

fn configured_providers(app: &Application) -> Result<ProviderList, ProviderError> {
    let config = app
        .make_as::<Arc<dyn ConfigRepository>>(keys::CONFIG)
        .map_err(|_| ProviderError::ConfigUnavailable { key: PROVIDERS_KEY })?;

    config
        .get(PROVIDERS_KEY)
        .and_then(|value| value.downcast_ref::<ProviderList>().cloned())
        .ok_or(ProviderError::MalformedProviderList { key: PROVIDERS_KEY })
}

impl std::fmt::Debug for ProviderRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("ProviderRepository")
            .field("providers", &names)
            .field("sorted", &self.sorted.is_some())
            .field("configured", &self.configured.as_ref().map(Vec::len))
            .finish()
    }
}
