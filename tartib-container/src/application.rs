//! The application handle passed to every provider.
//!
//! An [`Application`] owns a [`Container`] and derefs to it, so providers
//! call `app.singleton(..)` / `app.make(..)` directly. There is no global
//! instance: construct as many applications as you need, e.g. one per test.

use std::ops::Deref;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::ConfigRepository;
use crate::container::Container;
use crate::key::keys;
use crate::repository::{ProviderOrder, ProviderRepository};

#[derive(Debug, Default)]
pub struct Application {
    container: Container,
}

impl Application {
    /// Creates an application with an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an application with `config` bound under [`keys::CONFIG`].
    pub fn with_config(config: impl ConfigRepository + 'static) -> Self {
        let app = Self::new();
        app.instance(keys::CONFIG, Arc::new(config) as Arc<dyn ConfigRepository>);
        app
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Runs the startup sequence against `repository`.
    ///
    /// Loads the configured providers, adds them, registers every provider,
    /// then boots every provider. Providers added to the repository
    /// beforehand take part too. Returns the order used.
    ///
    /// # Panics
    /// If the providers' relationships are circular.
    #[instrument(skip_all, name = "application_bootstrap")]
    pub fn bootstrap(&self, repository: &mut ProviderRepository) -> ProviderOrder {
        let configured = repository.load_from_config(self);
        repository.add(configured);

        let order = repository.register(self);
        repository.boot(self);

        info!(providers = order.len(), bindings = self.len(), "Application booted");
        order
    }
}

impl Deref for Application {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.container
    }
}
