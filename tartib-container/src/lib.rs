//! Binding container and service provider runtime for Tartib.

pub mod application;
pub mod config;
pub mod container;
pub mod error;
mod graph;
pub mod key;
pub mod parameters;
pub mod provider;
pub mod registry;
pub mod repository;
pub mod scope;

pub use application::Application;
pub use container::Container;
pub use error::{ContainerError, ProviderError, Result};
pub use key::BindingKey;
pub use provider::{Relationship, ServiceProvider};
pub use repository::ProviderRepository;
pub use scope::Scope;

pub mod prelude {
    pub use crate::application::Application;
    pub use crate::config::{ConfigRepository, MemoryConfig, PROVIDERS_KEY};
    pub use crate::container::Container;
    pub use crate::error::{ContainerError, ProviderError, Result};
    pub use crate::key::{BindingKey, keys};
    pub use crate::parameters::Parameters;
    pub use crate::provider::{ProviderList, ProviderRef, Relationship, ServiceProvider};
    pub use crate::registry::{BoxError, Instance};
    pub use crate::repository::{ProviderOrder, ProviderRepository};
    pub use crate::scope::Scope;
}
