//! Error types for container resolution and provider ordering.
//!
//! Messages name the binding or the providers involved and end with a hint.

use std::fmt;

use tartib_support::rendering::render_chain;

use crate::key::BindingKey;
use crate::registry::BoxError;

/// Errors returned by [`Container`](crate::container::Container) lookups.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Requested key was never bound.
    #[error("{}", .0)]
    BindingNotFound(BindingNotFoundError),

    /// The binding's factory failed. The factory's error is passed through
    /// as-is, so `Display` and `source()` are the factory's own.
    #[error(transparent)]
    Factory(BoxError),

    /// The binding resolved, but not to the requested type.
    #[error("Binding {key} does not hold a {expected}\n  Hint: check the type used when the binding was registered")]
    TypeMismatch {
        key: BindingKey,
        expected: &'static str,
    },
}

/// Error when a key is not bound.
#[derive(Debug)]
pub struct BindingNotFoundError {
    /// The key that was requested
    pub key: BindingKey,
    /// Bound keys that look similar (for "did you mean?" hints)
    pub suggestions: Vec<String>,
}

impl fmt::Display for BindingNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binding not found: {}", self.key)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: is the provider that binds {} registered?",
            self.key
        )
    }
}

/// Errors raised while ordering or loading service providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Declared relationships form a cycle.
    #[error("{}", .0)]
    CycleDetected(CycleError),

    /// No configuration facade is bound.
    #[error("Configuration is unavailable; cannot read providers from {key}")]
    ConfigUnavailable { key: &'static str },

    /// The configured value is missing or not a provider list.
    #[error("Configuration value {key} is not a provider list")]
    MalformedProviderList { key: &'static str },
}

/// Error when provider relationships are circular.
///
/// `chain` holds provider names in cycle order, first name repeated at the
/// end: `["A", "B", "C", "A"]`. A provider depending on itself is `["A"]`.
#[derive(Debug)]
pub struct CycleError {
    pub chain: Vec<String>,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Circular service provider dependency detected:\n  {}",
            render_chain(&self.chain)
        )?;
        write!(
            f,
            "\n  Hint: remove one of the dependencies or provide_for entries in this chain"
        )
    }
}

/// Convenient Result type for container operations.
pub type Result<T, E = ContainerError> = std::result::Result<T, E>;
