//! Binding lifetimes.
//!
//! - [`Scope::Singleton`]: resolved once, then served from the instance cache
//! - [`Scope::Transient`]: the factory runs on every resolve
use std::fmt;

/// Defines whether a binding's resolved value is shared.
///
/// # Examples
/// ```
/// use tartib_container::scope::Scope;
///
/// assert!(Scope::Singleton.is_shared());
/// assert!(!Scope::Transient.is_shared());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One instance shared for the lifetime of the container.
    ///
    /// Registered through `singleton()` or `instance()`. The factory runs on
    /// first `make()` and the result is cached.
    ///
    /// # When to use
    /// - Database connection pools
    /// - Configuration facades
    /// - Shared caches
    Singleton,

    /// New instance on every `make()` call.
    ///
    /// Registered through `bind()` or `bind_with()`. Never cached.
    Transient,
}

impl Scope {
    /// Returns `true` if resolved values are cached.
    #[inline]
    pub fn is_shared(&self) -> bool {
        matches!(self, Scope::Singleton)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Singleton => write!(f, "Singleton"),
            Scope::Transient => write!(f, "Transient"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_equality() {
        assert_eq!(Scope::Singleton, Scope::Singleton);
        assert_ne!(Scope::Singleton, Scope::Transient);
    }

    #[test]
    fn scope_is_shared() {
        assert!(Scope::Singleton.is_shared());
        assert!(!Scope::Transient.is_shared());
    }

    #[test]
    fn scope_display() {
        assert_eq!(format!("{}", Scope::Singleton), "Singleton");
        assert_eq!(format!("{}", Scope::Transient), "Transient");
    }
}
