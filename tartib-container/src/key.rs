//! Binding identification keys.
//!
//! [`BindingKey`] names an entry in the [`Container`](crate::container::Container).
//! Keys are plain strings under the hood, so well-known facades can be
//! addressed by constants such as [`keys::CONFIG`].

use std::borrow::{Borrow, Cow};
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

/// Uniquely identifies a binding in the container.
///
/// # Examples
/// ```
/// use tartib_container::key::BindingKey;
///
/// let key = BindingKey::new("tartib.cache");
/// assert_eq!(key.as_str(), "tartib.cache");
/// ```
#[derive(Clone, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BindingKey(Cow<'static, str>);

impl BindingKey {
    /// Creates a key from a static name.
    #[inline]
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Returns the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Eq and Hash go through the str so `DashMap<BindingKey, _>` can be
// queried with a plain `&str`.
impl PartialEq for BindingKey {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for BindingKey {}

impl Hash for BindingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Borrow<str> for BindingKey {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for BindingKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&'static str> for BindingKey {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for BindingKey {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Debug for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BindingKey({:?})", self.as_str())
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Well-known binding keys.
pub mod keys {
    /// The configuration facade, stored as `Arc<dyn ConfigRepository>`.
    pub const CONFIG: &str = "tartib.config";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn static_and_owned_keys_are_equal() {
        assert_eq!(BindingKey::new("cache"), BindingKey::from(String::from("cache")));
    }

    #[test]
    fn different_names_differ() {
        assert_ne!(BindingKey::new("cache"), BindingKey::new("queue"));
    }

    #[test]
    fn lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(BindingKey::new("cache"), 1);
        map.insert(BindingKey::from(String::from("queue")), 2);
        assert_eq!(map.get("cache"), Some(&1));
        assert_eq!(map.get("queue"), Some(&2));
        assert_eq!(map.get("auth"), None);
    }

    #[test]
    fn display_and_debug() {
        let key = BindingKey::new("tartib.auth");
        assert_eq!(format!("{key}"), "tartib.auth");
        assert_eq!(format!("{key:?}"), "BindingKey(\"tartib.auth\")");
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&BindingKey::new("tartib.route")).unwrap();
        assert_eq!(json, "\"tartib.route\"");
    }
}
