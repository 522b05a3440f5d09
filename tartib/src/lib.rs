//! # Tartib: service provider ordering and bootstrap for Rust
//!
//! Modules ("service providers") declare which bindings they own and which
//! they need. Tartib sorts them, registers every provider, then boots every
//! provider, each exactly once, and serves their bindings from a
//! thread-safe container.
//!
//! ```rust
//! use std::sync::Arc;
//! use tartib::prelude::*;
//!
//! struct ConfigProvider;
//! impl ServiceProvider for ConfigProvider {
//!     fn register(&self, app: &Application) {
//!         app.instance("db.url", String::from("postgres://localhost"));
//!     }
//!     fn relationship(&self) -> Option<Relationship> {
//!         Some(Relationship::new().binds(["db.url"]))
//!     }
//! }
//!
//! struct DatabaseProvider;
//! impl ServiceProvider for DatabaseProvider {
//!     fn register(&self, app: &Application) {
//!         app.singleton("db", |c| Ok(format!("pool({})", c.make_as::<String>("db.url")?)));
//!     }
//!     fn relationship(&self) -> Option<Relationship> {
//!         Some(Relationship::new().binds(["db"]).depends_on(["db.url"]))
//!     }
//! }
//!
//! let app = Application::new();
//! let mut providers = ProviderRepository::new();
//! providers.add(vec![
//!     Arc::new(DatabaseProvider) as ProviderRef,
//!     Arc::new(ConfigProvider),
//! ]);
//! app.bootstrap(&mut providers);
//!
//! let db = app.make_as::<String>("db").expect("db is bound");
//! assert_eq!(db.as_str(), "pool(postgres://localhost)");
//! ```

pub use tartib_container::*;
pub use tartib_support::*;
