//! Boots a small application from configured providers.
//!
//! Run with `RUST_LOG=tartib_container=debug` to watch the ordering.

use std::sync::Arc;

use tartib::prelude::*;
use tracing_subscriber::EnvFilter;

// === Services ===

struct Logger {
    prefix: String,
}

impl Logger {
    fn log(&self, msg: &str) {
        println!("[{}] {msg}", self.prefix);
    }
}

struct Database {
    url: String,
    logger: Arc<Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

// === Providers ===

struct LogProvider;

impl ServiceProvider for LogProvider {
    fn register(&self, app: &Application) {
        app.singleton("log", |_| Ok(Logger { prefix: "LOG".into() }));
    }

    fn relationship(&self) -> Option<Relationship> {
        Some(Relationship::new().binds(["log"]))
    }
}

struct DatabaseProvider;

impl ServiceProvider for DatabaseProvider {
    fn register(&self, app: &Application) {
        app.singleton("db", |c| {
            let logger = c.make_as::<Logger>("log")?;
            Ok(Database {
                url: "postgres://localhost/app".into(),
                logger,
            })
        });
        app.bind_with("db.query", |c, params| {
            let db = c.make_as::<Database>("db")?;
            let sql = params.get::<String>("sql").cloned().unwrap_or_default();
            Ok(db.query(&sql))
        });
    }

    fn boot(&self, app: &Application) {
        if let Some(db) = app.make_typed::<Database>("db") {
            db.logger.log("Database ready");
        }
    }

    fn relationship(&self) -> Option<Relationship> {
        Some(Relationship::new().binds(["db", "db.query"]).depends_on(["log"]))
    }
}

/// Owns no bindings; only needs to run before the database.
struct MigrationProvider;

impl ServiceProvider for MigrationProvider {
    fn register(&self, _app: &Application) {
        println!("Migrations queued");
    }

    fn relationship(&self) -> Option<Relationship> {
        Some(Relationship::new().depends_on(["log"]).provides_for(["db"]))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tartib_container=info")),
        )
        .init();

    let config = MemoryConfig::new();
    config.set(
        PROVIDERS_KEY,
        vec![
            Arc::new(DatabaseProvider) as ProviderRef,
            Arc::new(MigrationProvider),
            Arc::new(LogProvider),
        ],
    );

    let app = Application::with_config(config);
    let mut providers = ProviderRepository::new();
    let order = app.bootstrap(&mut providers);

    println!("Boot order:");
    for provider in order.iter() {
        println!("  - {}", provider.name());
    }
    println!("{app:?}");

    let params = Parameters::new().with("sql", String::from("SELECT * FROM users"));
    let rows = app.make_with_as::<String>("db.query", &params)?;
    println!("{rows}");

    Ok(())
}
