//! PostgreSQL pool and migrations.

pub mod pool;

pub use pool::{create_pool, run_migrations, Database, DatabaseError, MIGRATIONS_DIR};
