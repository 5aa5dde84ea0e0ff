//! Document Store Infrastructure
//!
//! This crate provides the adapters behind the `DocumentStore` port:
//!
//! - [`InMemoryDocumentStore`]: process-local store used by tests and by the
//!   API server when no database is configured
//! - [`PostgresDocumentStore`]: JSONB-backed store on PostgreSQL using SQLx
//!
//! Both adapters evaluate write preconditions atomically with the write, so
//! two users acting on the same document cannot both succeed when the first
//! one has already changed the state the second one relied on.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_store::{DatabaseConfig, create_pool, PostgresDocumentStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/insurance")).await?;
//! let store = PostgresDocumentStore::new(pool);
//! ```

pub mod error;
pub mod memory;
pub mod pool;
pub mod postgres;

pub use error::StoreError;
pub use memory::InMemoryDocumentStore;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use postgres::PostgresDocumentStore;
