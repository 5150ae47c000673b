//! Store implementations for database access.
//!
//! Handlers talk to a [`Store`] trait object so the same code runs against PostgreSQL in
//! production and against [`InMemoryStore`] in tests or database-less deployments.
//!
//! - [`PgStore`]: Runtime-checked SQLx queries against the schema in `migrations/`
//! - [`InMemoryStore`]: Lock-guarded vectors mirroring the schema's constraints

pub mod in_memory;
pub mod postgres;
pub mod store;

pub use in_memory::InMemoryStore;
pub use postgres::PgStore;
pub use store::Store;
