/// Database module for the symbol catalog and subscriptions
///
/// This module provides:
/// - Connection pooling and embedded migrations for PostgreSQL
/// - Repository contracts and their diesel implementations
/// - An in-memory catalog for dry runs
/// - Database models and schema

pub mod connection;
pub mod enums;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod schema;

pub use connection::{establish_connection_pool, DatabaseError, DatabasePool};
pub use memory::MemorySymbolRepository;
