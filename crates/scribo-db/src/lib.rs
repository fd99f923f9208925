//! Database repositories for the data access layer
//!
//! This crate defines the store traits the lifecycle controller depends on and
//! their Postgres implementations. Each repository owns one table and provides
//! CRUD operations plus the conditional status updates that keep concurrent
//! pipeline runs race-free.

pub mod pool;
pub mod repositories;
pub mod stores;

pub use pool::setup_database;
pub use repositories::{FileRepository, ProcessingLogRepository, QuotaRepository};
pub use stores::{FileStore, NewFile, ProcessingLogStore, QuotaStore};
