//! Scribo Storage Library
//!
//! This crate provides the blob storage abstraction and implementations for
//! Scribo. It includes the Storage trait and implementations for S3 and the
//! local filesystem.
//!
//! # Storage key format
//!
//! Storage keys are owner-scoped and opaque: `audio/{user_id}/{uuid}_{filename}`.
//! The random component makes keys collision-free even when a user uploads the
//! same filename twice. Keys must not contain `..` or a leading `/`. Key
//! generation is centralized in the `keys` module so all backends stay
//! consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::generate_storage_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use scribo_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
