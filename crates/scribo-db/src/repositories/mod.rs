//! Postgres implementations of the store traits.

pub mod file;
pub mod processing_log;
pub mod quota;

pub use file::FileRepository;
pub use processing_log::ProcessingLogRepository;
pub use quota::QuotaRepository;
