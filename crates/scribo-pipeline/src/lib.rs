//! File lifecycle controller and processing pipeline.
//!
//! This crate owns the status state machine for uploaded audio files:
//!
//! ```text
//! UPLOADED -> PROCESSING -> TRANSCRIBED -> SUMMARIZED [-> TRANSLATED]
//!                 \________________________________________/
//!                                  v
//!                                ERROR  (manual retry re-enters PROCESSING)
//! ```
//!
//! Transitions happen through conditional store updates, so concurrent
//! triggers race safely: exactly one caller claims the file, the rest get a
//! conflict. Pipeline runs execute on a spawned task and are observable
//! through an in-process job registry.

pub mod controller;
pub mod jobs;
pub mod test_helpers;

pub use controller::FileLifecycle;
pub use jobs::JobRegistry;
