//! # vault-core
//!
//! Core types, traits, and abstractions for docvault.
//!
//! This crate provides the domain model, error type, shared defaults and the
//! store/collaborator traits that the other docvault crates depend on.

pub mod defaults;
pub mod error;
pub mod events;
pub mod file_safety;
pub mod logging;
pub mod models;
pub mod search;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{EventBus, EventEnvelope, ServerEvent};
pub use file_safety::{
    detect_executable_signature, sanitize_filename, suspicious_filename_patterns,
    FilenamePattern,
};
pub use models::*;
pub use search::*;
pub use traits::*;
