//! Shared building blocks: errors, configuration, randomness.

pub mod config;
pub mod error;
pub mod rng;

pub use self::config::{DrawMode, EngineConfig, QueryConfig};
pub use self::error::{CollaboratorError, ErrorKind, QueryError};
pub use self::rng::{DrawRng, DrawRngState};
