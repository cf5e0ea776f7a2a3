//! src/error.rs
//!
//! Defines the library's custom, comprehensive `Error` enum using `thiserror`.

use crate::domain::Status;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Library call `{call}` returned {status}")]
    Library { call: &'static str, status: Status },

    #[error("Failed to construct argument `{argument}`: {status}")]
    Setup { argument: &'static str, status: Status },

    #[error("Target `{target}` has no argument named `{argument}`")]
    UnknownArgument { argument: String, target: String },

    #[error("Unknown target API `{0}`")]
    UnknownTarget(String),

    #[error("Harness is already configured")]
    AlreadyConfigured,
}
