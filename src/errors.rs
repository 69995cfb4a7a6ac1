// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::session::SessionError;

#[derive(Error, Debug)]
pub enum SessionDagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SessionDagError>;
