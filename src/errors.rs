// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::watch::protocol::ProtocolError;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Unknown bundler: {0}")]
    UnknownTool(String),

    #[error(
        "Expected environment variable {var} to contain integer positive value. Got: {value}"
    )]
    InvalidSetting { var: &'static str, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("watch subscription error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BenchError>;
