//! Unified error type hierarchy for pio-prebuild
//!
//! Provides structured error handling with EnvFileError, PatchError and ConfigError.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Environment definition file (`.env`) errors.
#[derive(Error, Debug)]
pub enum EnvFileError {
    #[error("line {line}: expected KEY=VALUE, got {content:?}")]
    MissingSeparator { line: usize, content: String },

    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Vendored source patching errors.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Package '{name}' is not installed (looked in {})", .dir.display())]
    PackageNotInstalled { name: String, dir: PathBuf },

    #[error("Package directory could not be resolved: {0}")]
    PackageUnresolved(String),

    #[error("Pattern {pattern:?} not found in {}", .path.display())]
    PatternNotFound { path: PathBuf, pattern: String },

    #[error("IO error patching {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Configuration file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid TOML in {}: {source}", .path.display())]
    InvalidToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Top-level result type for operations that may fail.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
