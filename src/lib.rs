//! pio-prebuild
//!
//! Pre-build helpers for PlatformIO firmware projects:
//! - **flags**: turns `<project>/<env>/.env` into `-D KEY="VALUE"` build flags
//! - **patcher**: guarded, idempotent find/replace on vendored framework sources
//!
//! Supporting modules:
//! - **build**: the externally-owned build context both steps consume
//! - **config**: optional `pio-prebuild.toml`
//! - **system**: PlatformIO project and package path resolution
//! - **log_collector**: `log` backend writing to stderr and an optional file
//! - **error**: unified error types

pub mod error;
pub mod models;

pub mod build;
pub mod config;
pub mod flags;
pub mod patcher;
pub mod system;

pub mod log_collector;

// Re-export the log crate for macro usage
pub use log;

pub use build::{BuildContext, BuildFlags, PackageResolver, StaticResolver};
pub use config::PrebuildConfig;
pub use error::{ConfigError, EnvFileError, PatchError, Result};
pub use flags::FlagInjector;
pub use log_collector::{LogCollector, LogLine};
pub use models::{BuildFlag, EnvEntry, PatchMode, PatchOutcome, PatchRule};
pub use patcher::{PatchSet, SourcePatcher};
pub use system::{PlatformioPaths, PlatformioResolver};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
