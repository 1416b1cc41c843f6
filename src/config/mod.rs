//! Configuration for the pre-build steps.
//!
//! Read from an optional `pio-prebuild.toml` at the project root. Every field
//! has a default, so a project without the file behaves like one with:
//!
//! ```toml
//! [flags]
//! env_file = ".env"
//!
//! [[patch]]
//! package = "framework-arduinorenesas-uno"
//! subdir = "libraries/WiFiS3/src"
//! files = ["WiFiSSLClient.h", "WiFiSSLClient.cpp"]
//! marker = "PATCHED_BY_SCRIPT"
//!
//! [[patch.rules]]
//! search = "const byte cert[]"
//! replace = "const ::byte cert[]"
//!
//! [[patch.rules]]
//! search = "const byte* buffer"
//! replace = "const ::byte* buffer"
//! ```

pub mod loader;

use crate::error::ConfigError;
use crate::flags::DEFAULT_ENV_FILE;
use crate::patcher::PatchSet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "pio-prebuild.toml";

/// Flag injection settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagsConfig {
    /// File name inside `<project>/<env>/`.
    pub env_file: String,
}

impl Default for FlagsConfig {
    fn default() -> Self {
        FlagsConfig {
            env_file: DEFAULT_ENV_FILE.to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrebuildConfig {
    #[serde(default)]
    pub flags: FlagsConfig,
    #[serde(default = "default_patch_sets")]
    pub patch: Vec<PatchSet>,
}

fn default_patch_sets() -> Vec<PatchSet> {
    vec![PatchSet::default()]
}

impl Default for PrebuildConfig {
    fn default() -> Self {
        PrebuildConfig {
            flags: FlagsConfig::default(),
            patch: default_patch_sets(),
        }
    }
}

impl PrebuildConfig {
    /// Reject settings that would make a step misbehave silently.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flags.env_file.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "flags.env_file cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for set in &self.patch {
            if set.package.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "patch.package cannot be empty".to_string(),
                ));
            }
            if set.files.is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "patch set for '{}' lists no files",
                    set.package
                )));
            }
            // an empty marker is contained in every file, so nothing would ever be patched
            if set.marker.is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "patch set for '{}' has an empty marker",
                    set.package
                )));
            }
            if let Some(rule) = set.rules.iter().find(|r| r.search.is_empty()) {
                return Err(ConfigError::ValidationFailed(format!(
                    "patch set for '{}' has a rule with an empty search (replace = {:?})",
                    set.package, rule.replace
                )));
            }
            for file in &set.files {
                let target = (&set.package, Path::new(&set.subdir).join(file), &set.marker);
                if !seen.insert(target) {
                    return Err(ConfigError::ValidationFailed(format!(
                        "{}/{}/{} is targeted twice with marker '{}'",
                        set.package, set.subdir, file, set.marker
                    )));
                }
            }
        }

        Ok(())
    }
}
