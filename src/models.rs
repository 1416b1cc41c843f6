//! Core data types for pio-prebuild.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One `KEY=VALUE` line from an environment definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvEntry {
    pub key: String,
    /// Everything after the first `=`, verbatim.
    pub value: String,
    /// 1-based line number in the source file.
    pub line: usize,
}

/// A preprocessor definition passed to the compiler.
///
/// Renders as `-D KEY="VALUE"` with embedded double quotes escaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildFlag {
    pub key: String,
    pub value: String,
}

impl BuildFlag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        BuildFlag {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl From<&EnvEntry> for BuildFlag {
    fn from(entry: &EnvEntry) -> Self {
        BuildFlag::new(entry.key.clone(), entry.value.clone())
    }
}

impl fmt::Display for BuildFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "-D {}=\"{}\"",
            self.key,
            crate::flags::escape_value(&self.value)
        )
    }
}

/// A literal find/replace pair applied to a vendored source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRule {
    pub search: String,
    pub replace: String,
}

impl PatchRule {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        PatchRule {
            search: search.into(),
            replace: replace.into(),
        }
    }
}

/// Whether the patcher writes its changes back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatchMode {
    #[default]
    Apply,
    DryRun,
}

/// What happened to a single patch target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatchOutcome {
    /// Target file does not exist; skipped with a warning.
    Missing,
    /// Sentinel marker already present; content left untouched.
    AlreadyPatched,
    /// Content rewritten in place.
    Patched {
        replacements: usize,
        unmatched_rules: Vec<String>,
    },
    /// Dry run: the file would have been rewritten.
    WouldPatch {
        replacements: usize,
        unmatched_rules: Vec<String>,
    },
}

impl PatchOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, PatchOutcome::Patched { .. })
    }
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOutcome::Missing => write!(f, "missing"),
            PatchOutcome::AlreadyPatched => write!(f, "already patched"),
            PatchOutcome::Patched { replacements, .. } => {
                write!(f, "patched ({} replacements)", replacements)
            }
            PatchOutcome::WouldPatch { replacements, .. } => {
                write!(f, "would patch ({} replacements)", replacements)
            }
        }
    }
}
