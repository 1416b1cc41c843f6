//! Patch set definitions.
//!
//! Upstream source changes should only require editing the data here (or the
//! `[[patch]]` tables in `pio-prebuild.toml`), never the patching logic.

use crate::models::PatchRule;
use serde::{Deserialize, Serialize};

/// Marker stamped at the top of every patched file.
pub const DEFAULT_MARKER: &str = "PATCHED_BY_SCRIPT";

/// Framework package that ships the WiFiS3 library for the UNO R4 WiFi.
pub const RENESAS_FRAMEWORK_PACKAGE: &str = "framework-arduinorenesas-uno";

/// One package's worth of files and the rules applied to each of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSet {
    pub package: String,
    /// Directory inside the package holding the target files.
    pub subdir: String,
    pub files: Vec<String>,
    #[serde(default = "default_marker")]
    pub marker: String,
    /// Fail instead of warning when a rule matches nothing.
    #[serde(default)]
    pub strict: bool,
    /// Keep a `<file>.orig` copy next to each patched file.
    #[serde(default)]
    pub backup: bool,
    #[serde(default)]
    pub rules: Vec<PatchRule>,
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

impl PatchSet {
    /// Qualify `byte` with the global namespace in `WiFiSSLClient`.
    ///
    /// The Renesas core and the WiFiS3 library both see a `byte` type, which
    /// makes the unqualified declarations ambiguous.
    pub fn wifis3_byte_workaround() -> Self {
        PatchSet {
            package: RENESAS_FRAMEWORK_PACKAGE.to_string(),
            subdir: "libraries/WiFiS3/src".to_string(),
            files: vec![
                "WiFiSSLClient.h".to_string(),
                "WiFiSSLClient.cpp".to_string(),
            ],
            marker: default_marker(),
            strict: false,
            backup: false,
            rules: vec![
                PatchRule::new("const byte cert[]", "const ::byte cert[]"),
                PatchRule::new("const byte* buffer", "const ::byte* buffer"),
            ],
        }
    }

    /// Comment line prepended to patched files.
    pub fn marker_line(&self) -> String {
        format!("// {}\n", self.marker)
    }
}

impl Default for PatchSet {
    fn default() -> Self {
        Self::wifis3_byte_workaround()
    }
}
