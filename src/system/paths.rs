//! PlatformIO path resolution: project root anchoring and package lookup.
//!
//! The project root is anchored by `platformio.ini`, searched upward from the
//! starting directory. Packages live under the PlatformIO core directory unless
//! `PLATFORMIO_PACKAGES_DIR` points elsewhere.

use crate::build::PackageResolver;
use crate::error::PatchError;
use std::path::{Path, PathBuf};

/// File that marks a PlatformIO project root.
pub const PROJECT_ANCHOR: &str = "platformio.ini";

/// Find the project root by searching for `platformio.ini`.
///
/// Walks upward from `start`; falls back to `start` itself when no anchor is
/// found before the filesystem root.
pub fn find_project_root(start: &Path) -> PathBuf {
    let mut current = start.to_path_buf();

    loop {
        if current.join(PROJECT_ANCHOR).exists() {
            log::debug!("[Paths] Found {} in {}", PROJECT_ANCHOR, current.display());
            return current;
        }

        let parent = current.parent().map(Path::to_path_buf);
        match parent {
            Some(parent) if parent != current => current = parent,
            _ => {
                log::debug!(
                    "[Paths] No {} above {}, using it as project root",
                    PROJECT_ANCHOR,
                    start.display()
                );
                return start.to_path_buf();
            }
        }
    }
}

/// Resolved PlatformIO core and package directories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformioPaths {
    core_dir: PathBuf,
    packages_dir: PathBuf,
}

impl PlatformioPaths {
    /// Resolve from the process environment and the user's home directory.
    pub fn discover() -> Result<Self, PatchError> {
        Self::from_sources(
            std::env::var_os("PLATFORMIO_CORE_DIR").map(PathBuf::from),
            std::env::var_os("PLATFORMIO_PACKAGES_DIR").map(PathBuf::from),
            dirs::home_dir(),
        )
    }

    /// Resolve from explicit sources, in order of precedence.
    pub fn from_sources(
        core_dir: Option<PathBuf>,
        packages_dir: Option<PathBuf>,
        home_dir: Option<PathBuf>,
    ) -> Result<Self, PatchError> {
        let core_dir = match core_dir {
            Some(dir) => dir,
            None => home_dir
                .map(|home| home.join(".platformio"))
                .ok_or_else(|| {
                    PatchError::PackageUnresolved(
                        "cannot determine home directory; set PLATFORMIO_CORE_DIR".to_string(),
                    )
                })?,
        };
        let packages_dir = packages_dir.unwrap_or_else(|| core_dir.join("packages"));

        Ok(PlatformioPaths {
            core_dir,
            packages_dir,
        })
    }

    /// Packages directory fixed by the caller (e.g. `--packages-dir`).
    pub fn with_packages_dir(packages_dir: PathBuf) -> Self {
        PlatformioPaths {
            core_dir: packages_dir
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| packages_dir.clone()),
            packages_dir,
        }
    }

    pub fn core_dir(&self) -> &Path {
        &self.core_dir
    }

    pub fn packages_dir(&self) -> &Path {
        &self.packages_dir
    }
}

/// Resolves `<packages_dir>/<name>` and requires the package to be installed.
#[derive(Clone, Debug)]
pub struct PlatformioResolver {
    paths: PlatformioPaths,
}

impl PlatformioResolver {
    pub fn new(paths: PlatformioPaths) -> Self {
        PlatformioResolver { paths }
    }
}

impl PackageResolver for PlatformioResolver {
    fn package_dir(&self, name: &str) -> Result<PathBuf, PatchError> {
        let dir = self.paths.packages_dir().join(name);
        if !dir.is_dir() {
            return Err(PatchError::PackageNotInstalled {
                name: name.to_string(),
                dir,
            });
        }
        log::debug!("[Paths] Package {} -> {}", name, dir.display());
        Ok(dir)
    }
}
