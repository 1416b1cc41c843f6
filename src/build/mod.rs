//! Build context shared with the pre-build steps.
//!
//! The context belongs to the caller (the CLI, or a test). Steps read the
//! project directory and environment name from it, resolve packages through
//! it, and append to its flag list. They never replace the flag list.

use crate::error::PatchError;
use std::collections::HashMap;
use std::path::PathBuf;

/// Ordered, append-only collection of compiler flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFlags {
    flags: Vec<String>,
}

impl BuildFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from flags already configured elsewhere (e.g. `build_flags` in platformio.ini).
    pub fn with_existing<I: IntoIterator<Item = String>>(existing: I) -> Self {
        BuildFlags {
            flags: existing.into_iter().collect(),
        }
    }

    pub fn append<I: IntoIterator<Item = String>>(&mut self, flags: I) {
        self.flags.extend(flags);
    }

    pub fn as_slice(&self) -> &[String] {
        &self.flags
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.flags.iter()
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

/// Locates installed PlatformIO packages by name.
pub trait PackageResolver {
    fn package_dir(&self, name: &str) -> Result<PathBuf, PatchError>;
}

/// Resolver backed by a fixed name -> directory map.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    dirs: HashMap<String, PathBuf>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.dirs.insert(name.into(), dir.into());
        self
    }
}

impl PackageResolver for StaticResolver {
    fn package_dir(&self, name: &str) -> Result<PathBuf, PatchError> {
        self.dirs
            .get(name)
            .cloned()
            .ok_or_else(|| PatchError::PackageUnresolved(format!("no directory registered for '{}'", name)))
    }
}

/// Everything a pre-build step may consume from the surrounding build.
pub struct BuildContext {
    pub project_dir: PathBuf,
    /// Active PlatformIO environment (`PIOENV`).
    pub env_name: String,
    pub flags: BuildFlags,
    resolver: Box<dyn PackageResolver>,
}

impl BuildContext {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        env_name: impl Into<String>,
        resolver: Box<dyn PackageResolver>,
    ) -> Self {
        BuildContext {
            project_dir: project_dir.into(),
            env_name: env_name.into(),
            flags: BuildFlags::new(),
            resolver,
        }
    }

    pub fn package_dir(&self, name: &str) -> Result<PathBuf, PatchError> {
        self.resolver.package_dir(name)
    }
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("project_dir", &self.project_dir)
            .field("env_name", &self.env_name)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_existing_flags() {
        let mut flags = BuildFlags::with_existing(vec!["-Os".to_string()]);
        flags.append(vec!["-D A=\"1\"".to_string(), "-D B=\"2\"".to_string()]);
        assert_eq!(flags.as_slice(), &["-Os", "-D A=\"1\"", "-D B=\"2\""]);
    }

    #[test]
    fn test_append_empty_is_noop() {
        let mut flags = BuildFlags::with_existing(vec!["-Os".to_string()]);
        flags.append(Vec::new());
        assert_eq!(flags.len(), 1);
    }

    #[test]
    fn test_static_resolver_unknown_package() {
        let resolver = StaticResolver::new().with_package("a", "/tmp/a");
        assert_eq!(resolver.package_dir("a").unwrap(), PathBuf::from("/tmp/a"));
        assert!(matches!(
            resolver.package_dir("b"),
            Err(PatchError::PackageUnresolved(_))
        ));
    }
}
