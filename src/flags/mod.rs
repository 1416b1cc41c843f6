//! Flag injection from per-environment `.env` files.
//!
//! `<project_dir>/<env_name>/.env` is turned into `-D KEY="VALUE"` definitions
//! and appended to the build's flag list, in file order.

pub mod dotenv;

use crate::build::BuildContext;
use crate::error::EnvFileError;
use crate::models::BuildFlag;
use std::path::{Path, PathBuf};

/// Default name of the environment definition file.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Escape a value for use inside a double-quoted `-D` definition.
pub fn escape_value(value: &str) -> String {
    value.replace('"', "\\\"")
}

/// `<project_dir>/<env_name>/<file_name>`
pub fn env_file_path(project_dir: &Path, env_name: &str, file_name: &str) -> PathBuf {
    project_dir.join(env_name).join(file_name)
}

/// Appends `.env` definitions to a build context.
#[derive(Debug, Clone)]
pub struct FlagInjector {
    file_name: String,
}

impl Default for FlagInjector {
    fn default() -> Self {
        FlagInjector {
            file_name: DEFAULT_ENV_FILE.to_string(),
        }
    }
}

impl FlagInjector {
    pub fn new(file_name: impl Into<String>) -> Self {
        FlagInjector {
            file_name: file_name.into(),
        }
    }

    pub fn env_file(&self, ctx: &BuildContext) -> PathBuf {
        env_file_path(&ctx.project_dir, &ctx.env_name, &self.file_name)
    }

    /// Read the environment file and append one flag per entry to `ctx.flags`.
    ///
    /// A missing file adds nothing. A malformed line aborts before any flag is
    /// appended. Returns the flags that were added.
    pub fn inject(&self, ctx: &mut BuildContext) -> Result<Vec<String>, EnvFileError> {
        let path = self.env_file(ctx);

        let entries = match dotenv::read_env_file(&path)? {
            Some(entries) => entries,
            None => {
                log::debug!("[Flags] No env file at {}, nothing to add", path.display());
                Vec::new()
            }
        };

        let added: Vec<String> = entries
            .iter()
            .map(|entry| BuildFlag::from(entry).to_string())
            .collect();

        ctx.flags.append(added.iter().cloned());
        log::info!("[Flags] Added build flags: {:?}", added);

        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildFlags, StaticResolver};
    use proptest::prelude::*;
    use std::fs;

    fn context(dir: &Path) -> BuildContext {
        BuildContext::new(dir, "uno_r4_wifi", Box::new(StaticResolver::new()))
    }

    #[test]
    fn test_escape_value_quotes() {
        assert_eq!(escape_value(r#"bar"baz"#), r#"bar\"baz"#);
        assert_eq!(escape_value("plain"), "plain");
    }

    #[test]
    fn test_escape_value_leaves_backslashes() {
        assert_eq!(escape_value(r"a\b"), r"a\b");
    }

    #[test]
    fn test_env_file_path_layout() {
        let path = env_file_path(Path::new("/proj"), "uno", ".env");
        assert_eq!(path, PathBuf::from("/proj/uno/.env"));
    }

    #[test]
    fn test_inject_quote_escaping() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("uno_r4_wifi")).unwrap();
        fs::write(dir.path().join("uno_r4_wifi/.env"), "FOO=bar\"baz\n").unwrap();

        let mut ctx = context(dir.path());
        let added = FlagInjector::default().inject(&mut ctx).unwrap();

        assert_eq!(added, vec![r#"-D FOO="bar\"baz""#.to_string()]);
        assert_eq!(ctx.flags.as_slice(), added.as_slice());
    }

    #[test]
    fn test_inject_missing_file_leaves_flags_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context(dir.path());
        ctx.flags = BuildFlags::with_existing(vec!["-Wall".to_string()]);

        let added = FlagInjector::default().inject(&mut ctx).unwrap();

        assert!(added.is_empty());
        assert_eq!(ctx.flags.as_slice(), &["-Wall"]);
    }

    #[test]
    fn test_inject_malformed_line_adds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("uno_r4_wifi")).unwrap();
        fs::write(dir.path().join("uno_r4_wifi/.env"), "A=1\nnope\n").unwrap();

        let mut ctx = context(dir.path());
        let result = FlagInjector::default().inject(&mut ctx);

        assert!(matches!(result, Err(EnvFileError::MissingSeparator { line: 2, .. })));
        assert!(ctx.flags.is_empty());
    }

    #[test]
    fn test_inject_custom_file_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("uno_r4_wifi")).unwrap();
        fs::write(dir.path().join("uno_r4_wifi/secrets.env"), "KEY=v").unwrap();

        let mut ctx = context(dir.path());
        let added = FlagInjector::new("secrets.env").inject(&mut ctx).unwrap();
        assert_eq!(added, vec!["-D KEY=\"v\"".to_string()]);
    }

    proptest! {
        #[test]
        fn prop_flag_count_matches_entry_lines(
            entries in proptest::collection::vec(("[A-Z_][A-Z0-9_]{0,8}", "[ -~]{0,16}"), 0..12),
            blanks in 0usize..4,
        ) {
            let mut content = String::new();
            for (key, value) in &entries {
                content.push_str(&format!("{}={}\n", key, value));
                content.push_str("# comment\n");
            }
            content.push_str(&"\n".repeat(blanks));

            let parsed = dotenv::parse_env_str(&content).unwrap();
            prop_assert_eq!(parsed.len(), entries.len());
        }

        #[test]
        fn prop_rendered_flag_has_no_bare_quotes(value in "[ -~]{0,24}") {
            let flag = BuildFlag::new("K", value.clone()).to_string();
            let inner = &flag["-D K=\"".len()..flag.len() - 1];
            prop_assert_eq!(inner.replace("\\\"", ""), value.replace('"', ""));
        }
    }
}
