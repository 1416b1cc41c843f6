//! Config file loader and serialization.

use super::{PrebuildConfig, CONFIG_FILE_NAME};
use crate::error::ConfigError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// `<project_dir>/pio-prebuild.toml`
pub fn default_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(CONFIG_FILE_NAME)
}

/// Load config from a TOML file, falling back to defaults when it does not exist.
pub fn load_or_default(path: &Path) -> Result<PrebuildConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => parse_config(path, &content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("[Config] No config at {}, using defaults", path.display());
            Ok(PrebuildConfig::default())
        }
        Err(e) => Err(ConfigError::IoError(e)),
    }
}

/// Load config from a TOML file that must exist.
pub fn load_config_from_file(path: &Path) -> Result<PrebuildConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(path, &content)
}

fn parse_config(path: &Path, content: &str) -> Result<PrebuildConfig, ConfigError> {
    let config: PrebuildConfig =
        toml::from_str(content).map_err(|source| ConfigError::InvalidToml {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    log::debug!(
        "[Config] Loaded {} ({} patch set(s))",
        path.display(),
        config.patch.len()
    );
    Ok(config)
}

/// Render config as TOML.
pub fn to_toml_string(config: &PrebuildConfig) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::ValidationFailed(e.to_string()))
}

/// Save config to a TOML file.
pub fn save_config_to_file(config: &PrebuildConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, to_toml_string(config)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_or_default(&default_config_path(temp.path())).unwrap();
        assert_eq!(config, PrebuildConfig::default());
    }

    #[test]
    fn test_missing_file_is_error_when_required() {
        let temp = TempDir::new().unwrap();
        let result = load_config_from_file(&temp.path().join("nope.toml"));
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(CONFIG_FILE_NAME);

        let mut config = PrebuildConfig::default();
        config.flags.env_file = "secrets.env".to_string();
        config.patch[0].backup = true;

        save_config_to_file(&config, &path).unwrap();
        let loaded = load_config_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_toml() {
        let temp = TempDir::new().unwrap();
        let path = default_config_path(temp.path());
        fs::write(&path, "[flags\nenv_file = ").unwrap();

        let result = load_or_default(&path);
        assert!(matches!(result, Err(ConfigError::InvalidToml { .. })));
    }

    #[test]
    fn test_loaded_config_is_validated() {
        let temp = TempDir::new().unwrap();
        let path = default_config_path(temp.path());
        fs::write(
            &path,
            r#"
            [[patch]]
            package = "framework-x"
            subdir = "src"
            files = []
            "#,
        )
        .unwrap();

        assert!(matches!(
            load_or_default(&path),
            Err(ConfigError::ValidationFailed(_))
        ));
    }
}
