//! Integration tests for `pio-prebuild.toml` loading.

use pio_prebuild::config::{loader, PrebuildConfig, CONFIG_FILE_NAME};
use pio_prebuild::error::ConfigError;
use pio_prebuild::PatchRule;
use std::fs;

#[test]
fn test_project_without_config_uses_wifis3_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let project = tempfile::tempdir()?;
    let config = loader::load_or_default(&loader::default_config_path(project.path()))?;

    assert_eq!(config.flags.env_file, ".env");
    assert_eq!(config.patch.len(), 1);
    assert_eq!(config.patch[0].package, "framework-arduinorenesas-uno");
    assert_eq!(
        config.patch[0].rules,
        vec![
            PatchRule::new("const byte cert[]", "const ::byte cert[]"),
            PatchRule::new("const byte* buffer", "const ::byte* buffer"),
        ]
    );
    Ok(())
}

#[test]
fn test_full_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let project = tempfile::tempdir()?;
    let path = project.path().join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        r#"
[flags]
env_file = "wifi.env"

[[patch]]
package = "framework-arduinorenesas-uno"
subdir = "libraries/WiFiS3/src"
files = ["WiFiSSLClient.h"]
strict = true
backup = true

[[patch.rules]]
search = "const byte cert[]"
replace = "const ::byte cert[]"

[[patch]]
package = "framework-arduinorenesas-uno"
subdir = "libraries/WiFiS3/src"
files = ["WiFiClient.h"]
marker = "SECOND_FIX"
"#,
    )?;

    let config = loader::load_or_default(&path)?;

    assert_eq!(config.flags.env_file, "wifi.env");
    assert_eq!(config.patch.len(), 2);
    assert!(config.patch[0].strict);
    assert!(config.patch[0].backup);
    assert_eq!(config.patch[0].marker, "PATCHED_BY_SCRIPT");
    assert_eq!(config.patch[1].marker, "SECOND_FIX");
    assert!(config.patch[1].rules.is_empty());
    Ok(())
}

#[test]
fn test_default_config_renders_and_reloads() -> Result<(), Box<dyn std::error::Error>> {
    let project = tempfile::tempdir()?;
    let path = project.path().join(CONFIG_FILE_NAME);

    let rendered = loader::to_toml_string(&PrebuildConfig::default())?;
    fs::write(&path, rendered)?;

    assert_eq!(loader::load_config_from_file(&path)?, PrebuildConfig::default());
    Ok(())
}

#[test]
fn test_empty_env_file_name_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let project = tempfile::tempdir()?;
    let path = project.path().join(CONFIG_FILE_NAME);
    fs::write(&path, "[flags]\nenv_file = \"\"\n")?;

    assert!(matches!(
        loader::load_or_default(&path),
        Err(ConfigError::ValidationFailed(_))
    ));
    Ok(())
}

#[test]
fn test_two_sets_on_same_file_and_marker_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let project = tempfile::tempdir()?;
    let path = project.path().join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        r#"
[[patch]]
package = "framework-arduinorenesas-uno"
subdir = "libraries/WiFiS3/src"
files = ["WiFiSSLClient.h"]

[[patch.rules]]
search = "const byte cert[]"
replace = "const ::byte cert[]"

[[patch]]
package = "framework-arduinorenesas-uno"
subdir = "libraries/WiFiS3/src"
files = ["WiFiSSLClient.h"]

[[patch.rules]]
search = "const byte* buffer"
replace = "const ::byte* buffer"
"#,
    )?;

    assert!(matches!(
        loader::load_or_default(&path),
        Err(ConfigError::ValidationFailed(ref msg)) if msg.contains("targeted twice")
    ));
    Ok(())
}
