//! `.env` file parser.
//!
//! Format:
//! - one `KEY=VALUE` per line, split on the first `=`
//! - blank or whitespace-only lines are skipped
//! - lines whose first character is `#` are comments
//!
//! Keys and values are kept verbatim. No quoting, interpolation or
//! deduplication is performed.

use crate::error::EnvFileError;
use crate::models::EnvEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::Path;

static C_IDENTIFIER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid identifier regex"));

/// Parse the content of an environment definition file.
///
/// # Examples
///
/// ```
/// use pio_prebuild::flags::dotenv::parse_env_str;
///
/// let entries = parse_env_str("# wifi\nSSID=home\n\nPASS=a=b\n").unwrap();
/// assert_eq!(entries.len(), 2);
/// assert_eq!(entries[1].value, "a=b");
/// ```
pub fn parse_env_str(content: &str) -> Result<Vec<EnvEntry>, EnvFileError> {
    let mut entries = Vec::new();

    for (idx, raw) in content.split('\n').enumerate() {
        // CRLF files read the same as LF files
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| EnvFileError::MissingSeparator {
                line: idx + 1,
                content: line.to_string(),
            })?;

        if !C_IDENTIFIER_REGEX.is_match(key) {
            log::warn!(
                "[Flags] Line {}: key {:?} is not a valid macro name, passing it through anyway",
                idx + 1,
                key
            );
        }

        entries.push(EnvEntry {
            key: key.to_string(),
            value: value.to_string(),
            line: idx + 1,
        });
    }

    Ok(entries)
}

/// Read and parse an environment definition file.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn read_env_file(path: &Path) -> Result<Option<Vec<EnvEntry>>, EnvFileError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(EnvFileError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    parse_env_str(&content).map(Some)
}
