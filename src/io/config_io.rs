use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::EditorConfig;

/// Error type for config I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse weft.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("weft.toml is not valid toml: {0}")]
    EditError(#[from] toml_edit::TomlError),
    #[error("unknown config key `{0}` (expected section.field)")]
    BadKey(String),
}

/// Find `weft.toml` by walking up from the given directory.
pub fn discover_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join("weft.toml");
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Read the config, returning both the parsed config and the raw
/// toml_edit document for round-trip-safe editing.
pub fn read_config(path: &Path) -> Result<(EditorConfig, toml_edit::DocumentMut), ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: EditorConfig = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Load the config in effect for files under `start`, falling back to
/// defaults when there is no weft.toml or it does not parse.
pub fn load_or_default(start: &Path) -> EditorConfig {
    discover_config(start)
        .and_then(|path| read_config(&path).ok())
        .map(|(config, _)| config)
        .unwrap_or_default()
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(path: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    fs::write(path, doc.to_string()).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Set a `section.field` key, preserving the rest of the document.
/// Values are stored as integers or booleans when they parse as such.
pub fn set_config_value(
    doc: &mut toml_edit::DocumentMut,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    let Some((section, field)) = key.split_once('.') else {
        return Err(ConfigError::BadKey(key.to_string()));
    };
    if section.is_empty() || field.is_empty() {
        return Err(ConfigError::BadKey(key.to_string()));
    }
    if !doc.contains_key(section) {
        doc[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    let item = if let Ok(n) = value.parse::<i64>() {
        toml_edit::value(n)
    } else if let Ok(b) = value.parse::<bool>() {
        toml_edit::value(b)
    } else {
        toml_edit::value(value)
    };
    doc[section][field] = item;
    Ok(())
}
