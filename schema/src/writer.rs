//! Reads and writes the JSON artifacts of a city.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Serializes `value` as pretty JSON to `path`, creating parent directories
/// as needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, the value cannot be
/// serialized, or the file cannot be written.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and parses a JSON file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Json`] if
/// it does not parse as `T`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Like [`read_json`], but a missing file is [`Error::MissingInput`] naming
/// `resource`.
///
/// # Errors
///
/// Returns [`Error::MissingInput`] if `path` does not exist, otherwise as
/// [`read_json`].
pub fn read_required<T: DeserializeOwned>(resource: &'static str, path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::MissingInput {
            resource,
            path: path.to_path_buf(),
        });
    }
    read_json(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn writes_into_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("doc.json");
        write_json(&path, &json!({"x": 1})).unwrap();
        let back: Value = read_json(&path).unwrap();
        assert_eq!(back, json!({"x": 1}));
    }

    #[test]
    fn missing_required_file_names_resource() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let err = read_required::<Value>("docs", &path).unwrap_err();
        assert!(matches!(err, Error::MissingInput { resource: "docs", .. }));
    }

    #[test]
    fn invalid_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let err = read_json::<Value>(&path).unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
        assert!(err.to_string().contains("bad.json"));
    }
}
