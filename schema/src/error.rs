//! Error type shared by the builder, the comparator and the city operations.

use std::path::PathBuf;

/// Errors raised by this crate.
///
/// Only caller errors and missing inputs are raised. Irregular field metadata
/// and unresolvable reference documents are absorbed with defaults.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A field record had an empty path.
    #[error("field record #{index} has an empty path")]
    EmptyPath {
        /// Zero-based position of the record in the input sequence.
        index: usize,
    },

    /// A field record path contained an empty segment (`a..b`, `.a`, `a.`).
    #[error("field path `{path}` contains an empty segment")]
    EmptySegment {
        /// The offending path.
        path: String,
    },

    /// A required city document is not on disk.
    #[error("{resource} not found: {}", path.display())]
    MissingInput {
        /// Which document is missing (`schema`, `docs`, `field records`).
        resource: &'static str,
        /// Where it was expected.
        path: PathBuf,
    },

    /// The city schema root has no `properties` mapping.
    #[error("invalid schema: root has no properties")]
    MalformedSchema,

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A file did not contain valid JSON, or a value could not be serialized.
    #[error("JSON error on {}: {source}", path.display())]
    Json {
        /// The file being parsed or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The settings file is not valid TOML or has wrongly typed keys.
    #[error("invalid settings in {}: {source}", path.display())]
    Config {
        /// The settings file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_names_resource_and_path() {
        let err = Error::MissingInput {
            resource: "schema",
            path: PathBuf::from("work/guides/recife/recife-schema.json"),
        };
        assert_eq!(
            err.to_string(),
            "schema not found: work/guides/recife/recife-schema.json"
        );
    }
}
