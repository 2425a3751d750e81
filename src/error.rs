//! Error types for the dskit helpers.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the file helpers and the scaffolder.
///
/// Errors from the filesystem and the parsers are carried verbatim as
/// `source`, tagged with the path that was being accessed.
#[derive(Debug, Error)]
pub enum Error {
    /// A value did not have the shape the operation requires.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A YAML document parsed to null.
    #[error("yaml file is empty: {path}")]
    EmptyContent { path: Utf8PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed YAML in {path}: {source}")]
    Yaml {
        path: Utf8PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A parsed YAML value has no counterpart in the JSON data model.
    #[error("unsupported value at `{key}` in {path}: {reason}")]
    UnsupportedValue {
        path: Utf8PathBuf,
        key: String,
        reason: String,
    },

    #[error("cannot encode binary object for {path}: {source}")]
    BinEncode {
        path: Utf8PathBuf,
        #[source]
        source: rmp_serde::encode::Error,
    },

    #[error("malformed binary object in {path}: {source}")]
    Bin {
        path: Utf8PathBuf,
        #[source]
        source: rmp_serde::decode::Error,
    },

    /// The binary file was written by a different format or format version.
    #[error("incompatible binary file {path}: {reason}")]
    IncompatibleFormat { path: Utf8PathBuf, reason: String },

    #[error("invalid scaffold manifest: {0}")]
    InvalidManifest(String),

    #[error("template error: {0}")]
    Template(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// The underlying `io::ErrorKind`, if this is a filesystem error.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

/// Shape name used in `TypeMismatch` messages.
pub(crate) fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "sequence",
        serde_json::Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn io_kind_reports_not_found() {
        let err = Error::io("missing.yaml", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[test]
    fn value_kind_names_shapes() {
        assert_eq!(value_kind(&json!([1, 2])), "sequence");
        assert_eq!(value_kind(&json!({"a": 1})), "mapping");
        assert_eq!(value_kind(&json!(3)), "number");
        assert_eq!(value_kind(&json!(null)), "null");
    }
}
