//! File helpers shared by pipeline stages: YAML/JSON config, directories,
//! and binary object snapshots.
//!
//! Every helper is a single synchronous operation. File handles live for the
//! duration of the call only.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};

use camino::Utf8Path;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::config_data::ConfigData;
use crate::error::{Error, Result, value_kind};
use crate::yaml::{self, ParseError};

/// Leading bytes of every file written by [`save_bin`].
pub const BIN_MAGIC: [u8; 4] = *b"DSKB";
/// Payload layout version written after [`BIN_MAGIC`].
///
/// Version 2 payloads are MessagePack with named struct fields.
pub const BIN_FORMAT_VERSION: u16 = 2;

/// Read a YAML file into a [`ConfigData`].
///
/// Merge keys (`<<: *anchor`) are applied and key order is preserved.
/// A document that parses to null (an empty file, `null`, or only comments)
/// is rejected with [`Error::EmptyContent`]. A root that is not a mapping is
/// a [`Error::TypeMismatch`]. Non-finite floats and integers beyond 64 bits
/// fail with [`Error::UnsupportedValue`].
pub fn read_yaml(path: impl AsRef<Utf8Path>) -> Result<ConfigData> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::io(path, source))?;

    let mut raw = String::new();
    BufReader::new(file)
        .read_to_string(&mut raw)
        .map_err(|source| Error::io(path, source))?;
    let content = if is_blank_yaml(&raw) {
        Value::Null
    } else {
        yaml::parse(&raw).map_err(|err| match err {
            ParseError::Yaml(source) => Error::Yaml {
                path: path.to_owned(),
                source,
            },
            ParseError::Unsupported { key, reason } => Error::UnsupportedValue {
                path: path.to_owned(),
                key,
                reason,
            },
        })?
    };

    if content.is_null() {
        return Err(Error::EmptyContent {
            path: path.to_owned(),
        });
    }

    let config = ConfigData::try_from(content)?;
    info!(path = %path, "YAML file read successfully");
    Ok(config)
}

/// True when a YAML stream holds no document content at all.
fn is_blank_yaml(raw: &str) -> bool {
    raw.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

/// Create each directory (and its ancestors), succeeding if it already exists.
pub fn create_directories<P: AsRef<Utf8Path>>(paths: &[P], verbose: bool) -> Result<()> {
    for path in paths {
        let path = path.as_ref();
        fs::create_dir_all(path).map_err(|source| Error::io(path, source))?;
        if verbose {
            info!(path = %path, "Created directory");
        }
    }
    Ok(())
}

/// Write `data` as 4-space indented JSON, replacing any existing file.
///
/// `data` must serialize to a JSON object; anything else fails with
/// [`Error::TypeMismatch`] before the file is opened.
pub fn save_json<T: Serialize + ?Sized>(path: impl AsRef<Utf8Path>, data: &T) -> Result<()> {
    let path = path.as_ref();
    let value = serde_json::to_value(data).map_err(|source| Error::Json {
        path: path.to_owned(),
        source,
    })?;
    if !value.is_object() {
        return Err(Error::TypeMismatch {
            expected: "mapping",
            found: value_kind(&value),
        });
    }

    let file = File::create(path).map_err(|source| Error::io(path, source))?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|source| Error::Json {
            path: path.to_owned(),
            source,
        })?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|source| Error::io(path, source))?;

    info!(path = %path, "Data saved to JSON file");
    Ok(())
}

/// Load a JSON object into a [`ConfigData`].
pub fn load_json(path: impl AsRef<Utf8Path>) -> Result<ConfigData> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::io(path, source))?;
    let content: Value =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
            path: path.to_owned(),
            source,
        })?;
    let config = ConfigData::try_from(content)?;
    info!(path = %path, "Data loaded from JSON file");
    Ok(config)
}

/// Serialize any value into the binary object format at `path`.
///
/// The whole file is encoded in memory first, so an encoding failure leaves
/// any existing file at `path` untouched.
pub fn save_bin<T: Serialize + ?Sized>(data: &T, path: impl AsRef<Utf8Path>) -> Result<()> {
    let path = path.as_ref();
    let mut bytes = Vec::with_capacity(64);
    bytes.extend_from_slice(&BIN_MAGIC);
    bytes.extend_from_slice(&BIN_FORMAT_VERSION.to_le_bytes());
    rmp_serde::encode::write_named(&mut bytes, data).map_err(|source| Error::BinEncode {
        path: path.to_owned(),
        source,
    })?;
    fs::write(path, &bytes).map_err(|source| Error::io(path, source))?;

    info!(path = %path, "Data saved to binary file");
    Ok(())
}

/// Read back a value written by [`save_bin`].
pub fn load_bin<T: DeserializeOwned>(path: impl AsRef<Utf8Path>) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::io(path, source))?;
    let mut reader = BufReader::new(file);

    let mut header = [0u8; 6];
    if let Err(source) = reader.read_exact(&mut header) {
        if source.kind() == std::io::ErrorKind::UnexpectedEof {
            return Err(Error::IncompatibleFormat {
                path: path.to_owned(),
                reason: "file too short for header".to_owned(),
            });
        }
        return Err(Error::io(path, source));
    }
    if header[..4] != BIN_MAGIC {
        return Err(Error::IncompatibleFormat {
            path: path.to_owned(),
            reason: "unrecognized magic bytes".to_owned(),
        });
    }
    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != BIN_FORMAT_VERSION {
        return Err(Error::IncompatibleFormat {
            path: path.to_owned(),
            reason: format!("format version {version}, expected {BIN_FORMAT_VERSION}"),
        });
    }

    let data = rmp_serde::decode::from_read(&mut reader).map_err(|source| Error::Bin {
        path: path.to_owned(),
        source,
    })?;
    info!(path = %path, "Data loaded from binary file");
    Ok(data)
}
