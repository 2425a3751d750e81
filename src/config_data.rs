//! `ConfigData`: a nested key/value mapping loaded from YAML or JSON.

use std::ops::Index;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result, value_kind};

/// String-keyed mapping of arbitrarily nested values.
///
/// Values can be read by key (`config["key"]`, [`ConfigData::get`]), by a
/// dotted path through nested mappings ([`ConfigData::lookup`]), or
/// deserialized wholesale into a typed struct ([`ConfigData::extract`]).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigData(Map<String, Value>);

impl ConfigData {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Walk nested mappings along a `.`-separated path, e.g. `model.params.alpha`.
    ///
    /// Returns `None` if any segment is missing or reaches a non-mapping value
    /// before the path is exhausted.
    pub fn lookup(&self, dotted: &str) -> Option<&Value> {
        let mut segments = dotted.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Deserialize a single value into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<serde_json::Result<T>> {
        self.0
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
    }

    /// Deserialize the whole mapping into a caller-defined type.
    pub fn extract<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ConfigData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for ConfigData {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(Error::TypeMismatch {
                expected: "mapping",
                found: value_kind(&other),
            }),
        }
    }
}

impl From<ConfigData> for Value {
    fn from(config: ConfigData) -> Self {
        Value::Object(config.0)
    }
}

impl Index<&str> for ConfigData {
    type Output = Value;

    /// Missing keys index to `Value::Null`, matching `serde_json::Value`.
    fn index(&self, key: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.0.get(key).unwrap_or(&NULL)
    }
}
