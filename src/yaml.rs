//! YAML to JSON-model conversion for config files.
//!
//! Deserializing YAML straight into `serde_json::Value` drops information:
//! merge keys stay literal `<<` entries, `.inf`/`.nan` turn into `null`, and
//! wide integers fail with an unhelpful message. Here the document is read
//! into an intermediate tree first, merge keys are applied the way PyYAML's
//! `safe_load` applies them, and values JSON cannot hold are reported with the
//! key they sit under.

use std::fmt;

use serde::Deserialize;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Number, Value};

const MERGE_KEY: &str = "<<";

#[derive(Debug)]
pub(crate) enum ParseError {
    Yaml(serde_yaml::Error),
    Unsupported { key: String, reason: String },
}

/// Parse one YAML document into a JSON value.
pub(crate) fn parse(raw: &str) -> Result<Value, ParseError> {
    let node: Node = serde_yaml::from_str(raw).map_err(ParseError::Yaml)?;
    let mut key = Vec::new();
    node.into_json(&mut key)
}

enum Node {
    Null,
    Bool(bool),
    Number(Number),
    /// A scalar with no JSON counterpart.
    Unrepresentable(String),
    String(String),
    Seq(Vec<Node>),
    Map(Vec<(String, Node)>),
}

impl Node {
    fn into_json(self, key: &mut Vec<String>) -> Result<Value, ParseError> {
        match self {
            Node::Null => Ok(Value::Null),
            Node::Bool(b) => Ok(Value::Bool(b)),
            Node::Number(n) => Ok(Value::Number(n)),
            Node::String(s) => Ok(Value::String(s)),
            Node::Unrepresentable(reason) => Err(ParseError::Unsupported {
                key: dotted(key),
                reason,
            }),
            Node::Seq(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (idx, item) in items.into_iter().enumerate() {
                    key.push(idx.to_string());
                    let value = item.into_json(key);
                    key.pop();
                    out.push(value?);
                }
                Ok(Value::Array(out))
            }
            Node::Map(entries) => map_into_json(entries, key),
        }
    }
}

/// Merged keys come first; the mapping's own keys override them in place.
fn map_into_json(entries: Vec<(String, Node)>, key: &mut Vec<String>) -> Result<Value, ParseError> {
    let mut merged = Map::new();
    let mut own = Vec::with_capacity(entries.len());

    for (name, node) in entries {
        key.push(name.clone());
        let value = node.into_json(key);
        key.pop();
        let value = value?;

        if name == MERGE_KEY {
            merge_into(&mut merged, value, key)?;
        } else {
            own.push((name, value));
        }
    }

    for (name, value) in own {
        merged.insert(name, value);
    }
    Ok(Value::Object(merged))
}

/// Earlier merge sources win over later ones.
fn merge_into(target: &mut Map<String, Value>, source: Value, key: &[String]) -> Result<(), ParseError> {
    let sources = match source {
        Value::Object(map) => vec![map],
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                _ => Err(invalid_merge(key)),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(invalid_merge(key)),
    };

    for map in sources {
        for (k, v) in map {
            target.entry(k).or_insert(v);
        }
    }
    Ok(())
}

fn invalid_merge(key: &[String]) -> ParseError {
    ParseError::Unsupported {
        key: dotted(key),
        reason: "merge key `<<` must reference a mapping or a list of mappings".to_owned(),
    }
}

fn dotted(key: &[String]) -> String {
    if key.is_empty() {
        "<root>".to_owned()
    } else {
        key.join(".")
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a YAML value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Node, E> {
        Ok(Node::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Node, D::Error>
    where
        D: Deserializer<'de>,
    {
        Node::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
        Ok(Node::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
        Ok(Node::Number(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
        Ok(Node::Number(v.into()))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Node, E> {
        Ok(match i64::try_from(v) {
            Ok(n) => Node::Number(n.into()),
            Err(_) => Node::Unrepresentable(format!("integer {v} is outside the 64-bit range")),
        })
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Node, E> {
        Ok(match u64::try_from(v) {
            Ok(n) => Node::Number(n.into()),
            Err(_) => Node::Unrepresentable(format!("integer {v} is outside the 64-bit range")),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
        Ok(match Number::from_f64(v) {
            Some(n) => Node::Number(n),
            None => Node::Unrepresentable(format!("non-finite float {v}")),
        })
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
        Ok(Node::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
        Ok(Node::String(v))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Node, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Node::Seq(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Node, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, Node>()? {
            entries.push((key, value));
        }
        Ok(Node::Map(entries))
    }
}
