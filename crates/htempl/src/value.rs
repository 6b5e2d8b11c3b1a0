/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Metadata values and the merge rule applied across included files.
//!
//! Metadata is decoded from YAML into [`MetaValue`], a closed set of
//! variants. Merge and helper logic dispatch on the variant explicitly.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::Serialize;
use yaml_rust2::Yaml;

/// A mapping from metadata keys to values.
pub type MetaMap = BTreeMap<String, MetaValue>;

/// A decoded metadata value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// `~`, `null` or an empty value.
    Null,

    /// A boolean value.
    Bool(bool),

    /// An integer value.
    Integer(i64),

    /// A floating point value.
    Float(f64),

    /// A string value.
    String(String),

    /// A sequence of values.
    List(Vec<MetaValue>),

    /// A mapping of string keys to values.
    Map(MetaMap),
}

impl MetaValue {
    /// A short name for the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            MetaValue::Null => "null",
            MetaValue::Bool(_) => "boolean",
            MetaValue::Integer(_) => "integer",
            MetaValue::Float(_) => "float",
            MetaValue::String(_) => "string",
            MetaValue::List(_) => "sequence",
            MetaValue::Map(_) => "mapping",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[MetaValue]> {
        match self {
            MetaValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MetaMap> {
        match self {
            MetaValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Convert a decoded YAML node.
    ///
    /// Mapping keys must be scalars; they are stored in their string form.
    pub fn from_yaml(yaml: Yaml) -> Result<MetaValue, String> {
        let value = match yaml {
            Yaml::Null => MetaValue::Null,
            Yaml::Boolean(b) => MetaValue::Bool(b),
            Yaml::Integer(i) => MetaValue::Integer(i),
            Yaml::Real(text) => match text.parse::<f64>() {
                Ok(f) => MetaValue::Float(f),
                Err(_) => MetaValue::Float(parse_special_float(&text)?),
            },
            Yaml::String(s) => MetaValue::String(s),
            Yaml::Array(items) => MetaValue::List(
                items
                    .into_iter()
                    .map(MetaValue::from_yaml)
                    .collect::<Result<_, _>>()?,
            ),
            Yaml::Hash(hash) => {
                let mut map = MetaMap::new();
                for (key, value) in hash {
                    map.insert(yaml_key(key)?, MetaValue::from_yaml(value)?);
                }
                MetaValue::Map(map)
            }
            Yaml::Alias(_) => return Err("unresolved alias".to_string()),
            Yaml::BadValue => return Err("malformed value".to_string()),
        };
        Ok(value)
    }
}

/// YAML 1.2 spellings that `str::parse::<f64>` rejects.
fn parse_special_float(text: &str) -> Result<f64, String> {
    match text.trim_start_matches('+') {
        ".inf" | ".Inf" | ".INF" => Ok(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => Ok(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => Ok(f64::NAN),
        _ => Err(format!("invalid float '{text}'")),
    }
}

fn yaml_key(key: Yaml) -> Result<String, String> {
    match key {
        Yaml::String(s) | Yaml::Real(s) => Ok(s),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Boolean(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        other => Err(format!("unsupported mapping key {other:?}")),
    }
}

/// Merge `incoming` into `target`.
///
/// A key present on both sides takes the incoming value, except when both
/// values are sequences: then the incoming items are appended to the
/// existing ones. Mappings are replaced, not merged recursively.
pub fn merge_metadata(target: &mut MetaMap, incoming: MetaMap) {
    for (key, value) in incoming {
        match target.entry(key) {
            Entry::Occupied(mut slot) => match (slot.get_mut(), value) {
                (MetaValue::List(existing), MetaValue::List(items)) => existing.extend(items),
                (current, value) => *current = value,
            },
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
}
