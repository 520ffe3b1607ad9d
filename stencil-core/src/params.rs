//! Parameter namespace — the key/value map exchanged with the generated
//! program on every render pass.
//!
//! Reads of absent keys yield [`Value::None`], never an error; the map is a
//! `BTreeMap` so iteration and export order are deterministic.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ParamsError;
use crate::value::Value;

const ABSENT: Value = Value::None;

/// The parameter namespace visible to a generated program.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    map: BTreeMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a flat JSON object file. An empty path yields an empty map,
    /// matching the "no parameter file" case.
    pub fn load(path: &Path) -> Result<Self, ParamsError> {
        if path.as_os_str().is_empty() {
            return Ok(Self::new());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ParamsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ParamsError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a key. Absent keys yield the [`Value::None`] sentinel.
    pub fn get(&self, key: &str) -> &Value {
        self.map.get(key).unwrap_or(&ABSENT)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.map.insert(key.into(), value);
    }

    /// Merge `other` in; `other` wins per key, in map order.
    pub fn overlay(&mut self, other: &Params) {
        for (k, v) in &other.map {
            self.map.insert(k.clone(), v.clone());
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, Value> {
        self.map
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.map
    }
}

impl From<BTreeMap<String, Value>> for Params {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self { map }
    }
}

impl FromIterator<(String, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}
