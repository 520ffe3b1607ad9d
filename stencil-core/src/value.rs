//! Dynamic values shared by parameter files, caller overrides and the
//! script interpreter.
//!
//! [`Value`] is deliberately JSON-shaped: the serde representation is
//! untagged, so a parameter file deserializes straight into it and the
//! post-execution override map serializes straight back out.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A dynamic scalar, list or map value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// The null/absent sentinel. Reading an unknown namespace key yields
    /// this, never an error.
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Truthiness: empty/zero/none are false, everything else true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
        }
    }

    /// The type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// How the value reads when interpolated into rendered output.
    ///
    /// Floats always carry a decimal point so `2.0` does not silently
    /// collapse into `2` between passes.
    pub fn render_to_string(&self) -> String {
        match self {
            Value::None => "none".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => render_float(*f),
            Value::Str(s) => s.clone(),
            Value::List(l) => {
                let items: Vec<_> = l.iter().map(Value::render_to_string).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Map(m) => {
                let items: Vec<_> = m
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", v.render_to_string()))
                    .collect();
                format!("{{{}}}", items.join(", "))
            }
        }
    }
}

fn render_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(m: BTreeMap<String, Value>) -> Self {
        Value::Map(m)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn json_roundtrip_covers_every_shape() {
        let json = r#"{"b": true, "f": 1.5, "i": 3, "l": [1, "two"], "n": null, "s": "x"}"#;
        let v: Value = serde_json::from_str(json).expect("deserialize");
        let Value::Map(m) = &v else { panic!("expected map, got {v:?}") };
        assert_eq!(m["b"], Value::Bool(true));
        assert_eq!(m["f"], Value::Float(1.5));
        assert_eq!(m["i"], Value::Int(3));
        assert_eq!(m["n"], Value::None);
        assert_eq!(m["s"], Value::Str("x".into()));
        assert_eq!(
            m["l"],
            Value::List(vec![Value::Int(1), Value::Str("two".into())])
        );

        let back = serde_json::to_string(&v).expect("serialize");
        let again: Value = serde_json::from_str(&back).expect("re-deserialize");
        assert_eq!(v, again);
    }

    #[test]
    fn integers_do_not_decay_to_floats() {
        let v: Value = serde_json::from_str("7").unwrap();
        assert_eq!(v, Value::Int(7));
    }

    #[rstest]
    #[case(Value::None, false)]
    #[case(Value::Int(0), false)]
    #[case(Value::Str(String::new()), false)]
    #[case(Value::List(vec![]), false)]
    #[case(Value::Bool(false), false)]
    #[case(Value::Float(0.5), true)]
    #[case(Value::Str("x".into()), true)]
    #[case(Value::Int(-1), true)]
    fn truthiness_matches_emptiness(#[case] value: Value, #[case] truthy: bool) {
        assert_eq!(value.is_truthy(), truthy);
    }

    #[test]
    fn floats_render_with_decimal_point() {
        assert_eq!(Value::Float(2.0).render_to_string(), "2.0");
        assert_eq!(Value::Float(1.5).render_to_string(), "1.5");
        assert_eq!(Value::Int(2).render_to_string(), "2");
    }
}
