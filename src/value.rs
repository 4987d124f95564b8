//! Block Variable Values
//!
//! A closed variant covering everything a block var or attribute can hold.
//! Merge rules are defined per combination; no runtime type sniffing.

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::rc::Rc;

use crate::form::FormView;

/// Shared handle to a form sub-view. Compared by identity (`Rc::ptr_eq`).
pub type FormViewHandle = Rc<FormView>;

/// A block variable or attribute value.
///
/// `Null`/`Bool`/`Int`/`Float`/`String` are scalar-like; `List` and `Keyed`
/// are structured; `Form` is the opaque sub-view reference a form block
/// carries in its `form` var.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Keyed(IndexMap<String, Value>),
    Form(FormViewHandle),
}

impl Value {
    /// Whether this value participates in scalar string concatenation.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_)
        )
    }

    /// Scalar text used for append-style concatenation. Empty for `Null`.
    pub fn as_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::List(_) | Value::Keyed(_) | Value::Form(_) => String::new(),
        }
    }

    pub fn as_form(&self) -> Option<&FormViewHandle> {
        match self {
            Value::Form(form) => Some(form),
            _ => None,
        }
    }

    /// Human-readable rendering for template/CLI output.
    ///
    /// Strings pass through, `Null` becomes `"NULL"`, structured values render
    /// as compact JSON, form handles render their name.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Form(form) => form.name().to_string(),
            Value::List(_) | Value::Keyed(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Keyed(a), Value::Keyed(b)) => a == b,
            (Value::Form(a), Value::Form(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => items.serialize(serializer),
            Value::Keyed(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            // Form views are opaque; serialize the name only
            Value::Form(form) => serializer.serialize_str(form.name()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
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

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(entries: IndexMap<String, Value>) -> Self {
        Value::Keyed(entries)
    }
}

impl From<FormViewHandle> for Value {
    fn from(form: FormViewHandle) -> Self {
        Value::Form(form)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Keyed(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}
