//! Attribute Merging - Override and Append Semantics
//!
//! Explicit attributes win over plain defaults. A default tagged as
//! appendable combines with the explicit value of the same key instead of
//! replacing it, so list-valued attributes (CSS classes and the like)
//! compose cumulatively rather than clobbering each other.

use indexmap::IndexMap;
use tracing::debug;

use crate::value::Value;

/// Reserved key prefix marking a raw default as appendable.
pub const APPEND_MARKER: char = '~';

/// A default attribute, tagged at construction time.
///
/// Callers building defaults in code pick the variant directly; defaults
/// loaded from declarative config go through [`AttrDefault::parse_map`] once,
/// which strips the `~` marker.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrDefault {
    Plain(Value),
    Append(Value),
}

impl AttrDefault {
    /// Convert a raw marker-prefixed map into tagged defaults.
    pub fn parse_map(raw: IndexMap<String, Value>) -> IndexMap<String, AttrDefault> {
        raw.into_iter()
            .map(|(key, value)| match key.strip_prefix(APPEND_MARKER) {
                Some(stripped) => (stripped.to_string(), AttrDefault::Append(value)),
                None => (key, AttrDefault::Plain(value)),
            })
            .collect()
    }
}

/// Merge explicit attributes with defaults.
///
/// Total over any well-formed input: uncombinable append shapes fall back to
/// plain override and are never surfaced as errors.
pub fn merge_attributes(
    attr: IndexMap<String, Value>,
    defaults: &IndexMap<String, AttrDefault>,
) -> IndexMap<String, Value> {
    let mut merged = attr;
    for (key, default) in defaults {
        match default {
            AttrDefault::Plain(value) => {
                if !merged.contains_key(key) {
                    merged.insert(key.clone(), value.clone());
                }
            }
            AttrDefault::Append(payload) => {
                let combined = match merged.get(key) {
                    Some(explicit) => append_value(key, explicit, payload),
                    None => payload.clone(),
                };
                merged.insert(key.clone(), combined);
            }
        }
    }
    merged
}

/// Combine an explicit value with an appendable default payload.
fn append_value(key: &str, explicit: &Value, payload: &Value) -> Value {
    if explicit.is_scalar() && payload.is_scalar() {
        // explicit first, payloads carry their own separator
        return Value::String(format!("{}{}", explicit.as_text(), payload.as_text()));
    }

    let (Some(base), Some(overlay)) = (to_keyed(payload), to_keyed(explicit)) else {
        debug!(attr = key, "uncombinable append default, falling back to plain override");
        return explicit.clone();
    };

    let mut result = base;
    for (entry_key, explicit_entry) in overlay {
        if entry_key.bytes().all(|b| b.is_ascii_digit()) {
            push_positional(&mut result, explicit_entry);
            continue;
        }
        let combined = match result.get(&entry_key) {
            None => explicit_entry,
            Some(default_entry) => merge_entry(key, default_entry, explicit_entry),
        };
        result.insert(entry_key, combined);
    }
    Value::Keyed(result)
}

/// Per-entry rules when default and explicit structured values share a key.
fn merge_entry(key: &str, default_entry: &Value, explicit_entry: Value) -> Value {
    match (default_entry, explicit_entry) {
        // list forms concatenate, default entries first
        (Value::List(defaults), Value::List(explicits)) => {
            let mut items = defaults.clone();
            items.extend(explicits);
            Value::List(items)
        }
        (Value::List(defaults), explicit) if explicit.is_scalar() => {
            let mut items = defaults.clone();
            items.push(explicit);
            Value::List(items)
        }
        (default, Value::List(explicits)) if default.is_scalar() => {
            let mut items = vec![default.clone()];
            items.extend(explicits);
            Value::List(items)
        }
        // matching scalar or keyed entries: explicit wins, like plain override
        (_, explicit) => {
            debug!(attr = key, "overlapping append entry, explicit value wins");
            explicit
        }
    }
}

/// Normalize a value to keyed form. Scalars and lists become positional
/// entries under numeric keys; form handles are not combinable.
fn to_keyed(value: &Value) -> Option<IndexMap<String, Value>> {
    match value {
        Value::Keyed(entries) => Some(entries.clone()),
        Value::List(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), item.clone()))
                .collect(),
        ),
        Value::Form(_) => None,
        scalar => {
            let mut entries = IndexMap::new();
            entries.insert("0".to_string(), scalar.clone());
            Some(entries)
        }
    }
}

fn push_positional(entries: &mut IndexMap<String, Value>, value: Value) {
    let mut n = 0usize;
    while entries.contains_key(&n.to_string()) {
        n += 1;
    }
    entries.insert(n.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_parse_map_strips_marker() {
        let raw = attrs(&[
            ("autofocus", Value::from(true)),
            ("~class", Value::from(" input")),
        ]);
        let defaults = AttrDefault::parse_map(raw);
        assert_eq!(
            defaults.get("class"),
            Some(&AttrDefault::Append(Value::from(" input")))
        );
        assert_eq!(
            defaults.get("autofocus"),
            Some(&AttrDefault::Plain(Value::from(true)))
        );
    }

    #[test]
    fn test_append_without_explicit_value_uses_payload() {
        let defaults = AttrDefault::parse_map(attrs(&[("~class", Value::from(" input"))]));
        let merged = merge_attributes(IndexMap::new(), &defaults);
        assert_eq!(merged.get("class"), Some(&Value::from(" input")));
    }

    #[test]
    fn test_explicit_scalar_becomes_positional_entry() {
        let defaults = AttrDefault::parse_map(attrs(&[(
            "~class",
            Value::Keyed(attrs(&[("class", Value::from(" input input_block"))])),
        )]));
        let merged = merge_attributes(attrs(&[("class", Value::from("test"))]), &defaults);

        let Some(Value::Keyed(class)) = merged.get("class") else {
            panic!("expected keyed class attribute");
        };
        assert_eq!(class.get("class"), Some(&Value::from(" input input_block")));
        assert_eq!(class.get("0"), Some(&Value::from("test")));
    }

    #[test]
    fn test_overlapping_scalar_entries_explicit_wins() {
        let defaults = AttrDefault::parse_map(attrs(&[(
            "~class",
            Value::Keyed(attrs(&[("variant", Value::from("default"))])),
        )]));
        let merged = merge_attributes(
            attrs(&[(
                "class",
                Value::Keyed(attrs(&[("variant", Value::from("explicit"))])),
            )]),
            &defaults,
        );

        let Some(Value::Keyed(class)) = merged.get("class") else {
            panic!("expected keyed class attribute");
        };
        assert_eq!(class.get("variant"), Some(&Value::from("explicit")));
    }

    #[test]
    fn test_form_payload_falls_back_to_override() {
        use crate::form::FormView;

        let form = FormView::leaf("field");
        let mut defaults = IndexMap::new();
        defaults.insert(
            "class".to_string(),
            AttrDefault::Append(Value::Form(form)),
        );
        let merged = merge_attributes(attrs(&[("class", Value::from("keep"))]), &defaults);
        assert_eq!(merged.get("class"), Some(&Value::from("keep")));
    }
}
