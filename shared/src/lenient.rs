//! Tolerant field readers
//!
//! Every field of the shared document is read through one of these helpers:
//! a missing, null or wrongly-typed value degrades to the type's neutral
//! value instead of failing the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Any type: fall back to `Default` when the value does not fit.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Text field; numbers and booleans are stringified, everything else is empty.
pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Integer that may have been stored as a float or a numeric string.
pub fn int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_i64(&value).unwrap_or(0))
}

/// Non-negative count (capacity, seats); negatives clamp to zero.
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let n = value_to_i64(&value).unwrap_or(0);
    Ok(n.clamp(0, u32::MAX as i64) as u32)
}

/// Document version; anything missing or non-positive reads as 1.
pub fn version<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value_to_i64(&value) {
        Some(v) if v > 0 => v as u64,
        _ => 1,
    })
}

/// Sequence; non-arrays become empty and malformed elements are dropped.
pub fn seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| T::deserialize(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Map; non-objects become empty and malformed entries are dropped.
pub fn map<'de, D, K, V>(deserializer: D) -> Result<BTreeMap<K, V>, D::Error>
where
    D: Deserializer<'de>,
    K: DeserializeOwned + Ord,
    V: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(entries(value, |v| V::deserialize(v).ok()))
}

/// Two-level map (e.g. event -> card -> booking); bad entries are dropped at
/// either level without touching their siblings.
pub fn nested_map<'de, D, K1, K2, V>(
    deserializer: D,
) -> Result<BTreeMap<K1, BTreeMap<K2, V>>, D::Error>
where
    D: Deserializer<'de>,
    K1: DeserializeOwned + Ord,
    K2: DeserializeOwned + Ord,
    V: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(entries(value, |inner| match inner {
        Value::Object(_) => Some(entries(inner, |v| V::deserialize(v).ok())),
        _ => None,
    }))
}

pub(crate) fn entries<K, V>(value: Value, read: impl Fn(Value) -> Option<V>) -> BTreeMap<K, V>
where
    K: DeserializeOwned + Ord,
{
    let Value::Object(map) = value else {
        return BTreeMap::new();
    };
    map.into_iter()
        .filter_map(|(key, value)| {
            let key = K::deserialize(Value::String(key)).ok()?;
            Some((key, read(value)?))
        })
        .collect()
}

/// Optional object; `null`, scalars and malformed objects read as `None`.
pub fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(_) => T::deserialize(value).ok(),
        _ => None,
    })
}

pub(crate) fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "string")]
        text: String,
        #[serde(default, deserialize_with = "count")]
        capacity: u32,
        #[serde(default = "one", deserialize_with = "version")]
        version: u64,
        #[serde(default, deserialize_with = "seq")]
        items: Vec<u8>,
    }

    fn one() -> u64 {
        1
    }

    #[test]
    fn test_wrong_types_degrade() {
        let p: Fields = serde_json::from_str(
            r#"{"text": null, "capacity": "12", "version": -3, "items": [1, "x", 300, 2]}"#,
        )
        .unwrap();
        assert_eq!(p.text, "");
        assert_eq!(p.capacity, 12);
        assert_eq!(p.version, 1);
        assert_eq!(p.items, vec![1, 2]);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let p: Fields = serde_json::from_str("{}").unwrap();
        assert_eq!(p.text, "");
        assert_eq!(p.capacity, 0);
        assert_eq!(p.version, 1);
        assert!(p.items.is_empty());
    }

    #[test]
    fn test_bad_map_entries_are_dropped_alone() {
        #[derive(Debug, Deserialize)]
        struct Tables {
            #[serde(default, deserialize_with = "map")]
            flat: BTreeMap<String, u8>,
            #[serde(default, deserialize_with = "nested_map")]
            nested: BTreeMap<String, BTreeMap<String, u8>>,
        }

        let t: Tables = serde_json::from_str(
            r#"{"flat": {"a": 1, "b": null, "c": 3},
                "nested": {"x": {"a": 1, "b": "?"}, "y": 7, "z": {"c": 2}}}"#,
        )
        .unwrap();
        assert_eq!(t.flat.len(), 2);
        assert_eq!(t.flat["c"], 3);
        assert_eq!(t.nested.len(), 2);
        assert_eq!(t.nested["x"].len(), 1);
        assert_eq!(t.nested["z"]["c"], 2);

        let t: Tables = serde_json::from_str(r#"{"flat": [1, 2], "nested": "x"}"#).unwrap();
        assert!(t.flat.is_empty());
        assert!(t.nested.is_empty());
    }

    #[test]
    fn test_negative_capacity_clamps() {
        let p: Fields = serde_json::from_str(r#"{"capacity": -4.5, "items": {}}"#).unwrap();
        assert_eq!(p.capacity, 0);
        assert!(p.items.is_empty());
    }
}
