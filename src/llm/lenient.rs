//! Field-level deserializers for records filled from model output
//!
//! Used with `#[serde(deserialize_with = "...")]`. A null or mistyped value
//! only empties its own field; the rest of the record still deserializes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `null` or a value of the wrong type becomes `None`. Strings holding a
/// JSON scalar (`"7"`, `"true"`) are read as that scalar.
pub fn option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(convert(Value::deserialize(deserializer)?))
}

/// `null` becomes `[]`, unusable elements are dropped and a lone value is
/// wrapped in a one-element list.
pub fn vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(convert).collect(),
        Value::Null => Vec::new(),
        other => convert(other).into_iter().collect(),
    })
}

/// `null` or a mistyped value becomes `T::default()`.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(convert(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn convert<T: DeserializeOwned>(value: Value) -> Option<T> {
    if value.is_null() {
        return None;
    }

    match serde_json::from_value::<T>(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(_) => match value {
            Value::String(s) => serde_json::from_str(s.trim()).ok(),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        #[serde(deserialize_with = "option")]
        score: Option<f64>,
        #[serde(deserialize_with = "option")]
        name: Option<String>,
        #[serde(deserialize_with = "vec")]
        tags: Vec<String>,
        #[serde(deserialize_with = "or_default")]
        count: u32,
    }

    fn sample(json: &str) -> Sample {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_null_fields_are_empty() {
        let s = sample(r#"{"score": null, "name": "Ana", "tags": null, "count": null}"#);
        assert_eq!(s.score, None);
        assert_eq!(s.name.as_deref(), Some("Ana"));
        assert!(s.tags.is_empty());
        assert_eq!(s.count, 0);
    }

    #[test]
    fn test_mistyped_scalars() {
        let s = sample(r#"{"score": "7.5", "name": 42, "count": "3"}"#);
        assert_eq!(s.score, Some(7.5));
        assert_eq!(s.name, None);
        assert_eq!(s.count, 3);

        let s = sample(r#"{"score": "high", "count": {"n": 1}}"#);
        assert_eq!(s.score, None);
        assert_eq!(s.count, 0);
    }

    #[test]
    fn test_lists_keep_usable_elements() {
        assert_eq!(sample(r#"{"tags": ["a", null, 3, "b"]}"#).tags, vec!["a", "b"]);
        assert_eq!(sample(r#"{"tags": "solo"}"#).tags, vec!["solo"]);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        assert_eq!(sample("{}"), Sample::default());
    }
}
