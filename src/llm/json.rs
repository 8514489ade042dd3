//! Best-effort JSON extraction from model output
//!
//! Models wrap JSON in code fences, prefix it with prose or trail off with
//! commentary. None of these functions fail: an unusable answer becomes an
//! empty record.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

/// Extract the first JSON object found in `text`.
pub fn parse_json(text: &str) -> Map<String, Value> {
    let trimmed = text.trim();

    for candidate in fenced_blocks(trimmed).chain(std::iter::once(trimmed)) {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate.trim()) {
            return map;
        }
    }

    if let Some(map) = first_embedded_object(trimmed) {
        return map;
    }

    if !trimmed.is_empty() {
        warn!(len = trimmed.len(), "Model output contained no JSON object");
    }
    Map::new()
}

/// Parse model output into a record whose fields are all optional.
pub fn parse_record<T>(text: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let map = parse_json(text);
    if map.is_empty() {
        return T::default();
    }

    serde_json::from_value(Value::Object(map)).unwrap_or_else(|e| {
        warn!(error = %e, "Model JSON did not match the expected shape");
        T::default()
    })
}

/// Contents of ``` fences, preferring ```json ones.
fn fenced_blocks(text: &str) -> impl Iterator<Item = &str> {
    let json_fenced = text
        .split("```json")
        .skip(1)
        .filter_map(|s| s.split("```").next());
    let any_fenced = text.split("```").skip(1).step_by(2);
    json_fenced.chain(any_fenced)
}

fn first_embedded_object(text: &str) -> Option<Map<String, Value>> {
    text.match_indices('{').find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => Some(map),
            _ => None,
        }
    })
}
