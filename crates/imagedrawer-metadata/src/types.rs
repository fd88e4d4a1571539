//! Core types for embedded metadata representation

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Well-known key carrying the positive generation prompt.
pub const POSITIVE_PROMPT_KEY: &str = "positive_prompt";

/// Well-known key carrying the negative generation prompt.
pub const NEGATIVE_PROMPT_KEY: &str = "negative_prompt";

/// Ordered string-to-string mapping of embedded generation parameters.
///
/// Entries keep the order they were first inserted in. Inserting a key that
/// already exists replaces its value without moving it, so the map behaves
/// like the "last write wins" objects metadata writers produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataMap {
    entries: Vec<(String, String)>,
}

impl MetadataMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value for `key`.
    ///
    /// Returns the replaced value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Look up the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Value of `positive_prompt`, treating an empty string as absent.
    pub fn positive_prompt(&self) -> Option<&str> {
        self.get(POSITIVE_PROMPT_KEY).filter(|v| !v.is_empty())
    }

    /// Value of `negative_prompt`, treating an empty string as absent.
    pub fn negative_prompt(&self) -> Option<&str> {
        self.get(NEGATIVE_PROMPT_KEY).filter(|v| !v.is_empty())
    }

    /// Build a map from a JSON object.
    ///
    /// Strings are taken verbatim, `null` members are skipped and every other
    /// value is stored as its compact JSON text.
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut map = Self::new();
        for (key, value) in object {
            match value {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => map.insert(key.as_str(), s.as_str()),
                other => map.insert(key.as_str(), other.to_string()),
            };
        }
        map
    }
}

impl<K, V> FromIterator<(K, V)> for MetadataMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for MetadataMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            out.serialize_entry(k, v)?;
        }
        out.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut map = MetadataMap::new();
        map.insert("b", "1");
        map.insert("a", "2");
        assert_eq!(map.insert("b", "3"), Some("1".to_string()));

        let entries: Vec<_> = map.iter().collect();
        assert_eq!(entries, vec![("b", "3"), ("a", "2")]);
    }

    #[test]
    fn empty_prompts_read_as_absent() {
        let map: MetadataMap = [("positive_prompt", ""), ("negative_prompt", "blurry")]
            .into_iter()
            .collect();
        assert_eq!(map.positive_prompt(), None);
        assert_eq!(map.negative_prompt(), Some("blurry"));
    }

    #[test]
    fn json_values_are_flattened() {
        let value = serde_json::json!({
            "seed": 42,
            "cfg": 7.5,
            "positive_prompt": "a cat",
            "loras": ["a", "b"],
            "missing": null
        });
        let map = MetadataMap::from_json_object(value.as_object().unwrap());

        assert_eq!(map.get("seed"), Some("42"));
        assert_eq!(map.get("cfg"), Some("7.5"));
        assert_eq!(map.get("positive_prompt"), Some("a cat"));
        assert_eq!(map.get("loras"), Some(r#"["a","b"]"#));
        assert!(!map.contains_key("missing"));
    }

    #[test]
    fn serializes_as_json_object() {
        let map: MetadataMap = [("z", "1"), ("a", "2")].into_iter().collect();
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"z":"1","a":"2"}"#);
    }
}
