use crate::timeline_api::types::TimelineError;
use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An order-preserving map with case-insensitive lookup
///
/// Used both for outgoing content payloads and for parsed response bodies, so
/// callers can look up `"pageToken"` or `"pagetoken"` interchangeably while
/// the wire representation keeps the server's key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields {
    inner: IndexMap<String, Value>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw JSON response body into a field map.
    ///
    /// Anything other than a JSON object is a malformed response.
    pub fn from_json_str(body: &str) -> Result<Self, TimelineError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| TimelineError::MalformedResponse(format!("invalid JSON: {}", e)))?;
        Self::from_value(value)
    }

    /// Convert a JSON value into a field map; non-objects are rejected.
    pub fn from_value(value: Value) -> Result<Self, TimelineError> {
        match value {
            Value::Object(map) => Ok(Self {
                inner: map.into_iter().collect(),
            }),
            other => Err(TimelineError::MalformedResponse(format!(
                "expected a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.inner.into_iter().collect())
    }

    /// Look up a value by key, ignoring ASCII case.
    ///
    /// An exact match wins over a case-insensitive one.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.inner.get(key) {
            return Some(value);
        }
        self.inner
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.insert(key.into(), value)
    }

    /// Remove a key (case-insensitively), preserving the order of the rest.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let found = self
            .inner
            .keys()
            .find(|k| k.eq_ignore_ascii_case(key))
            .cloned()?;
        self.inner.shift_remove(&found)
    }

    /// Merge `other` into `self`; keys from `other` win.
    pub fn merge(&mut self, other: Fields) {
        for (key, value) in other.inner {
            self.inner.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.inner.iter()
    }

    /// Rename every top-level key from snake_case to lower camelCase and
    /// reformat the `displayTime` value to the API's timestamp shape.
    ///
    /// Idempotent: already-camelCase keys pass through unchanged.
    pub fn normalized(self) -> Fields {
        let mut out = IndexMap::with_capacity(self.inner.len());
        for (key, value) in self.inner {
            let new_key = camelize(&key);
            let value = if new_key == "displayTime" {
                format_display_time(value)
            } else {
                value
            };
            out.insert(new_key, value);
        }
        Fields { inner: out }
    }
}

impl From<IndexMap<String, Value>> for Fields {
    fn from(inner: IndexMap<String, Value>) -> Self {
        Self { inner }
    }
}

impl FromIterator<(String, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Rails-style lower camelization: `display_time` -> `displayTime`,
/// `DisplayTime` -> `displayTime`, `displayTime` -> `displayTime`.
pub(crate) fn camelize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut parts = key.split('_').filter(|p| !p.is_empty());
    if let Some(first) = parts.next() {
        let mut chars = first.chars();
        if let Some(c) = chars.next() {
            out.extend(c.to_lowercase());
            out.push_str(chars.as_str());
        }
    }
    for part in parts {
        let mut chars = part.chars();
        if let Some(c) = chars.next() {
            out.extend(c.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Reformat a `displayTime` value to ISO-8601 UTC with a forced `.000`
/// fractional part and literal `Z` suffix, the only shape the API accepts.
///
/// Unparseable values are passed through unchanged rather than dropped.
fn format_display_time(value: Value) -> Value {
    let Value::String(raw) = value else {
        return value;
    };
    match parse_timestamp(&raw) {
        Some(utc) => Value::String(utc.format("%Y-%m-%dT%H:%M:%S.000Z").to_string()),
        None => {
            tracing::warn!("displayTime value {:?} is not a recognized timestamp", raw);
            Value::String(raw)
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camelize_snake_case() {
        assert_eq!(camelize("display_time"), "displayTime");
        assert_eq!(camelize("speakable_text"), "speakableText");
        assert_eq!(camelize("text"), "text");
    }

    #[test]
    fn test_camelize_is_idempotent_on_camel_case() {
        assert_eq!(camelize("displayTime"), "displayTime");
        assert_eq!(camelize(&camelize("display_time")), "displayTime");
    }

    #[test]
    fn test_camelize_lowercases_leading_capital() {
        assert_eq!(camelize("DisplayTime"), "displayTime");
    }

    #[test]
    fn test_indifferent_access() {
        let fields = Fields::from_json_str(r#"{"id":"x","pageToken":"y"}"#).unwrap();
        assert_eq!(fields.get("id"), Some(&json!("x")));
        assert_eq!(fields.get("Id"), Some(&json!("x")));
        assert_eq!(fields.get("pageToken"), Some(&json!("y")));
        assert_eq!(fields.get("pagetoken"), Some(&json!("y")));
        assert_eq!(fields.get("PAGETOKEN"), Some(&json!("y")));
        assert!(fields.get("missing").is_none());
    }

    #[test]
    fn test_preserves_insertion_order() {
        let fields = Fields::from_json_str(r#"{"b":1,"a":2,"c":3}"#).unwrap();
        let keys: Vec<&str> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_from_json_str_rejects_non_objects() {
        assert!(matches!(
            Fields::from_json_str("[1,2,3]"),
            Err(TimelineError::MalformedResponse(_))
        ));
        assert!(matches!(
            Fields::from_json_str("not json"),
            Err(TimelineError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_normalized_renames_and_formats_display_time() {
        let fields = Fields::from_value(json!({
            "text": "hello",
            "speakable_text": "hello there",
            "display_time": "2024-03-01T12:30:45+02:00"
        }))
        .unwrap();

        let normalized = fields.normalized();
        assert_eq!(normalized.get("speakableText"), Some(&json!("hello there")));
        assert!(normalized.get("speakable_text").is_none());
        assert_eq!(
            normalized.get("displayTime"),
            Some(&json!("2024-03-01T10:30:45.000Z"))
        );
    }

    #[test]
    fn test_normalized_formats_display_time_only() {
        let fields = Fields::from_value(json!({
            "created_time": "2024-03-01T12:30:45Z",
            "display_time": "2024-03-01T12:30:45Z"
        }))
        .unwrap();
        let normalized = fields.normalized();
        // Only displayTime gets the date treatment.
        assert_eq!(
            normalized.get("createdTime"),
            Some(&json!("2024-03-01T12:30:45Z"))
        );
        assert_eq!(
            normalized.get("displayTime"),
            Some(&json!("2024-03-01T12:30:45.000Z"))
        );
    }

    #[test]
    fn test_display_time_naive_and_offset_formats() {
        let fields = Fields::from_value(json!({"display_time": "2024-03-01 12:30:45"})).unwrap();
        assert_eq!(
            fields.normalized().get("displayTime"),
            Some(&json!("2024-03-01T12:30:45.000Z"))
        );

        let fields =
            Fields::from_value(json!({"display_time": "2024-03-01 12:30:45 -0700"})).unwrap();
        assert_eq!(
            fields.normalized().get("displayTime"),
            Some(&json!("2024-03-01T19:30:45.000Z"))
        );
    }

    #[test]
    fn test_display_time_unparseable_passes_through() {
        let fields = Fields::from_value(json!({"display_time": "soonish"})).unwrap();
        assert_eq!(fields.normalized().get("displayTime"), Some(&json!("soonish")));
    }

    #[test]
    fn test_remove_is_case_insensitive() {
        let mut fields = Fields::from_json_str(r#"{"Id":"x","text":"t"}"#).unwrap();
        assert_eq!(fields.remove("id"), Some(json!("x")));
        assert!(fields.get("Id").is_none());
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_merge_other_wins() {
        let mut base = Fields::from_json_str(r#"{"text":"old","html":"<b>x</b>"}"#).unwrap();
        let over = Fields::from_json_str(r#"{"text":"new"}"#).unwrap();
        base.merge(over);
        assert_eq!(base.get("text"), Some(&json!("new")));
        assert_eq!(base.get("html"), Some(&json!("<b>x</b>")));
    }
}
