// src/models/profile.rs - Raw extractor output and the canonical profile record
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::models::aliases;
use crate::normalization::helpers::clean_str;

/// Loosely keyed mapping produced by an upstream extractor. Keys may be snake
/// case, PascalCase, or one of the declared aliases; values may be any JSON
/// scalar or null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawProfile {
    fields: HashMap<String, Value>,
}

impl RawProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-object JSON produces an empty profile.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::from_map(map.clone()),
            _ => Self::default(),
        }
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self {
            fields: map.into_iter().collect(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Raw value stored under exactly `key`.
    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Cleaned text stored under exactly `key`. Null, empty, and
    /// whitespace-only values count as missing.
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(value_as_text)
    }

    /// First non-empty value for a logical field, walking its declared aliases.
    pub fn lookup(&self, field: &str) -> Option<String> {
        aliases::keys_for(field)
            .iter()
            .find_map(|key| self.text(key))
    }

    /// First non-empty value across several logical fields, in order.
    pub fn lookup_any(&self, fields: &[&str]) -> Option<String> {
        fields.iter().find_map(|field| self.lookup(field))
    }
}

impl From<Map<String, Value>> for RawProfile {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(map)
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean_str(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Fixed-schema output record. Every schema key is always present; a field
/// that could not be populated holds `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalProfile {
    schema: Vec<String>,
    values: HashMap<String, Value>,
}

impl CanonicalProfile {
    pub fn empty(schema: &[String]) -> Self {
        let values = schema
            .iter()
            .map(|field| (field.clone(), Value::Null))
            .collect();
        Self {
            schema: schema.to_vec(),
            values,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.schema.iter().map(String::as_str)
    }

    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn is_absent(&self, field: &str) -> bool {
        self.get(field).is_none()
    }

    /// Writes `value` when `field` belongs to the schema. Returns whether the
    /// write happened; fields outside the schema are dropped silently.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> bool {
        match self.values.get_mut(field) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn set_opt(&mut self, field: &str, value: Option<String>) -> bool {
        match value {
            Some(v) => self.set(field, v),
            None => false,
        }
    }

    /// Writes only when the field is currently absent.
    pub fn fill(&mut self, field: &str, value: Option<String>) -> bool {
        if !self.is_absent(field) {
            return false;
        }
        self.set_opt(field, value)
    }

    pub fn clear(&mut self, field: &str) {
        self.set(field, Value::Null);
    }

    pub fn populated_count(&self) -> usize {
        self.values.values().filter(|v| !v.is_null()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .iter()
            .map(move |field| (field.as_str(), self.values.get(field).unwrap_or(&Value::Null)))
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Value::Object(map)
    }
}

impl Serialize for CanonicalProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.schema.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Vec<String> {
        ["full_name", "age", "city"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lookup_walks_aliases_and_pascal_case() {
        let raw = RawProfile::from_json(&json!({"FullName": "Priya Sharma", "Sex": "f"}));
        assert_eq!(raw.lookup("full_name").as_deref(), Some("Priya Sharma"));
        assert_eq!(raw.lookup("gender").as_deref(), Some("f"));
    }

    #[test]
    fn test_blank_values_are_treated_as_missing() {
        let raw = RawProfile::new()
            .with("full_name", "   ")
            .with("name", "Rahul Verma")
            .with("city", Value::Null);
        assert_eq!(raw.lookup("full_name").as_deref(), Some("Rahul Verma"));
        assert_eq!(raw.lookup("city"), None);
    }

    #[test]
    fn test_numeric_values_become_text() {
        let raw = RawProfile::new().with("age", 28).with("pincode", 302001);
        assert_eq!(raw.lookup("age").as_deref(), Some("28"));
        assert_eq!(raw.lookup("zip_code").as_deref(), Some("302001"));
    }

    #[test]
    fn test_non_object_json_is_empty() {
        assert!(RawProfile::from_json(&json!(["a", "b"])).is_empty());
    }

    #[test]
    fn test_canonical_profile_keeps_schema_keys() {
        let mut profile = CanonicalProfile::empty(&schema());
        assert!(profile.set("city", "Jaipur"));
        assert!(!profile.set("unknown_field", "x"));
        let json = profile.to_json();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(json["city"], json!("Jaipur"));
        assert_eq!(json["age"], Value::Null);
    }

    #[test]
    fn test_fill_does_not_overwrite() {
        let mut profile = CanonicalProfile::empty(&schema());
        profile.set("city", "Jaipur");
        assert!(!profile.fill("city", Some("Ajmer".into())));
        assert!(profile.fill("full_name", Some("Priya".into())));
        assert_eq!(profile.get_str("city"), Some("Jaipur"));
        assert_eq!(profile.populated_count(), 2);
    }

    #[test]
    fn test_serializes_in_schema_order() {
        let mut profile = CanonicalProfile::empty(&schema());
        profile.set("age", 28);
        let text = serde_json::to_string(&profile).unwrap();
        assert_eq!(text, r#"{"full_name":null,"age":28,"city":null}"#);
    }
}
