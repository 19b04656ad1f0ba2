//! Importable object representations
//!
//! A [`Representation`] is the serializable snapshot of one remote object
//! that crosses the sequential/parallel boundary: a flat map of primitive
//! fields, built once by the collection strategy and immutable afterward.
//! Keeping it flat and primitive means a queue message can round-trip
//! through any JSON-capable transport without schema knowledge.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ImportError;

/// Flat, primitive-typed snapshot of one remote object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Representation {
    fields: Map<String, Value>,
}

impl Representation {
    /// Build a representation from a flat field map
    ///
    /// Nested arrays or objects are a contract violation by the strategy
    /// that produced them and are rejected.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, ImportError> {
        for (name, value) in &fields {
            if value.is_array() || value.is_object() {
                return Err(ImportError::InvalidObject(format!(
                    "representation field '{}' is not a primitive value",
                    name
                )));
            }
        }
        Ok(Self { fields })
    }

    pub fn builder() -> RepresentationBuilder {
        RepresentationBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.fields.get(name).and_then(Value::as_i64)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(Value::as_bool)
    }

    /// Timestamps travel as RFC3339 strings
    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.text(name)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder used by collection strategies to assemble a representation
#[derive(Debug, Default)]
pub struct RepresentationBuilder {
    fields: Map<String, Value>,
}

impl RepresentationBuilder {
    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), Value::String(value.into()));
        self
    }

    pub fn integer(mut self, name: &str, value: i64) -> Self {
        self.fields.insert(name.to_string(), Value::from(value));
        self
    }

    pub fn boolean(mut self, name: &str, value: bool) -> Self {
        self.fields.insert(name.to_string(), Value::Bool(value));
        self
    }

    pub fn timestamp(mut self, name: &str, value: DateTime<Utc>) -> Self {
        self.fields.insert(
            name.to_string(),
            Value::String(value.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        self
    }

    pub fn null(mut self, name: &str) -> Self {
        self.fields.insert(name.to_string(), Value::Null);
        self
    }

    /// Copy a primitive field straight out of a raw API object, storing
    /// null when the field is missing
    pub fn raw(mut self, name: &str, raw: &Value) -> Result<Self, ImportError> {
        let value = raw.get(name).cloned().unwrap_or(Value::Null);
        if value.is_array() || value.is_object() {
            return Err(ImportError::InvalidObject(format!(
                "raw field '{}' is not a primitive value",
                name
            )));
        }
        self.fields.insert(name.to_string(), value);
        Ok(self)
    }

    pub fn build(self) -> Representation {
        // Builder methods only insert primitives, so this cannot fail
        Representation { fields: self.fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_builder_and_accessors() {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let repr = Representation::builder()
            .integer("external_id", 42)
            .text("title", "Fix the flaky build")
            .boolean("closed", false)
            .timestamp("created_at", created_at)
            .null("milestone")
            .build();

        assert_eq!(repr.integer("external_id"), Some(42));
        assert_eq!(repr.text("title"), Some("Fix the flaky build"));
        assert_eq!(repr.boolean("closed"), Some(false));
        assert_eq!(repr.timestamp("created_at"), Some(created_at));
        assert_eq!(repr.get("milestone"), Some(&Value::Null));
        assert_eq!(repr.integer("missing"), None);
    }

    #[test]
    fn test_from_fields_rejects_nested_values() {
        let mut fields = Map::new();
        fields.insert("labels".to_string(), json!(["bug", "p1"]));
        assert!(Representation::from_fields(fields).is_err());

        let mut fields = Map::new();
        fields.insert("author".to_string(), json!({"login": "octocat"}));
        assert!(Representation::from_fields(fields).is_err());
    }

    #[test]
    fn test_raw_copies_primitives_and_rejects_nesting() {
        let raw = json!({"id": 7, "title": "hello", "assignees": []});

        let repr = Representation::builder()
            .raw("id", &raw)
            .unwrap()
            .raw("title", &raw)
            .unwrap()
            .raw("missing", &raw)
            .unwrap()
            .build();
        assert_eq!(repr.integer("id"), Some(7));
        assert_eq!(repr.text("title"), Some("hello"));
        assert_eq!(repr.get("missing"), Some(&Value::Null));

        assert!(Representation::builder().raw("assignees", &raw).is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let repr = Representation::builder()
            .integer("external_id", 42)
            .text("state", "closed")
            .build();

        let encoded = serde_json::to_string(&repr).unwrap();
        let decoded: Representation = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, repr);
    }
}
