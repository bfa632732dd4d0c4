use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Identifier for a [`Document`], unique within its collection.
///
/// Ids are plain strings: callers may supply their own, or ask for a
/// generated one. Generated ids are random UUID v4 values, so collisions
/// between independently generated ids are not a practical concern.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create an id from a caller-supplied string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id (hyphenated UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty id.
    ///
    /// An empty id never matches a stored document and is rejected by
    /// mutation operations.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One record in a collection.
///
/// A document is a JSON object augmented with three reserved fields that the
/// collection maintains:
///
/// - `id` — unique within the collection
/// - `_created` — set once at creation, immutable thereafter
/// - `_updated` — refreshed on every update; equals `_created` on a fresh
///   document
///
/// The caller's own fields are flattened alongside the reserved ones, so a
/// document serializes to a single flat JSON object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier within the owning collection.
    pub id: DocumentId,
    /// Creation timestamp (ISO-8601).
    #[serde(rename = "_created")]
    pub created: DateTime<Utc>,
    /// Last-update timestamp (ISO-8601).
    #[serde(rename = "_updated")]
    pub updated: DateTime<Utc>,
    /// Caller-supplied fields, flattened into the document object.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Build a document from its parts.
    pub fn new(
        id: DocumentId,
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            created,
            updated,
            fields,
        }
    }

    /// Look up a caller field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The full document as a flat JSON object.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("document serializes to JSON")
    }

    /// Decode a document from a flat JSON object.
    ///
    /// Returns `None` when the value is not an object or the reserved fields
    /// are missing or malformed.
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generated_ids_are_unique() {
        let a = DocumentId::generate();
        let b = DocumentId::generate();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn id_display_and_from() {
        let id = DocumentId::from("answers");
        assert_eq!(id.as_str(), "answers");
        assert_eq!(format!("{id}"), "answers");
        assert_eq!(format!("{id:?}"), "DocumentId(answers)");
    }

    #[test]
    fn empty_id() {
        assert!(DocumentId::new("").is_empty());
        assert!(!DocumentId::new("x").is_empty());
    }

    #[test]
    fn document_serializes_flat() {
        let now = Utc::now();
        let mut fields = Map::new();
        fields.insert("title".into(), json!("first"));
        let doc = Document::new(DocumentId::new("d1"), now, now, fields);

        let value = doc.to_value();
        let obj = value.as_object().expect("object");
        assert_eq!(obj["id"], json!("d1"));
        assert_eq!(obj["title"], json!("first"));
        assert!(obj.contains_key("_created"));
        assert!(obj.contains_key("_updated"));
        // Reserved fields live at the top level, not nested.
        assert_eq!(obj.len(), 4);
    }

    #[test]
    fn document_roundtrip() {
        let now = Utc::now();
        let mut fields = Map::new();
        fields.insert("a".into(), json!(1));
        fields.insert("nested".into(), json!({"b": [1, 2, 3]}));
        let doc = Document::new(DocumentId::new("d2"), now, now, fields);

        let decoded = Document::from_value(doc.to_value()).expect("decodes");
        assert_eq!(decoded.id, doc.id);
        assert_eq!(decoded.fields, doc.fields);
    }

    #[test]
    fn from_value_rejects_missing_reserved_fields() {
        assert!(Document::from_value(json!({"a": 1})).is_none());
        assert!(Document::from_value(json!("not an object")).is_none());
        assert!(Document::from_value(json!({"id": "x", "_created": "bad"})).is_none());
    }

    #[test]
    fn get_reads_caller_fields() {
        let now = Utc::now();
        let mut fields = Map::new();
        fields.insert("k".into(), json!("v"));
        let doc = Document::new(DocumentId::generate(), now, now, fields);
        assert_eq!(doc.get("k"), Some(&json!("v")));
        assert_eq!(doc.get("missing"), None);
    }
}
