use crate::core::{Document, ID_FIELD, REV_FIELD};
use serde_json::Value;

/// Normalized outcome of a successful sync.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncResponse {
    /// A single fetched document, as stored.
    Document(Document),
    /// Documents of a collection read, in backend order.
    Documents(Vec<Document>),
    Created { id: String, rev: String },
    Updated { rev: String },
    Deleted { rev: String },
}

impl SyncResponse {
    /// Revision reported by a write.
    pub fn revision(&self) -> Option<&str> {
        match self {
            SyncResponse::Created { rev, .. }
            | SyncResponse::Updated { rev }
            | SyncResponse::Deleted { rev } => Some(rev),
            SyncResponse::Document(doc) => doc.get(REV_FIELD).and_then(Value::as_str),
            SyncResponse::Documents(_) => None,
        }
    }

    /// Attributes to merge into a model: the fetched document, or the
    /// `{_rev, _id}` envelope of a write.
    pub fn attributes(&self) -> Option<Document> {
        let mut envelope = Document::new();
        match self {
            SyncResponse::Document(doc) => return Some(doc.clone()),
            SyncResponse::Documents(_) => return None,
            SyncResponse::Created { id, rev } => {
                envelope.insert(REV_FIELD.to_string(), Value::String(rev.clone()));
                envelope.insert(ID_FIELD.to_string(), Value::String(id.clone()));
            }
            SyncResponse::Updated { rev } | SyncResponse::Deleted { rev } => {
                envelope.insert(REV_FIELD.to_string(), Value::String(rev.clone()));
            }
        }
        Some(envelope)
    }

    pub fn into_documents(self) -> Vec<Document> {
        match self {
            SyncResponse::Documents(docs) => docs,
            SyncResponse::Document(doc) => vec![doc],
            _ => Vec::new(),
        }
    }

    /// Plain JSON form: the document, the array of documents, or the envelope.
    pub fn into_value(self) -> Value {
        match self {
            SyncResponse::Documents(docs) => {
                Value::Array(docs.into_iter().map(Value::Object).collect())
            }
            SyncResponse::Document(doc) => Value::Object(doc),
            other => other.attributes().map(Value::Object).unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_created_envelope() {
        let response = SyncResponse::Created {
            id: "t1".into(),
            rev: "1-a".into(),
        };
        assert_eq!(response.revision(), Some("1-a"));
        assert_eq!(response.into_value(), json!({"_id": "t1", "_rev": "1-a"}));
    }

    #[test]
    fn test_update_envelope_has_only_rev() {
        let response = SyncResponse::Updated { rev: "2-b".into() };
        assert_eq!(response.into_value(), json!({"_rev": "2-b"}));
    }

    #[test]
    fn test_documents_value() {
        let doc = json!({"_id": "a"}).as_object().cloned().unwrap();
        let response = SyncResponse::Documents(vec![doc]);
        assert!(response.attributes().is_none());
        assert_eq!(response.into_value(), json!([{"_id": "a"}]));
    }
}
