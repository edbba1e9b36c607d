use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use super::error::SyncError;

/// A JSON document as stored by the backend.
pub type Document = Map<String, Value>;

/// Query parameters passed to `view` and `all` (`include_docs`, `key`, `limit`, ...).
pub type QueryOptions = Map<String, Value>;

/// Reserved document fields.
pub const ID_FIELD: &str = "_id";
pub const REV_FIELD: &str = "_rev";

/// Persistence operation requested by a model or collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Read,
    Create,
    Update,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Read => "read",
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::Delete => "delete",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Verb::Read),
            "create" => Ok(Verb::Create),
            "update" => Ok(Verb::Update),
            "delete" => Ok(Verb::Delete),
            other => Err(SyncError::UnknownVerb(other.to_string())),
        }
    }
}

/// One row of a view or all-docs response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub key: Value,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Document>,
}

impl ViewRow {
    /// The document carried by the row: the included doc, or an object-valued
    /// emit when docs were not included.
    pub fn into_document(self) -> Option<Document> {
        match (self.doc, self.value) {
            (Some(doc), _) => Some(doc),
            (None, Value::Object(value)) => Some(value),
            _ => None,
        }
    }
}

/// Backend reply to a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub id: String,
    pub rev: String,
}

/// Backend reply to a successful remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveResponse {
    pub id: String,
    pub rev: String,
}

/// Reads the `_id` of a document, if it is a non-empty string.
pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// Reads the `_rev` of a document.
pub fn document_rev(doc: &Document) -> Option<&str> {
    doc.get(REV_FIELD).and_then(Value::as_str)
}
