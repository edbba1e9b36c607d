use crate::core::{
    DbError, DbResult, Document, SyncError, SyncResult, Verb, document_id, document_rev,
};
use crate::sync::{DatabaseRef, SyncAdapter, SyncResponse, Syncable};
use serde_json::Value;

/// A document-backed model.
///
/// The id lives in the `_id` attribute and the revision in `_rev`, so a
/// model's attributes are exactly the document that gets stored.
#[derive(Debug, Clone, Default)]
pub struct Model {
    attributes: Document,
    database: DatabaseRef,
}

impl Model {
    pub fn new(attributes: Document) -> Self {
        Self {
            attributes,
            database: DatabaseRef::Default,
        }
    }

    /// Build a model from a JSON object.
    pub fn from_value(value: Value) -> DbResult<Self> {
        match value {
            Value::Object(attributes) => Ok(Self::new(attributes)),
            other => Err(DbError::InvalidDocument(format!(
                "model attributes must be an object, got {}",
                other
            ))),
        }
    }

    pub fn with_database(mut self, database: impl Into<DatabaseRef>) -> Self {
        self.database = database.into();
        self
    }

    pub fn set_database(&mut self, database: impl Into<DatabaseRef>) {
        self.database = database.into();
    }

    pub fn id(&self) -> Option<&str> {
        document_id(&self.attributes)
    }

    pub fn revision(&self) -> Option<&str> {
        document_rev(&self.attributes)
    }

    /// A model is new until it has an id.
    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    /// Merge attributes into the model, replacing existing keys.
    pub fn set_all(&mut self, attributes: Document) {
        self.attributes.extend(attributes);
    }

    pub fn unset(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    pub fn attributes(&self) -> &Document {
        &self.attributes
    }

    /// Merge a sync response into the attributes.
    pub fn apply(&mut self, response: &SyncResponse) {
        if let Some(attributes) = response.attributes() {
            self.set_all(attributes);
        }
    }

    /// Create the model if it is new, update it otherwise.
    pub async fn save(&mut self, adapter: &SyncAdapter) -> SyncResult<SyncResponse> {
        let verb = if self.is_new() { Verb::Create } else { Verb::Update };
        let response = adapter.sync(verb, &*self, None).await?;
        self.apply(&response);
        Ok(response)
    }

    /// Reload the attributes from the database.
    pub async fn fetch(&mut self, adapter: &SyncAdapter) -> SyncResult<SyncResponse> {
        if self.is_new() {
            return Err(SyncError::MissingId(Verb::Read));
        }
        let response = adapter.sync(Verb::Read, &*self, None).await?;
        self.apply(&response);
        Ok(response)
    }

    /// Delete the model, keeping the tombstone revision.
    pub async fn destroy(&mut self, adapter: &SyncAdapter) -> SyncResult<SyncResponse> {
        let response = adapter.sync(Verb::Delete, &*self, None).await?;
        self.apply(&response);
        Ok(response)
    }
}

impl From<Document> for Model {
    fn from(attributes: Document) -> Self {
        Self::new(attributes)
    }
}

impl Syncable for Model {
    fn id(&self) -> Option<&str> {
        Model::id(self)
    }

    fn to_document(&self) -> Document {
        self.attributes.clone()
    }

    fn database(&self) -> &DatabaseRef {
        &self.database
    }
}
