use super::Model;
use crate::core::{Document, QueryOptions, SyncResult, Verb};
use crate::sync::{DatabaseRef, SyncAdapter, Syncable, ViewName};

/// An ordered set of models loaded from a view or from all documents.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    models: Vec<Model>,
    database: DatabaseRef,
    view_name: Option<ViewName>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(mut self, database: impl Into<DatabaseRef>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_view_name(mut self, view_name: impl Into<ViewName>) -> Self {
        self.view_name = Some(view_name.into());
        self
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn first(&self) -> Option<&Model> {
        self.models.first()
    }

    pub fn last(&self) -> Option<&Model> {
        self.models.last()
    }

    pub fn get(&self, id: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.id() == Some(id))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Model> {
        self.models.iter()
    }

    pub fn push(&mut self, model: Model) {
        self.models.push(model);
    }

    /// Replace the models with the documents the database returns.
    ///
    /// Loaded models share the collection's database. Returns how many were loaded.
    pub async fn fetch(
        &mut self,
        adapter: &SyncAdapter,
        data: Option<QueryOptions>,
    ) -> SyncResult<usize> {
        let response = adapter.sync(Verb::Read, &*self, data).await?;
        self.models = response
            .into_documents()
            .into_iter()
            .map(|doc| Model::new(doc).with_database(self.database.clone()))
            .collect();
        Ok(self.models.len())
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Model;
    type IntoIter = std::slice::Iter<'a, Model>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.iter()
    }
}

impl Syncable for Collection {
    fn id(&self) -> Option<&str> {
        None
    }

    /// Collections have no document of their own.
    fn to_document(&self) -> Document {
        Document::new()
    }

    fn database(&self) -> &DatabaseRef {
        &self.database
    }

    fn view_name(&self) -> Option<&ViewName> {
        self.view_name.as_ref()
    }
}
