//! CouchDB database over HTTP

use super::ClientInner;
use crate::core::{
    DbError, DbResult, Document, QueryOptions, RemoveResponse, SaveResponse, ViewRow,
    document_id, document_rev,
};
use crate::handle::DatabaseHandle;
use async_trait::async_trait;
use log::debug;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Query parameters CouchDB expects as JSON rather than plain strings.
const JSON_PARAMS: &[&str] = &["key", "keys", "startkey", "endkey", "start_key", "end_key"];

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct WriteBody {
    id: String,
    rev: String,
}

#[derive(Debug, Deserialize)]
struct RowsBody {
    #[serde(default)]
    rows: Vec<ViewRow>,
}

/// A database on a CouchDB server
#[derive(Clone)]
pub struct CouchDatabase {
    name: String,
    client: Arc<ClientInner>,
}

/// Encode view/all-docs options into URL query pairs.
pub(crate) fn encode_query(query: &QueryOptions) -> DbResult<Vec<(String, String)>> {
    query
        .iter()
        .map(|(name, value)| -> DbResult<(String, String)> {
            let encoded = match value {
                _ if JSON_PARAMS.contains(&name.as_str()) => serde_json::to_string(value)?,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Ok((name.clone(), encoded))
        })
        .collect()
}

/// Split `"design/view"` into its two path parts.
pub(crate) fn split_view_name(view_name: &str) -> DbResult<(&str, &str)> {
    match view_name.split_once('/') {
        Some((design, view)) if !design.is_empty() && !view.is_empty() => Ok((design, view)),
        _ => Err(DbError::InvalidViewName(view_name.to_string())),
    }
}

/// Map a non-success response to a typed error.
pub(crate) fn status_error(status: u16, body: &Value, subject: &str) -> DbError {
    let body: ErrorBody = serde_json::from_value(body.clone()).unwrap_or_default();
    match status {
        404 => DbError::not_found(subject, body.reason),
        409 => DbError::Conflict(subject.to_string()),
        _ => DbError::Server {
            status,
            error: body.error,
            reason: body.reason,
        },
    }
}

impl CouchDatabase {
    pub(crate) fn new(name: &str, client: Arc<ClientInner>) -> Self {
        Self {
            name: name.to_string(),
            client,
        }
    }

    fn url(&self, segments: &[&str]) -> DbResult<Url> {
        let mut url = Url::parse(&self.client.config.base_url())
            .map_err(|e| DbError::Config(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| DbError::Config("base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .push(&self.name)
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!("CouchDB {} {}", method, url);
        let config = &self.client.config;
        let request = self.client.http.request(method, url);
        match &config.username {
            Some(username) => request.basic_auth(username, config.password.as_deref()),
            None => request,
        }
    }

    /// Send a request and decode the JSON body, mapping error statuses.
    async fn execute(&self, request: RequestBuilder, subject: &str) -> DbResult<Value> {
        let response = request.send().await?;
        let status = response.status();
        let body: Value = if status == StatusCode::NO_CONTENT {
            Value::Null
        } else if status.is_success() {
            response.json().await?
        } else {
            // Proxies answer with HTML; keep the status either way.
            response.json().await.unwrap_or(Value::Null)
        };

        if status.is_success() {
            Ok(body)
        } else {
            debug!("CouchDB error {} for '{}': {}", status, subject, body);
            Err(status_error(status.as_u16(), &body, subject))
        }
    }

    async fn write(&self, request: RequestBuilder, subject: &str) -> DbResult<WriteBody> {
        let body = self.execute(request, subject).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn rows(&self, url: Url, query: &QueryOptions) -> DbResult<Vec<ViewRow>> {
        let request = self.request(Method::GET, url).query(&encode_query(query)?);
        let body = self.execute(request, &self.name).await?;
        let rows: RowsBody = serde_json::from_value(body)?;
        Ok(rows.rows)
    }

    /// Create the database on the server
    pub async fn create(&self) -> DbResult<()> {
        let request = self.request(Method::PUT, self.url(&[])?);
        match self.execute(request, &self.name).await {
            Err(DbError::Server { status: 412, .. }) => {
                Err(DbError::DatabaseExists(self.name.clone()))
            }
            other => other.map(|_| ()),
        }
    }

    /// Delete the database from the server
    pub async fn destroy(&self) -> DbResult<()> {
        let request = self.request(Method::DELETE, self.url(&[])?);
        match self.execute(request, &self.name).await {
            Err(DbError::NotFound { .. }) => Err(DbError::DatabaseNotFound(self.name.clone())),
            other => other.map(|_| ()),
        }
    }

    pub async fn exists(&self) -> DbResult<bool> {
        let response = self.request(Method::HEAD, self.url(&[])?).send().await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl DatabaseHandle for CouchDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, id: &str) -> DbResult<Document> {
        let request = self.request(Method::GET, self.url(&[id])?);
        match self.execute(request, id).await? {
            Value::Object(doc) => Ok(doc),
            other => Err(DbError::InvalidDocument(format!(
                "expected an object for '{}', got {}",
                id, other
            ))),
        }
    }

    async fn view(&self, view_name: &str, query: &QueryOptions) -> DbResult<Vec<ViewRow>> {
        let (design, view) = split_view_name(view_name)?;
        let url = self.url(&["_design", design, "_view", view])?;
        self.rows(url, query).await
    }

    async fn all(&self, query: &QueryOptions) -> DbResult<Vec<ViewRow>> {
        let url = self.url(&["_all_docs"])?;
        self.rows(url, query).await
    }

    async fn save(&self, doc: Document) -> DbResult<SaveResponse> {
        let request = match document_id(&doc) {
            Some(id) => self.request(Method::PUT, self.url(&[id])?),
            None => self.request(Method::POST, self.url(&[])?),
        };
        let subject = document_id(&doc).unwrap_or(&self.name).to_string();
        let body = self.write(request.json(&doc), &subject).await?;
        Ok(SaveResponse {
            id: body.id,
            rev: body.rev,
        })
    }

    async fn save_with_id(&self, id: &str, doc: Document) -> DbResult<SaveResponse> {
        let request = self.request(Method::PUT, self.url(&[id])?).json(&doc);
        let body = self.write(request, id).await?;
        Ok(SaveResponse {
            id: body.id,
            rev: body.rev,
        })
    }

    async fn remove(&self, id: &str) -> DbResult<RemoveResponse> {
        // DELETE needs the current revision.
        let current = self.get(id).await?;
        let rev = document_rev(&current)
            .ok_or_else(|| DbError::InvalidDocument(format!("'{}' has no _rev", id)))?
            .to_string();

        let request = self
            .request(Method::DELETE, self.url(&[id])?)
            .query(&[("rev", rev.as_str())]);
        let body = self.write(request, id).await?;
        Ok(RemoveResponse {
            id: body.id,
            rev: body.rev,
        })
    }
}
