//! HTTP client for an Outline-compatible knowledge base API.
//!
//! Every endpoint is a `POST {base}/{method}` with a JSON body and bearer
//! token, answering `{"data": ..., "pagination": {...}}`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{Document, DocumentStore, NewDocument, StoreError, StoreResult};

/// Page size used when listing documents.
pub const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Document store backed by the Outline REST API.
#[derive(Debug, Clone)]
pub struct OutlineClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl OutlineClient {
    /// Create a client for `base_url` (e.g. `https://app.getoutline.com/api`).
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, token)
    }

    /// Create a client reusing an existing `reqwest` client.
    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> StoreResult<T> {
        let response = self
            .http
            .post(self.endpoint(method))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &bytes));
        }

        let envelope: Envelope<T> =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }

    async fn list_all(&self, mut filter: Value) -> StoreResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut offset = 0usize;

        loop {
            filter["offset"] = json!(offset);
            filter["limit"] = json!(PAGE_SIZE);
            let page: Vec<Document> = self.call("documents.list", filter.clone()).await?;
            let fetched = page.len();
            documents.extend(page);
            debug!(offset, fetched, "Fetched document page");

            if fetched < PAGE_SIZE {
                break;
            }
            offset += fetched;
        }

        Ok(documents)
    }
}

#[async_trait]
impl DocumentStore for OutlineClient {
    async fn list_documents(&self, collection_id: &str) -> StoreResult<Vec<Document>> {
        self.list_all(json!({ "collectionId": collection_id })).await
    }

    async fn get_document(&self, id: &str) -> StoreResult<Document> {
        match self.call("documents.info", json!({ "id": id })).await {
            Err(StoreError::Api { status: 404, .. }) => Err(StoreError::NotFound(id.to_string())),
            other => other,
        }
    }

    async fn create_document(&self, document: NewDocument) -> StoreResult<Document> {
        let mut body = serde_json::to_value(&document)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        body["publish"] = json!(true);
        self.call("documents.create", body).await
    }

    async fn find_by_title(
        &self,
        title: &str,
        collection_id: &str,
        parent_id: Option<&str>,
    ) -> StoreResult<Option<Document>> {
        let mut filter = json!({ "collectionId": collection_id });
        if let Some(parent_id) = parent_id {
            filter["parentDocumentId"] = json!(parent_id);
        }
        let candidates = self.list_all(filter).await?;
        Ok(pick_exact_title(candidates, title, parent_id))
    }
}

/// Select the first document with exactly `title` placed directly under `parent_id`.
pub(crate) fn pick_exact_title(
    candidates: Vec<Document>,
    title: &str,
    parent_id: Option<&str>,
) -> Option<Document> {
    candidates
        .into_iter()
        .find(|doc| doc.title == title && doc.parent_document_id.as_deref() == parent_id)
}

fn api_error(status: u16, body: &[u8]) -> StoreError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());
    StoreError::Api { status, message }
}
