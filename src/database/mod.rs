pub mod memory;
pub mod store;
pub mod value;

pub use memory::MemoryStore;
pub use store::*;

use crate::{
    config::AdminConfig,
    services::credentials_service::TokenProvider,
    utils::error::{AdminError, Result},
};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use value::{from_firestore_fields, quote_field_path, to_firestore_fields, to_firestore_value};

const FIRESTORE_API_BASE: &str = "https://firestore.googleapis.com/v1";
const LIST_PAGE_SIZE: u32 = 300;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(default)]
    create_time: Option<String>,
    #[serde(default)]
    update_time: Option<String>,
}

impl RawDocument {
    fn into_document(self) -> Document {
        let id = self.name.rsplit('/').next().unwrap_or_default().to_string();
        Document {
            id,
            fields: from_firestore_fields(&self.fields),
            create_time: self.create_time,
            update_time: self.update_time,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<RawDocument>,
}

/// Firestore REST client (`projects/{project}/databases/{database}/documents`).
#[derive(Clone)]
pub struct FirestoreDB {
    client: reqwest::Client,
    tokens: Arc<TokenProvider>,
    api_base: String,
    database_path: String,
}

impl FirestoreDB {
    pub fn new(config: &AdminConfig, project_id: &str, tokens: Arc<TokenProvider>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(config.request_timeout)
            .build()?;

        let api_base = match &config.emulator_host {
            Some(host) => format!("http://{}/v1", host.trim_end_matches('/')),
            None => FIRESTORE_API_BASE.to_string(),
        };

        Ok(Self {
            client,
            tokens,
            api_base,
            database_path: format!("projects/{}/databases/{}", project_id, config.database_id),
        })
    }

    /// Resource name of a document, as used inside request bodies.
    pub fn document_name(&self, collection: &str, document_id: &str) -> String {
        format!("{}/documents/{}/{}", self.database_path, collection, document_id)
    }

    fn documents_url(&self) -> String {
        format!("{}/{}/documents", self.api_base, self.database_path)
    }

    /// Verifies that the credentials can reach the database.
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}:listCollectionIds", self.documents_url());
        self.send(self.client.post(&url).json(&json!({ "pageSize": 1 })))
            .await?;
        log::debug!("Firestore reachable at {}", self.database_path);
        Ok(())
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(request.bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorized(request).await?.send().await?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(api_error(response).await)
        }
    }
}

async fn api_error(response: Response) -> AdminError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(body);
    AdminError::ApiError { status, message }
}

/// Encodes one write as a Firestore `Write` resource for `documents:commit`.
pub fn encode_write(document_name: &str, write: &Write) -> Value {
    let mut encoded = Map::new();
    encoded.insert(
        "update".to_string(),
        json!({ "name": document_name, "fields": to_firestore_fields(&write.fields) }),
    );

    if write.mode != WriteMode::Overwrite {
        let paths: Vec<String> = write.field_paths().into_iter().map(quote_field_path).collect();
        encoded.insert("updateMask".to_string(), json!({ "fieldPaths": paths }));
    }
    if write.mode == WriteMode::Update {
        encoded.insert("currentDocument".to_string(), json!({ "exists": true }));
    }
    if !write.server_timestamps.is_empty() {
        let transforms: Vec<Value> = write
            .server_timestamps
            .iter()
            .map(|field| json!({ "fieldPath": quote_field_path(field), "setToServerValue": "REQUEST_TIME" }))
            .collect();
        encoded.insert("updateTransforms".to_string(), Value::Array(transforms));
    }

    Value::Object(encoded)
}

/// Builds the `structuredQuery` body for a single-field filter.
pub fn encode_query(collection: &str, filter: &FieldFilter, limit: Option<u32>) -> Value {
    let mut structured = json!({
        "from": [{ "collectionId": collection }],
        "where": {
            "fieldFilter": {
                "field": { "fieldPath": quote_field_path(&filter.field) },
                "op": filter.op.as_str(),
                "value": to_firestore_value(&filter.value)
            }
        }
    });
    if let Some(limit) = limit {
        structured["limit"] = json!(limit);
    }
    json!({ "structuredQuery": structured })
}

#[async_trait]
impl DocumentStore for FirestoreDB {
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>> {
        let url = format!("{}/{}", self.documents_url(), collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: ListDocumentsResponse = self.send(request).await?.json().await?;
            log::debug!("📄 {}: fetched {} documents", collection, page.documents.len());
            documents.extend(page.documents.into_iter().map(RawDocument::into_document));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    async fn get_document(&self, collection: &str, document_id: &str) -> Result<Option<Document>> {
        let url = format!(
            "{}/{}/{}",
            self.documents_url(),
            collection,
            urlencoding::encode(document_id)
        );
        let response = self.authorized(self.client.get(&url)).await?.send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let raw: RawDocument = response.json().await?;
                Ok(Some(raw.into_document()))
            }
            _ => Err(api_error(response).await),
        }
    }

    async fn run_query(
        &self,
        collection: &str,
        filter: &FieldFilter,
        limit: Option<u32>,
    ) -> Result<Vec<Document>> {
        let url = format!("{}:runQuery", self.documents_url());
        let body = encode_query(collection, filter, limit);

        let items: Vec<RunQueryItem> = self.send(self.client.post(&url).json(&body)).await?.json().await?;
        Ok(items
            .into_iter()
            .filter_map(|item| item.document.map(RawDocument::into_document))
            .collect())
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }
        if writes.len() > MAX_BATCH_SIZE {
            return Err(AdminError::InvalidRequest(format!(
                "maximum {} writes allowed per request, got {}",
                MAX_BATCH_SIZE,
                writes.len()
            )));
        }

        let encoded: Vec<Value> = writes
            .iter()
            .map(|write| encode_write(&self.document_name(&write.collection, &write.document_id), write))
            .collect();

        let url = format!("{}:commit", self.documents_url());
        self.send(self.client.post(&url).json(&json!({ "writes": encoded })))
            .await?;
        log::debug!("💾 Committed {} writes", writes.len());
        Ok(())
    }
}
