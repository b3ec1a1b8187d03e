//! In-process [`DocumentStore`] with Firestore's write semantics; backs the test suite.

use super::store::{Document, DocumentStore, FieldFilter, Write, WriteMode, MAX_BATCH_SIZE};
use crate::utils::error::{AdminError, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

type Collections = BTreeMap<String, BTreeMap<String, Document>>;

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
    failing_query_values: Mutex<Vec<Value>>,
    commits: AtomicUsize,
    failing_commits: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document directly, bypassing commit accounting.
    pub fn insert(&self, collection: &str, document_id: &str, fields: Value) -> Result<()> {
        let fields = match fields {
            Value::Object(map) => map,
            other => {
                return Err(AdminError::InvalidRequest(format!(
                    "document fields must be an object, got {}",
                    other
                )))
            }
        };
        let now = server_time();
        let mut document = Document::new(document_id, fields);
        document.create_time = Some(now.clone());
        document.update_time = Some(now);

        self.lock()?
            .entry(collection.to_string())
            .or_default()
            .insert(document_id.to_string(), document);
        Ok(())
    }

    pub fn document(&self, collection: &str, document_id: &str) -> Option<Document> {
        self.collections
            .lock()
            .ok()?
            .get(collection)?
            .get(document_id)
            .cloned()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .map(|c| c.get(collection).map(BTreeMap::len).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of `commit` calls issued, including rejected ones.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Any query whose filter value equals `value` fails.
    pub fn fail_queries_for(&self, value: impl Into<Value>) {
        if let Ok(mut values) = self.failing_query_values.lock() {
            values.push(value.into());
        }
    }

    /// The next `count` commits fail without applying any write.
    pub fn fail_next_commits(&self, count: usize) {
        self.failing_commits.store(count, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|_| AdminError::DatabaseError("memory store lock poisoned".to_string()))
    }
}

fn server_time() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn apply_write(collections: &mut Collections, write: Write, now: &str) -> Result<()> {
    let documents = collections.entry(write.collection.clone()).or_default();
    let existing = documents.get(&write.document_id).cloned();

    let mut document = match (write.mode, existing) {
        (WriteMode::Update, None) => {
            return Err(AdminError::NotFound(format!(
                "No document to update: {}/{}",
                write.collection, write.document_id
            )))
        }
        (WriteMode::Overwrite, existing) => {
            let mut document = Document::new(write.document_id.clone(), write.fields);
            document.create_time = existing.and_then(|d| d.create_time);
            document
        }
        (_, Some(mut document)) => {
            document.fields.extend(write.fields);
            document
        }
        (WriteMode::Merge, None) => Document::new(write.document_id.clone(), write.fields),
    };

    for field in &write.server_timestamps {
        document.fields.insert(field.clone(), Value::String(now.to_string()));
    }
    if document.create_time.is_none() {
        document.create_time = Some(now.to_string());
    }
    document.update_time = Some(now.to_string());

    documents.insert(write.document_id, document);
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>> {
        Ok(self
            .lock()?
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_document(&self, collection: &str, document_id: &str) -> Result<Option<Document>> {
        Ok(self.lock()?.get(collection).and_then(|docs| docs.get(document_id).cloned()))
    }

    async fn run_query(
        &self,
        collection: &str,
        filter: &FieldFilter,
        limit: Option<u32>,
    ) -> Result<Vec<Document>> {
        let should_fail = self
            .failing_query_values
            .lock()
            .map(|values| values.contains(&filter.value))
            .unwrap_or(false);
        if should_fail {
            return Err(AdminError::ApiError {
                status: 503,
                message: format!("query on {}.{} unavailable", collection, filter.field),
            });
        }

        let limit = limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(self
            .lock()?
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| filter.matches(doc))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);

        if writes.len() > MAX_BATCH_SIZE {
            return Err(AdminError::InvalidRequest(format!(
                "maximum {} writes allowed per request, got {}",
                MAX_BATCH_SIZE,
                writes.len()
            )));
        }

        let pending_failures = self.failing_commits.load(Ordering::SeqCst);
        if pending_failures > 0 {
            self.failing_commits.store(pending_failures - 1, Ordering::SeqCst);
            return Err(AdminError::ApiError {
                status: 503,
                message: "commit unavailable".to_string(),
            });
        }

        // Aplica numa cópia para manter o commit atômico
        let mut guard = self.lock()?;
        let mut staged = guard.clone();
        let now = server_time();
        for write in writes {
            apply_write(&mut staged, write, &now)?;
        }
        *guard = staged;
        Ok(())
    }
}
