use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Máximo de operações por batch aceito pelo Firestore
pub const MAX_BATCH_SIZE: usize = 500;

/// A document read from a collection: its id plus decoded fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
            create_time: None,
            update_time: None,
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replaces the whole document (`set`).
    Overwrite,
    /// Creates the document or updates only the listed fields (`set(merge=True)`).
    Merge,
    /// Updates only the listed fields; the document must exist.
    Update,
}

/// One queued write against `collection/document_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub collection: String,
    pub document_id: String,
    pub fields: Map<String, Value>,
    /// Fields stamped with the server's request time.
    pub server_timestamps: Vec<String>,
    pub mode: WriteMode,
}

impl Write {
    pub fn new(collection: &str, document_id: &str, mode: WriteMode) -> Self {
        Self {
            collection: collection.to_string(),
            document_id: document_id.to_string(),
            fields: Map::new(),
            server_timestamps: Vec::new(),
            mode,
        }
    }

    pub fn set(collection: &str, document_id: &str) -> Self {
        Self::new(collection, document_id, WriteMode::Overwrite)
    }

    pub fn merge(collection: &str, document_id: &str) -> Self {
        Self::new(collection, document_id, WriteMode::Merge)
    }

    pub fn update(collection: &str, document_id: &str) -> Self {
        Self::new(collection, document_id, WriteMode::Update)
    }

    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn server_timestamp(mut self, name: &str) -> Self {
        self.server_timestamps.push(name.to_string());
        self
    }

    /// Top-level fields touched by this write, used as the update mask.
    pub fn field_paths(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    ArrayContains,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Equal => "EQUAL",
            FilterOp::ArrayContains => "ARRAY_CONTAINS",
        }
    }
}

/// Single-field query filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl FieldFilter {
    pub fn equal(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::Equal,
            value: value.into(),
        }
    }

    pub fn array_contains(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::ArrayContains,
            value: value.into(),
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        let Some(actual) = document.fields.get(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Equal => *actual == self.value,
            FilterOp::ArrayContains => actual
                .as_array()
                .map(|items| items.contains(&self.value))
                .unwrap_or(false),
        }
    }
}

/// The handful of document-database primitives the admin tools rely on.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in the collection, following pagination to the end.
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>>;

    /// `Ok(None)` when the document does not exist.
    async fn get_document(&self, collection: &str, document_id: &str) -> Result<Option<Document>>;

    async fn run_query(
        &self,
        collection: &str,
        filter: &FieldFilter,
        limit: Option<u32>,
    ) -> Result<Vec<Document>>;

    /// Applies the writes atomically. At most [`MAX_BATCH_SIZE`] writes per call.
    async fn commit(&self, writes: Vec<Write>) -> Result<()>;

    async fn apply(&self, write: Write) -> Result<()> {
        self.commit(vec![write]).await
    }
}

/// Accumulates writes until the caller commits them as one batch.
#[derive(Debug, Default)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: Write) {
        self.writes.push(write);
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.writes.len() >= MAX_BATCH_SIZE
    }

    /// Drains the batch into a single commit; the batch is empty afterwards even on error.
    pub async fn commit<S>(&mut self, store: &S) -> Result<usize>
    where
        S: DocumentStore + ?Sized,
    {
        let writes = std::mem::take(&mut self.writes);
        let count = writes.len();
        store.commit(writes).await?;
        Ok(count)
    }
}
