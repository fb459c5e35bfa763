use crate::domain::model::{Document, FieldMap};
use crate::domain::ports::DocumentStore;
use crate::utils::error::{Result, UpdaterError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    collections: HashMap<String, BTreeMap<String, FieldMap>>,
    writes: usize,
}

/// In-process document store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(collection: &str, documents: Vec<Document>) -> Self {
        let mut state = State::default();
        let entries = state.collections.entry(collection.to_string()).or_default();
        for doc in documents {
            entries.insert(doc.id, doc.fields);
        }
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub async fn insert(&self, collection: &str, document: Document) {
        let mut state = self.state.lock().await;
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(document.id, document.fields);
    }

    pub async fn get(&self, collection: &str, id: &str) -> Option<Document> {
        let state = self.state.lock().await;
        state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document::new(id, fields.clone()))
    }

    pub async fn snapshot(&self, collection: &str) -> Vec<Document> {
        let state = self.state.lock().await;
        state
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of successful `update_fields` calls so far.
    pub async fn write_count(&self) -> usize {
        self.state.lock().await.writes
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<Document>> {
        Ok(self.snapshot(collection).await)
    }

    async fn update_fields(&self, collection: &str, id: &str, fields: &FieldMap) -> Result<()> {
        let mut state = self.state.lock().await;
        let existing = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| UpdaterError::StoreWriteError {
                id: id.to_string(),
                message: format!("document not found in '{}'", collection),
            })?;

        for (key, value) in fields {
            existing.insert(key.clone(), value.clone());
        }
        state.writes += 1;
        Ok(())
    }
}
