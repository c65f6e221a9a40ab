use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use crate::error::SourceError;
use crate::store::{matches_all, merge_into};
use crate::traits::{Document, DocumentStore, FieldFilter, StoredDocument};

/// Process-local store. Documents are kept per collection, ordered by id.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, SourceError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), SourceError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, fields: Document) -> Result<(), SourceError> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_default();
        merge_into(existing, fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), SourceError> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn query(&self, collection: &str, filters: &[FieldFilter]) -> Result<Vec<StoredDocument>, SourceError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| matches_all(doc, filters))
                    .map(|(id, doc)| StoredDocument {
                        id: id.clone(),
                        fields: doc.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
