use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use crate::error::SourceError;
use crate::store::{matches_all, merge_into};
use crate::traits::{Document, DocumentStore, FieldFilter, StoredDocument};

type CollectionData = BTreeMap<String, Document>;

/// File-backed store: one pretty-printed JSON object per collection,
/// `<dir>/<collection>.json`, mapping document id to fields.
///
/// Every operation reads the collection file; writes go through a temp file
/// and rename. A single mutex serialises access within the process.
pub struct LocalStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(dir: &Path) -> Result<Self, SourceError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            lock: Mutex::new(()),
        })
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{}.json", collection))
    }

    async fn load(&self, collection: &str) -> Result<CollectionData, SourceError> {
        let path = self.collection_path(collection);
        if !path.exists() {
            debug!("Local store: {} has no file yet", collection);
            return Ok(CollectionData::new());
        }

        let content = tokio::fs::read_to_string(&path).await?;
        match serde_json::from_str::<CollectionData>(&content) {
            Ok(data) => Ok(data),
            Err(e) => {
                // Keep the unreadable file around instead of overwriting it on the next write.
                let backup_path = path.with_extension("json.bak");
                if let Err(backup_err) = tokio::fs::copy(&path, &backup_path).await {
                    warn!(
                        "Local store: {} is corrupted ({}) and could not be backed up: {}",
                        collection, e, backup_err
                    );
                    return Err(SourceError::Store(format!("corrupted collection file {}: {}", path.display(), e)));
                }
                warn!(
                    "Local store: {} is corrupted ({}). Backed up to {:?} and starting empty.",
                    collection, e, backup_path
                );
                Ok(CollectionData::new())
            }
        }
    }

    async fn save(&self, collection: &str, data: &CollectionData) -> Result<(), SourceError> {
        let path = self.collection_path(collection);
        let json = serde_json::to_string_pretty(data)?;
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, json).await?;
        tokio::fs::rename(&temp_path, &path).await?;
        debug!("Local store: saved {} ({} documents)", collection, data.len());
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), SourceError> {
        let _guard = self.lock.lock().await;
        if self.dir.exists() {
            tokio::fs::remove_dir_all(&self.dir).await?;
            tokio::fs::create_dir_all(&self.dir).await?;
            info!("Cleared local store directory: {:?}", self.dir);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    fn backend_name(&self) -> &str {
        "local"
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, SourceError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load(collection).await?;
        Ok(data.remove(id))
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), SourceError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load(collection).await?;
        data.insert(id.to_string(), doc);
        self.save(collection, &data).await
    }

    async fn merge(&self, collection: &str, id: &str, fields: Document) -> Result<(), SourceError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load(collection).await?;
        merge_into(data.entry(id.to_string()).or_default(), fields);
        self.save(collection, &data).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), SourceError> {
        let _guard = self.lock.lock().await;
        let mut data = self.load(collection).await?;
        if data.remove(id).is_some() {
            self.save(collection, &data).await?;
        }
        Ok(())
    }

    async fn query(&self, collection: &str, filters: &[FieldFilter]) -> Result<Vec<StoredDocument>, SourceError> {
        let _guard = self.lock.lock().await;
        let data = self.load(collection).await?;
        Ok(data
            .into_iter()
            .filter(|(_, doc)| matches_all(doc, filters))
            .map(|(id, fields)| StoredDocument { id, fields })
            .collect())
    }
}
