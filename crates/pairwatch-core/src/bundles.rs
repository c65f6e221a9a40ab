use chrono::Utc;
use pairwatch_models::{Bundle, BundleItem, Collection, TmdbId};
use pairwatch_sources::{Document, DocumentStore, SourceError};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use crate::documents::{decode_all, from_document, to_document};

/// Curated title lists in `bundles`.
#[derive(Clone)]
pub struct BundleRepository {
    store: Arc<dyn DocumentStore>,
}

fn slug(title: &str) -> String {
    let mut out = String::new();
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "bundle".to_string()
    } else {
        trimmed.to_string()
    }
}

impl BundleRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, title: &str, created_by: &str, items: Vec<BundleItem>) -> Result<Bundle, SourceError> {
        let now = Utc::now();
        let mut id = format!("{}-{:x}", slug(title), now.timestamp_millis());
        while self.store.get(Collection::Bundles.name(), &id).await?.is_some() {
            id.push('x');
        }

        let bundle = Bundle {
            id: id.clone(),
            title: title.trim().to_string(),
            created_by: created_by.to_string(),
            content_ids: items.iter().map(|i| i.tmdb_id.to_string()).collect(),
            content_items: items,
            created_at: now,
        };
        self.store
            .set(Collection::Bundles.name(), &id, to_document(&bundle)?)
            .await?;
        info!("Created bundle '{}' ({}) with {} item(s)", bundle.title, id, bundle.content_items.len());
        Ok(bundle)
    }

    pub async fn get(&self, bundle_id: &str) -> Result<Option<Bundle>, SourceError> {
        let Some(mut fields) = self.store.get(Collection::Bundles.name(), bundle_id).await? else {
            return Ok(None);
        };
        // Older documents don't carry their own id.
        fields.entry("id").or_insert_with(|| json!(bundle_id));
        from_document(fields).map(Some)
    }

    /// All bundles, newest first.
    pub async fn list(&self) -> Result<Vec<Bundle>, SourceError> {
        let collection = Collection::Bundles.name();
        let docs = self
            .store
            .list(collection)
            .await?
            .into_iter()
            .map(|mut doc| {
                doc.fields.entry("id").or_insert_with(|| json!(doc.id.clone()));
                doc
            })
            .collect();
        let mut bundles: Vec<Bundle> = decode_all(collection, docs);
        bundles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bundles)
    }

    async fn require(&self, bundle_id: &str) -> Result<Bundle, SourceError> {
        self.get(bundle_id)
            .await?
            .ok_or_else(|| SourceError::NotFound(format!("bundle '{}'", bundle_id)))
    }

    async fn write_contents(&self, bundle: &Bundle) -> Result<(), SourceError> {
        let mut fields = Document::new();
        fields.insert("contentIds".to_string(), serde_json::to_value(&bundle.content_ids)?);
        fields.insert("contentItems".to_string(), serde_json::to_value(&bundle.content_items)?);
        self.store.merge(Collection::Bundles.name(), &bundle.id, fields).await
    }

    /// Append a title. Adding one already present only refreshes its item.
    pub async fn add_item(&self, bundle_id: &str, item: BundleItem) -> Result<Bundle, SourceError> {
        let mut bundle = self.require(bundle_id).await?;
        let raw_id = item.tmdb_id.to_string();
        if !bundle.content_ids.iter().any(|c| c.trim() == raw_id) {
            bundle.content_ids.push(raw_id);
        }
        match bundle.content_items.iter_mut().find(|i| i.tmdb_id == item.tmdb_id) {
            Some(existing) => *existing = item,
            None => bundle.content_items.push(item),
        }
        self.write_contents(&bundle).await?;
        Ok(bundle)
    }

    /// Returns false when the title wasn't in the bundle.
    pub async fn remove_item(&self, bundle_id: &str, tmdb_id: TmdbId) -> Result<bool, SourceError> {
        let mut bundle = self.require(bundle_id).await?;
        if !bundle.contains(tmdb_id) {
            return Ok(false);
        }
        let raw_id = tmdb_id.to_string();
        bundle.content_ids.retain(|c| c.trim() != raw_id);
        bundle.content_items.retain(|i| i.tmdb_id != tmdb_id);
        self.write_contents(&bundle).await?;
        Ok(true)
    }

    pub async fn delete(&self, bundle_id: &str) -> Result<(), SourceError> {
        self.store.delete(Collection::Bundles.name(), bundle_id).await
    }

    /// Record the media types titles actually resolved under, in one
    /// read-modify-write of the bundle. Other fields of an existing item are
    /// kept; missing items are appended.
    pub async fn set_item_media_types(&self, bundle_id: &str, corrections: Vec<BundleItem>) -> Result<(), SourceError> {
        if corrections.is_empty() {
            return Ok(());
        }
        let mut bundle = self.require(bundle_id).await?;
        for correction in corrections {
            debug!("Bundle {} item {} is {}", bundle_id, correction.tmdb_id, correction.media_type);
            match bundle.content_items.iter_mut().find(|i| i.tmdb_id == correction.tmdb_id) {
                Some(item) => {
                    item.media_type = correction.media_type;
                    item.title = item.title.take().or(correction.title);
                    item.poster_path = item.poster_path.take().or(correction.poster_path);
                }
                None => bundle.content_items.push(correction),
            }
        }
        self.write_contents(&bundle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairwatch_models::MediaType;
    use pairwatch_sources::MemoryStore;

    fn item(tmdb_id: TmdbId, media_type: MediaType) -> BundleItem {
        BundleItem {
            tmdb_id,
            media_type,
            title: None,
            poster_path: None,
        }
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("  Cozy Nights!! "), "cozy-nights");
        assert_eq!(slug("???"), "bundle");
    }

    #[tokio::test]
    async fn test_create_add_remove_delete() {
        let repo = BundleRepository::new(Arc::new(MemoryStore::new()));
        let bundle = repo.create("Cozy nights", "alex", vec![item(10, MediaType::Movie)]).await.unwrap();
        assert!(bundle.id.starts_with("cozy-nights-"));
        assert_eq!(bundle.content_ids, vec!["10".to_string()]);

        let updated = repo.add_item(&bundle.id, item(20, MediaType::Tv)).await.unwrap();
        assert_eq!(updated.content_ids, vec!["10".to_string(), "20".to_string()]);
        repo.add_item(&bundle.id, item(20, MediaType::Tv)).await.unwrap();
        let stored = repo.get(&bundle.id).await.unwrap().unwrap();
        assert_eq!(stored.content_items.len(), 2);
        assert_eq!(stored.title, "Cozy nights");

        assert!(repo.remove_item(&bundle.id, 10).await.unwrap());
        assert!(!repo.remove_item(&bundle.id, 10).await.unwrap());
        assert_eq!(repo.get(&bundle.id).await.unwrap().unwrap().entries(), vec![(20, Some(MediaType::Tv))]);

        repo.delete(&bundle.id).await.unwrap();
        assert!(repo.get(&bundle.id).await.unwrap().is_none());
        assert!(repo.add_item(&bundle.id, item(1, MediaType::Movie)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_set_item_media_types_updates_or_appends() {
        let store = Arc::new(MemoryStore::new());
        let repo = BundleRepository::new(store.clone());
        let legacy: Document = serde_json::from_value(json!({
            "title": "Legacy",
            "createdBy": "sam",
            "contentIds": ["100", "200"],
            "contentItems": [{"tmdbId": "200", "mediaType": "movie", "title": "Two"}],
            "createdAt": "2023-01-01T00:00:00Z",
        }))
        .unwrap();
        store.set("bundles", "legacy", legacy).await.unwrap();

        let mut one = item(100, MediaType::Tv);
        one.title = Some("One".to_string());
        repo.set_item_media_types("legacy", vec![item(200, MediaType::Tv), one])
            .await
            .unwrap();
        repo.set_item_media_types("missing", Vec::new()).await.unwrap();

        let bundle = repo.get("legacy").await.unwrap().unwrap();
        assert_eq!(bundle.id, "legacy");
        assert_eq!(bundle.item(200).unwrap().media_type, MediaType::Tv);
        assert_eq!(bundle.item(200).unwrap().title.as_deref(), Some("Two"));
        assert_eq!(bundle.item(100).unwrap().title.as_deref(), Some("One"));
        assert_eq!(bundle.content_ids, vec!["100".to_string(), "200".to_string()]);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let repo = BundleRepository::new(Arc::new(MemoryStore::new()));
        let older = repo.create("Older", "alex", Vec::new()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = repo.create("Newer", "sam", Vec::new()).await.unwrap();

        let ids: Vec<String> = repo.list().await.unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }
}
