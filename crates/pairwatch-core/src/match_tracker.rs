use pairwatch_models::{match_doc_id, Collection, MatchRecord, TmdbId};
use pairwatch_sources::{DocumentStore, FieldFilter, SourceError};
use std::sync::Arc;
use tracing::{debug, warn};
use crate::documents::{decode_all, from_document, to_document};

/// Maintains the `matches` collection: who liked each title.
///
/// This is a projection for cheap listing. Match decisions always come from
/// recomputing over the interaction records, so a missed update here is only
/// logged.
#[derive(Clone)]
pub struct MatchTracker {
    store: Arc<dyn DocumentStore>,
}

impl MatchTracker {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, tmdb_id: TmdbId) -> Result<Option<MatchRecord>, SourceError> {
        self.store
            .get(Collection::Matches.name(), &match_doc_id(tmdb_id))
            .await?
            .map(from_document)
            .transpose()
    }

    pub async fn active(&self) -> Result<Vec<MatchRecord>, SourceError> {
        let collection = Collection::Matches.name();
        let docs = self
            .store
            .query(collection, &[FieldFilter::eq("isActiveMatch", true)])
            .await?;
        Ok(decode_all(collection, docs))
    }

    /// Best-effort update after a rating change.
    pub async fn record(&self, user_id: &str, tmdb_id: TmdbId, positive: bool) {
        if let Err(e) = self.apply(user_id, tmdb_id, positive).await {
            warn!("Match record for {} not updated after {}'s rating: {}", tmdb_id, user_id, e);
        }
    }

    /// Add or drop `user_id` from the record. Returns the record as stored,
    /// `None` once nobody is left on it.
    pub async fn apply(&self, user_id: &str, tmdb_id: TmdbId, positive: bool) -> Result<Option<MatchRecord>, SourceError> {
        let collection = Collection::Matches.name();
        let id = match_doc_id(tmdb_id);
        let mut record = self.get(tmdb_id).await?.unwrap_or_else(|| MatchRecord::new(tmdb_id));

        let changed = if positive {
            record.add_user(user_id)
        } else {
            record.remove_user(user_id)
        };

        if record.users.is_empty() {
            self.store.delete(collection, &id).await?;
            return Ok(None);
        }
        if changed {
            debug!(
                "Match record {} now has {} user(s), active: {}",
                tmdb_id,
                record.users.len(),
                record.is_active_match
            );
            self.store.set(collection, &id, to_document(&record)?).await?;
        }
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FlakyStore;
    use pairwatch_sources::MemoryStore;

    #[tokio::test]
    async fn test_active_flag_follows_membership() {
        let tracker = MatchTracker::new(Arc::new(MemoryStore::new()));

        let record = tracker.apply("user1", 100, true).await.unwrap().unwrap();
        assert!(!record.is_active_match);
        let record = tracker.apply("user2", 100, true).await.unwrap().unwrap();
        assert!(record.is_active_match);
        assert_eq!(tracker.active().await.unwrap().len(), 1);

        let record = tracker.apply("user1", 100, false).await.unwrap().unwrap();
        assert!(!record.is_active_match);
        assert!(tracker.active().await.unwrap().is_empty());

        assert!(tracker.apply("user2", 100, false).await.unwrap().is_none());
        assert!(tracker.get(100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_swallows_store_failures() {
        let store = Arc::new(FlakyStore::new());
        store.fail_writes_to("matches");
        let tracker = MatchTracker::new(store);
        tracker.record("user1", 5, true).await;
        assert!(tracker.get(5).await.unwrap().is_none());
    }
}
