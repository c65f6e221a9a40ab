use chrono::{DateTime, Utc};
use pairwatch_models::{
    bundle_interaction_doc_id, interaction_doc_id, BundleInteraction, BundleStatus, Collection, ContentSnapshot,
    Interaction, InteractionStatus, MediaType, TmdbId,
};
use pairwatch_sources::{DocumentStore, FieldFilter, SourceError};
use std::sync::Arc;
use tracing::debug;
use crate::documents::{decode_all, from_document, to_document};

/// Global per-user ratings in `user_interactions`.
#[derive(Clone)]
pub struct InteractionRepository {
    store: Arc<dyn DocumentStore>,
}

impl InteractionRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: &str, tmdb_id: TmdbId) -> Result<Option<Interaction>, SourceError> {
        let id = interaction_doc_id(user_id, tmdb_id);
        self.store
            .get(Collection::UserInteractions.name(), &id)
            .await?
            .map(from_document)
            .transpose()
    }

    /// Upsert the user's status for a title. `createdAt` and an existing
    /// metadata snapshot survive; `updatedAt` is set to `at`.
    pub async fn set_status(
        &self,
        user_id: &str,
        tmdb_id: TmdbId,
        content_type: MediaType,
        status: InteractionStatus,
        snapshot: Option<ContentSnapshot>,
        at: DateTime<Utc>,
    ) -> Result<Interaction, SourceError> {
        let existing = self.get(user_id, tmdb_id).await?;
        let interaction = Interaction {
            user_id: user_id.to_string(),
            tmdb_id,
            content_type,
            status,
            metadata: snapshot.or_else(|| existing.as_ref().and_then(|e| e.metadata.clone())),
            created_at: existing.as_ref().map(|e| e.created_at).unwrap_or(at),
            updated_at: at,
        };

        debug!("Setting {} -> {} for {}", interaction.doc_id(), status, user_id);
        self.store
            .merge(
                Collection::UserInteractions.name(),
                &interaction.doc_id(),
                to_document(&interaction)?,
            )
            .await?;
        Ok(interaction)
    }

    pub async fn remove(&self, user_id: &str, tmdb_id: TmdbId) -> Result<(), SourceError> {
        self.store
            .delete(Collection::UserInteractions.name(), &interaction_doc_id(user_id, tmdb_id))
            .await
    }

    pub async fn for_user(&self, user_id: &str) -> Result<Vec<Interaction>, SourceError> {
        let collection = Collection::UserInteractions.name();
        let docs = self.store.query(collection, &[FieldFilter::eq("userId", user_id)]).await?;
        Ok(decode_all(collection, docs))
    }

    pub async fn for_user_with_status(
        &self,
        user_id: &str,
        statuses: &[InteractionStatus],
    ) -> Result<Vec<Interaction>, SourceError> {
        Ok(self
            .for_user(user_id)
            .await?
            .into_iter()
            .filter(|i| statuses.contains(&i.status))
            .collect())
    }
}

/// Per-bundle ratings in `bundle_interactions`.
#[derive(Clone)]
pub struct BundleInteractionRepository {
    store: Arc<dyn DocumentStore>,
}

impl BundleInteractionRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, bundle_id: &str, user_id: &str, tmdb_id: TmdbId) -> Result<Option<BundleInteraction>, SourceError> {
        let id = bundle_interaction_doc_id(bundle_id, user_id, tmdb_id);
        self.store
            .get(Collection::BundleInteractions.name(), &id)
            .await?
            .map(from_document)
            .transpose()
    }

    pub async fn set_status(
        &self,
        bundle_id: &str,
        user_id: &str,
        tmdb_id: TmdbId,
        content_type: MediaType,
        status: BundleStatus,
    ) -> Result<BundleInteraction, SourceError> {
        let now = Utc::now();
        let existing = self.get(bundle_id, user_id, tmdb_id).await?;
        let record = BundleInteraction {
            bundle_id: bundle_id.to_string(),
            user_id: user_id.to_string(),
            tmdb_id,
            content_type,
            status,
            created_at: existing.map(|e| e.created_at).unwrap_or(now),
            updated_at: now,
        };
        self.store
            .merge(Collection::BundleInteractions.name(), &record.doc_id(), to_document(&record)?)
            .await?;
        Ok(record)
    }

    pub async fn restore(
        &self,
        bundle_id: &str,
        user_id: &str,
        tmdb_id: TmdbId,
        previous: Option<&BundleInteraction>,
    ) -> Result<(), SourceError> {
        let id = bundle_interaction_doc_id(bundle_id, user_id, tmdb_id);
        match previous {
            Some(record) => {
                self.store
                    .set(Collection::BundleInteractions.name(), &id, to_document(record)?)
                    .await
            }
            None => self.store.delete(Collection::BundleInteractions.name(), &id).await,
        }
    }

    pub async fn remove(&self, bundle_id: &str, user_id: &str, tmdb_id: TmdbId) -> Result<(), SourceError> {
        self.store
            .delete(
                Collection::BundleInteractions.name(),
                &bundle_interaction_doc_id(bundle_id, user_id, tmdb_id),
            )
            .await
    }

    pub async fn for_bundle_user(&self, bundle_id: &str, user_id: &str) -> Result<Vec<BundleInteraction>, SourceError> {
        let collection = Collection::BundleInteractions.name();
        let docs = self
            .store
            .query(
                collection,
                &[FieldFilter::eq("bundleId", bundle_id), FieldFilter::eq("userId", user_id)],
            )
            .await?;
        Ok(decode_all(collection, docs))
    }

    /// Delete every rating recorded inside `bundle_id`; returns how many.
    pub async fn remove_all_for_bundle(&self, bundle_id: &str) -> Result<usize, SourceError> {
        let collection = Collection::BundleInteractions.name();
        let docs = self.store.query(collection, &[FieldFilter::eq("bundleId", bundle_id)]).await?;
        for doc in &docs {
            self.store.delete(collection, &doc.id).await?;
        }
        debug!("Removed {} rating(s) from bundle {}", docs.len(), bundle_id);
        Ok(docs.len())
    }
}
