use chrono::Utc;
use pairwatch_config::Profile;
use pairwatch_models::{Collection, UserProfile};
use pairwatch_sources::{DocumentStore, SourceError};
use std::sync::Arc;
use tracing::info;
use crate::documents::{from_document, to_document};

#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn DocumentStore>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, SourceError> {
        self.store
            .get(Collection::Users.name(), user_id)
            .await?
            .map(from_document)
            .transpose()
    }

    /// Upsert a configured profile, refreshing its display name.
    pub async fn ensure(&self, profile: &Profile) -> Result<UserProfile, SourceError> {
        match self.get(&profile.id).await? {
            Some(existing) if existing.display_name == profile.name => Ok(existing),
            existing => {
                let record = UserProfile {
                    id: profile.id.clone(),
                    display_name: profile.name.clone(),
                    created_at: existing.map(|e| e.created_at).unwrap_or_else(Utc::now),
                };
                self.store
                    .set(Collection::Users.name(), &record.id, to_document(&record)?)
                    .await?;
                info!("Saved profile {} ({})", record.id, record.display_name);
                Ok(record)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairwatch_sources::MemoryStore;

    #[tokio::test]
    async fn test_ensure_creates_then_renames() {
        let repo = ProfileRepository::new(Arc::new(MemoryStore::new()));
        let mut profile = Profile {
            id: "user1".to_string(),
            name: "Alex".to_string(),
        };

        let created = repo.ensure(&profile).await.unwrap();
        assert_eq!(created.display_name, "Alex");
        assert_eq!(repo.ensure(&profile).await.unwrap(), created);

        profile.name = "Alexandra".to_string();
        let renamed = repo.ensure(&profile).await.unwrap();
        assert_eq!(renamed.display_name, "Alexandra");
        assert_eq!(renamed.created_at, created.created_at);
    }
}
