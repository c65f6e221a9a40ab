//! Construction of the remote boundaries from configuration.
//!
//! Centralises which implementation backs each trait so the CLI and tests
//! never branch on backend names themselves.

use anyhow::{anyhow, Result};
use pairwatch_config::{Config, CredentialStore, PathManager, StoreBackend};
use std::sync::Arc;
use tracing::{debug, info};
use crate::{CatalogApi, DocumentStore, FirestoreStore, LocalStore, OmdbClient, RatingsApi, TmdbClient};

pub fn build_document_store(
    config: &Config,
    credentials: &CredentialStore,
    paths: &PathManager,
) -> Result<Arc<dyn DocumentStore>> {
    match config.store.backend {
        StoreBackend::Firestore => {
            let firestore = config
                .store
                .firestore
                .as_ref()
                .ok_or_else(|| anyhow!("store.backend is 'firestore' but [store.firestore] is missing"))?;
            let token = credentials.get_firestore_token();
            if token.is_none() {
                debug!("No Firestore token configured; requests will be unauthenticated");
            }
            info!("Using Firestore project '{}' ({})", firestore.project_id, firestore.database);
            Ok(Arc::new(FirestoreStore::new(firestore, token)))
        }
        StoreBackend::Local => {
            let dir = config
                .store
                .local_dir
                .clone()
                .unwrap_or_else(|| paths.store_dir());
            info!("Using local document store at {:?}", dir);
            Ok(Arc::new(LocalStore::new(&dir)?))
        }
    }
}

pub fn build_catalog(config: &Config, credentials: &CredentialStore) -> Result<Arc<dyn CatalogApi>> {
    let api_key = credentials
        .get_tmdb_api_key()
        .ok_or_else(|| anyhow!("TMDB API key missing: set tmdb_api_key in credentials.toml or PAIRWATCH_TMDB_API_KEY"))?;
    Ok(Arc::new(TmdbClient::new(&config.catalog, api_key)))
}

/// `None` when ratings are disabled or no OMDb key is configured.
pub fn build_ratings(config: &Config, credentials: &CredentialStore) -> Option<Arc<dyn RatingsApi>> {
    if !config.ratings.enabled {
        return None;
    }
    match credentials.get_omdb_api_key() {
        Some(key) => Some(Arc::new(OmdbClient::new(&config.ratings, key))),
        None => {
            debug!("Ratings enabled but no OMDb key configured; skipping aggregated ratings");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairwatch_config::CredentialKey;

    #[test]
    fn test_local_backend_uses_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::template();
        config.store.local_dir = Some(dir.path().join("docs"));
        let credentials = CredentialStore::new(dir.path().join("credentials.toml"));
        let paths = PathManager::with_base(dir.path().to_path_buf());

        let store = build_document_store(&config, &credentials, &paths).unwrap();
        assert_eq!(store.backend_name(), "local");
        assert!(dir.path().join("docs").is_dir());
    }

    #[test]
    fn test_firestore_backend_requires_section() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::template();
        config.store.backend = StoreBackend::Firestore;
        let credentials = CredentialStore::new(dir.path().join("credentials.toml"));
        let paths = PathManager::with_base(dir.path().to_path_buf());

        assert!(build_document_store(&config, &credentials, &paths).is_err());
    }

    #[test]
    fn test_ratings_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::template();
        config.ratings.enabled = false;
        let mut credentials = CredentialStore::new(dir.path().join("credentials.toml"));
        credentials.set(CredentialKey::OmdbApiKey, "key");
        assert!(build_ratings(&config, &credentials).is_none());

        config.ratings.enabled = true;
        assert!(build_ratings(&config, &credentials).is_some());
    }
}
