pub mod bundle;
pub mod config;
pub mod import;
pub mod matches;
pub mod progress;
pub mod rate;
pub mod search;

use color_eyre::eyre::{eyre, Result};
use color_eyre::Report;
use pairwatch_config::{Config, ConfigError, CredentialStore, LoggingConfig, PathManager, Profile};
use pairwatch_core::{CachedCatalog, PairService};
use pairwatch_models::{ContentDetails, MediaType, TmdbId};
use pairwatch_sources::{build_catalog, build_document_store, build_ratings, CatalogApi};
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything a command needs once the configuration has been loaded.
pub struct AppContext {
    pub config: Config,
    pub service: PairService,
    catalog: Option<Arc<CachedCatalog>>,
    catalog_error: Option<String>,
}

impl AppContext {
    pub fn load(paths: &PathManager) -> Result<Self> {
        let config_file = paths.config_file();
        if !config_file.exists() {
            return Err(eyre!(
                "No configuration found at {}. Run 'pairwatch config init' first.",
                config_file.display()
            ));
        }

        let config = Config::load_from_file(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
        config.validate()?;
        paths.ensure_directories().map_err(to_report)?;

        let mut credentials = CredentialStore::new(paths.credentials_file());
        credentials.load().map_err(to_report)?;

        let store = build_document_store(&config, &credentials, paths).map_err(to_report)?;
        debug!(backend = store.backend_name(), "Document store ready");
        let service = PairService::new(store, config.profiles.clone());

        let (catalog, catalog_error) = match build_catalog(&config, &credentials) {
            Ok(api) => {
                let ratings = build_ratings(&config, &credentials);
                let cached = CachedCatalog::new(api, ratings, config.cache.ttl());
                (Some(Arc::new(cached)), None)
            }
            Err(e) => {
                debug!(error = %e, "Catalog unavailable");
                (None, Some(e.to_string()))
            }
        };

        Ok(Self {
            config,
            service,
            catalog,
            catalog_error,
        })
    }

    /// The catalog, or an error explaining why it isn't configured.
    pub fn catalog(&self) -> Result<Arc<CachedCatalog>> {
        match &self.catalog {
            Some(catalog) => Ok(Arc::clone(catalog)),
            None => Err(eyre!(
                "{}",
                self.catalog_error.as_deref().unwrap_or("catalog is not configured")
            )),
        }
    }

    pub fn catalog_if_configured(&self) -> Option<Arc<CachedCatalog>> {
        self.catalog.clone()
    }

    pub fn profile(&self, user_id: &str) -> Result<&Profile> {
        self.config
            .profiles
            .get(user_id)
            .ok_or_else(|| ConfigError::UnknownProfile(user_id.to_string()).into())
    }

    pub fn display_name<'a>(&'a self, user_id: &'a str) -> &'a str {
        self.config.profiles.get(user_id).map(|p| p.name.as_str()).unwrap_or(user_id)
    }

    /// Catalog details for a title, trying `hint` (movie when absent) and
    /// then the other type. `None` without a catalog or when neither type
    /// exists.
    pub async fn lookup_title(&self, tmdb_id: TmdbId, hint: Option<MediaType>) -> Option<ContentDetails> {
        let catalog = self.catalog.as_ref()?;
        let first = hint.unwrap_or(MediaType::Movie);
        for media_type in [first, first.other()] {
            match catalog.details(media_type, tmdb_id).await {
                Ok(details) => return Some(details),
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    warn!("Catalog lookup for {} {} failed: {}", media_type, tmdb_id, e);
                    return None;
                }
            }
        }
        None
    }
}

/// Logging settings from the config file, if it loads.
pub fn configured_logging(paths: &PathManager) -> Option<LoggingConfig> {
    Config::load_from_file(&paths.config_file()).ok()?.logging
}

pub fn to_report(e: anyhow::Error) -> Report {
    eyre!("{:#}", e)
}
