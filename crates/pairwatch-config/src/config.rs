use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub profiles: ProfilesConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ratings: RatingsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("profile id for '{0}' cannot be empty")]
    EmptyProfileId(&'static str),
    #[error("profile id '{0}' cannot contain '_' (used as the document id separator)")]
    InvalidProfileId(String),
    #[error("primary and partner profiles must have different ids (both are '{0}')")]
    DuplicateProfile(String),
    #[error("firestore backend selected but store.firestore.project_id is not set")]
    MissingFirestoreProject,
    #[error("cache.ttl_seconds must be greater than zero")]
    ZeroTtl,
    #[error("unknown profile '{0}'")]
    UnknownProfile(String),
    #[error("unknown credential '{0}' (expected tmdb_api_key, omdb_api_key or firestore_token)")]
    UnknownCredential(String),
}

/// One of the two fixed people using the app.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilesConfig {
    pub primary: Profile,
    pub partner: Profile,
}

impl ProfilesConfig {
    pub fn get(&self, user_id: &str) -> Option<&Profile> {
        [&self.primary, &self.partner].into_iter().find(|p| p.id == user_id)
    }

    /// The other profile of the pair.
    pub fn partner_of(&self, user_id: &str) -> Result<&Profile, ConfigError> {
        if self.primary.id == user_id {
            Ok(&self.partner)
        } else if self.partner.id == user_id {
            Ok(&self.primary)
        } else {
            Err(ConfigError::UnknownProfile(user_id.to_string()))
        }
    }

    pub fn all(&self) -> [&Profile; 2] {
        [&self.primary, &self.partner]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Firestore,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,
    #[serde(default)]
    pub firestore: Option<FirestoreConfig>,
    /// Overrides the data-dir location used by the local backend.
    #[serde(default)]
    pub local_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreConfig {
    pub project_id: String,
    #[serde(default = "default_firestore_database")]
    pub database: String,
    #[serde(default = "default_firestore_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_base_url")]
    pub base_url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_region")]
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ratings_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Re-rate titles the user already has an interaction for.
    #[serde(default)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_store_backend() -> StoreBackend {
    StoreBackend::Local
}

fn default_firestore_database() -> String {
    "(default)".to_string()
}

fn default_firestore_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_catalog_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_region() -> String {
    "US".to_string()
}

fn default_ratings_base_url() -> String {
    "https://www.omdbapi.com".to_string()
}

fn default_ttl_seconds() -> u64 {
    300 // 5 minutes
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            firestore: None,
            local_dir: None,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_base_url(),
            language: default_language(),
            region: default_region(),
        }
    }
}

impl Default for RatingsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_ratings_base_url(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

impl Config {
    /// Starter configuration written by `pairwatch config init`.
    pub fn template() -> Self {
        Self {
            profiles: ProfilesConfig {
                primary: Profile {
                    id: "user1".to_string(),
                    name: "User 1".to_string(),
                },
                partner: Profile {
                    id: "user2".to_string(),
                    name: "User 2".to_string(),
                },
            },
            store: StoreConfig::default(),
            catalog: CatalogConfig::default(),
            ratings: RatingsConfig::default(),
            cache: CacheConfig::default(),
            import: ImportConfig::default(),
            logging: None,
        }
    }

    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, profile) in [("primary", &self.profiles.primary), ("partner", &self.profiles.partner)] {
            if profile.id.trim().is_empty() {
                return Err(ConfigError::EmptyProfileId(label));
            }
            if profile.id.contains('_') {
                return Err(ConfigError::InvalidProfileId(profile.id.clone()));
            }
        }
        if self.profiles.primary.id == self.profiles.partner.id {
            return Err(ConfigError::DuplicateProfile(self.profiles.primary.id.clone()));
        }

        if self.store.backend == StoreBackend::Firestore {
            let configured = self
                .store
                .firestore
                .as_ref()
                .map(|f| !f.project_id.trim().is_empty())
                .unwrap_or(false);
            if !configured {
                return Err(ConfigError::MissingFirestoreProject);
            }
        }

        if self.cache.ttl_seconds == 0 {
            return Err(ConfigError::ZeroTtl);
        }

        Ok(())
    }
}
