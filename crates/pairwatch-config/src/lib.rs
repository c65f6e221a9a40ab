pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{
    CacheConfig, CatalogConfig, Config, ConfigError, FirestoreConfig, ImportConfig, LoggingConfig, Profile,
    ProfilesConfig, RatingsConfig, StoreBackend, StoreConfig,
};
pub use credentials::{CredentialKey, CredentialStore};
pub use paths::PathManager;
