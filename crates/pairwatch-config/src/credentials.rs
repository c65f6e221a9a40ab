use crate::config::ConfigError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// The secrets pairwatch knows how to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKey {
    TmdbApiKey,
    OmdbApiKey,
    FirestoreToken,
}

impl CredentialKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TmdbApiKey => "tmdb_api_key",
            Self::OmdbApiKey => "omdb_api_key",
            Self::FirestoreToken => "firestore_token",
        }
    }

    /// `PAIRWATCH_TMDB_API_KEY` and friends.
    pub fn env_var(&self) -> String {
        format!("PAIRWATCH_{}", self.as_str().to_uppercase())
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "tmdb" | "tmdb_api_key" => Ok(Self::TmdbApiKey),
            "omdb" | "omdb_api_key" => Ok(Self::OmdbApiKey),
            "firestore" | "firestore_token" => Ok(Self::FirestoreToken),
            _ => Err(ConfigError::UnknownCredential(s.to_string())),
        }
    }
}

/// On-disk layout of `credentials.toml`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tmdb_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    omdb_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    firestore_token: Option<String>,
}

impl CredentialsFile {
    fn slot(&mut self, key: CredentialKey) -> &mut Option<String> {
        match key {
            CredentialKey::TmdbApiKey => &mut self.tmdb_api_key,
            CredentialKey::OmdbApiKey => &mut self.omdb_api_key,
            CredentialKey::FirestoreToken => &mut self.firestore_token,
        }
    }

    fn value(&self, key: CredentialKey) -> Option<&String> {
        match key {
            CredentialKey::TmdbApiKey => self.tmdb_api_key.as_ref(),
            CredentialKey::OmdbApiKey => self.omdb_api_key.as_ref(),
            CredentialKey::FirestoreToken => self.firestore_token.as_ref(),
        }
    }
}

/// API secrets kept outside `config.toml`.
///
/// Each lookup checks the key's `PAIRWATCH_<KEY>` environment variable first,
/// so containers can inject secrets without writing the file.
pub struct CredentialStore {
    path: PathBuf,
    file: CredentialsFile,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: CredentialsFile::default(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            self.file = toml::from_str(&content)?;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string_pretty(&self.file)?)?;
        Ok(())
    }

    pub fn get(&self, key: CredentialKey) -> Option<String> {
        std::env::var(key.env_var())
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.file.value(key).cloned())
    }

    /// Store `value` for `key`; an empty value clears it.
    pub fn set(&mut self, key: CredentialKey, value: &str) {
        let value = value.trim();
        *self.file.slot(key) = (!value.is_empty()).then(|| value.to_string());
    }

    pub fn get_tmdb_api_key(&self) -> Option<String> {
        self.get(CredentialKey::TmdbApiKey)
    }

    pub fn get_omdb_api_key(&self) -> Option<String> {
        self.get(CredentialKey::OmdbApiKey)
    }

    pub fn get_firestore_token(&self) -> Option<String> {
        self.get(CredentialKey::FirestoreToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_credentials_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("credentials.toml");

        let mut store = CredentialStore::new(path.clone());
        store.set(CredentialKey::OmdbApiKey, "omdb-secret");
        store.set(CredentialKey::FirestoreToken, " ya29.token ");
        store.save().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("omdb_api_key = \"omdb-secret\""));
        assert!(!written.contains("tmdb_api_key"));

        let mut loaded = CredentialStore::new(path);
        loaded.load().unwrap();
        assert_eq!(loaded.get_omdb_api_key().as_deref(), Some("omdb-secret"));
        assert_eq!(loaded.get_firestore_token().as_deref(), Some("ya29.token"));

        loaded.set(CredentialKey::OmdbApiKey, "");
        assert_eq!(loaded.get_omdb_api_key(), None);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/pairwatch-test-credentials"));
        store.set(CredentialKey::TmdbApiKey, "from-file");
        assert_eq!(store.get_tmdb_api_key().as_deref(), Some("from-file"));

        std::env::set_var("PAIRWATCH_TMDB_API_KEY", "from-env");
        assert_eq!(store.get_tmdb_api_key().as_deref(), Some("from-env"));
        std::env::remove_var("PAIRWATCH_TMDB_API_KEY");
    }

    #[test]
    fn test_key_names() {
        assert_eq!("tmdb".parse::<CredentialKey>().unwrap(), CredentialKey::TmdbApiKey);
        assert_eq!("OMDB-API-KEY".parse::<CredentialKey>().unwrap(), CredentialKey::OmdbApiKey);
        assert_eq!("firestore_token".parse::<CredentialKey>().unwrap(), CredentialKey::FirestoreToken);
        assert_eq!(
            "trakt".parse::<CredentialKey>().unwrap_err(),
            ConfigError::UnknownCredential("trakt".to_string())
        );
        assert_eq!(CredentialKey::FirestoreToken.env_var(), "PAIRWATCH_FIRESTORE_TOKEN");
    }
}
