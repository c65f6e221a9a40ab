use anyhow::{anyhow, Result};
use std::path::PathBuf;

/// Base directory inside the container image, `/app` unless
/// `PAIRWATCH_BASE_PATH` says otherwise.
fn container_base_path() -> PathBuf {
    std::env::var("PAIRWATCH_BASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/app"))
}

/// Where pairwatch keeps its config, secrets and local store.
pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl PathManager {
    /// The platform config directory, e.g. `~/.config/pairwatch`.
    pub fn new() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?
            .join("pairwatch");
        Ok(Self::with_base(base))
    }

    /// Config files at `base`, data in a subdirectory.
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            data_dir: base.join("data"),
            config_dir: base,
        }
    }

    /// Root of the local document store (one JSON file per collection).
    pub fn store_dir(&self) -> PathBuf {
        self.data_dir.join("store")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir.join("credentials.toml")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(self.store_dir())?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // The container base directory only exists inside the image.
        let base = container_base_path();
        if base.exists() {
            return Self::with_base(base);
        }
        Self::new().unwrap_or_else(|_| Self::with_base(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_base() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathManager::with_base(dir.path().to_path_buf());
        paths.ensure_directories().unwrap();

        assert_eq!(paths.config_file(), dir.path().join("config.toml"));
        assert_eq!(paths.store_dir(), dir.path().join("data").join("store"));
        assert_eq!(paths.credentials_file(), dir.path().join("credentials.toml"));
        assert!(paths.store_dir().is_dir());
    }
}
