use crate::output::{check_mark, styled_table, Output};
use crate::ConfigCommands;
use color_eyre::eyre::{eyre, Result};
use comfy_table::{Attribute, Cell};
use owo_colors::OwoColorize;
use pairwatch_config::{Config, CredentialKey, CredentialStore, PathManager, StoreBackend};
use serde_json::json;

pub async fn run_config(cmd: ConfigCommands, paths: &PathManager, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, paths, output),
        ConfigCommands::Init { force } => init_config(force, paths, output),
        ConfigCommands::SetCredential { key, value } => set_credential(&key, &value, paths, output),
    }
}

fn show_config(full: bool, paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'pairwatch config init' to create one.");
        return Ok(());
    }

    let config = Config::load_from_file(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;

    let secret = |value: Option<String>| -> String {
        match value {
            Some(v) if full => v,
            Some(v) => mask_string(&v),
            None => "<not set>".to_string(),
        }
    };
    let tmdb_key = secret(credentials.get_tmdb_api_key());
    let omdb_key = secret(credentials.get_omdb_api_key());
    let firestore_token = secret(credentials.get_firestore_token());
    let validation = config.validate().err().map(|e| e.to_string());

    output.render(
        json!({
            "config_file": config_file.display().to_string(),
            "credentials_file": paths.credentials_file().display().to_string(),
            "valid": validation.is_none(),
            "validation_error": validation,
            "profiles": config.profiles,
            "store": config.store,
            "catalog": config.catalog,
            "ratings": config.ratings,
            "cache": config.cache,
            "import": config.import,
            "logging": config.logging,
            "credentials": {
                "tmdb_api_key": tmdb_key,
                "omdb_api_key": omdb_key,
                "firestore_token": firestore_token,
            },
        }),
        || {
            println!("\n{}\n", "Configuration".bright_cyan().bold());

            let mut files = styled_table(["Files", ""]);
            files.add_row(vec![
                Cell::new("Config").add_attribute(Attribute::Bold),
                Cell::new(config_file.display()),
            ]);
            files.add_row(vec![
                Cell::new("Credentials").add_attribute(Attribute::Bold),
                Cell::new(paths.credentials_file().display()),
            ]);
            output.table(&files);

            let mut profiles = styled_table(["Profiles", "Id", "Name"]);
            profiles.add_row(vec!["Primary", config.profiles.primary.id.as_str(), config.profiles.primary.name.as_str()]);
            profiles.add_row(vec!["Partner", config.profiles.partner.id.as_str(), config.profiles.partner.name.as_str()]);
            output.table(&profiles);

            let mut store = styled_table(["Store", ""]);
            match config.store.backend {
                StoreBackend::Firestore => {
                    store.add_row(vec!["Backend", "firestore"]);
                    if let Some(firestore) = &config.store.firestore {
                        store.add_row(vec!["Project", firestore.project_id.as_str()]);
                        store.add_row(vec!["Database", firestore.database.as_str()]);
                    }
                    store.add_row(vec!["Token".to_string(), firestore_token.clone()]);
                }
                StoreBackend::Local => {
                    store.add_row(vec!["Backend", "local"]);
                    let dir = config
                        .store
                        .local_dir
                        .clone()
                        .unwrap_or_else(|| paths.store_dir());
                    store.add_row(vec!["Directory".to_string(), dir.display().to_string()]);
                }
            }
            output.table(&store);

            let mut apis = styled_table(["Catalog & Ratings", ""]);
            apis.add_row(vec!["TMDB", config.catalog.base_url.as_str()]);
            apis.add_row(vec!["TMDB API Key", tmdb_key.as_str()]);
            apis.add_row(vec!["Language / Region".to_string(), format!("{} / {}", config.catalog.language, config.catalog.region)]);
            apis.add_row(vec!["Ratings Enabled".to_string(), check_mark(config.ratings.enabled)]);
            apis.add_row(vec!["OMDb API Key", omdb_key.as_str()]);
            apis.add_row(vec!["Cache TTL".to_string(), format!("{}s", config.cache.ttl_seconds)]);
            output.table(&apis);

            let mut options = styled_table(["Options", ""]);
            options.add_row(vec!["Import Overwrites".to_string(), check_mark(config.import.overwrite)]);
            if let Some(logging) = &config.logging {
                options.add_row(vec!["Log Level", logging.level.as_str()]);
                if let Some(file) = &logging.file {
                    options.add_row(vec!["Log File".to_string(), file.display().to_string()]);
                }
            }
            output.table(&options);

            if let Some(problem) = &validation {
                output.warn(format!("Configuration is invalid: {}", problem));
            }
        },
    );
    Ok(())
}

fn init_config(force: bool, paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if config_file.exists() && !force {
        return Err(eyre!(
            "Configuration already exists at {}. Use --force to overwrite it.",
            config_file.display()
        ));
    }

    paths
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create directories: {}", e))?;
    Config::template()
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to write {}: {}", config_file.display(), e))?;

    output.render(
        json!({
            "type": "config_init",
            "config_file": config_file.display().to_string(),
            "credentials_file": paths.credentials_file().display().to_string(),
        }),
        || {
            output.success(format!("Wrote {}", config_file.display()));
            output.info("Next steps:");
            output.info("  1. Set the two profile ids and names under [profiles]");
            output.info(
                "  2. Run 'pairwatch config set-credential tmdb <key>' (and optionally omdb) or export PAIRWATCH_TMDB_API_KEY",
            );
            output.info("  3. Choose store.backend = \"local\" or \"firestore\"");
        },
    );
    Ok(())
}

fn set_credential(key: &str, value: &str, paths: &PathManager, output: &Output) -> Result<()> {
    let key: CredentialKey = key.parse()?;
    let mut credentials = CredentialStore::new(paths.credentials_file());
    credentials
        .load()
        .map_err(|e| eyre!("Failed to load credentials: {}", e))?;
    credentials.set(key, value);
    credentials
        .save()
        .map_err(|e| eyre!("Failed to write {}: {}", credentials.path().display(), e))?;

    let cleared = value.trim().is_empty();
    output.render(
        json!({
            "type": "credential_set",
            "key": key.as_str(),
            "cleared": cleared,
            "credentials_file": credentials.path().display().to_string(),
        }),
        || {
            if cleared {
                output.success(format!("Cleared {}", key));
            } else {
                output.success(format!("Saved {} ({})", key, mask_string(value.trim())));
            }
            if std::env::var(key.env_var()).is_ok_and(|v| !v.is_empty()) {
                output.warn(format!("{} is set and takes precedence over the file", key.env_var()));
            }
        },
    );
    Ok(())
}

fn mask_string(s: &str) -> String {
    if s.is_empty() {
        return "<not set>".to_string();
    }
    if s.chars().count() <= 4 {
        return "*".repeat(s.chars().count());
    }
    let chars: Vec<char> = s.chars().collect();
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "<not set>");
        assert_eq!(mask_string("abc"), "***");
        assert_eq!(mask_string("abcdef123456"), "ab***56");
    }

    #[tokio::test]
    async fn test_set_credential_persists_and_clears() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = PathManager::with_base(dir.path().to_path_buf());
        let output = Output::new(crate::output::OutputFormat::Json, true);

        let set = ConfigCommands::SetCredential {
            key: "omdb".to_string(),
            value: "omdb-secret".to_string(),
        };
        run_config(set, &paths, &output).await.unwrap();
        let mut stored = CredentialStore::new(paths.credentials_file());
        stored.load().unwrap();
        assert_eq!(stored.get_omdb_api_key().as_deref(), Some("omdb-secret"));

        set_credential("omdb_api_key", "", &paths, &output).unwrap();
        let mut cleared = CredentialStore::new(paths.credentials_file());
        cleared.load().unwrap();
        assert_eq!(cleared.get_omdb_api_key(), None);

        assert!(set_credential("trakt", "x", &paths, &output).is_err());
    }
}
