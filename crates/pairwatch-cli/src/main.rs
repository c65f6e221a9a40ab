use clap::{ArgAction, Parser, Subcommand};
use commands::{bundle, config, import, matches, rate, search, AppContext};
use pairwatch_config::PathManager;
use pairwatch_models::{MediaType, TmdbId};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "pairwatch")]
#[command(about = "Pairwatch - find what the two of you both want to watch")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rate a title, globally or inside a bundle
    #[command(long_about = "Rate a title for one profile. Global statuses: liked, not_important, wont_watch, watched, yes, no. With --bundle the status is one of yes, not_now, never; 'never' also marks the title wont_watch globally.")]
    Rate {
        /// Profile id
        user: String,
        /// TMDB id of the title
        tmdb_id: TmdbId,
        /// New status
        status: String,
        /// Media type (movie or tv); looked up in the catalog when omitted
        #[arg(long = "type", value_name = "TYPE")]
        media_type: Option<MediaType>,
        /// Rate inside this bundle instead of globally
        #[arg(long)]
        bundle: Option<String>,
    },
    /// Remove a rating
    Unrate {
        user: String,
        tmdb_id: TmdbId,
        #[arg(long)]
        bundle: Option<String>,
    },
    /// List titles both profiles rated positively
    Matches {
        /// Whose view to show (defaults to the primary profile)
        #[arg(long)]
        user: Option<String>,
        /// Only matches inside this bundle
        #[arg(long)]
        bundle: Option<String>,
    },
    /// Show a profile's rating for a title and what the partner did
    Status { user: String, tmdb_id: TmdbId },
    /// Search the catalog
    Search {
        query: String,
        #[arg(long = "type", value_name = "TYPE")]
        media_type: Option<MediaType>,
    },
    /// Manage bundles
    Bundle {
        #[command(subcommand)]
        cmd: BundleCommands,
    },
    /// Import a watchlist export (CSV with "added" and "title" columns) as liked titles
    Import {
        /// Path to the CSV export
        csv: PathBuf,
        /// Profile to import for
        #[arg(long)]
        user: String,
        /// Re-rate titles the profile already rated
        #[arg(long, action = ArgAction::SetTrue)]
        overwrite: bool,
    },
    /// Show or create the configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum BundleCommands {
    /// List all bundles, newest first
    List,
    /// Show a bundle's titles and both profiles' ratings
    Show { id: String },
    /// Create an empty bundle
    Create {
        title: String,
        /// Profile creating the bundle
        #[arg(long = "by")]
        created_by: String,
    },
    /// Add a title
    Add {
        id: String,
        tmdb_id: TmdbId,
        #[arg(long = "type", value_name = "TYPE")]
        media_type: Option<MediaType>,
    },
    /// Remove a title
    Remove { id: String, tmdb_id: TmdbId },
    /// Delete a bundle and every rating made inside it
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks credentials)
    Show {
        /// Show credentials unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Store a secret in credentials.toml (an empty value clears it)
    SetCredential {
        /// tmdb_api_key, omdb_api_key or firestore_token
        key: String,
        value: String,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let paths = PathManager::default();

    // A broken config is reported by the command itself.
    let log_settings = commands::configured_logging(&paths);
    logging::init_logging(cli.verbose, cli.quiet, log_settings.as_ref())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Config { cmd } => config::run_config(cmd, &paths, &output).await,
        Commands::Rate {
            user,
            tmdb_id,
            status,
            media_type,
            bundle,
        } => {
            let ctx = AppContext::load(&paths)?;
            rate::run_rate(&ctx, &user, tmdb_id, &status, media_type, bundle.as_deref(), &output).await
        }
        Commands::Unrate { user, tmdb_id, bundle } => {
            let ctx = AppContext::load(&paths)?;
            rate::run_unrate(&ctx, &user, tmdb_id, bundle.as_deref(), &output).await
        }
        Commands::Matches { user, bundle } => {
            let ctx = AppContext::load(&paths)?;
            matches::run_matches(&ctx, user.as_deref(), bundle.as_deref(), &output).await
        }
        Commands::Status { user, tmdb_id } => {
            let ctx = AppContext::load(&paths)?;
            matches::run_status(&ctx, &user, tmdb_id, &output).await
        }
        Commands::Search { query, media_type } => {
            let ctx = AppContext::load(&paths)?;
            search::run_search(&ctx, &query, media_type, &output).await
        }
        Commands::Bundle { cmd } => {
            let ctx = AppContext::load(&paths)?;
            bundle::run_bundle(&ctx, cmd, &output).await
        }
        Commands::Import { csv, user, overwrite } => {
            let ctx = AppContext::load(&paths)?;
            import::run_import(&ctx, &csv, &user, overwrite, &output).await
        }
    }
}
