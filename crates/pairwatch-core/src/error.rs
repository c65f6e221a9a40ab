use pairwatch_models::TmdbId;
use pairwatch_sources::SourceError;
use std::fmt;

/// Step of the bundle "never" write that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    BundleRating,
    GlobalRating,
}

impl fmt::Display for WriteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStep::BundleRating => f.write_str("bundle rating"),
            WriteStep::GlobalRating => f.write_str("global rating"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compensation {
    /// Nothing had been written yet.
    NotNeeded,
    RolledBack,
    /// The bundle record could not be put back and now disagrees with the
    /// global one.
    Failed,
}

impl fmt::Display for Compensation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compensation::NotNeeded => f.write_str("not needed"),
            Compensation::RolledBack => f.write_str("rolled back"),
            Compensation::Failed => f.write_str("rollback failed"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("'never' for {tmdb_id} in bundle {bundle_id} failed at the {step} write ({source}); {compensation}")]
pub struct DualWriteError {
    pub bundle_id: String,
    pub tmdb_id: TmdbId,
    pub step: WriteStep,
    pub source: SourceError,
    pub compensation: Compensation,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("cannot read watchlist export: {0}")]
    Export(String),
    #[error(transparent)]
    Profile(#[from] pairwatch_config::ConfigError),
}
