pub mod bundles;
pub mod cache;
pub mod catalog;
pub mod documents;
pub mod error;
pub mod healing;
pub mod import;
pub mod interactions;
pub mod match_tracker;
pub mod matching;
pub mod profiles;
pub mod search;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use bundles::BundleRepository;
pub use cache::{TtlCache, DEFAULT_TTL};
pub use catalog::CachedCatalog;
pub use error::{Compensation, DualWriteError, ImportError, WriteStep};
pub use healing::{BundleContents, BundleResolver, ResolvedItem};
pub use import::{ImportReport, ImportedTitle, WatchlistImporter};
pub use interactions::{BundleInteractionRepository, InteractionRepository};
pub use match_tracker::MatchTracker;
pub use matching::{
    is_match, is_positive_bundle, is_positive_global, match_ids, mutual_positive, partner_loved_it, partner_status,
    PartnerStatus, Rated,
};
pub use profiles::ProfileRepository;
pub use search::{SearchOutcome, SearchSession};
pub use service::{BundleMatchView, MatchView, PairService, TitleStatus};
