pub mod bundle;
pub mod bundle_interaction;
pub mod catalog;
pub mod collections;
pub mod interaction;
pub mod match_record;
pub mod media;
pub mod profile;
pub mod status;
pub mod tmdb_id;

pub use bundle::{Bundle, BundleItem};
pub use bundle_interaction::BundleInteraction;
pub use catalog::{
    AggregatedRatings, CastMember, CatalogSummary, ContentDetails, Credits, ExternalIds, ProviderOffer,
    Video, WatchProviders,
};
pub use collections::{bundle_interaction_doc_id, interaction_doc_id, match_doc_id, Collection};
pub use interaction::{ContentSnapshot, Interaction};
pub use match_record::MatchRecord;
pub use media::{MediaType, ParseMediaTypeError};
pub use profile::UserProfile;
pub use status::{BundleStatus, InteractionStatus, ParseStatusError};
pub use tmdb_id::TmdbId;
