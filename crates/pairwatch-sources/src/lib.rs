pub mod error;
pub mod factory;
pub mod omdb;
pub mod store;
pub mod tmdb;
pub mod traits;
pub mod watchlist_csv;

pub use error::SourceError;
pub use factory::{build_catalog, build_document_store, build_ratings};
pub use omdb::OmdbClient;
pub use store::{FirestoreStore, LocalStore, MemoryStore};
pub use tmdb::TmdbClient;
pub use traits::{
    CatalogApi, DiscoverParams, Document, DocumentStore, FieldFilter, RatingsApi, RatingsQuery, StoredDocument,
    TrendingWindow,
};
pub use watchlist_csv::{parse_watchlist_export, parse_watchlist_reader, ExportRow};
