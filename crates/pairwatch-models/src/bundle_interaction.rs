use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::{BundleStatus, MediaType, TmdbId};

/// A rating scoped to one bundle (`bundle_interactions`), independent of the global record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BundleInteraction {
    pub bundle_id: String,
    pub user_id: String,
    #[serde(with = "crate::tmdb_id")]
    pub tmdb_id: TmdbId,
    #[serde(default)]
    pub content_type: MediaType,
    pub status: BundleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BundleInteraction {
    pub fn doc_id(&self) -> String {
        crate::collections::bundle_interaction_doc_id(&self.bundle_id, &self.user_id, self.tmdb_id)
    }
}
