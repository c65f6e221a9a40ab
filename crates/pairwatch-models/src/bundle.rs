use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::{MediaType, TmdbId};

/// Entry in a bundle's `contentItems`. Its `media_type` is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BundleItem {
    #[serde(with = "crate::tmdb_id")]
    pub tmdb_id: TmdbId,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
}

/// A user-curated themed list.
///
/// `content_ids` is the legacy ordered id list and may reference titles that
/// have no `content_items` entry yet; those resolve with a guessed media type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub id: String,
    pub title: String,
    pub created_by: String,
    #[serde(default)]
    pub content_ids: Vec<String>,
    #[serde(default)]
    pub content_items: Vec<BundleItem>,
    pub created_at: DateTime<Utc>,
}

impl Bundle {
    pub fn item(&self, tmdb_id: TmdbId) -> Option<&BundleItem> {
        self.content_items.iter().find(|item| item.tmdb_id == tmdb_id)
    }

    /// Every title in the bundle, in `content_ids` order followed by any
    /// `content_items` entries missing from the legacy list. Each id is paired
    /// with its stored media type, if known.
    pub fn entries(&self) -> Vec<(TmdbId, Option<MediaType>)> {
        let mut seen = std::collections::HashSet::new();
        let mut entries = Vec::new();

        for raw in &self.content_ids {
            let Ok(tmdb_id) = raw.trim().parse::<TmdbId>() else {
                continue;
            };
            if seen.insert(tmdb_id) {
                entries.push((tmdb_id, self.item(tmdb_id).map(|item| item.media_type)));
            }
        }
        for item in &self.content_items {
            if seen.insert(item.tmdb_id) {
                entries.push((item.tmdb_id, Some(item.media_type)));
            }
        }
        entries
    }

    pub fn contains(&self, tmdb_id: TmdbId) -> bool {
        self.item(tmdb_id).is_some() || self.content_ids.iter().any(|raw| raw.trim() == tmdb_id.to_string())
    }
}
