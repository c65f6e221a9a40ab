use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::{InteractionStatus, MediaType, TmdbId};

/// Metadata copied from the catalog at rating time so lists render without a lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

/// One user's global rating of one title (`user_interactions`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub user_id: String,
    #[serde(with = "crate::tmdb_id")]
    pub tmdb_id: TmdbId,
    #[serde(default)]
    pub content_type: MediaType,
    pub status: InteractionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ContentSnapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Interaction {
    pub fn doc_id(&self) -> String {
        crate::collections::interaction_doc_id(&self.user_id, self.tmdb_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_string_tmdb_id_and_missing_content_type() {
        let doc = serde_json::json!({
            "userId": "alex",
            "tmdbId": "603",
            "status": "liked",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z",
        });
        let interaction: Interaction = serde_json::from_value(doc).unwrap();
        assert_eq!(interaction.tmdb_id, 603);
        assert_eq!(interaction.content_type, MediaType::Movie);
        assert!(interaction.metadata.is_none());
        assert_eq!(interaction.doc_id(), "alex_603");
    }
}
