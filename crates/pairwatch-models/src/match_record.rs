use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::TmdbId;

/// Projection document in `matches`: who liked a title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    #[serde(with = "crate::tmdb_id")]
    pub tmdb_id: TmdbId,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub is_active_match: bool,
    pub updated_at: DateTime<Utc>,
}

impl MatchRecord {
    pub const ACTIVE_MEMBERS: usize = 2;

    pub fn new(tmdb_id: TmdbId) -> Self {
        Self {
            tmdb_id,
            users: Vec::new(),
            is_active_match: false,
            updated_at: Utc::now(),
        }
    }

    /// Returns true if the member list changed.
    pub fn add_user(&mut self, user_id: &str) -> bool {
        if self.users.iter().any(|u| u == user_id) {
            return false;
        }
        self.users.push(user_id.to_string());
        self.refresh();
        true
    }

    /// Returns true if the member list changed.
    pub fn remove_user(&mut self, user_id: &str) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u != user_id);
        let changed = self.users.len() != before;
        if changed {
            self.refresh();
        }
        changed
    }

    fn refresh(&mut self) {
        self.is_active_match = self.users.len() >= Self::ACTIVE_MEMBERS;
        self.updated_at = Utc::now();
    }
}
