use crate::TmdbId;
use std::fmt;

/// Document collections and their id conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Bundles,
    UserInteractions,
    BundleInteractions,
    Matches,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Bundles => "bundles",
            Collection::UserInteractions => "user_interactions",
            Collection::BundleInteractions => "bundle_interactions",
            Collection::Matches => "matches",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `${userId}_${tmdbId}`
pub fn interaction_doc_id(user_id: &str, tmdb_id: TmdbId) -> String {
    format!("{}_{}", user_id, tmdb_id)
}

/// `${bundleId}_${userId}_${tmdbId}`
pub fn bundle_interaction_doc_id(bundle_id: &str, user_id: &str, tmdb_id: TmdbId) -> String {
    format!("{}_{}_{}", bundle_id, user_id, tmdb_id)
}

pub fn match_doc_id(tmdb_id: TmdbId) -> String {
    tmdb_id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_ids() {
        assert_eq!(interaction_doc_id("alex", 100), "alex_100");
        assert_eq!(bundle_interaction_doc_id("b1", "sam", 200), "b1_sam_200");
        assert_eq!(match_doc_id(42), "42");
    }
}
