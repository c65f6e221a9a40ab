//! Match reconciliation between the two profiles.
//!
//! Everything here is pure: callers load both collections and pass them in.
//! A content id is a match when both sides hold a positive status for it.

use chrono::{DateTime, Utc};
use pairwatch_models::{BundleInteraction, BundleStatus, Interaction, InteractionStatus, TmdbId};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Positive for global matching: `liked` or the swipe flow's `Yes`.
pub fn is_positive_global(status: InteractionStatus) -> bool {
    matches!(status, InteractionStatus::Liked | InteractionStatus::Yes)
}

pub fn is_positive_bundle(status: BundleStatus) -> bool {
    status == BundleStatus::Yes
}

/// Badge predicate for "your partner loved this". Also true for `watched`,
/// which does not count towards a match.
pub fn partner_loved_it(status: InteractionStatus) -> bool {
    matches!(
        status,
        InteractionStatus::Liked | InteractionStatus::Yes | InteractionStatus::Watched
    )
}

/// A rating record that can take part in a match.
pub trait Rated {
    fn content_id(&self) -> TmdbId;
    fn is_positive(&self) -> bool;
    fn updated_at(&self) -> DateTime<Utc>;
}

impl Rated for Interaction {
    fn content_id(&self) -> TmdbId {
        self.tmdb_id
    }

    fn is_positive(&self) -> bool {
        is_positive_global(self.status)
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl Rated for BundleInteraction {
    fn content_id(&self) -> TmdbId {
        self.tmdb_id
    }

    fn is_positive(&self) -> bool {
        is_positive_bundle(self.status)
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Ids whose most recent record is positive. With one record per content the
/// recency rule never comes into play; it only settles stray duplicates.
pub fn positive_ids<R: Rated>(records: &[R]) -> HashSet<TmdbId> {
    let mut latest: HashMap<TmdbId, &R> = HashMap::new();
    for record in records {
        latest
            .entry(record.content_id())
            .and_modify(|current| {
                if record.updated_at() >= current.updated_at() {
                    *current = record;
                }
            })
            .or_insert(record);
    }
    latest
        .into_iter()
        .filter(|(_, record)| record.is_positive())
        .map(|(id, _)| id)
        .collect()
}

/// Ids positive on both sides, in `current` order, without duplicates.
pub fn match_ids<R: Rated>(current: &[R], partner: &[R]) -> Vec<TmdbId> {
    let mine = positive_ids(current);
    let theirs = positive_ids(partner);
    let mut seen = HashSet::new();
    current
        .iter()
        .map(Rated::content_id)
        .filter(|id| mine.contains(id) && theirs.contains(id) && seen.insert(*id))
        .collect()
}

pub fn is_match<R: Rated>(tmdb_id: TmdbId, current: &[R], partner: &[R]) -> bool {
    positive_ids(current).contains(&tmdb_id) && positive_ids(partner).contains(&tmdb_id)
}

/// The current user's records for matched content, one per id.
pub fn mutual_positive<'a, R: Rated>(current: &'a [R], partner: &[R]) -> Vec<&'a R> {
    let ids: HashSet<TmdbId> = match_ids(current, partner).into_iter().collect();
    let mut seen = HashSet::new();
    current
        .iter()
        .filter(|r| r.is_positive() && ids.contains(&r.content_id()) && seen.insert(r.content_id()))
        .collect()
}

/// What the partner did with a title, for display next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartnerStatus {
    Loved,
    Watched,
    Passed,
    NotInterested,
    NotRated,
}

impl PartnerStatus {
    pub fn from_status(status: Option<InteractionStatus>) -> Self {
        match status {
            Some(InteractionStatus::Liked | InteractionStatus::Yes) => PartnerStatus::Loved,
            Some(InteractionStatus::Watched) => PartnerStatus::Watched,
            Some(InteractionStatus::WontWatch | InteractionStatus::No) => PartnerStatus::Passed,
            Some(InteractionStatus::NotImportant) => PartnerStatus::NotInterested,
            None => PartnerStatus::NotRated,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PartnerStatus::Loved => "Partner loved it",
            PartnerStatus::Watched => "Partner watched it",
            PartnerStatus::Passed => "Partner passed",
            PartnerStatus::NotInterested => "Partner isn't interested",
            PartnerStatus::NotRated => "Partner hasn't rated",
        }
    }
}

impl fmt::Display for PartnerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn partner_status(tmdb_id: TmdbId, partner: &[Interaction]) -> PartnerStatus {
    let status = partner
        .iter()
        .filter(|i| i.tmdb_id == tmdb_id)
        .max_by_key(|i| i.updated_at)
        .map(|i| i.status);
    PartnerStatus::from_status(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pairwatch_models::MediaType;

    fn global(user: &str, tmdb_id: TmdbId, status: InteractionStatus) -> Interaction {
        let now = Utc::now();
        Interaction {
            user_id: user.to_string(),
            tmdb_id,
            content_type: MediaType::Movie,
            status,
            metadata: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn in_bundle(user: &str, tmdb_id: TmdbId, status: BundleStatus) -> BundleInteraction {
        let now = Utc::now();
        BundleInteraction {
            bundle_id: "b1".to_string(),
            user_id: user.to_string(),
            tmdb_id,
            content_type: MediaType::Movie,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_global_match_lifecycle() {
        let mut user1 = vec![global("user1", 100, InteractionStatus::Liked)];
        let mut user2: Vec<Interaction> = Vec::new();
        assert!(match_ids(&user1, &user2).is_empty());

        user2.push(global("user2", 100, InteractionStatus::Liked));
        assert_eq!(match_ids(&user1, &user2), vec![100]);
        assert!(is_match(100, &user1, &user2));

        user1[0].status = InteractionStatus::WontWatch;
        assert!(match_ids(&user1, &user2).is_empty());
        assert!(!is_match(100, &user1, &user2));
    }

    #[test]
    fn test_yes_counts_as_positive_but_watched_does_not() {
        let user1 = vec![
            global("user1", 1, InteractionStatus::Yes),
            global("user1", 2, InteractionStatus::Watched),
            global("user1", 3, InteractionStatus::Liked),
        ];
        let user2 = vec![
            global("user2", 1, InteractionStatus::Liked),
            global("user2", 2, InteractionStatus::Liked),
            global("user2", 3, InteractionStatus::NotImportant),
        ];
        assert_eq!(match_ids(&user1, &user2), vec![1]);
        assert!(partner_loved_it(InteractionStatus::Watched));
        assert!(!is_positive_global(InteractionStatus::Watched));
    }

    #[test]
    fn test_bundle_scope_requires_yes_on_both_sides() {
        let user1 = vec![in_bundle("user1", 200, BundleStatus::Yes)];
        let mut user2 = vec![in_bundle("user2", 200, BundleStatus::NotNow)];
        assert!(match_ids(&user1, &user2).is_empty());

        user2[0].status = BundleStatus::Yes;
        assert_eq!(match_ids(&user1, &user2), vec![200]);
    }

    #[test]
    fn test_match_ids_keep_current_order_without_duplicates() {
        let user1 = vec![
            global("user1", 30, InteractionStatus::Liked),
            global("user1", 10, InteractionStatus::Liked),
            global("user1", 20, InteractionStatus::Yes),
        ];
        let user2 = vec![
            global("user2", 10, InteractionStatus::Liked),
            global("user2", 20, InteractionStatus::Liked),
            global("user2", 30, InteractionStatus::Yes),
        ];
        assert_eq!(match_ids(&user1, &user2), vec![30, 10, 20]);

        let mutual = mutual_positive(&user1, &user2);
        assert_eq!(mutual.len(), 3);
        assert!(mutual.iter().all(|i| i.user_id == "user1"));
    }

    #[test]
    fn test_newest_duplicate_wins() {
        let mut stale = global("user1", 5, InteractionStatus::Liked);
        stale.updated_at = Utc::now() - Duration::days(2);
        let fresh = global("user1", 5, InteractionStatus::No);
        let user2 = vec![global("user2", 5, InteractionStatus::Liked)];

        assert!(match_ids(&[stale.clone(), fresh.clone()], &user2).is_empty());
        assert!(match_ids(&[fresh, stale], &user2).is_empty());
    }

    #[test]
    fn test_partner_status_labels() {
        let partner = vec![
            global("user2", 1, InteractionStatus::Yes),
            global("user2", 2, InteractionStatus::Watched),
            global("user2", 3, InteractionStatus::No),
            global("user2", 4, InteractionStatus::NotImportant),
        ];
        assert_eq!(partner_status(1, &partner), PartnerStatus::Loved);
        assert_eq!(partner_status(2, &partner), PartnerStatus::Watched);
        assert_eq!(partner_status(3, &partner), PartnerStatus::Passed);
        assert_eq!(partner_status(4, &partner), PartnerStatus::NotInterested);
        assert_eq!(partner_status(5, &partner), PartnerStatus::NotRated);
        assert_eq!(PartnerStatus::Watched.to_string(), "Partner watched it");
    }
}
