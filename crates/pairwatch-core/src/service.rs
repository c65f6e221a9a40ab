use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use pairwatch_config::{Profile, ProfilesConfig};
use pairwatch_models::{
    Bundle, BundleInteraction, BundleStatus, ContentSnapshot, Interaction, InteractionStatus, MediaType, TmdbId,
};
use pairwatch_sources::DocumentStore;
use std::sync::Arc;
use tracing::{info, warn};
use crate::bundles::BundleRepository;
use crate::error::{Compensation, DualWriteError, WriteStep};
use crate::interactions::{BundleInteractionRepository, InteractionRepository};
use crate::match_tracker::MatchTracker;
use crate::matching::{self, PartnerStatus};
use crate::profiles::ProfileRepository;

/// Mutual matches for one user, global scope.
#[derive(Debug, Clone)]
pub struct MatchView {
    /// The requesting user's records for matched titles.
    pub matches: Vec<Interaction>,
    /// Users whose ratings could not be loaded and were treated as empty.
    pub degraded: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BundleMatchView {
    pub bundle: Bundle,
    pub matches: Vec<BundleInteraction>,
    pub degraded: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TitleStatus {
    pub own: Option<Interaction>,
    pub partner: PartnerStatus,
    pub partner_loved_it: bool,
    pub is_match: bool,
}

/// Rating and matching for the configured pair of profiles.
#[derive(Clone)]
pub struct PairService {
    profiles: ProfilesConfig,
    users: ProfileRepository,
    interactions: InteractionRepository,
    bundle_interactions: BundleInteractionRepository,
    bundles: BundleRepository,
    tracker: MatchTracker,
}

impl PairService {
    pub fn new(store: Arc<dyn DocumentStore>, profiles: ProfilesConfig) -> Self {
        Self {
            profiles,
            users: ProfileRepository::new(Arc::clone(&store)),
            interactions: InteractionRepository::new(Arc::clone(&store)),
            bundle_interactions: BundleInteractionRepository::new(Arc::clone(&store)),
            bundles: BundleRepository::new(Arc::clone(&store)),
            tracker: MatchTracker::new(store),
        }
    }

    pub fn profiles(&self) -> &ProfilesConfig {
        &self.profiles
    }

    pub fn interactions(&self) -> &InteractionRepository {
        &self.interactions
    }

    pub fn bundle_interactions(&self) -> &BundleInteractionRepository {
        &self.bundle_interactions
    }

    pub fn bundles(&self) -> &BundleRepository {
        &self.bundles
    }

    pub fn tracker(&self) -> &MatchTracker {
        &self.tracker
    }

    fn profile(&self, user_id: &str) -> Result<&Profile> {
        Ok(self
            .profiles
            .get(user_id)
            .ok_or_else(|| pairwatch_config::ConfigError::UnknownProfile(user_id.to_string()))?)
    }

    /// Write both configured profiles to `users`.
    pub async fn ensure_profiles(&self) -> Result<()> {
        for profile in self.profiles.all() {
            self.users.ensure(profile).await?;
        }
        Ok(())
    }

    pub async fn rate(
        &self,
        user_id: &str,
        tmdb_id: TmdbId,
        content_type: MediaType,
        status: InteractionStatus,
        snapshot: Option<ContentSnapshot>,
    ) -> Result<Interaction> {
        self.rate_at(user_id, tmdb_id, content_type, status, snapshot, Utc::now()).await
    }

    /// Like `rate`, with an explicit timestamp (imports keep the export's).
    pub async fn rate_at(
        &self,
        user_id: &str,
        tmdb_id: TmdbId,
        content_type: MediaType,
        status: InteractionStatus,
        snapshot: Option<ContentSnapshot>,
        at: DateTime<Utc>,
    ) -> Result<Interaction> {
        self.profile(user_id)?;
        let interaction = self
            .interactions
            .set_status(user_id, tmdb_id, content_type, status, snapshot, at)
            .await?;
        self.tracker
            .record(user_id, tmdb_id, matching::is_positive_global(status))
            .await;
        Ok(interaction)
    }

    pub async fn unrate(&self, user_id: &str, tmdb_id: TmdbId) -> Result<()> {
        self.profile(user_id)?;
        self.interactions.remove(user_id, tmdb_id).await?;
        self.tracker.record(user_id, tmdb_id, false).await;
        Ok(())
    }

    async fn require_bundle(&self, bundle_id: &str) -> Result<Bundle> {
        match self.bundles.get(bundle_id).await? {
            Some(bundle) => Ok(bundle),
            None => bail!("bundle '{}' not found", bundle_id),
        }
    }

    /// Rate a title inside a bundle. `never` also marks the title `wont_watch`
    /// globally; see [`DualWriteError`] for how a half-done write is reported.
    pub async fn rate_in_bundle(
        &self,
        bundle_id: &str,
        user_id: &str,
        tmdb_id: TmdbId,
        content_type: MediaType,
        status: BundleStatus,
    ) -> Result<BundleInteraction> {
        self.profile(user_id)?;
        let bundle = self.require_bundle(bundle_id).await?;
        if !bundle.contains(tmdb_id) {
            bail!("{} is not in bundle '{}'", tmdb_id, bundle.title);
        }

        if status != BundleStatus::Never {
            return Ok(self
                .bundle_interactions
                .set_status(bundle_id, user_id, tmdb_id, content_type, status)
                .await?);
        }
        Ok(self.rate_never(bundle_id, user_id, tmdb_id, content_type).await?)
    }

    /// Bundle record first, then the global one. When the global write fails
    /// the bundle record is put back to what it was.
    async fn rate_never(
        &self,
        bundle_id: &str,
        user_id: &str,
        tmdb_id: TmdbId,
        content_type: MediaType,
    ) -> Result<BundleInteraction, DualWriteError> {
        let failed = |step, source, compensation| DualWriteError {
            bundle_id: bundle_id.to_string(),
            tmdb_id,
            step,
            source,
            compensation,
        };

        let previous = self
            .bundle_interactions
            .get(bundle_id, user_id, tmdb_id)
            .await
            .map_err(|e| failed(WriteStep::BundleRating, e, Compensation::NotNeeded))?;

        let record = self
            .bundle_interactions
            .set_status(bundle_id, user_id, tmdb_id, content_type, BundleStatus::Never)
            .await
            .map_err(|e| failed(WriteStep::BundleRating, e, Compensation::NotNeeded))?;

        let global = self
            .interactions
            .set_status(user_id, tmdb_id, content_type, InteractionStatus::WontWatch, None, Utc::now())
            .await;

        match global {
            Ok(_) => {
                self.tracker.record(user_id, tmdb_id, false).await;
                Ok(record)
            }
            Err(source) => {
                let compensation = match self
                    .bundle_interactions
                    .restore(bundle_id, user_id, tmdb_id, previous.as_ref())
                    .await
                {
                    Ok(()) => Compensation::RolledBack,
                    Err(e) => {
                        warn!(
                            "Could not roll back bundle {} rating for {} by {}: {}",
                            bundle_id, tmdb_id, user_id, e
                        );
                        Compensation::Failed
                    }
                };
                Err(failed(WriteStep::GlobalRating, source, compensation))
            }
        }
    }

    pub async fn unrate_in_bundle(&self, bundle_id: &str, user_id: &str, tmdb_id: TmdbId) -> Result<()> {
        self.profile(user_id)?;
        self.bundle_interactions.remove(bundle_id, user_id, tmdb_id).await?;
        Ok(())
    }

    /// A user's ratings, or an empty list when they can't be loaded.
    async fn interactions_or_empty(&self, user_id: &str) -> (Vec<Interaction>, bool) {
        match self.interactions.for_user(user_id).await {
            Ok(records) => (records, false),
            Err(e) => {
                warn!("Failed to load ratings for {}, treating as empty: {}", user_id, e);
                (Vec::new(), true)
            }
        }
    }

    async fn bundle_interactions_or_empty(&self, bundle_id: &str, user_id: &str) -> (Vec<BundleInteraction>, bool) {
        match self.bundle_interactions.for_bundle_user(bundle_id, user_id).await {
            Ok(records) => (records, false),
            Err(e) => {
                warn!(
                    "Failed to load bundle {} ratings for {}, treating as empty: {}",
                    bundle_id, user_id, e
                );
                (Vec::new(), true)
            }
        }
    }

    pub async fn matches(&self, user_id: &str) -> Result<MatchView> {
        let partner = self.profiles.partner_of(user_id)?;
        let ((mine, mine_failed), (theirs, theirs_failed)) = tokio::join!(
            self.interactions_or_empty(user_id),
            self.interactions_or_empty(&partner.id)
        );

        let matches = matching::mutual_positive(&mine, &theirs).into_iter().cloned().collect();
        Ok(MatchView {
            matches,
            degraded: degraded(user_id, mine_failed, &partner.id, theirs_failed),
        })
    }

    pub async fn bundle_matches(&self, bundle_id: &str, user_id: &str) -> Result<BundleMatchView> {
        let partner = self.profiles.partner_of(user_id)?;
        let bundle = self.require_bundle(bundle_id).await?;
        let ((mine, mine_failed), (theirs, theirs_failed)) = tokio::join!(
            self.bundle_interactions_or_empty(bundle_id, user_id),
            self.bundle_interactions_or_empty(bundle_id, &partner.id)
        );

        let matches = matching::mutual_positive(&mine, &theirs).into_iter().cloned().collect();
        Ok(BundleMatchView {
            bundle,
            matches,
            degraded: degraded(user_id, mine_failed, &partner.id, theirs_failed),
        })
    }

    pub async fn title_status(&self, user_id: &str, tmdb_id: TmdbId) -> Result<TitleStatus> {
        let partner = self.profiles.partner_of(user_id)?;
        let own = self.interactions.get(user_id, tmdb_id).await?;
        let (theirs, _) = self.interactions_or_empty(&partner.id).await;

        let partner_status = matching::partner_status(tmdb_id, &theirs);
        let partner_loved_it = theirs
            .iter()
            .filter(|i| i.tmdb_id == tmdb_id)
            .max_by_key(|i| i.updated_at)
            .map(|i| matching::partner_loved_it(i.status))
            .unwrap_or(false);
        let is_match = own
            .as_ref()
            .map(|mine| matching::is_match(tmdb_id, std::slice::from_ref(mine), &theirs))
            .unwrap_or(false);

        Ok(TitleStatus {
            own,
            partner: partner_status,
            partner_loved_it,
            is_match,
        })
    }

    /// Delete a bundle and every rating made inside it.
    pub async fn delete_bundle(&self, bundle_id: &str) -> Result<usize> {
        self.require_bundle(bundle_id).await?;
        let removed = self.bundle_interactions.remove_all_for_bundle(bundle_id).await?;
        self.bundles.delete(bundle_id).await?;
        info!("Deleted bundle {} and {} rating(s)", bundle_id, removed);
        Ok(removed)
    }
}

fn degraded(user_id: &str, user_failed: bool, partner_id: &str, partner_failed: bool) -> Vec<String> {
    [(user_id, user_failed), (partner_id, partner_failed)]
        .into_iter()
        .filter(|(_, failed)| *failed)
        .map(|(id, _)| id.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FlakyStore;
    use pairwatch_models::BundleItem;
    use pairwatch_sources::{FieldFilter, MemoryStore};

    fn pair() -> ProfilesConfig {
        ProfilesConfig {
            primary: Profile {
                id: "user1".to_string(),
                name: "Alex".to_string(),
            },
            partner: Profile {
                id: "user2".to_string(),
                name: "Sam".to_string(),
            },
        }
    }

    async fn bundle_with(service: &PairService, tmdb_id: TmdbId) -> Bundle {
        service
            .bundles()
            .create(
                "Date night",
                "user1",
                vec![BundleItem {
                    tmdb_id,
                    media_type: MediaType::Movie,
                    title: None,
                    poster_path: None,
                }],
            )
            .await
            .unwrap()
    }

    fn ids(view: &MatchView) -> Vec<TmdbId> {
        view.matches.iter().map(|i| i.tmdb_id).collect()
    }

    #[tokio::test]
    async fn test_global_match_scenario() {
        let service = PairService::new(Arc::new(MemoryStore::new()), pair());

        service.rate("user1", 100, MediaType::Movie, InteractionStatus::Liked, None).await.unwrap();
        assert!(service.matches("user1").await.unwrap().matches.is_empty());
        assert!(!service.tracker().get(100).await.unwrap().unwrap().is_active_match);

        service.rate("user2", 100, MediaType::Movie, InteractionStatus::Liked, None).await.unwrap();
        assert_eq!(ids(&service.matches("user1").await.unwrap()), vec![100]);
        assert_eq!(ids(&service.matches("user2").await.unwrap()), vec![100]);
        assert!(service.tracker().get(100).await.unwrap().unwrap().is_active_match);

        service.rate("user1", 100, MediaType::Movie, InteractionStatus::WontWatch, None).await.unwrap();
        assert!(service.matches("user1").await.unwrap().matches.is_empty());
        assert!(!service.tracker().get(100).await.unwrap().unwrap().is_active_match);
    }

    #[tokio::test]
    async fn test_unknown_user_is_rejected() {
        let service = PairService::new(Arc::new(MemoryStore::new()), pair());
        let err = service
            .rate("user3", 1, MediaType::Movie, InteractionStatus::Liked, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown profile 'user3'"));
        assert!(service.matches("user3").await.is_err());
    }

    #[tokio::test]
    async fn test_bundle_match_scenario() {
        let service = PairService::new(Arc::new(MemoryStore::new()), pair());
        let bundle = bundle_with(&service, 200).await;

        service.rate_in_bundle(&bundle.id, "user1", 200, MediaType::Movie, BundleStatus::Yes).await.unwrap();
        service.rate_in_bundle(&bundle.id, "user2", 200, MediaType::Movie, BundleStatus::NotNow).await.unwrap();
        assert!(service.bundle_matches(&bundle.id, "user1").await.unwrap().matches.is_empty());

        service.rate_in_bundle(&bundle.id, "user2", 200, MediaType::Movie, BundleStatus::Yes).await.unwrap();
        let view = service.bundle_matches(&bundle.id, "user1").await.unwrap();
        assert_eq!(view.matches.len(), 1);
        assert_eq!(view.matches[0].tmdb_id, 200);

        // Global matches are unaffected by bundle ratings.
        assert!(service.matches("user1").await.unwrap().matches.is_empty());

        assert!(service
            .rate_in_bundle(&bundle.id, "user1", 999, MediaType::Movie, BundleStatus::Yes)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_never_writes_both_records() {
        let service = PairService::new(Arc::new(MemoryStore::new()), pair());
        let bundle = bundle_with(&service, 300).await;

        service.rate_in_bundle(&bundle.id, "user1", 300, MediaType::Movie, BundleStatus::Never).await.unwrap();
        let global = service.interactions().get("user1", 300).await.unwrap().unwrap();
        assert_eq!(global.status, InteractionStatus::WontWatch);
        let local = service.bundle_interactions().get(&bundle.id, "user1", 300).await.unwrap().unwrap();
        assert_eq!(local.status, BundleStatus::Never);
    }

    #[tokio::test]
    async fn test_never_rolls_back_bundle_record_when_global_write_fails() {
        let store = Arc::new(FlakyStore::new());
        let service = PairService::new(store.clone(), pair());
        let bundle = bundle_with(&service, 300).await;
        let before = service
            .rate_in_bundle(&bundle.id, "user1", 300, MediaType::Movie, BundleStatus::NotNow)
            .await
            .unwrap();

        store.fail_writes_to("user_interactions");
        let err = service
            .rate_in_bundle(&bundle.id, "user1", 300, MediaType::Movie, BundleStatus::Never)
            .await
            .unwrap_err();
        let dual = err.downcast_ref::<DualWriteError>().unwrap();
        assert_eq!(dual.step, WriteStep::GlobalRating);
        assert_eq!(dual.compensation, Compensation::RolledBack);

        let restored = service.bundle_interactions().get(&bundle.id, "user1", 300).await.unwrap();
        assert_eq!(restored, Some(before));
        assert!(service.interactions().get("user1", 300).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_never_reports_failed_rollback() {
        let store = Arc::new(FlakyStore::new());
        let service = PairService::new(store.clone(), pair());
        let bundle = bundle_with(&service, 300).await;

        store.fail_writes_to("user_interactions");
        store.allow_writes_to("bundle_interactions", 1);
        let err = service
            .rate_in_bundle(&bundle.id, "user1", 300, MediaType::Movie, BundleStatus::Never)
            .await
            .unwrap_err();
        let dual = err.downcast_ref::<DualWriteError>().unwrap();
        assert_eq!(dual.step, WriteStep::GlobalRating);
        assert_eq!(dual.compensation, Compensation::Failed);
    }

    #[tokio::test]
    async fn test_never_stops_at_failed_bundle_write() {
        let store = Arc::new(FlakyStore::new());
        let service = PairService::new(store.clone(), pair());
        let bundle = bundle_with(&service, 300).await;

        store.fail_writes_to("bundle_interactions");
        let err = service
            .rate_in_bundle(&bundle.id, "user1", 300, MediaType::Movie, BundleStatus::Never)
            .await
            .unwrap_err();
        let dual = err.downcast_ref::<DualWriteError>().unwrap();
        assert_eq!(dual.step, WriteStep::BundleRating);
        assert_eq!(dual.compensation, Compensation::NotNeeded);
        assert!(service.interactions().get("user1", 300).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_matches_degrade_when_partner_load_fails() {
        let store = Arc::new(FlakyStore::new());
        let service = PairService::new(store.clone(), pair());
        service.rate("user1", 1, MediaType::Movie, InteractionStatus::Liked, None).await.unwrap();
        service.rate("user2", 1, MediaType::Movie, InteractionStatus::Liked, None).await.unwrap();

        store.fail_queries_with(FieldFilter::eq("userId", "user2"));
        let view = service.matches("user1").await.unwrap();
        assert!(view.matches.is_empty());
        assert_eq!(view.degraded, vec!["user2".to_string()]);
    }

    #[tokio::test]
    async fn test_title_status_shows_partner_badge() {
        let service = PairService::new(Arc::new(MemoryStore::new()), pair());
        service.rate("user2", 7, MediaType::Tv, InteractionStatus::Watched, None).await.unwrap();
        service.rate("user1", 7, MediaType::Tv, InteractionStatus::Liked, None).await.unwrap();

        let status = service.title_status("user1", 7).await.unwrap();
        assert_eq!(status.partner, PartnerStatus::Watched);
        assert!(status.partner_loved_it);
        assert!(!status.is_match);
        assert_eq!(status.own.unwrap().status, InteractionStatus::Liked);
    }

    #[tokio::test]
    async fn test_delete_bundle_cascades_ratings() {
        let service = PairService::new(Arc::new(MemoryStore::new()), pair());
        let bundle = bundle_with(&service, 400).await;
        service.rate_in_bundle(&bundle.id, "user1", 400, MediaType::Movie, BundleStatus::Yes).await.unwrap();
        service.rate_in_bundle(&bundle.id, "user2", 400, MediaType::Movie, BundleStatus::Yes).await.unwrap();

        assert_eq!(service.delete_bundle(&bundle.id).await.unwrap(), 2);
        assert!(service.bundles().get(&bundle.id).await.unwrap().is_none());
        assert!(service.delete_bundle(&bundle.id).await.is_err());
    }

    #[tokio::test]
    async fn test_unrate_breaks_match_and_updates_tracker() {
        let service = PairService::new(Arc::new(MemoryStore::new()), pair());
        service.rate("user1", 500, MediaType::Movie, InteractionStatus::Liked, None).await.unwrap();
        service.rate("user2", 500, MediaType::Movie, InteractionStatus::Liked, None).await.unwrap();
        assert_eq!(ids(&service.matches("user2").await.unwrap()), vec![500]);

        service.unrate("user1", 500).await.unwrap();

        assert!(service.interactions().get("user1", 500).await.unwrap().is_none());
        assert!(service.matches("user1").await.unwrap().matches.is_empty());
        assert!(service.matches("user2").await.unwrap().matches.is_empty());
        assert!(service.tracker().active().await.unwrap().is_empty());
        let record = service.tracker().get(500).await.unwrap().unwrap();
        assert_eq!(record.users, vec!["user2".to_string()]);
        assert!(!record.is_active_match);

        // Removing a rating that was never there is harmless.
        service.unrate("user1", 500).await.unwrap();
        assert!(service.unrate("user3", 500).await.is_err());
    }

    #[tokio::test]
    async fn test_unrate_in_bundle_breaks_bundle_match() {
        let service = PairService::new(Arc::new(MemoryStore::new()), pair());
        let bundle = bundle_with(&service, 600).await;
        service.rate_in_bundle(&bundle.id, "user1", 600, MediaType::Movie, BundleStatus::Yes).await.unwrap();
        service.rate_in_bundle(&bundle.id, "user2", 600, MediaType::Movie, BundleStatus::Yes).await.unwrap();
        assert_eq!(service.bundle_matches(&bundle.id, "user1").await.unwrap().matches.len(), 1);

        service.unrate_in_bundle(&bundle.id, "user2", 600).await.unwrap();

        assert!(service.bundle_interactions().get(&bundle.id, "user2", 600).await.unwrap().is_none());
        assert!(service.bundle_matches(&bundle.id, "user1").await.unwrap().matches.is_empty());
        assert!(service.bundle_matches(&bundle.id, "user2").await.unwrap().matches.is_empty());
        // The other side keeps their rating.
        assert!(service.bundle_interactions().get(&bundle.id, "user1", 600).await.unwrap().is_some());
    }
}
