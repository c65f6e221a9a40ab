//! End-to-end rating and matching against the file-backed store.

use pairwatch_config::{Profile, ProfilesConfig};
use pairwatch_core::PairService;
use pairwatch_models::{BundleItem, BundleStatus, InteractionStatus, MediaType};
use pairwatch_sources::LocalStore;
use std::sync::Arc;
use tempfile::TempDir;

fn service(dir: &TempDir) -> PairService {
    let store = LocalStore::new(dir.path()).unwrap();
    PairService::new(
        Arc::new(store),
        ProfilesConfig {
            primary: Profile {
                id: "user1".to_string(),
                name: "Alex".to_string(),
            },
            partner: Profile {
                id: "user2".to_string(),
                name: "Sam".to_string(),
            },
        },
    )
}

#[tokio::test]
async fn global_match_lifecycle_survives_reopening_the_store() {
    let dir = TempDir::new().unwrap();
    let pair = service(&dir);
    pair.ensure_profiles().await.unwrap();

    pair.rate("user1", 100, MediaType::Movie, InteractionStatus::Liked, None)
        .await
        .unwrap();
    assert!(pair.matches("user1").await.unwrap().matches.is_empty());

    pair.rate("user2", 100, MediaType::Movie, InteractionStatus::Yes, None)
        .await
        .unwrap();

    let reopened = service(&dir);
    let view = reopened.matches("user1").await.unwrap();
    assert_eq!(view.matches.iter().map(|i| i.tmdb_id).collect::<Vec<_>>(), vec![100]);
    assert!(view.degraded.is_empty());
    let active = reopened.tracker().active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].tmdb_id, 100);

    reopened
        .rate("user1", 100, MediaType::Movie, InteractionStatus::WontWatch, None)
        .await
        .unwrap();
    assert!(reopened.matches("user2").await.unwrap().matches.is_empty());
    assert!(reopened.tracker().active().await.unwrap().is_empty());
}

#[tokio::test]
async fn bundle_ratings_match_separately_and_never_spills_into_global() {
    let dir = TempDir::new().unwrap();
    let pair = service(&dir);
    let bundle = pair
        .bundles()
        .create(
            "Date night",
            "user1",
            vec![BundleItem {
                tmdb_id: 200,
                media_type: MediaType::Tv,
                title: Some("The Bear".to_string()),
                poster_path: None,
            }],
        )
        .await
        .unwrap();

    pair.rate_in_bundle(&bundle.id, "user1", 200, MediaType::Tv, BundleStatus::Yes)
        .await
        .unwrap();
    pair.rate_in_bundle(&bundle.id, "user2", 200, MediaType::Tv, BundleStatus::NotNow)
        .await
        .unwrap();
    assert!(pair.bundle_matches(&bundle.id, "user1").await.unwrap().matches.is_empty());

    pair.rate_in_bundle(&bundle.id, "user2", 200, MediaType::Tv, BundleStatus::Yes)
        .await
        .unwrap();
    let view = pair.bundle_matches(&bundle.id, "user2").await.unwrap();
    assert_eq!(view.matches.len(), 1);
    // Bundle matches never leak into the global list.
    assert!(pair.matches("user1").await.unwrap().matches.is_empty());

    pair.rate_in_bundle(&bundle.id, "user1", 200, MediaType::Tv, BundleStatus::Never)
        .await
        .unwrap();
    let global = pair.interactions().get("user1", 200).await.unwrap().unwrap();
    assert_eq!(global.status, InteractionStatus::WontWatch);
    assert!(pair.bundle_matches(&bundle.id, "user1").await.unwrap().matches.is_empty());

    let removed = pair.delete_bundle(&bundle.id).await.unwrap();
    assert_eq!(removed, 2);
    assert!(pair.bundles().get(&bundle.id).await.unwrap().is_none());
    // The global record written by "never" outlives the bundle.
    assert!(pair.interactions().get("user1", 200).await.unwrap().is_some());
}
