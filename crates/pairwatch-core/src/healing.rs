use futures::future::join_all;
use pairwatch_models::{Bundle, BundleItem, ContentDetails, MediaType, TmdbId};
use pairwatch_sources::CatalogApi;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::bundles::BundleRepository;

/// A bundle title with the details it resolved to.
#[derive(Debug, Clone)]
pub struct ResolvedItem {
    pub details: ContentDetails,
    /// The type the lookup was first tried with, when that turned out wrong.
    pub corrected_from: Option<MediaType>,
}

impl ResolvedItem {
    /// The bundle item to write back when the stored type was wrong.
    fn correction(&self) -> Option<BundleItem> {
        self.corrected_from?;
        Some(BundleItem {
            tmdb_id: self.details.tmdb_id,
            media_type: self.details.media_type,
            title: Some(self.details.title.clone()),
            poster_path: self.details.poster_path.clone(),
        })
    }
}

#[derive(Debug, Default)]
pub struct BundleContents {
    pub items: Vec<ResolvedItem>,
    pub unresolved: Vec<TmdbId>,
    /// Background write of every media-type correction found. Awaiting it is
    /// optional.
    pub correction: Option<JoinHandle<()>>,
}

/// Resolves bundle titles against the catalog and writes back media types
/// that turned out to be wrong.
#[derive(Clone)]
pub struct BundleResolver {
    catalog: Arc<dyn CatalogApi>,
    bundles: BundleRepository,
}

impl BundleResolver {
    pub fn new(catalog: Arc<dyn CatalogApi>, bundles: BundleRepository) -> Self {
        Self { catalog, bundles }
    }

    /// Look the title up under its stored type (movie when unknown), then
    /// under the other type. A fallback hit spawns a patch of the bundle's
    /// item list and hands back its handle.
    pub async fn resolve_item(
        &self,
        bundle_id: &str,
        tmdb_id: TmdbId,
        stored: Option<MediaType>,
    ) -> (Option<ResolvedItem>, Option<JoinHandle<()>>) {
        let resolved = self.lookup(bundle_id, tmdb_id, stored).await;
        let correction = resolved
            .as_ref()
            .and_then(ResolvedItem::correction)
            .map(|item| self.spawn_corrections(bundle_id, vec![item]));
        (resolved, correction)
    }

    /// Only a not-found under the first type triggers the fallback. Any other
    /// failure leaves the title unresolved so a transient error never
    /// rewrites a correct stored type.
    async fn lookup(&self, bundle_id: &str, tmdb_id: TmdbId, stored: Option<MediaType>) -> Option<ResolvedItem> {
        let first = stored.unwrap_or(MediaType::Movie);
        let first_error = match self.catalog.details(first, tmdb_id).await {
            Ok(details) => {
                return Some(ResolvedItem {
                    details,
                    corrected_from: None,
                });
            }
            Err(e) if e.is_not_found() => e,
            Err(e) => {
                warn!("Bundle {} item {} lookup as {} failed: {}", bundle_id, tmdb_id, first, e);
                return None;
            }
        };

        let fallback = first.other();
        debug!(
            "Bundle {} item {} not found as {} ({}), retrying as {}",
            bundle_id, tmdb_id, first, first_error, fallback
        );
        match self.catalog.details(fallback, tmdb_id).await {
            Ok(details) => {
                info!("Bundle {} item {} is a {}, not a {}", bundle_id, tmdb_id, fallback, first);
                Some(ResolvedItem {
                    details,
                    corrected_from: Some(first),
                })
            }
            Err(e) => {
                warn!(
                    "Could not resolve bundle {} item {} as {} or {}: {}",
                    bundle_id, tmdb_id, first, fallback, e
                );
                None
            }
        }
    }

    fn spawn_corrections(&self, bundle_id: &str, corrections: Vec<BundleItem>) -> JoinHandle<()> {
        let bundles = self.bundles.clone();
        let bundle_id = bundle_id.to_string();
        tokio::spawn(async move {
            let count = corrections.len();
            if let Err(e) = bundles.set_item_media_types(&bundle_id, corrections).await {
                warn!("Failed to record {} media type(s) for bundle {}: {}", count, bundle_id, e);
            }
        })
    }

    /// Resolve every title in the bundle concurrently, in bundle order. All
    /// corrections go out in a single write once every lookup is done.
    pub async fn resolve_bundle(&self, bundle: &Bundle) -> BundleContents {
        let lookups = bundle
            .entries()
            .into_iter()
            .map(|(tmdb_id, stored)| async move { (tmdb_id, self.lookup(&bundle.id, tmdb_id, stored).await) });

        let mut contents = BundleContents::default();
        let mut corrections = Vec::new();
        for (tmdb_id, resolved) in join_all(lookups).await {
            match resolved {
                Some(item) => {
                    corrections.extend(item.correction());
                    contents.items.push(item);
                }
                None => contents.unresolved.push(tmdb_id),
            }
        }
        if !corrections.is_empty() {
            contents.correction = Some(self.spawn_corrections(&bundle.id, corrections));
        }
        contents
    }
}
