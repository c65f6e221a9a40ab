use super::{to_report, AppContext};
use crate::output::{check_mark, styled_table, Output};
use crate::BundleCommands;
use color_eyre::eyre::{eyre, Result};
use comfy_table::Cell;
use pairwatch_core::{is_match, BundleResolver};
use pairwatch_models::{BundleInteraction, BundleItem, MediaType, TmdbId};
use pairwatch_sources::CatalogApi;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub async fn run_bundle(ctx: &AppContext, cmd: BundleCommands, output: &Output) -> Result<()> {
    match cmd {
        BundleCommands::List => list_bundles(ctx, output).await,
        BundleCommands::Show { id } => show_bundle(ctx, &id, output).await,
        BundleCommands::Create { title, created_by } => create_bundle(ctx, &title, &created_by, output).await,
        BundleCommands::Add { id, tmdb_id, media_type } => add_item(ctx, &id, tmdb_id, media_type, output).await,
        BundleCommands::Remove { id, tmdb_id } => remove_item(ctx, &id, tmdb_id, output).await,
        BundleCommands::Delete { id } => delete_bundle(ctx, &id, output).await,
    }
}

async fn list_bundles(ctx: &AppContext, output: &Output) -> Result<()> {
    let bundles = ctx.service.bundles().list().await?;

    output.render(json!({ "type": "bundles", "bundles": bundles }), || {
        if bundles.is_empty() {
            output.info("No bundles yet. Create one with 'pairwatch bundle create'.");
            return;
        }
        let mut table = styled_table(["Id", "Title", "Titles", "Created by", "Created"]);
        for bundle in &bundles {
            table.add_row(vec![
                Cell::new(&bundle.id),
                Cell::new(&bundle.title),
                Cell::new(bundle.entries().len()),
                Cell::new(ctx.display_name(&bundle.created_by)),
                Cell::new(bundle.created_at.format("%Y-%m-%d")),
            ]);
        }
        output.table(&table);
    });
    Ok(())
}

struct ShownItem {
    tmdb_id: TmdbId,
    title: String,
    media_type: Option<MediaType>,
    corrected: bool,
}

async fn show_bundle(ctx: &AppContext, bundle_id: &str, output: &Output) -> Result<()> {
    let bundle = ctx
        .service
        .bundles()
        .get(bundle_id)
        .await?
        .ok_or_else(|| eyre!("bundle '{}' not found", bundle_id))?;

    let mut items = Vec::new();
    let mut unresolved = Vec::new();
    match ctx.catalog_if_configured() {
        Some(catalog) => {
            let catalog: Arc<dyn CatalogApi> = catalog;
            let resolver = BundleResolver::new(catalog, ctx.service.bundles().clone());
            let contents = resolver.resolve_bundle(&bundle).await;
            items.extend(contents.items.into_iter().map(|item| ShownItem {
                tmdb_id: item.details.tmdb_id,
                title: item.details.title,
                media_type: Some(item.details.media_type),
                corrected: item.corrected_from.is_some(),
            }));
            unresolved = contents.unresolved;
            // Let the media-type fixes land before the process exits.
            if let Some(correction) = contents.correction {
                if let Err(e) = correction.await {
                    warn!("Media type correction task failed: {}", e);
                }
            }
        }
        None => {
            debug!("No catalog configured; showing stored bundle items");
            items.extend(bundle.entries().into_iter().map(|(tmdb_id, media_type)| ShownItem {
                tmdb_id,
                title: bundle
                    .item(tmdb_id)
                    .and_then(|i| i.title.clone())
                    .unwrap_or_else(|| "-".to_string()),
                media_type,
                corrected: false,
            }));
        }
    }

    let [first, second] = ctx.config.profiles.all();
    let records = ctx.service.bundle_interactions();
    let (mine, theirs) = tokio::join!(
        records.for_bundle_user(bundle_id, &first.id),
        records.for_bundle_user(bundle_id, &second.id)
    );
    let mine = mine.unwrap_or_else(|e| {
        output.warn(format!("Couldn't load {}'s ratings: {}", first.name, e));
        Vec::new()
    });
    let theirs = theirs.unwrap_or_else(|e| {
        output.warn(format!("Couldn't load {}'s ratings: {}", second.name, e));
        Vec::new()
    });
    let mine_by_id = by_title(&mine);
    let theirs_by_id = by_title(&theirs);
    let status_of = |ratings: &HashMap<TmdbId, &BundleInteraction>, id: TmdbId| {
        ratings.get(&id).map(|r| r.status.to_string()).unwrap_or_else(|| "-".to_string())
    };

    let rows: Vec<serde_json::Value> = items
        .iter()
        .map(|item| {
            json!({
                "tmdb_id": item.tmdb_id,
                "title": item.title,
                "media_type": item.media_type,
                "corrected": item.corrected,
                "ratings": {
                    (first.id.as_str()): mine_by_id.get(&item.tmdb_id).map(|r| r.status),
                    (second.id.as_str()): theirs_by_id.get(&item.tmdb_id).map(|r| r.status),
                },
                "is_match": is_match(item.tmdb_id, &mine, &theirs),
            })
        })
        .collect();

    output.render(
        json!({
            "type": "bundle",
            "bundle": bundle,
            "items": rows,
            "unresolved": unresolved,
        }),
        || {
            output.info(format!(
                "{} (by {}, {} title(s))",
                bundle.title,
                ctx.display_name(&bundle.created_by),
                bundle.entries().len()
            ));
            let mut table = styled_table([
                "TMDB id".to_string(),
                "Title".to_string(),
                "Type".to_string(),
                first.name.clone(),
                second.name.clone(),
                "Match".to_string(),
            ]);
            for item in &items {
                let kind = match (item.media_type, item.corrected) {
                    (Some(t), true) => format!("{} (fixed)", t),
                    (Some(t), false) => t.to_string(),
                    (None, _) => "?".to_string(),
                };
                table.add_row(vec![
                    Cell::new(item.tmdb_id),
                    Cell::new(&item.title),
                    Cell::new(kind),
                    Cell::new(status_of(&mine_by_id, item.tmdb_id)),
                    Cell::new(status_of(&theirs_by_id, item.tmdb_id)),
                    Cell::new(check_mark(is_match(item.tmdb_id, &mine, &theirs))),
                ]);
            }
            output.table(&table);
            for tmdb_id in &unresolved {
                output.warn(format!("{} could not be found as a movie or TV show", tmdb_id));
            }
        },
    );
    Ok(())
}

fn by_title(records: &[BundleInteraction]) -> HashMap<TmdbId, &BundleInteraction> {
    let mut latest: HashMap<TmdbId, &BundleInteraction> = HashMap::new();
    for record in records {
        let newer = latest
            .get(&record.tmdb_id)
            .map_or(true, |seen| seen.updated_at < record.updated_at);
        if newer {
            latest.insert(record.tmdb_id, record);
        }
    }
    latest
}

async fn create_bundle(ctx: &AppContext, title: &str, created_by: &str, output: &Output) -> Result<()> {
    ctx.profile(created_by)?;
    if title.trim().is_empty() {
        return Err(eyre!("Bundle title cannot be empty"));
    }
    let bundle = ctx.service.bundles().create(title, created_by, Vec::new()).await?;

    output.render(json!({ "type": "bundle_created", "bundle": bundle }), || {
        output.success(format!("Created bundle '{}' with id {}", bundle.title, bundle.id));
    });
    Ok(())
}

async fn add_item(
    ctx: &AppContext,
    bundle_id: &str,
    tmdb_id: TmdbId,
    media_type: Option<MediaType>,
    output: &Output,
) -> Result<()> {
    let details = ctx.lookup_title(tmdb_id, media_type).await;
    let item = match (details, media_type) {
        (Some(details), _) => BundleItem {
            tmdb_id,
            media_type: details.media_type,
            title: Some(details.title),
            poster_path: details.poster_path,
        },
        (None, Some(media_type)) => BundleItem {
            tmdb_id,
            media_type,
            title: None,
            poster_path: None,
        },
        (None, None) => {
            return Err(eyre!(
                "Couldn't look up {}; pass --type movie or --type tv to add it anyway",
                tmdb_id
            ))
        }
    };

    let bundle = ctx.service.bundles().add_item(bundle_id, item.clone()).await?;
    output.render(json!({ "type": "bundle_item_added", "bundle": bundle, "item": item }), || {
        output.success(format!(
            "Added {} to '{}'",
            item.title.as_deref().unwrap_or(&tmdb_id.to_string()),
            bundle.title
        ));
    });
    Ok(())
}

async fn remove_item(ctx: &AppContext, bundle_id: &str, tmdb_id: TmdbId, output: &Output) -> Result<()> {
    let removed = ctx.service.bundles().remove_item(bundle_id, tmdb_id).await?;

    output.render(
        json!({ "type": "bundle_item_removed", "bundle_id": bundle_id, "tmdb_id": tmdb_id, "removed": removed }),
        || {
            if removed {
                output.success(format!("Removed {} from {}", tmdb_id, bundle_id));
            } else {
                output.warn(format!("{} was not in {}", tmdb_id, bundle_id));
            }
        },
    );
    Ok(())
}

async fn delete_bundle(ctx: &AppContext, bundle_id: &str, output: &Output) -> Result<()> {
    let removed = ctx.service.delete_bundle(bundle_id).await.map_err(to_report)?;

    output.render(
        json!({ "type": "bundle_deleted", "bundle_id": bundle_id, "ratings_removed": removed }),
        || output.success(format!("Deleted {} and {} rating(s) made in it", bundle_id, removed)),
    );
    Ok(())
}
