use super::{to_report, AppContext};
use crate::output::Output;
use color_eyre::eyre::{eyre, Result};
use pairwatch_core::{Compensation, DualWriteError};
use pairwatch_models::{BundleStatus, InteractionStatus, MediaType, TmdbId};
use serde_json::json;
use tracing::warn;

pub async fn run_rate(
    ctx: &AppContext,
    user: &str,
    tmdb_id: TmdbId,
    status: &str,
    media_type: Option<MediaType>,
    bundle: Option<&str>,
    output: &Output,
) -> Result<()> {
    let profile = ctx.profile(user)?;

    if let Some(bundle_id) = bundle {
        let status: BundleStatus = status.parse().map_err(|e| eyre!("{}", e))?;
        return rate_in_bundle(ctx, bundle_id, user, tmdb_id, status, media_type, output).await;
    }

    let status: InteractionStatus = status.parse().map_err(|e| eyre!("{}", e))?;
    let details = ctx.lookup_title(tmdb_id, media_type).await;
    let content_type = match (&details, media_type) {
        (Some(details), _) => details.media_type,
        (None, Some(given)) => given,
        (None, None) => {
            warn!("Could not look up {}; recording it as a movie", tmdb_id);
            MediaType::Movie
        }
    };

    let interaction = ctx
        .service
        .rate(user, tmdb_id, content_type, status, details.as_ref().map(|d| d.snapshot()))
        .await
        .map_err(to_report)?;
    let title = details.map(|d| d.title).unwrap_or_else(|| tmdb_id.to_string());

    let state = ctx.service.title_status(user, tmdb_id).await.map_err(to_report)?;
    output.render(
        json!({
            "type": "rating",
            "scope": "global",
            "interaction": interaction,
            "is_match": state.is_match,
        }),
        || {
            output.success(format!("{} rated {} as {}", profile.name, title, status));
            if state.is_match {
                output.success("It's a match!");
            }
        },
    );
    Ok(())
}

async fn rate_in_bundle(
    ctx: &AppContext,
    bundle_id: &str,
    user: &str,
    tmdb_id: TmdbId,
    status: BundleStatus,
    media_type: Option<MediaType>,
    output: &Output,
) -> Result<()> {
    let bundle = ctx
        .service
        .bundles()
        .get(bundle_id)
        .await?
        .ok_or_else(|| eyre!("bundle '{}' not found", bundle_id))?;
    // The bundle's own item list knows the type better than a guess.
    let content_type = match media_type.or_else(|| bundle.item(tmdb_id).map(|i| i.media_type)) {
        Some(known) => known,
        None => ctx
            .lookup_title(tmdb_id, None)
            .await
            .map(|d| d.media_type)
            .unwrap_or(MediaType::Movie),
    };

    let record = match ctx
        .service
        .rate_in_bundle(bundle_id, user, tmdb_id, content_type, status)
        .await
    {
        Ok(record) => record,
        Err(e) => return Err(explain_bundle_failure(e)),
    };

    output.render(
        json!({
            "type": "rating",
            "scope": "bundle",
            "bundle_interaction": record,
        }),
        || {
            output.success(format!(
                "{} rated {} as {} in '{}'",
                ctx.display_name(user),
                tmdb_id,
                status,
                bundle.title
            ));
            if status == BundleStatus::Never {
                output.info("Also marked as won't watch everywhere.");
            }
        },
    );
    Ok(())
}

fn explain_bundle_failure(e: anyhow::Error) -> color_eyre::Report {
    let Some(dual) = e.downcast_ref::<DualWriteError>() else {
        return to_report(e);
    };
    match dual.compensation {
        Compensation::Failed => eyre!(
            "{}. The bundle rating for {} may now disagree with the global rating; rate it again to fix.",
            dual,
            dual.tmdb_id
        ),
        _ => eyre!("{}. Nothing was changed.", dual),
    }
}

pub async fn run_unrate(
    ctx: &AppContext,
    user: &str,
    tmdb_id: TmdbId,
    bundle: Option<&str>,
    output: &Output,
) -> Result<()> {
    let profile = ctx.profile(user)?;
    match bundle {
        Some(bundle_id) => ctx
            .service
            .unrate_in_bundle(bundle_id, user, tmdb_id)
            .await
            .map_err(to_report)?,
        None => ctx.service.unrate(user, tmdb_id).await.map_err(to_report)?,
    }

    output.render(
        json!({
            "type": "unrate",
            "user": user,
            "tmdb_id": tmdb_id,
            "bundle_id": bundle,
        }),
        || output.success(format!("Removed {}'s rating for {}", profile.name, tmdb_id)),
    );
    Ok(())
}
