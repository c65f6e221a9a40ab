use super::{to_report, AppContext};
use crate::output::{check_mark, styled_table, Output};
use color_eyre::eyre::Result;
use comfy_table::Cell;
use pairwatch_models::TmdbId;
use serde_json::json;

pub async fn run_matches(ctx: &AppContext, user: Option<&str>, bundle: Option<&str>, output: &Output) -> Result<()> {
    let user = user.unwrap_or(ctx.config.profiles.primary.id.as_str());
    ctx.profile(user)?;

    match bundle {
        Some(bundle_id) => bundle_matches(ctx, bundle_id, user, output).await,
        None => global_matches(ctx, user, output).await,
    }
}

async fn global_matches(ctx: &AppContext, user: &str, output: &Output) -> Result<()> {
    let view = ctx.service.matches(user).await.map_err(to_report)?;
    warn_degraded(ctx, &view.degraded, output);

    output.render(
        json!({
            "type": "matches",
            "user": user,
            "matches": view.matches,
            "degraded": view.degraded,
        }),
        || {
            if view.matches.is_empty() {
                output.info("No matches yet. Keep rating!");
                return;
            }
            let mut table = styled_table(["TMDB id", "Title", "Type", "Status", "Rated"]);
            for interaction in &view.matches {
                let title = interaction
                    .metadata
                    .as_ref()
                    .and_then(|m| m.title.clone())
                    .unwrap_or_else(|| "-".to_string());
                table.add_row(vec![
                    Cell::new(interaction.tmdb_id),
                    Cell::new(title),
                    Cell::new(interaction.content_type),
                    Cell::new(interaction.status),
                    Cell::new(interaction.updated_at.format("%Y-%m-%d")),
                ]);
            }
            output.table(&table);
            output.info(format!("{} match(es)", view.matches.len()));
        },
    );
    Ok(())
}

async fn bundle_matches(ctx: &AppContext, bundle_id: &str, user: &str, output: &Output) -> Result<()> {
    let view = ctx.service.bundle_matches(bundle_id, user).await.map_err(to_report)?;
    warn_degraded(ctx, &view.degraded, output);

    output.render(
        json!({
            "type": "bundle_matches",
            "user": user,
            "bundle": view.bundle,
            "matches": view.matches,
            "degraded": view.degraded,
        }),
        || {
            if view.matches.is_empty() {
                output.info(format!("No matches in '{}' yet.", view.bundle.title));
                return;
            }
            let mut table = styled_table(["TMDB id", "Title", "Type"]);
            for record in &view.matches {
                let title = view
                    .bundle
                    .item(record.tmdb_id)
                    .and_then(|item| item.title.clone())
                    .unwrap_or_else(|| "-".to_string());
                table.add_row(vec![
                    Cell::new(record.tmdb_id),
                    Cell::new(title),
                    Cell::new(record.content_type),
                ]);
            }
            output.info(format!("Matches in '{}':", view.bundle.title));
            output.table(&table);
        },
    );
    Ok(())
}

fn warn_degraded(ctx: &AppContext, degraded: &[String], output: &Output) {
    for user in degraded {
        output.warn(format!(
            "Couldn't load {}'s ratings; matches may be incomplete.",
            ctx.display_name(user)
        ));
    }
}

pub async fn run_status(ctx: &AppContext, user: &str, tmdb_id: TmdbId, output: &Output) -> Result<()> {
    let profile = ctx.profile(user)?;
    let hint = ctx
        .service
        .interactions()
        .get(user, tmdb_id)
        .await
        .ok()
        .flatten()
        .map(|i| i.content_type);

    let (state, details) = tokio::join!(ctx.service.title_status(user, tmdb_id), ctx.lookup_title(tmdb_id, hint));
    let state = state.map_err(to_report)?;

    let ratings = match (&details, ctx.catalog_if_configured()) {
        (Some(details), Some(catalog)) if catalog.has_ratings() => catalog.ratings_for(details).await.unwrap_or_else(|e| {
            tracing::debug!("Ratings lookup for {} failed: {}", tmdb_id, e);
            None
        }),
        _ => None,
    };

    output.render(
        json!({
            "type": "status",
            "user": user,
            "tmdb_id": tmdb_id,
            "details": details,
            "own": state.own,
            "partner": state.partner.label(),
            "partner_loved_it": state.partner_loved_it,
            "is_match": state.is_match,
            "ratings": ratings,
        }),
        || {
            let title = details.as_ref().map(|d| d.title.clone()).unwrap_or_else(|| tmdb_id.to_string());
            let mut table = styled_table([title, String::new()]);
            if let Some(details) = &details {
                table.add_row(vec![Cell::new("Type"), Cell::new(details.media_type)]);
                if let Some(date) = &details.release_date {
                    table.add_row(vec![Cell::new("Released"), Cell::new(date)]);
                }
            }
            let own = state
                .own
                .as_ref()
                .map(|i| i.status.to_string())
                .unwrap_or_else(|| "not rated".to_string());
            table.add_row(vec![Cell::new(format!("{}'s rating", profile.name)), Cell::new(own)]);
            table.add_row(vec![Cell::new("Partner"), Cell::new(state.partner.label())]);
            table.add_row(vec![Cell::new("Match"), Cell::new(check_mark(state.is_match))]);
            if let Some(ratings) = &ratings {
                if let Some(imdb) = ratings.imdb_rating {
                    table.add_row(vec![Cell::new("IMDb"), Cell::new(format!("{:.1}", imdb))]);
                }
                if let Some(rt) = ratings.rotten_tomatoes {
                    table.add_row(vec![Cell::new("Rotten Tomatoes"), Cell::new(format!("{}%", rt))]);
                }
                if let Some(mc) = ratings.metacritic {
                    table.add_row(vec![Cell::new("Metacritic"), Cell::new(mc)]);
                }
            }
            output.table(&table);
        },
    );
    Ok(())
}
