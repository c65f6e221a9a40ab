use super::AppContext;
use crate::output::{styled_table, Output};
use color_eyre::eyre::Result;
use comfy_table::Cell;
use pairwatch_core::{SearchOutcome, SearchSession};
use pairwatch_models::MediaType;
use pairwatch_sources::CatalogApi;
use serde_json::json;
use std::sync::Arc;

pub async fn run_search(ctx: &AppContext, query: &str, media_type: Option<MediaType>, output: &Output) -> Result<()> {
    let catalog: Arc<dyn CatalogApi> = ctx.catalog()?;
    let session = SearchSession::new(catalog);

    let results = match session.search(query).await? {
        SearchOutcome::Results(results) => results,
        // Only one query is ever in flight here.
        SearchOutcome::Superseded => Vec::new(),
    };
    let results: Vec<_> = results
        .into_iter()
        .filter(|r| media_type.map_or(true, |t| r.media_type == t))
        .collect();

    output.render(
        json!({
            "type": "search",
            "query": query,
            "results": results,
        }),
        || {
            if results.is_empty() {
                output.info(format!("Nothing found for '{}'", query.trim()));
                return;
            }
            let mut table = styled_table(["TMDB id", "Title", "Type", "Year", "Score"]);
            for result in &results {
                table.add_row(vec![
                    Cell::new(result.tmdb_id),
                    Cell::new(&result.title),
                    Cell::new(result.media_type),
                    Cell::new(result.year().map(|y| y.to_string()).unwrap_or_default()),
                    Cell::new(
                        result
                            .vote_average
                            .map(|v| format!("{:.1}", v))
                            .unwrap_or_default(),
                    ),
                ]);
            }
            output.table(&table);
        },
    );
    Ok(())
}
