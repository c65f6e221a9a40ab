use super::progress::ImportProgress;
use super::AppContext;
use crate::output::{styled_table, Output};
use color_eyre::eyre::Result;
use comfy_table::Cell;
use pairwatch_core::WatchlistImporter;
use pairwatch_sources::CatalogApi;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

pub async fn run_import(ctx: &AppContext, csv: &Path, user: &str, overwrite: bool, output: &Output) -> Result<()> {
    let profile = ctx.profile(user)?;
    let catalog: Arc<dyn CatalogApi> = ctx.catalog()?;
    let overwrite = overwrite || ctx.config.import.overwrite;

    ctx.service.ensure_profiles().await.map_err(super::to_report)?;

    let importer = WatchlistImporter::new(ctx.service.clone(), catalog).overwrite(overwrite);
    let progress = ImportProgress::new(!output.is_json());
    let report = importer
        .import_file(csv, user, |done, total, title| progress.update(done, total, title))
        .await;
    progress.finish();
    let report = report?;

    output.render(
        json!({
            "type": "import",
            "user": user,
            "file": csv.display().to_string(),
            "imported": report.imported.iter().map(|t| json!({
                "title": t.title,
                "tmdb_id": t.tmdb_id,
                "media_type": t.media_type,
            })).collect::<Vec<_>>(),
            "skipped": report.skipped,
            "unresolved": report.unresolved,
            "failed": report.failed.iter().map(|(title, error)| json!({
                "title": title,
                "error": error,
            })).collect::<Vec<_>>(),
        }),
        || {
            output.success(format!(
                "Imported {} of {} title(s) as liked for {}",
                report.imported.len(),
                report.total(),
                profile.name
            ));
            if !report.skipped.is_empty() {
                output.info(format!(
                    "{} already rated (use --overwrite to replace)",
                    report.skipped.len()
                ));
            }
            if !report.unresolved.is_empty() || !report.failed.is_empty() {
                let mut table = styled_table(["Title", "Problem"]);
                for title in &report.unresolved {
                    table.add_row(vec![Cell::new(title), Cell::new("not found in catalog")]);
                }
                for (title, error) in &report.failed {
                    table.add_row(vec![Cell::new(title), Cell::new(error)]);
                }
                output.warn("Some titles were not imported:");
                output.table(&table);
            }
        },
    );
    Ok(())
}
