use pairwatch_models::{CatalogSummary, InteractionStatus, MediaType, TmdbId};
use pairwatch_sources::{parse_watchlist_export, CatalogApi, ExportRow, SourceError};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::error::ImportError;
use crate::service::PairService;

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedTitle {
    pub title: String,
    pub tmdb_id: TmdbId,
    pub media_type: MediaType,
}

#[derive(Debug, Default, Clone)]
pub struct ImportReport {
    pub imported: Vec<ImportedTitle>,
    /// Already rated by the user.
    pub skipped: Vec<String>,
    /// No catalog result.
    pub unresolved: Vec<String>,
    /// (title, error)
    pub failed: Vec<(String, String)>,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.imported.len() + self.skipped.len() + self.unresolved.len() + self.failed.len()
    }
}

/// Turns a watchlist export into `liked` ratings for one user.
pub struct WatchlistImporter {
    service: PairService,
    catalog: Arc<dyn CatalogApi>,
    overwrite: bool,
}

impl WatchlistImporter {
    pub fn new(service: PairService, catalog: Arc<dyn CatalogApi>) -> Self {
        Self {
            service,
            catalog,
            overwrite: false,
        }
    }

    /// Re-rate titles the user already has a rating for.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub async fn import_file<P, F>(&self, path: P, user_id: &str, progress: F) -> Result<ImportReport, ImportError>
    where
        P: AsRef<Path>,
        F: FnMut(usize, usize, &str),
    {
        let rows = parse_watchlist_export(path.as_ref()).map_err(|e| ImportError::Export(e.to_string()))?;
        self.import_rows(rows, user_id, progress).await
    }

    /// Rows are processed one at a time; `progress` gets (done, total, title)
    /// after each.
    pub async fn import_rows<F>(&self, rows: Vec<ExportRow>, user_id: &str, mut progress: F) -> Result<ImportReport, ImportError>
    where
        F: FnMut(usize, usize, &str),
    {
        self.service.profiles().partner_of(user_id)?;
        let total = rows.len();
        let mut report = ImportReport::default();

        for (done, row) in rows.into_iter().enumerate() {
            self.import_row(&row, user_id, &mut report).await;
            progress(done + 1, total, &row.title);
        }

        info!(
            "Import for {}: {} imported, {} skipped, {} unresolved, {} failed",
            user_id,
            report.imported.len(),
            report.skipped.len(),
            report.unresolved.len(),
            report.failed.len()
        );
        Ok(report)
    }

    async fn import_row(&self, row: &ExportRow, user_id: &str, report: &mut ImportReport) {
        let hit = match self.resolve(&row.title).await {
            Ok(Some(hit)) => hit,
            Ok(None) => {
                debug!("Row {}: no catalog match for '{}'", row.row, row.title);
                report.unresolved.push(row.title.clone());
                return;
            }
            Err(e) => {
                warn!("Row {}: lookup for '{}' failed: {}", row.row, row.title, e);
                report.failed.push((row.title.clone(), e.to_string()));
                return;
            }
        };

        if !self.overwrite {
            match self.service.interactions().get(user_id, hit.tmdb_id).await {
                Ok(Some(existing)) => {
                    debug!("Row {}: '{}' already rated {}", row.row, row.title, existing.status);
                    report.skipped.push(row.title.clone());
                    return;
                }
                Ok(None) => {}
                Err(e) => {
                    report.failed.push((row.title.clone(), e.to_string()));
                    return;
                }
            }
        }

        let written = self
            .service
            .rate_at(
                user_id,
                hit.tmdb_id,
                hit.media_type,
                InteractionStatus::Liked,
                Some(hit.snapshot()),
                row.added_at,
            )
            .await;
        match written {
            Ok(_) => report.imported.push(ImportedTitle {
                title: row.title.clone(),
                tmdb_id: hit.tmdb_id,
                media_type: hit.media_type,
            }),
            Err(e) => {
                warn!("Row {}: could not save '{}': {}", row.row, row.title, e);
                report.failed.push((row.title.clone(), e.to_string()));
            }
        }
    }

    /// First movie or TV result of a multi search.
    async fn resolve(&self, title: &str) -> Result<Option<CatalogSummary>, SourceError> {
        Ok(self.catalog.search(title, 1).await?.into_iter().next())
    }
}
