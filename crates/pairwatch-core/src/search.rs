use pairwatch_models::CatalogSummary;
use pairwatch_sources::{CatalogApi, SourceError};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::AbortHandle;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Results(Vec<CatalogSummary>),
    /// A newer query was issued before this one finished; its results were
    /// dropped.
    Superseded,
}

impl SearchOutcome {
    pub fn into_results(self) -> Option<Vec<CatalogSummary>> {
        match self {
            SearchOutcome::Results(results) => Some(results),
            SearchOutcome::Superseded => None,
        }
    }
}

/// Search-as-you-type: each query cancels the one before it.
///
/// Every request is tagged with a generation number. The previous request's
/// task is aborted when a new one starts, and any response that still arrives
/// for an older generation is discarded. The generation and the in-flight
/// task are swapped under one lock, so the highest generation always owns
/// the task that survives.
pub struct SearchSession {
    catalog: Arc<dyn CatalogApi>,
    in_flight: Mutex<InFlight>,
}

#[derive(Default)]
struct InFlight {
    generation: u64,
    task: Option<AbortHandle>,
}

impl SearchSession {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self {
            catalog,
            in_flight: Mutex::new(InFlight::default()),
        }
    }

    /// Start a new generation owned by `task`, aborting whatever ran before.
    fn supersede(&self, task: Option<AbortHandle>) -> u64 {
        let mut in_flight = self.in_flight.lock();
        in_flight.generation += 1;
        if let Some(previous) = std::mem::replace(&mut in_flight.task, task) {
            previous.abort();
        }
        in_flight.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.in_flight.lock().generation == generation
    }

    pub async fn search(&self, query: &str) -> Result<SearchOutcome, SourceError> {
        let query = query.trim().to_string();

        if query.is_empty() {
            self.supersede(None);
            return Ok(SearchOutcome::Results(Vec::new()));
        }

        let catalog = Arc::clone(&self.catalog);
        let task_query = query.clone();
        let task = tokio::spawn(async move { catalog.search(&task_query, 1).await });
        let generation = self.supersede(Some(task.abort_handle()));
        trace!("Search #{} for '{}' started", generation, query);

        let result = match task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => {
                debug!("Search #{} for '{}' cancelled", generation, query);
                return Ok(SearchOutcome::Superseded);
            }
            Err(e) => return Err(SourceError::Http(format!("search task failed: {}", e))),
        };

        if !self.is_current(generation) {
            debug!("Dropping stale results for search #{} '{}'", generation, query);
            return Ok(SearchOutcome::Superseded);
        }
        result.map(SearchOutcome::Results)
    }
}
