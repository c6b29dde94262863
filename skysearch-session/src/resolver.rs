use skysearch_core::LocationSearchService;
use skysearch_shared::Location;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Lifecycle of one autocomplete field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverStatus {
    Idle,
    Debouncing,
    Loading,
    Populated,
    Empty,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub debounce: Duration,
    pub min_query_len: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_query_len: 2,
        }
    }
}

/// Point-in-time copy of the field state for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverSnapshot {
    pub query: String,
    pub status: ResolverStatus,
    pub results: Vec<Location>,
    pub error: Option<String>,
    pub committed: Option<Location>,
    pub open: bool,
}

struct FieldState {
    query: String,
    // Bumped on every keystroke and selection; lookups carry the value they started with.
    generation: u64,
    status: ResolverStatus,
    results: Vec<Location>,
    error: Option<String>,
    committed: Option<Location>,
    open: bool,
}

/// Debounced, race-safe airport/city lookup for a single autocomplete field.
///
/// Every keystroke starts a new generation. A debounce timer or a backend
/// response is only honoured if its generation is still current, so a burst
/// of typing yields one request and a slow reply never overwrites a newer one.
#[derive(Clone)]
pub struct LocationResolver {
    service: Arc<dyn LocationSearchService>,
    settings: ResolverSettings,
    state: Arc<RwLock<FieldState>>,
}

impl LocationResolver {
    pub fn new(service: Arc<dyn LocationSearchService>, settings: ResolverSettings) -> Self {
        Self {
            service,
            settings,
            state: Arc::new(RwLock::new(FieldState {
                query: String::new(),
                generation: 0,
                status: ResolverStatus::Idle,
                results: Vec::new(),
                error: None,
                committed: None,
                open: false,
            })),
        }
    }

    /// Handle a change of the field's text
    pub async fn set_query(&self, query: &str) {
        let generation = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.query = query.to_string();
            state.error = None;
            state.open = true;

            if query.chars().count() < self.settings.min_query_len {
                state.results.clear();
                state.status = ResolverStatus::Idle;
                return;
            }

            state.status = ResolverStatus::Debouncing;
            state.generation
        };

        let resolver = self.clone();
        let query = query.to_string();
        tokio::spawn(async move {
            resolver.lookup(generation, query).await;
        });
    }

    async fn lookup(self, generation: u64, query: String) {
        tokio::time::sleep(self.settings.debounce).await;

        {
            let mut state = self.state.write().await;
            if state.generation != generation {
                debug!("Debounce for '{}' superseded", query);
                return;
            }
            state.status = ResolverStatus::Loading;
        }

        debug!("Searching locations for '{}'", query);
        let result = self.service.search_locations(&query).await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            debug!("Discarding stale location results for '{}'", query);
            return;
        }

        match result {
            Ok(locations) => {
                state.status = if locations.is_empty() {
                    ResolverStatus::Empty
                } else {
                    ResolverStatus::Populated
                };
                state.results = locations;
            }
            Err(e) => {
                warn!("Location search for '{}' failed: {}", query, e);
                state.status = ResolverStatus::Failed;
                state.results.clear();
                state.error = Some(e.to_string());
            }
        }
    }

    /// Commit a candidate and close the suggestion list.
    /// Returns the committed IATA code.
    pub async fn select(&self, location: &Location) -> String {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.committed = Some(location.clone());
        state.results.clear();
        state.error = None;
        state.status = ResolverStatus::Idle;
        state.open = false;
        location.iata_code.clone()
    }

    pub async fn committed_code(&self) -> Option<String> {
        self.state
            .read()
            .await
            .committed
            .as_ref()
            .map(|l| l.iata_code.clone())
    }

    pub async fn snapshot(&self) -> ResolverSnapshot {
        let state = self.state.read().await;
        ResolverSnapshot {
            query: state.query.clone(),
            status: state.status,
            results: state.results.clone(),
            error: state.error.clone(),
            committed: state.committed.clone(),
            open: state.open,
        }
    }
}
