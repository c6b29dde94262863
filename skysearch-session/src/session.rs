use chrono::NaiveDate;
use skysearch_core::{
    build_histogram, distinct_carriers, filter_offers, FilterCriteria, FlightSearchService,
    HistogramBucket, SearchCriteria, ServiceError, StopBucket, ValidationErrors, DEFAULT_BUCKET_COUNT,
};
use skysearch_shared::FlightOffer;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::navigation::NavigationStore;

/// State of the most recent flight search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// What the results page shows, derived from the cached offers and the filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub offers: Vec<FlightOffer>,
    pub histogram: Vec<HistogramBucket>,
    /// Primary carriers across all cached offers, for the airline filter
    pub carriers: Vec<String>,
}

/// A dispatched search, tagged with its sequence number
#[derive(Debug, Clone)]
pub struct SearchTicket {
    pub seq: u64,
    pub criteria: SearchCriteria,
}

impl SearchTicket {
    pub async fn execute(self, service: &dyn FlightSearchService) -> SearchOutcome {
        let result = service.search_flights(&self.criteria).await;
        SearchOutcome { seq: self.seq, result }
    }
}

/// Backend reply for a ticket
#[derive(Debug)]
pub struct SearchOutcome {
    pub seq: u64,
    pub result: Result<Vec<FlightOffer>, ServiceError>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("Search {0} was superseded by a newer search")]
    Superseded(u64),
}

/// Owns one results page: the raw offers, the filters and the derived view.
pub struct SearchSession {
    id: Uuid,
    service: Arc<dyn FlightSearchService>,
    navigation: Box<dyn NavigationStore>,
    bucket_count: usize,
    criteria: Option<SearchCriteria>,
    offers: Vec<FlightOffer>,
    filters: FilterCriteria,
    status: FetchStatus,
    latest_seq: u64,
    view: SessionView,
}

impl SearchSession {
    /// Create a session, reading the navigation store once for existing criteria
    pub fn new(service: Arc<dyn FlightSearchService>, navigation: Box<dyn NavigationStore>) -> Self {
        let id = Uuid::new_v4();
        let mut status = FetchStatus::Idle;

        let criteria = match navigation.read().map(|q| SearchCriteria::from_query(&q)) {
            Some(Ok(criteria)) => criteria,
            Some(Err(e)) => {
                warn!("Session {}: ignoring unreadable search URL: {}", id, e);
                status = FetchStatus::Failed(e.to_string());
                None
            }
            None => None,
        };

        Self {
            id,
            service,
            navigation,
            bucket_count: DEFAULT_BUCKET_COUNT,
            criteria,
            offers: Vec::new(),
            filters: FilterCriteria::default(),
            status,
            latest_seq: 0,
            view: SessionView::default(),
        }
    }

    pub fn with_bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self.recompute();
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn criteria(&self) -> Option<&SearchCriteria> {
        self.criteria.as_ref()
    }

    pub fn offers(&self) -> &[FlightOffer] {
        &self.offers
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn status(&self) -> &FetchStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn view(&self) -> &SessionView {
        &self.view
    }

    pub fn navigation(&self) -> &dyn NavigationStore {
        self.navigation.as_ref()
    }

    pub fn service(&self) -> Arc<dyn FlightSearchService> {
        self.service.clone()
    }

    /// Run the search already present in the URL when the session started
    pub async fn resume(&mut self, today: NaiveDate) -> Result<(), SessionError> {
        let Some(criteria) = self.criteria.clone() else {
            return Ok(());
        };
        let ticket = self.dispatch(criteria, today, false)?;
        let outcome = ticket.execute(self.service.as_ref()).await;
        self.complete_search(outcome)
    }

    /// Validate, record in the URL and run a new search
    pub async fn submit(&mut self, criteria: SearchCriteria, today: NaiveDate) -> Result<(), SessionError> {
        let ticket = self.begin_search(criteria, today)?;
        let outcome = ticket.execute(self.service.as_ref()).await;
        self.complete_search(outcome)
    }

    /// Validate and dispatch without awaiting the backend.
    /// Any earlier ticket is superseded.
    pub fn begin_search(&mut self, criteria: SearchCriteria, today: NaiveDate) -> Result<SearchTicket, SessionError> {
        self.dispatch(criteria, today, true)
    }

    fn dispatch(
        &mut self,
        criteria: SearchCriteria,
        today: NaiveDate,
        record_navigation: bool,
    ) -> Result<SearchTicket, SessionError> {
        criteria.validate(today)?;

        self.latest_seq += 1;
        self.status = FetchStatus::Loading;
        if record_navigation {
            self.navigation.push(criteria.to_query());
        }
        self.criteria = Some(criteria.clone());

        info!(
            "Session {}: search #{} {} -> {} on {:?}",
            self.id, self.latest_seq, criteria.origin, criteria.destination, criteria.departure_date
        );

        Ok(SearchTicket {
            seq: self.latest_seq,
            criteria,
        })
    }

    /// Apply a backend reply. Replies for superseded tickets are dropped and
    /// a failure leaves the previously cached offers in place.
    pub fn complete_search(&mut self, outcome: SearchOutcome) -> Result<(), SessionError> {
        if outcome.seq != self.latest_seq {
            debug!(
                "Session {}: discarding reply for search #{} (latest is #{})",
                self.id, outcome.seq, self.latest_seq
            );
            return Err(SessionError::Superseded(outcome.seq));
        }

        match outcome.result {
            Ok(offers) => {
                info!("Session {}: search #{} returned {} offers", self.id, outcome.seq, offers.len());
                self.offers = offers;
                self.status = FetchStatus::Loaded;
                self.recompute();
                Ok(())
            }
            Err(e) => {
                warn!("Session {}: search #{} failed: {}", self.id, outcome.seq, e);
                self.status = FetchStatus::Failed(e.to_string());
                Err(SessionError::Service(e))
            }
        }
    }

    pub fn set_stop(&mut self, bucket: StopBucket, selected: bool) {
        self.filters.set_stop(bucket, selected);
        self.recompute();
    }

    pub fn set_carrier(&mut self, carrier: &str, selected: bool) {
        self.filters.set_carrier(carrier, selected);
        self.recompute();
    }

    pub fn set_price_range(&mut self, min_price: Option<f64>, max_price: Option<f64>) {
        self.filters.set_price_range(min_price, max_price);
        self.recompute();
    }

    pub fn set_price_inputs(&mut self, min_input: &str, max_input: &str) {
        self.filters.set_price_inputs(min_input, max_input);
        self.recompute();
    }

    pub fn set_filters(&mut self, filters: FilterCriteria) {
        self.filters = filters;
        self.recompute();
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset();
        self.recompute();
    }

    fn recompute(&mut self) {
        let offers = filter_offers(&self.offers, &self.filters);
        let histogram = build_histogram(&offers, self.bucket_count);
        self.view = SessionView {
            offers,
            histogram,
            carriers: distinct_carriers(&self.offers),
        };
    }
}
