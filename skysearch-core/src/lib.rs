pub mod filter;
pub mod histogram;
pub mod search;
pub mod service;

pub use filter::{distinct_carriers, filter_offers, parse_price_input, FilterCriteria, StopBucket};
pub use histogram::{build_histogram, histogram, HistogramBucket, DEFAULT_BUCKET_COUNT};
pub use search::{FieldError, SearchCriteria, SearchField, ValidationErrors};
pub use service::{FlightSearchService, LocationSearchService, ServiceError};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
