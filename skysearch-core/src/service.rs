use async_trait::async_trait;
use skysearch_shared::{FlightOffer, Location};

use crate::search::SearchCriteria;

/// Backend returning priced itineraries for a search
#[async_trait]
pub trait FlightSearchService: Send + Sync {
    async fn search_flights(&self, criteria: &SearchCriteria) -> Result<Vec<FlightOffer>, ServiceError>;
}

/// Backend resolving free text to airports and cities
#[async_trait]
pub trait LocationSearchService: Send + Sync {
    async fn search_locations(&self, keyword: &str) -> Result<Vec<Location>, ServiceError>;
}

/// Transport-level failure talking to either backend.
/// Display output is suitable for showing to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("{detail}")]
    Status { status: u16, detail: String },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl ServiceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
