use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use skysearch_core::{FlightSearchService, LocationSearchService, SearchCriteria, ServiceError};
use skysearch_shared::{FlightOffer, Location};
use std::time::Duration;
use tracing::{debug, warn};

use crate::app_config::BackendConfig;

const FLIGHTS_PATH: &str = "/api/flights/search";
const LOCATIONS_PATH: &str = "/api/locations/search";

#[derive(Debug, Deserialize)]
struct FlightsEnvelope {
    flights: Vec<FlightOffer>,
}

#[derive(Debug, Deserialize)]
struct LocationsEnvelope {
    locations: Vec<Location>,
}

/// Error payload. FastAPI sends a string for handled errors and a list for 422s.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
            serde_json::Value::Null | serde_json::Value::String(_) => None,
            other => Some(other.to_string()),
        }
    }
}

/// HTTP client for the flight and location search endpoints
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ServiceError> {
        let timeout = config.request_timeout();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        fallback_detail: &str,
    ) -> Result<T, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let response = self
            .http
            .get(&url)
            .query(query)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(ErrorBody::message)
                .unwrap_or_else(|| fallback_detail.to_string());
            warn!("GET {} failed with {}: {}", url, status, detail);
            return Err(ServiceError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        response.json::<T>().await.map_err(|e| self.map_error(e))
    }

    fn map_error(&self, err: reqwest::Error) -> ServiceError {
        if err.is_timeout() {
            ServiceError::Timeout(self.timeout.as_millis() as u64)
        } else if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl FlightSearchService for BackendClient {
    async fn search_flights(&self, criteria: &SearchCriteria) -> Result<Vec<FlightOffer>, ServiceError> {
        let envelope: FlightsEnvelope = self
            .get_json(FLIGHTS_PATH, &criteria.query_pairs(), "Failed to fetch flights")
            .await?;
        Ok(envelope.flights)
    }
}

#[async_trait]
impl LocationSearchService for BackendClient {
    async fn search_locations(&self, keyword: &str) -> Result<Vec<Location>, ServiceError> {
        let envelope: LocationsEnvelope = self
            .get_json(LOCATIONS_PATH, &[("q", keyword.to_string())], "Failed to fetch locations")
            .await?;
        Ok(envelope.locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::NaiveDate;
    use serde_json::json;
    use std::collections::HashMap;

    fn cache_disabled(headers: &HeaderMap) -> bool {
        headers.get("cache-control").and_then(|v| v.to_str().ok()) == Some("no-store")
    }

    async fn flights(Query(params): Query<HashMap<String, String>>, headers: HeaderMap) -> impl IntoResponse {
        if !cache_disabled(&headers) {
            return (StatusCode::BAD_REQUEST, Json(json!({ "detail": "cache not disabled" })));
        }
        if params.get("origin").map(String::as_str) == Some("ERR") {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": "Amadeus quota exceeded" })));
        }
        if params.get("origin").map(String::as_str) == Some("NOD") {
            return (StatusCode::BAD_GATEWAY, Json(json!({})));
        }
        if params.get("origin").map(String::as_str) == Some("BAD") {
            return (StatusCode::OK, Json(json!({ "results": "not a flight list" })));
        }
        if params.get("origin").map(String::as_str) == Some("SLO") {
            tokio::time::sleep(Duration::from_secs(2)).await;
        }

        let flights = json!({
            "flights": [{
                "price": "199.00",
                "currency": "USD",
                "stops": 0,
                "duration_minutes": 420,
                "segments": [{
                    "from": params.get("origin").cloned().unwrap_or_default(),
                    "to": params.get("destination").cloned().unwrap_or_default(),
                    "departure": format!("{}T08:00:00", params.get("departureDate").cloned().unwrap_or_default()),
                    "arrival": format!("{}T15:00:00", params.get("departureDate").cloned().unwrap_or_default()),
                    "carrier": format!("A{}", params.get("adults").cloned().unwrap_or_default()),
                    "duration": "PT7H"
                }]
            }]
        });
        (StatusCode::OK, Json(flights))
    }

    async fn locations(Query(params): Query<HashMap<String, String>>, headers: HeaderMap) -> impl IntoResponse {
        if !cache_disabled(&headers) {
            return (StatusCode::BAD_REQUEST, Json(json!({ "detail": "cache not disabled" })));
        }
        let q = params.get("q").cloned().unwrap_or_default();
        if q == "down" {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})));
        }

        let locations = json!({
            "locations": [{
                "iataCode": "LON",
                "name": q.to_uppercase(),
                "cityName": "London",
                "countryName": "United Kingdom"
            }]
        });
        (StatusCode::OK, Json(locations))
    }

    async fn spawn_backend() -> BackendClient {
        spawn_backend_with_timeout(5_000).await
    }

    async fn spawn_backend_with_timeout(request_timeout_ms: u64) -> BackendClient {
        let app = Router::new()
            .route("/api/flights/search", get(flights))
            .route("/api/locations/search", get(locations));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        BackendClient::new(&BackendConfig {
            base_url: format!("http://{}/", addr),
            request_timeout_ms,
        })
        .unwrap()
    }

    fn criteria(origin: &str) -> SearchCriteria {
        SearchCriteria::one_way(origin, "LHR", NaiveDate::from_ymd_opt(2026, 12, 1).unwrap()).with_adults(2)
    }

    #[tokio::test]
    async fn test_search_flights_sends_criteria() {
        let client = spawn_backend().await;
        assert!(!client.base_url().ends_with('/'));

        let offers = client.search_flights(&criteria("JFK")).await.unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].origin(), Some("JFK"));
        assert_eq!(offers[0].destination(), Some("LHR"));
        assert_eq!(offers[0].primary_carrier(), Some("A2"));
        assert_eq!(offers[0].segments[0].departure.to_string(), "2026-12-01 08:00:00");
    }

    #[tokio::test]
    async fn test_error_detail_is_surfaced() {
        let client = spawn_backend().await;
        let err = client.search_flights(&criteria("ERR")).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Amadeus quota exceeded");
    }

    #[tokio::test]
    async fn test_missing_detail_uses_fallback() {
        let client = spawn_backend().await;
        let err = client.search_flights(&criteria("NOD")).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.to_string(), "Failed to fetch flights");
    }

    #[tokio::test]
    async fn test_search_locations() {
        let client = spawn_backend().await;
        let locations = client.search_locations("heath row").await.unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].iata_code, "LON");
        assert_eq!(locations[0].name, "HEATH ROW");
    }

    #[tokio::test]
    async fn test_locations_missing_detail_uses_fallback() {
        let client = spawn_backend().await;
        let err = client.search_locations("down").await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Failed to fetch locations");
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let client = spawn_backend_with_timeout(200).await;
        let err = client.search_flights(&criteria("SLO")).await.unwrap_err();
        assert_eq!(err, ServiceError::Timeout(200));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_unexpected_body_is_decode_error() {
        let client = spawn_backend().await;
        let err = client.search_flights(&criteria("BAD")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = BackendClient::new(&BackendConfig {
            base_url: format!("http://{}", addr),
            request_timeout_ms: 2_000,
        })
        .unwrap();
        let err = client.search_locations("lon").await.unwrap_err();
        assert!(matches!(err, ServiceError::Transport(_)), "got {:?}", err);
    }
}
