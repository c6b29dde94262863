use serde::{Deserialize, Serialize};
use skysearch_shared::FlightOffer;
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::CoreError;

/// Stop-count buckets offered by the filter sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StopBucket {
    #[serde(rename = "0")]
    NonStop,
    #[serde(rename = "1")]
    OneStop,
    #[serde(rename = "2+")]
    TwoOrMore,
}

impl StopBucket {
    pub const ALL: [StopBucket; 3] = [StopBucket::NonStop, StopBucket::OneStop, StopBucket::TwoOrMore];

    pub fn matches(&self, stops: u32) -> bool {
        match self {
            StopBucket::NonStop => stops == 0,
            StopBucket::OneStop => stops == 1,
            StopBucket::TwoOrMore => stops >= 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StopBucket::NonStop => "0",
            StopBucket::OneStop => "1",
            StopBucket::TwoOrMore => "2+",
        }
    }
}

impl FromStr for StopBucket {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(StopBucket::NonStop),
            "1" => Ok(StopBucket::OneStop),
            "2+" => Ok(StopBucket::TwoOrMore),
            other => Err(CoreError::ValidationError(format!("Unknown stop filter: {}", other))),
        }
    }
}

/// User-selected refinements. Empty sets and `None` bounds mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub stops: BTreeSet<StopBucket>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub carriers: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.carriers.is_empty()
    }

    /// Check or uncheck a stop bucket
    pub fn set_stop(&mut self, bucket: StopBucket, selected: bool) {
        if selected {
            self.stops.insert(bucket);
        } else {
            self.stops.remove(&bucket);
        }
    }

    /// Check or uncheck a carrier code
    pub fn set_carrier(&mut self, carrier: &str, selected: bool) {
        if selected {
            self.carriers.insert(carrier.to_string());
        } else {
            self.carriers.remove(carrier);
        }
    }

    /// Non-finite bounds are treated as absent
    pub fn set_price_range(&mut self, min_price: Option<f64>, max_price: Option<f64>) {
        self.min_price = min_price.filter(|p| p.is_finite());
        self.max_price = max_price.filter(|p| p.is_finite());
    }

    /// Set bounds from the raw text of the min/max inputs
    pub fn set_price_inputs(&mut self, min_input: &str, max_input: &str) {
        self.set_price_range(parse_price_input(min_input), parse_price_input(max_input));
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True if the offer passes every active category
    pub fn matches(&self, offer: &FlightOffer) -> bool {
        self.matches_stops(offer) && self.matches_price(offer) && self.matches_carrier(offer)
    }

    fn matches_stops(&self, offer: &FlightOffer) -> bool {
        self.stops.is_empty() || self.stops.iter().any(|b| b.matches(offer.stops))
    }

    fn matches_price(&self, offer: &FlightOffer) -> bool {
        if self.min_price.is_none() && self.max_price.is_none() {
            return true;
        }

        // An unparsable price can't be placed against a bound
        let Some(price) = offer.price_value() else {
            return false;
        };

        if let Some(min) = self.min_price {
            if price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if price > max {
                return false;
            }
        }
        true
    }

    fn matches_carrier(&self, offer: &FlightOffer) -> bool {
        if self.carriers.is_empty() {
            return true;
        }
        match offer.primary_carrier() {
            Some(carrier) => self.carriers.contains(carrier),
            None => false,
        }
    }
}

/// Free-text price input to an optional bound. Blank or non-numeric input means no bound.
pub fn parse_price_input(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Order-preserving filter over the cached offers
pub fn filter_offers(offers: &[FlightOffer], criteria: &FilterCriteria) -> Vec<FlightOffer> {
    offers
        .iter()
        .filter(|offer| criteria.matches(offer))
        .cloned()
        .collect()
}

/// Primary carriers in first-seen order, duplicates collapsed
pub fn distinct_carriers(offers: &[FlightOffer]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut carriers = Vec::new();

    for carrier in offers.iter().filter_map(|o| o.primary_carrier()) {
        if seen.insert(carrier) {
            carriers.push(carrier.to_string());
        }
    }

    carriers
}
