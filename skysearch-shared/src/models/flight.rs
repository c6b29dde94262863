use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One non-stop leg of an itinerary, as returned by the flight search backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightSegment {
    #[serde(rename = "from")]
    pub origin: String,
    #[serde(rename = "to")]
    pub destination: String,
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
    pub carrier: String,
    /// ISO-8601 duration, e.g. `PT2H30M`
    pub duration: String,
}

impl FlightSegment {
    /// Segment duration in minutes, if the backend sent a well-formed value
    pub fn duration_minutes(&self) -> Option<u32> {
        parse_iso8601_duration(&self.duration)
    }
}

/// A priced itinerary. Segments are ordered and never empty for well-formed offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    /// Decimal string, kept verbatim from the backend
    pub price: String,
    pub currency: String,
    pub stops: u32,
    pub duration_minutes: u32,
    pub segments: Vec<FlightSegment>,
}

impl FlightOffer {
    /// Numeric price. `None` for strings that don't parse to a finite number.
    pub fn price_value(&self) -> Option<f64> {
        self.price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
    }

    /// Carrier of the first segment, used as the offer's representative airline
    pub fn primary_carrier(&self) -> Option<&str> {
        self.segments.first().map(|s| s.carrier.as_str())
    }

    pub fn origin(&self) -> Option<&str> {
        self.segments.first().map(|s| s.origin.as_str())
    }

    pub fn destination(&self) -> Option<&str> {
        self.segments.last().map(|s| s.destination.as_str())
    }

    pub fn departure(&self) -> Option<NaiveDateTime> {
        self.segments.first().map(|s| s.departure)
    }

    pub fn arrival(&self) -> Option<NaiveDateTime> {
        self.segments.last().map(|s| s.arrival)
    }

    /// "Direct", "1 stop", "2 stops"
    pub fn stop_label(&self) -> String {
        match self.stops {
            0 => "Direct".to_string(),
            1 => "1 stop".to_string(),
            n => format!("{} stops", n),
        }
    }

    /// Total duration rendered as "Xh Ym"
    pub fn duration_label(&self) -> String {
        format_duration(self.duration_minutes)
    }
}

/// Convert an ISO-8601 duration like `PT2H30M` (or `P1DT2H`) to whole minutes.
/// Seconds are truncated.
pub fn parse_iso8601_duration(value: &str) -> Option<u32> {
    let rest = value.trim().strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }

    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => {
            if t.is_empty() {
                return None;
            }
            (d, t)
        }
        None => (rest, ""),
    };

    let mut minutes: u32 = 0;
    for (amount, unit) in components(date_part)? {
        match unit {
            'D' => minutes = minutes.checked_add(amount.checked_mul(24 * 60)?)?,
            _ => return None,
        }
    }
    for (amount, unit) in components(time_part)? {
        match unit {
            'H' => minutes = minutes.checked_add(amount.checked_mul(60)?)?,
            'M' => minutes = minutes.checked_add(amount)?,
            'S' => {}
            _ => return None,
        }
    }
    Some(minutes)
}

fn components(part: &str) -> Option<Vec<(u32, char)>> {
    let mut out = Vec::new();
    let mut digits = String::new();
    for c in part.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else {
            if digits.is_empty() {
                return None;
            }
            out.push((digits.parse().ok()?, c));
            digits.clear();
        }
    }
    if !digits.is_empty() {
        return None;
    }
    Some(out)
}

/// 150 -> "2h 30m"
pub fn format_duration(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"
        {
            "price": "412.50",
            "currency": "USD",
            "stops": 1,
            "duration_minutes": 545,
            "segments": [
                {
                    "from": "JFK",
                    "to": "KEF",
                    "departure": "2026-12-01T19:30:00",
                    "arrival": "2026-12-02T05:10:00",
                    "carrier": "FI",
                    "duration": "PT5H40M"
                },
                {
                    "from": "KEF",
                    "to": "LHR",
                    "departure": "2026-12-02T07:40:00",
                    "arrival": "2026-12-02T11:45:00",
                    "carrier": "BA",
                    "duration": "PT3H5M"
                }
            ]
        }
        "#
    }

    #[test]
    fn test_offer_deserialization() {
        let offer: FlightOffer = serde_json::from_str(sample_json()).expect("Failed to deserialize");
        assert_eq!(offer.segments.len(), 2);
        assert_eq!(offer.origin(), Some("JFK"));
        assert_eq!(offer.destination(), Some("LHR"));
        assert_eq!(offer.primary_carrier(), Some("FI"));
        assert_eq!(offer.price_value(), Some(412.5));
        assert_eq!(offer.segments[0].duration_minutes(), Some(340));
    }

    #[test]
    fn test_price_value_rejects_garbage() {
        let mut offer: FlightOffer = serde_json::from_str(sample_json()).unwrap();
        offer.price = "n/a".to_string();
        assert_eq!(offer.price_value(), None);
        offer.price = "NaN".to_string();
        assert_eq!(offer.price_value(), None);
        offer.price = " 99 ".to_string();
        assert_eq!(offer.price_value(), Some(99.0));
    }

    #[test]
    fn test_parse_iso8601_duration() {
        assert_eq!(parse_iso8601_duration("PT2H30M"), Some(150));
        assert_eq!(parse_iso8601_duration("PT45M"), Some(45));
        assert_eq!(parse_iso8601_duration("PT3H"), Some(180));
        assert_eq!(parse_iso8601_duration("P1DT2H"), Some(26 * 60));
        assert_eq!(parse_iso8601_duration("PT1H0M30S"), Some(60));
        assert_eq!(parse_iso8601_duration("2H30M"), None);
        assert_eq!(parse_iso8601_duration("PT"), None);
        assert_eq!(parse_iso8601_duration("PTH"), None);
    }

    #[test]
    fn test_labels() {
        let mut offer: FlightOffer = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(offer.duration_label(), "9h 5m");
        assert_eq!(offer.stop_label(), "1 stop");
        offer.stops = 0;
        assert_eq!(offer.stop_label(), "Direct");
        offer.stops = 3;
        assert_eq!(offer.stop_label(), "3 stops");
    }
}
