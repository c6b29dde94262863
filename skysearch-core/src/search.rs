use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::form_urlencoded;

use crate::{CoreError, CoreResult};

pub const PARAM_ORIGIN: &str = "origin";
pub const PARAM_DESTINATION: &str = "destination";
pub const PARAM_DEPARTURE_DATE: &str = "departureDate";
pub const PARAM_RETURN_DATE: &str = "returnDate";
pub const PARAM_ADULTS: &str = "adults";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// What the user asked the backend for. Round-trips through the navigable URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    pub origin: String,
    pub destination: String,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub adults: u32,
}

impl SearchCriteria {
    pub fn one_way(origin: &str, destination: &str, departure_date: NaiveDate) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            departure_date: Some(departure_date),
            return_date: None,
            adults: 1,
        }
    }

    pub fn with_return(mut self, return_date: NaiveDate) -> Self {
        self.return_date = Some(return_date);
        self
    }

    pub fn with_adults(mut self, adults: u32) -> Self {
        self.adults = adults;
        self
    }

    /// Check the criteria before anything is sent to the backend.
    /// At most one message is reported per field.
    pub fn validate(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if !is_iata_code(&self.origin) {
            errors.push(FieldError::new(SearchField::Origin, "Origin must be a 3-letter IATA code"));
        }
        if !is_iata_code(&self.destination) {
            errors.push(FieldError::new(
                SearchField::Destination,
                "Destination must be a 3-letter IATA code",
            ));
        }

        match self.departure_date {
            None => errors.push(FieldError::new(
                SearchField::DepartureDate,
                "Departure date is required",
            )),
            Some(departure) if departure < today => errors.push(FieldError::new(
                SearchField::DepartureDate,
                "Departure date cannot be in the past",
            )),
            Some(_) => {}
        }

        if let Some(ret) = self.return_date {
            if ret < today {
                errors.push(FieldError::new(
                    SearchField::ReturnDate,
                    "Return date cannot be in the past",
                ));
            } else if matches!(self.departure_date, Some(departure) if ret < departure) {
                errors.push(FieldError::new(
                    SearchField::ReturnDate,
                    "Return date must be after departure date",
                ));
            }
        }

        if self.adults == 0 {
            errors.push(FieldError::new(
                SearchField::Adults,
                "At least one adult passenger is required",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }

    /// Parameters in the order the backend and the URL expect them. Empty fields are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.origin.is_empty() {
            pairs.push((PARAM_ORIGIN, self.origin.clone()));
        }
        if !self.destination.is_empty() {
            pairs.push((PARAM_DESTINATION, self.destination.clone()));
        }
        if let Some(date) = self.departure_date {
            pairs.push((PARAM_DEPARTURE_DATE, date.format(DATE_FORMAT).to_string()));
        }
        if let Some(date) = self.return_date {
            pairs.push((PARAM_RETURN_DATE, date.format(DATE_FORMAT).to_string()));
        }
        pairs.push((PARAM_ADULTS, self.adults.to_string()));
        pairs
    }

    /// Encode as a URL query string (without the leading `?`)
    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.query_pairs() {
            serializer.append_pair(key, &value);
        }
        serializer.finish()
    }

    /// Decode from a URL query string. `Ok(None)` when the query carries no search parameters.
    pub fn from_query(query: &str) -> CoreResult<Option<Self>> {
        let query = query.trim().trim_start_matches('?');

        let mut criteria = SearchCriteria {
            origin: String::new(),
            destination: String::new(),
            departure_date: None,
            return_date: None,
            adults: 1,
        };
        let mut seen = false;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                PARAM_ORIGIN => criteria.origin = value.to_uppercase(),
                PARAM_DESTINATION => criteria.destination = value.to_uppercase(),
                PARAM_DEPARTURE_DATE => criteria.departure_date = parse_date(PARAM_DEPARTURE_DATE, value)?,
                PARAM_RETURN_DATE => criteria.return_date = parse_date(PARAM_RETURN_DATE, value)?,
                PARAM_ADULTS => {
                    criteria.adults = value.parse().map_err(|_| {
                        CoreError::InvalidQuery(format!("{} must be a whole number, got '{}'", PARAM_ADULTS, value))
                    })?
                }
                _ => continue,
            }
            seen = true;
        }

        Ok(if seen { Some(criteria) } else { None })
    }
}

fn parse_date(param: &str, value: &str) -> CoreResult<Option<NaiveDate>> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|_| CoreError::InvalidQuery(format!("{} must be YYYY-MM-DD, got '{}'", param, value)))
}

fn is_iata_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Form fields a validation message can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchField {
    Origin,
    Destination,
    DepartureDate,
    ReturnDate,
    Adults,
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchField::Origin => PARAM_ORIGIN,
            SearchField::Destination => PARAM_DESTINATION,
            SearchField::DepartureDate => PARAM_DEPARTURE_DATE,
            SearchField::ReturnDate => PARAM_RETURN_DATE,
            SearchField::Adults => PARAM_ADULTS,
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: SearchField,
    pub message: String,
}

impl FieldError {
    pub fn new(field: SearchField, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Local validation failures; submission is blocked until they are fixed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid search: {}", summarize(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Message attached to a field, if any
    pub fn message_for(&self, field: SearchField) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}
