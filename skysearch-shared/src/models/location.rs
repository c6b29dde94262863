use serde::{Deserialize, Serialize};

/// An airport or city candidate returned by the location search backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub iata_code: String,
    pub name: String,
    pub city_name: String,
    pub country_name: String,
}

impl Location {
    /// "London (LHR)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.city_name, self.iata_code)
    }
}
