pub mod flight;
pub mod location;

pub use flight::{format_duration, parse_iso8601_duration, FlightOffer, FlightSegment};
pub use location::Location;
