pub mod models;

pub use models::{FlightOffer, FlightSegment, Location};
