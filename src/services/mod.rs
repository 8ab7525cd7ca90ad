pub mod location_service;
pub mod routing_service;
pub mod travel_service;

pub use location_service::{Geocoder, NominatimGeocoder, StaticGeocoder};
pub use routing_service::RoutePlanner;
pub use travel_service::{PricingConfig, TravelError, TravelService};
