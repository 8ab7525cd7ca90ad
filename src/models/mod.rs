pub mod hotel;
pub mod luggage;
pub mod order;
pub mod travel;
pub mod trip;

pub use hotel::PartnerHotel;
pub use luggage::LuggageItem;
pub use order::{OrderRecord, TravelOrderRecord, TripOrderRecord};
pub use travel::{HotelStay, Travel, TravelStatus};
pub use trip::{Trip, TripStatus};
