pub mod advance_booking;
pub mod instant_booking;
pub mod vehicle_selection;

pub use advance_booking::{AdvanceBookingController, AdvanceStep, HotelStaySegment};
pub use instant_booking::{InstantBookingController, InstantStep};
pub use vehicle_selection::{SelectedVehicle, VehicleKind, VehicleSelectionController};

use regex::Regex;

use crate::db::StoreError;
use crate::services::TravelError;

/// Failures surfaced to the user at the controller boundary. Validation
/// messages are the exact text shown in the UI; persistence failures keep
/// the in-memory wizard state intact so the user can retry.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("cannot resolve address: {0}")]
    Geocoding(String),

    #[error("save failed, please try again")]
    Persistence(#[from] StoreError),

    #[error(transparent)]
    Travel(#[from] TravelError),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .map(|pattern| pattern.is_match(email))
        .unwrap_or(false)
}
