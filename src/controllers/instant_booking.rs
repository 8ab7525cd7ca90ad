//! Instant Booking Controller
//!
//! Two-step wizard for on-demand pickups: collect pickup/dropoff/luggage,
//! compute the pending trip through geocoding and pricing, run the
//! vehicle-selection sub-flow, then confirm and persist. Any validation
//! failure keeps the current step and surfaces a message; the controller
//! owns the single in-memory pending trip for the session.

use chrono::Local;
use log::{info, warn};
use serde_json::{Map, Value};

use crate::config::DEFAULT_MAP_CENTER;
use crate::controllers::{is_valid_email, BookingError, SelectedVehicle};
use crate::db::OrderStore;
use crate::models::{LuggageItem, PartnerHotel, Trip};
use crate::services::location_service::{calculate_distance, Geocoder};
use crate::services::TravelService;

const MAX_LUGGAGE_COUNT: u32 = 10;
const NEARBY_HOTEL_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstantStep {
    /// Step 1: pick locations and luggage.
    Collect,
    /// Step 2: final confirmation with a selected vehicle.
    Confirm,
}

pub struct InstantBookingController<G: Geocoder> {
    geocoder: G,
    store: OrderStore,
    service: TravelService,
    current_step: InstantStep,
    pending_trip: Option<Trip>,
    pickup_location: String,
    dropoff_location: String,
    luggage_count: u32,
    luggage_note: String,
    scan_confirmed: bool,
    scanned_items: Vec<LuggageItem>,
    selected_vehicle: Option<SelectedVehicle>,
    all_hotels: Vec<PartnerHotel>,
    nearby_hotels: Vec<PartnerHotel>,
    map_center: (f64, f64),
    user_email: String,
}

impl<G: Geocoder> InstantBookingController<G> {
    pub fn new(geocoder: G, store: OrderStore) -> Self {
        let all_hotels = store.load_partner_hotels();
        Self {
            geocoder,
            store,
            service: TravelService::new(),
            current_step: InstantStep::Collect,
            pending_trip: None,
            pickup_location: String::new(),
            dropoff_location: String::new(),
            luggage_count: 1,
            luggage_note: String::new(),
            scan_confirmed: false,
            scanned_items: Vec::new(),
            selected_vehicle: None,
            all_hotels,
            nearby_hotels: Vec::new(),
            map_center: DEFAULT_MAP_CENTER,
            user_email: "user@example.com".to_string(),
        }
    }

    pub fn current_step(&self) -> InstantStep {
        self.current_step
    }

    pub fn pending_trip(&self) -> Option<&Trip> {
        self.pending_trip.as_ref()
    }

    pub fn pickup_location(&self) -> &str {
        &self.pickup_location
    }

    pub fn dropoff_location(&self) -> &str {
        &self.dropoff_location
    }

    pub fn luggage_count(&self) -> u32 {
        self.luggage_count
    }

    pub fn nearby_hotels(&self) -> &[PartnerHotel] {
        &self.nearby_hotels
    }

    pub fn map_center(&self) -> (f64, f64) {
        self.map_center
    }

    pub fn set_user_email(&mut self, email: &str) -> Result<(), BookingError> {
        if !is_valid_email(email) {
            return Err(BookingError::Validation(
                "please provide a valid email address".to_string(),
            ));
        }
        self.user_email = email.to_string();
        Ok(())
    }

    pub fn set_pickup_location(&mut self, location: &str) {
        self.pickup_location = location.to_string();
    }

    pub fn set_dropoff_location(&mut self, location: &str) {
        self.dropoff_location = location.to_string();
    }

    pub fn set_luggage_count(&mut self, count: u32) {
        let clamped = count.clamp(1, MAX_LUGGAGE_COUNT);
        if clamped != count {
            warn!("luggage count {} out of range, clamped to {}", count, clamped);
        }
        self.luggage_count = clamped;
    }

    pub fn set_luggage_note(&mut self, note: &str) {
        self.luggage_note = note.to_string();
    }

    /// Record the result of the luggage scan. Scanning is required before
    /// the booking can advance.
    pub fn confirm_scan(&mut self, items: Vec<LuggageItem>) {
        self.scan_confirmed = true;
        self.scanned_items = items;
    }

    /// Re-rank the partner hotels around a map center, keeping the closest
    /// ones for display.
    pub fn update_nearby_hotels(&mut self, lat: f64, lon: f64) {
        self.map_center = (lat, lon);
        let mut ranked = self.all_hotels.clone();
        ranked.sort_by(|a, b| {
            let da = calculate_distance(a.lat, a.lon, lat, lon);
            let db = calculate_distance(b.lat, b.lon, lat, lon);
            da.total_cmp(&db)
        });
        ranked.truncate(NEARBY_HOTEL_LIMIT);
        info!(
            "nearby hotels refreshed around ({}, {}): {} candidates",
            lat,
            lon,
            ranked.len()
        );
        self.nearby_hotels = ranked;
    }

    /// Try to recenter the map on whatever the user typed as their current
    /// pickup.
    pub async fn refresh_user_location(&mut self) {
        if self.pickup_location.is_empty() {
            return;
        }
        if let Some((lat, lon, _)) = self.geocoder.geocode(&self.pickup_location, None).await {
            self.map_center = (lat, lon);
            info!("map center moved to user location ({}, {})", lat, lon);
        }
    }

    /// Validate step 1 and compute the pending trip. On success the caller
    /// hands `pending_trip()` to the vehicle-selection sub-flow.
    pub async fn go_to_confirm(&mut self) -> Result<(), BookingError> {
        if self.pickup_location.is_empty() {
            warn!("pickup location not selected");
            return Err(BookingError::Validation(
                "please select a pickup location".to_string(),
            ));
        }
        if self.dropoff_location.is_empty() {
            warn!("dropoff location not selected");
            return Err(BookingError::Validation(
                "please select a dropoff location".to_string(),
            ));
        }
        if !self.scan_confirmed {
            warn!("luggage not scanned yet");
            return Err(BookingError::Validation(
                "please scan your luggage first".to_string(),
            ));
        }

        self.compute_pending_trip().await?;
        self.selected_vehicle = None;
        Ok(())
    }

    async fn compute_pending_trip(&mut self) -> Result<(), BookingError> {
        // The pickup may fall back to the current map center; the dropoff
        // must resolve.
        let pickup_coords = match self.geocoder.geocode(&self.pickup_location, None).await {
            Some((lat, lon, _)) => (lat, lon),
            None => self.map_center,
        };
        let dropoff_coords = match self.geocoder.geocode(&self.dropoff_location, None).await {
            Some((lat, lon, _)) => (lat, lon),
            None => {
                return Err(BookingError::Geocoding(self.dropoff_location.clone()));
            }
        };

        let luggage_items = if self.scanned_items.is_empty() {
            vec![LuggageItem::standard(self.luggage_count.max(1))]
        } else {
            self.scanned_items.clone()
        };

        let trip = self.service.build_manual_trip(
            Local::now().naive_local(),
            (self.pickup_location.as_str(), pickup_coords.0, pickup_coords.1),
            (
                self.dropoff_location.as_str(),
                dropoff_coords.0,
                dropoff_coords.1,
            ),
            luggage_items,
            None,
        );
        info!(
            "instant booking computed: {} -> {} ({:.2})",
            self.pickup_location, self.dropoff_location, trip.price
        );
        self.pending_trip = Some(trip);
        Ok(())
    }

    /// Apply the vehicle sub-flow's result to the pending trip and advance
    /// to the confirmation step.
    pub fn present_vehicle_confirmation(
        &mut self,
        selection: SelectedVehicle,
    ) -> Result<(), BookingError> {
        let trip = self.pending_trip.as_mut().ok_or_else(|| {
            BookingError::Validation("no pending trip, please restart the booking".to_string())
        })?;

        trip.vehicle_type = selection.kind.as_str().to_string();
        trip.price = selection.price;
        self.selected_vehicle = Some(selection);
        self.current_step = InstantStep::Confirm;
        Ok(())
    }

    /// Final confirmation: persist the trip and reset for the next booking.
    /// On a store failure everything stays in memory for a retry.
    pub fn finalize_booking(&mut self) -> Result<Value, BookingError> {
        let trip = self.pending_trip.as_ref().ok_or_else(|| {
            BookingError::Validation("order details are incomplete, please start over".to_string())
        })?;
        let vehicle = self.selected_vehicle.as_ref().ok_or_else(|| {
            BookingError::Validation("please select a vehicle first".to_string())
        })?;

        let mut extra_fields = Map::new();
        extra_fields.insert(
            "pickup_display".to_string(),
            Value::from(self.pickup_location.clone()),
        );
        extra_fields.insert(
            "dropoff_display".to_string(),
            Value::from(self.dropoff_location.clone()),
        );
        extra_fields.insert(
            "luggage_note".to_string(),
            Value::from(self.luggage_note.clone()),
        );
        extra_fields.insert(
            "selected_vehicle".to_string(),
            Value::from(vehicle.kind.as_str()),
        );

        let record =
            self.store
                .save_single_trip(trip, &self.user_email, "instant_trip", extra_fields)?;

        info!("instant booking saved for {}", self.user_email);
        self.reset_form();
        Ok(record)
    }

    /// Back from the confirmation step to editing, without re-validating.
    pub fn go_back(&mut self) {
        if self.current_step == InstantStep::Confirm {
            self.current_step = InstantStep::Collect;
        }
    }

    pub fn reset_form(&mut self) {
        self.current_step = InstantStep::Collect;
        self.pending_trip = None;
        self.pickup_location.clear();
        self.dropoff_location.clear();
        self.luggage_count = 1;
        self.luggage_note.clear();
        self.scan_confirmed = false;
        self.scanned_items.clear();
        self.selected_vehicle = None;
    }
}
