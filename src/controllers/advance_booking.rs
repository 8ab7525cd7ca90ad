//! Advance Booking Controller
//!
//! Three-step wizard for planning a whole stay ahead of time: pick the
//! travel date range, lay out hotel stays as a chain of segments (each new
//! segment checks in on the previous one's check-out date), then preview
//! the generated transfer legs and submit. Confirmed segments are locked
//! against edits; removing the last segment unlocks the one before it.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use log::{info, warn};
use serde_json::Value;
use uuid::Uuid;

use crate::config::DEFAULT_TRANSFER_LOCATION;
use crate::controllers::{is_valid_email, BookingError};
use crate::db::OrderStore;
use crate::models::{HotelStay, PartnerHotel, Travel, TravelStatus};
use crate::services::location_service::Geocoder;
use crate::services::TravelService;

/// A stay being filled in by the user; becomes a `HotelStay` once the plan
/// is confirmed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotelStaySegment {
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
    pub hotel_name: String,
    pub is_locked: bool,
}

impl HotelStaySegment {
    pub fn is_complete(&self) -> bool {
        self.check_in_date.is_some() && self.check_out_date.is_some() && !self.hotel_name.is_empty()
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.check_in_date.is_none() {
            missing.push("check-in date");
        }
        if self.check_out_date.is_none() {
            missing.push("check-out date");
        }
        if self.hotel_name.is_empty() {
            missing.push("hotel name");
        }
        missing
    }
}

/// Everything the wizard collects before a `Travel` is built.
#[derive(Debug, Clone)]
pub struct TripConfiguration {
    pub total_start_date: Option<NaiveDate>,
    pub total_end_date: Option<NaiveDate>,
    pub segments: Vec<HotelStaySegment>,
    pub luggage_count: u32,
    pub need_arrival_transfer: bool,
    pub need_departure_transfer: bool,
    pub arrival_location: String,
    pub departure_location: String,
}

impl Default for TripConfiguration {
    fn default() -> Self {
        Self {
            total_start_date: None,
            total_end_date: None,
            segments: Vec::new(),
            luggage_count: 0,
            need_arrival_transfer: false,
            need_departure_transfer: false,
            arrival_location: DEFAULT_TRANSFER_LOCATION.to_string(),
            departure_location: DEFAULT_TRANSFER_LOCATION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceStep {
    /// Step 1: total date range.
    DateRange,
    /// Step 2: dynamic stay segments.
    Planning,
    /// Step 3: preview and submit.
    Confirm,
}

/// Result of confirming a segment: either a new blank segment was chained
/// on, or the plan already reaches the travel end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddSegmentOutcome {
    Added,
    PlanningComplete,
}

pub struct AdvanceBookingController<G: Geocoder> {
    geocoder: G,
    store: OrderStore,
    service: TravelService,
    current_step: AdvanceStep,
    config: TripConfiguration,
    preview_travel: Option<Travel>,
    hotel_lookup: HashMap<String, PartnerHotel>,
    user_email: String,
}

impl<G: Geocoder> AdvanceBookingController<G> {
    pub fn new(geocoder: G, store: OrderStore) -> Self {
        let hotel_lookup = store
            .load_hotels()
            .into_iter()
            .map(|hotel| (hotel.name.clone(), hotel))
            .collect();
        Self {
            geocoder,
            store,
            service: TravelService::new(),
            current_step: AdvanceStep::DateRange,
            config: TripConfiguration::default(),
            preview_travel: None,
            hotel_lookup,
            user_email: "user@example.com".to_string(),
        }
    }

    pub fn current_step(&self) -> AdvanceStep {
        self.current_step
    }

    pub fn trip_config(&self) -> &TripConfiguration {
        &self.config
    }

    pub fn segments(&self) -> &[HotelStaySegment] {
        &self.config.segments
    }

    pub fn preview_travel(&self) -> Option<&Travel> {
        self.preview_travel.as_ref()
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

    // --- Step 1: date range ---

    pub fn set_start_date(&mut self, start: NaiveDate) {
        info!("travel start date set: {}", start);
        self.config.total_start_date = Some(start);
        // Keep the range valid: picking a start at or past the current end
        // pushes the end out by a day.
        if let Some(end) = self.config.total_end_date {
            if end <= start {
                self.config.total_end_date = Some(start + Duration::days(1));
            }
        }
        self.preview_travel = None;
    }

    pub fn set_end_date(&mut self, end: NaiveDate) {
        info!("travel end date set: {}", end);
        self.config.total_end_date = Some(end);
        self.preview_travel = None;
    }

    pub fn set_luggage_count(&mut self, count: u32) {
        self.config.luggage_count = count;
        self.preview_travel = None;
    }

    pub fn set_arrival_transfer(&mut self, enabled: bool) {
        self.config.need_arrival_transfer = enabled;
        self.preview_travel = None;
    }

    pub fn set_departure_transfer(&mut self, enabled: bool) {
        self.config.need_departure_transfer = enabled;
        self.preview_travel = None;
    }

    pub fn set_arrival_location(&mut self, location: &str) {
        self.config.arrival_location = location.to_string();
        self.preview_travel = None;
    }

    pub fn set_departure_location(&mut self, location: &str) {
        self.config.departure_location = location.to_string();
        self.preview_travel = None;
    }

    pub fn go_to_planning(&mut self) -> Result<(), BookingError> {
        let (start, end) = match (self.config.total_start_date, self.config.total_end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(BookingError::Validation(
                    "please select the full travel date range first".to_string(),
                ));
            }
        };
        if end <= start {
            return Err(BookingError::Validation(
                "the end date must be after the start date".to_string(),
            ));
        }

        if self.config.segments.is_empty() {
            self.seed_first_segment();
        }
        self.current_step = AdvanceStep::Planning;
        Ok(())
    }

    /// The first segment always checks in on the travel start date.
    fn seed_first_segment(&mut self) {
        if let Some(start) = self.config.total_start_date {
            self.config.segments.push(HotelStaySegment {
                check_in_date: Some(start),
                ..HotelStaySegment::default()
            });
        }
    }

    // --- Step 2: dynamic segments ---

    fn segment_mut(&mut self, index: usize) -> Result<&mut HotelStaySegment, BookingError> {
        let segment = self.config.segments.get_mut(index).ok_or_else(|| {
            BookingError::Validation("that stay no longer exists".to_string())
        })?;
        if segment.is_locked {
            return Err(BookingError::Validation(
                "this stay is confirmed and can no longer be edited".to_string(),
            ));
        }
        Ok(segment)
    }

    pub fn set_segment_check_in(
        &mut self,
        index: usize,
        date: NaiveDate,
    ) -> Result<(), BookingError> {
        let segment = self.segment_mut(index)?;
        segment.check_in_date = Some(date);
        self.preview_travel = None;
        Ok(())
    }

    pub fn set_segment_check_out(
        &mut self,
        index: usize,
        date: NaiveDate,
    ) -> Result<(), BookingError> {
        let segment = self.segment_mut(index)?;
        if let Some(check_in) = segment.check_in_date {
            if date <= check_in {
                return Err(BookingError::Validation(
                    "the check-out date must be after the check-in date".to_string(),
                ));
            }
        }
        segment.check_out_date = Some(date);
        self.preview_travel = None;
        Ok(())
    }

    pub fn set_segment_hotel_name(
        &mut self,
        index: usize,
        name: &str,
    ) -> Result<(), BookingError> {
        let segment = self.segment_mut(index)?;
        segment.hotel_name = name.to_string();
        self.preview_travel = None;
        Ok(())
    }

    /// Confirm the segment at `index` and chain the next one on. The
    /// confirmed segment becomes locked.
    pub fn add_next_segment(&mut self, index: usize) -> Result<AddSegmentOutcome, BookingError> {
        let total_end = self.config.total_end_date.ok_or_else(|| {
            BookingError::Validation("please select the full travel date range first".to_string())
        })?;

        let segment = self.config.segments.get_mut(index).ok_or_else(|| {
            BookingError::Validation("that stay no longer exists".to_string())
        })?;
        if !segment.is_complete() {
            return Err(BookingError::Validation(format!(
                "please complete the current stay: {}",
                segment.missing_fields().join(", ")
            )));
        }

        segment.is_locked = true;
        info!("stay segment {} locked", index);
        let check_out = segment.check_out_date.ok_or_else(|| {
            BookingError::Validation("the stay is missing its check-out date".to_string())
        })?;

        if check_out >= total_end {
            info!("stay planning reaches the travel end date");
            return Ok(AddSegmentOutcome::PlanningComplete);
        }

        self.config.segments.push(HotelStaySegment {
            check_in_date: Some(check_out),
            ..HotelStaySegment::default()
        });
        info!("new stay segment chained; total {}", self.config.segments.len());
        self.preview_travel = None;
        Ok(AddSegmentOutcome::Added)
    }

    /// Drop the last segment and unlock the one before it so it can be
    /// refilled. The first segment always stays.
    pub fn remove_last_segment(&mut self) {
        if self.config.segments.len() > 1 {
            self.config.segments.pop();
            if let Some(last) = self.config.segments.last_mut() {
                last.is_locked = false;
            }
            self.preview_travel = None;
        }
    }

    // --- Step 3: preview and submission ---

    /// Final validation, then build the priced preview and advance to the
    /// confirmation step. On failure the last segment is unlocked again so
    /// the user can fix it.
    pub async fn go_to_confirm(&mut self) -> Result<(), BookingError> {
        let total_end = self.config.total_end_date.ok_or_else(|| {
            BookingError::Validation("please select the full travel date range first".to_string())
        })?;

        let last = self.config.segments.last_mut().ok_or_else(|| {
            BookingError::Validation("at least one stay segment is required".to_string())
        })?;
        if !last.is_complete() {
            let missing = last.missing_fields().join(", ");
            warn!("last stay segment incomplete: {}", missing);
            return Err(BookingError::Validation(format!(
                "please complete the last stay: {}",
                missing
            )));
        }
        last.is_locked = true;

        if let Some(check_out) = last.check_out_date {
            if check_out < total_end {
                warn!("stay coverage incomplete: {} < {}", check_out, total_end);
                return Err(BookingError::Validation(format!(
                    "the stays do not yet cover the travel end date ({})",
                    total_end
                )));
            }
        }

        if let Err(err) = self.build_preview().await {
            warn!("travel preview failed: {}", err);
            if let Some(last) = self.config.segments.last_mut() {
                last.is_locked = false;
            }
            return Err(err);
        }

        info!("moving to confirmation step");
        self.current_step = AdvanceStep::Confirm;
        Ok(())
    }

    /// Save the previewed travel and all its generated trips, then reset.
    /// A store failure leaves the preview intact for a retry.
    pub async fn submit_order(&mut self) -> Result<(Value, Vec<Value>), BookingError> {
        if self.preview_travel.is_none() {
            self.build_preview().await?;
        }
        let travel = self.preview_travel.as_ref().ok_or_else(|| {
            BookingError::Validation("the travel could not be built, please try again".to_string())
        })?;

        let saved = self.store.save_travel_with_trips(travel, &self.user_email)?;
        info!("travel submitted for {}", self.user_email);
        self.reset_form();
        Ok(saved)
    }

    async fn build_preview(&mut self) -> Result<(), BookingError> {
        let (start, end) = match (self.config.total_start_date, self.config.total_end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(BookingError::Validation(
                    "please select the full travel date range first".to_string(),
                ));
            }
        };
        if self.config.segments.is_empty() {
            return Err(BookingError::Validation(
                "at least one stay segment is required".to_string(),
            ));
        }

        let mut hotels = Vec::with_capacity(self.config.segments.len());
        let segments = self.config.segments.clone();
        for segment in &segments {
            let (check_in, check_out) = match (segment.check_in_date, segment.check_out_date) {
                (Some(check_in), Some(check_out)) => (check_in, check_out),
                _ => {
                    return Err(BookingError::Validation(
                        "please complete every stay before confirming".to_string(),
                    ));
                }
            };
            if segment.hotel_name.is_empty() {
                return Err(BookingError::Validation(
                    "please enter a hotel name for every stay".to_string(),
                ));
            }

            let resolved = self.resolve_hotel_metadata(&segment.hotel_name).await;
            hotels.push(HotelStay {
                hotel_name: segment.hotel_name.clone(),
                address: resolved.address,
                lat: resolved.lat,
                lon: resolved.lon,
                check_in_date: check_in,
                check_out_date: check_out,
                is_locked: true,
            });
        }

        let mut travel = Travel {
            id: Uuid::new_v4().to_string(),
            total_start_date: start,
            total_end_date: end,
            status: TravelStatus::Draft,
            luggage_count: self.config.luggage_count,
            arrival_transfer: self.config.need_arrival_transfer,
            arrival_location: self.config.arrival_location.clone(),
            arrival_lat: None,
            arrival_lon: None,
            arrival_time: None,
            departure_transfer: self.config.need_departure_transfer,
            departure_location: self.config.departure_location.clone(),
            departure_lat: None,
            departure_lon: None,
            departure_time: None,
            default_checkout_time: None,
            luggage_items: Vec::new(),
            hotels,
            trips: Vec::new(),
            total_price: 0.0,
            user_email: None,
        };

        // Resolve both transfer endpoints in one round.
        let (arrival_coords, departure_coords) = futures::join!(
            self.geocode_if(self.config.need_arrival_transfer, &self.config.arrival_location),
            self.geocode_if(
                self.config.need_departure_transfer,
                &self.config.departure_location
            ),
        );
        if let Some((lat, lon)) = arrival_coords {
            travel.arrival_lat = Some(lat);
            travel.arrival_lon = Some(lon);
        }
        if let Some((lat, lon)) = departure_coords {
            travel.departure_lat = Some(lat);
            travel.departure_lon = Some(lon);
        }

        self.service.generate_trips(&mut travel)?;
        self.preview_travel = Some(travel);
        Ok(())
    }

    async fn geocode_if(&self, wanted: bool, address: &str) -> Option<(f64, f64)> {
        if !wanted || address.is_empty() {
            return None;
        }
        self.geocoder
            .geocode(address, None)
            .await
            .map(|(lat, lon, _)| (lat, lon))
    }

    /// Partner hotels resolve from the lookup table; everything else goes
    /// through geocoding, with a zero-coordinate placeholder as the last
    /// resort so the preview still renders.
    async fn resolve_hotel_metadata(&self, hotel_name: &str) -> PartnerHotel {
        if let Some(known) = self.hotel_lookup.get(hotel_name) {
            return known.clone();
        }
        if let Some((lat, lon, formatted)) = self.geocoder.geocode(hotel_name, None).await {
            return PartnerHotel {
                name: hotel_name.to_string(),
                address: formatted,
                lat,
                lon,
                is_partner: false,
            };
        }
        warn!("hotel {} could not be resolved", hotel_name);
        PartnerHotel {
            name: hotel_name.to_string(),
            address: hotel_name.to_string(),
            lat: 0.0,
            lon: 0.0,
            is_partner: false,
        }
    }

    pub fn go_back(&mut self) {
        match self.current_step {
            AdvanceStep::Confirm => {
                self.current_step = AdvanceStep::Planning;
                self.preview_travel = None;
            }
            AdvanceStep::Planning => {
                self.current_step = AdvanceStep::DateRange;
                self.preview_travel = None;
            }
            AdvanceStep::DateRange => {}
        }
    }

    pub fn reset_form(&mut self) {
        info!("advance booking form reset");
        self.config = TripConfiguration::default();
        self.preview_travel = None;
        self.current_step = AdvanceStep::DateRange;
    }
}
