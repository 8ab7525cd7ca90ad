//! Travel Service
//!
//! Turns a fully-specified travel plan (ordered hotel stays plus optional
//! airport transfers) into an ordered list of priced transport legs, and
//! builds the one-off legs used by instant booking. Pricing is uniform:
//! base fare + distance rate + a per-piece luggage fee.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use log::info;
use uuid::Uuid;

use crate::models::{HotelStay, LuggageItem, Travel, Trip, TripStatus};
use crate::services::location_service::calculate_distance;

const BASE_FARE: f64 = 30.0;
const DISTANCE_RATE: f64 = 30.0; // per km
const AVG_SPEED_KMH: f64 = 35.0;
const MIN_TRIP_HOURS: f64 = 0.5;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TravelError {
    #[error("at least one stay segment is required")]
    NoHotels,

    #[error("each stay must check out after it checks in")]
    StayDatesInvalid,

    #[error("the first stay must check in on the travel start date")]
    FirstCheckInMismatch,

    #[error("the last stay must check out on the travel end date")]
    LastCheckOutMismatch,

    #[error("stays must connect seamlessly: each check-out date must equal the next check-in date")]
    NonContiguousStays,
}

#[derive(Debug, Clone)]
pub struct PricingConfig {
    pub base_fare: f64,
    pub distance_rate: f64,
    pub avg_speed_kmh: f64,
    pub min_trip_hours: f64,
    pub default_arrival_time: NaiveTime,
    pub default_checkout_time: NaiveTime,
    pub default_departure_time: NaiveTime,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_fare: BASE_FARE,
            distance_rate: DISTANCE_RATE,
            avg_speed_kmh: AVG_SPEED_KMH,
            min_trip_hours: MIN_TRIP_HOURS,
            default_arrival_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            default_checkout_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            default_departure_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        }
    }
}

/// Business logic for converting travel plans into trips.
pub struct TravelService {
    config: PricingConfig,
}

impl TravelService {
    pub fn new() -> Self {
        Self {
            config: PricingConfig::default(),
        }
    }

    pub fn with_config(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Sort stays by check-in date in place, then check the plan covers the
    /// whole date range without gaps or overlaps. Fails before any pricing
    /// work happens.
    pub fn validate_hotels(&self, travel: &mut Travel) -> Result<(), TravelError> {
        if travel.hotels.is_empty() {
            return Err(TravelError::NoHotels);
        }
        if !travel.hotels.iter().all(stay_dates_valid) {
            return Err(TravelError::StayDatesInvalid);
        }

        travel.hotels.sort_by_key(|stay| stay.check_in_date);

        let first = &travel.hotels[0];
        if first.check_in_date != travel.total_start_date {
            return Err(TravelError::FirstCheckInMismatch);
        }
        let last = &travel.hotels[travel.hotels.len() - 1];
        if last.check_out_date != travel.total_end_date {
            return Err(TravelError::LastCheckOutMismatch);
        }

        for pair in travel.hotels.windows(2) {
            if pair[0].check_out_date != pair[1].check_in_date {
                return Err(TravelError::NonContiguousStays);
            }
        }

        Ok(())
    }

    /// Generate the travel's transport legs in order: optional arrival
    /// transfer, one leg per consecutive stay pair, optional departure
    /// transfer. Sets `travel.trips` and `travel.total_price`.
    pub fn generate_trips(&self, travel: &mut Travel) -> Result<Vec<Trip>, TravelError> {
        self.validate_hotels(travel)?;

        let luggage_items = if travel.luggage_items.is_empty() {
            vec![LuggageItem::standard(travel.luggage_count.max(1))]
        } else {
            travel.luggage_items.clone()
        };

        let mut trips = Vec::new();
        let parent_id = Some(travel.id.as_str());
        let first_hotel = &travel.hotels[0];
        let last_hotel = &travel.hotels[travel.hotels.len() - 1];

        if travel.arrival_transfer && !travel.arrival_location.is_empty() {
            if let (Some(lat), Some(lon)) = (travel.arrival_lat, travel.arrival_lon) {
                let arrival_time = travel.arrival_time.unwrap_or(self.config.default_arrival_time);
                let start = travel.total_start_date.and_time(arrival_time);
                trips.push(self.build_trip(
                    parent_id,
                    start,
                    (travel.arrival_location.as_str(), lat, lon),
                    (first_hotel.hotel_name.as_str(), first_hotel.lat, first_hotel.lon),
                    luggage_items.clone(),
                ));
            }
        }

        let checkout_time = travel
            .default_checkout_time
            .unwrap_or(self.config.default_checkout_time);
        for pair in travel.hotels.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            let start = current.check_out_date.and_time(checkout_time);
            trips.push(self.build_trip(
                parent_id,
                start,
                (current.hotel_name.as_str(), current.lat, current.lon),
                (next.hotel_name.as_str(), next.lat, next.lon),
                luggage_items.clone(),
            ));
        }

        if travel.departure_transfer && !travel.departure_location.is_empty() {
            if let (Some(lat), Some(lon)) = (travel.departure_lat, travel.departure_lon) {
                let departure_time = travel
                    .departure_time
                    .unwrap_or(self.config.default_departure_time);
                let start = travel.total_end_date.and_time(departure_time);
                trips.push(self.build_trip(
                    parent_id,
                    start,
                    (last_hotel.hotel_name.as_str(), last_hotel.lat, last_hotel.lon),
                    (travel.departure_location.as_str(), lat, lon),
                    luggage_items.clone(),
                ));
            }
        }

        travel.total_price = round2(trips.iter().map(|trip| trip.price).sum());
        travel.trips = trips.clone();
        info!(
            "generated {} trips for travel {} (total {:.2})",
            trips.len(),
            travel.id,
            travel.total_price
        );
        Ok(trips)
    }

    /// Build a single leg outside of any generated travel, as instant
    /// booking does.
    pub fn build_manual_trip(
        &self,
        start_time: NaiveDateTime,
        pickup: (&str, f64, f64),
        dropoff: (&str, f64, f64),
        luggage_items: Vec<LuggageItem>,
        parent_id: Option<&str>,
    ) -> Trip {
        self.build_trip(parent_id, start_time, pickup, dropoff, luggage_items)
    }

    fn build_trip(
        &self,
        parent_id: Option<&str>,
        start_time: NaiveDateTime,
        pickup: (&str, f64, f64),
        dropoff: (&str, f64, f64),
        luggage_items: Vec<LuggageItem>,
    ) -> Trip {
        let (pickup_location, pickup_lat, pickup_lon) = pickup;
        let (dropoff_location, dropoff_lat, dropoff_lon) = dropoff;
        let (price, distance_km) = self.trip_price(
            pickup_lat,
            pickup_lon,
            dropoff_lat,
            dropoff_lon,
            &luggage_items,
        );

        Trip {
            id: Uuid::new_v4().to_string(),
            parent_travel_id: parent_id.map(str::to_string),
            start_time,
            end_time: Some(self.estimate_end_time(start_time, distance_km)),
            pickup_location: pickup_location.to_string(),
            pickup_lat,
            pickup_lon,
            dropoff_location: dropoff_location.to_string(),
            dropoff_lat,
            dropoff_lon,
            status: TripStatus::Pending,
            vehicle_type: "sedan".to_string(),
            price,
            luggage_items,
        }
    }

    fn trip_price(
        &self,
        pickup_lat: f64,
        pickup_lon: f64,
        dropoff_lat: f64,
        dropoff_lon: f64,
        luggage_items: &[LuggageItem],
    ) -> (f64, f64) {
        let distance_km = calculate_distance(pickup_lat, pickup_lon, dropoff_lat, dropoff_lon);
        let fare = self.config.base_fare
            + distance_km * self.config.distance_rate
            + self.luggage_fee(luggage_items);
        (round2(fare), distance_km)
    }

    /// Per-piece handling fee, tiered by case size.
    fn luggage_fee(&self, items: &[LuggageItem]) -> f64 {
        items
            .iter()
            .map(|item| {
                let rate = if item.size <= 20 {
                    50.0
                } else if item.size <= 24 {
                    80.0
                } else {
                    100.0
                };
                rate * f64::from(item.quantity.max(1))
            })
            .sum()
    }

    fn estimate_end_time(&self, start_time: NaiveDateTime, distance_km: f64) -> NaiveDateTime {
        let duration_hours = (distance_km / self.config.avg_speed_kmh).max(self.config.min_trip_hours);
        start_time + Duration::seconds((duration_hours * 3600.0).round() as i64)
    }
}

impl Default for TravelService {
    fn default() -> Self {
        Self::new()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Validation for a single stay on its own: the check-out must come after
/// the check-in.
pub fn stay_dates_valid(stay: &HotelStay) -> bool {
    stay.check_out_date > stay.check_in_date
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TravelStatus;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stay(name: &str, lat: f64, lon: f64, check_in: NaiveDate, check_out: NaiveDate) -> HotelStay {
        HotelStay {
            hotel_name: name.to_string(),
            address: format!("{} address", name),
            lat,
            lon,
            check_in_date: check_in,
            check_out_date: check_out,
            is_locked: true,
        }
    }

    fn base_travel(hotels: Vec<HotelStay>) -> Travel {
        Travel {
            id: "travel-1".to_string(),
            total_start_date: date(2026, 1, 1),
            total_end_date: date(2026, 1, 5),
            status: TravelStatus::Draft,
            luggage_count: 0,
            arrival_transfer: false,
            arrival_location: String::new(),
            arrival_lat: None,
            arrival_lon: None,
            arrival_time: None,
            departure_transfer: false,
            departure_location: String::new(),
            departure_lat: None,
            departure_lon: None,
            departure_time: None,
            default_checkout_time: None,
            luggage_items: vec![],
            hotels,
            trips: vec![],
            total_price: 0.0,
            user_email: None,
        }
    }

    fn with_transfers(mut travel: Travel) -> Travel {
        travel.arrival_transfer = true;
        travel.arrival_location = "Taoyuan International Airport".to_string();
        travel.arrival_lat = Some(25.0797);
        travel.arrival_lon = Some(121.2342);
        travel.departure_transfer = true;
        travel.departure_location = "Taoyuan International Airport".to_string();
        travel.departure_lat = Some(25.0797);
        travel.departure_lon = Some(121.2342);
        travel
    }

    #[test]
    fn test_validate_rejects_empty_plan() {
        let service = TravelService::new();
        let mut travel = base_travel(vec![]);
        assert_eq!(
            service.validate_hotels(&mut travel),
            Err(TravelError::NoHotels)
        );
    }

    #[test]
    fn test_validate_rejects_gap_between_stays() {
        let service = TravelService::new();
        let mut travel = base_travel(vec![
            stay("Hotel A", 25.03, 121.56, date(2026, 1, 1), date(2026, 1, 3)),
            stay("Hotel B", 24.14, 120.68, date(2026, 1, 4), date(2026, 1, 5)),
        ]);
        assert_eq!(
            service.validate_hotels(&mut travel),
            Err(TravelError::NonContiguousStays)
        );
        // Fail-fast: no pricing happened.
        assert!(service.generate_trips(&mut travel).is_err());
        assert!(travel.trips.is_empty());
    }

    #[test]
    fn test_validate_rejects_inverted_stay_dates() {
        let service = TravelService::new();
        let mut travel = base_travel(vec![stay(
            "Hotel A",
            25.03,
            121.56,
            date(2026, 1, 5),
            date(2026, 1, 1),
        )]);
        assert_eq!(
            service.validate_hotels(&mut travel),
            Err(TravelError::StayDatesInvalid)
        );
    }

    #[test]
    fn test_validate_is_order_independent() {
        let service = TravelService::new();
        let a = stay("Hotel A", 25.03, 121.56, date(2026, 1, 1), date(2026, 1, 3));
        let b = stay("Hotel B", 24.14, 120.68, date(2026, 1, 3), date(2026, 1, 5));

        let mut forward = base_travel(vec![a.clone(), b.clone()]);
        let mut reversed = base_travel(vec![b, a]);
        assert!(service.validate_hotels(&mut forward).is_ok());
        assert!(service.validate_hotels(&mut reversed).is_ok());
        assert_eq!(forward.hotels, reversed.hotels);
    }

    #[test]
    fn test_validate_rejects_boundary_mismatch() {
        let service = TravelService::new();
        let mut travel = base_travel(vec![stay(
            "Hotel A",
            25.03,
            121.56,
            date(2026, 1, 2),
            date(2026, 1, 5),
        )]);
        assert_eq!(
            service.validate_hotels(&mut travel),
            Err(TravelError::FirstCheckInMismatch)
        );

        let mut travel = base_travel(vec![stay(
            "Hotel A",
            25.03,
            121.56,
            date(2026, 1, 1),
            date(2026, 1, 4),
        )]);
        assert_eq!(
            service.validate_hotels(&mut travel),
            Err(TravelError::LastCheckOutMismatch)
        );
    }

    #[test]
    fn test_single_stay_with_both_transfers_yields_two_legs() {
        let service = TravelService::new();
        let mut travel = with_transfers(base_travel(vec![stay(
            "Grand Hotel",
            25.0792,
            121.5263,
            date(2026, 1, 1),
            date(2026, 1, 5),
        )]));
        travel.luggage_items = vec![LuggageItem::new(24, 2)];

        let trips = service.generate_trips(&mut travel).unwrap();
        assert_eq!(trips.len(), 2);

        let leg1 = &trips[0];
        assert_eq!(leg1.pickup_location, "Taoyuan International Airport");
        assert_eq!(leg1.dropoff_location, "Grand Hotel");
        assert_eq!(
            leg1.start_time,
            date(2026, 1, 1).and_hms_opt(14, 0, 0).unwrap()
        );

        let leg2 = &trips[1];
        assert_eq!(leg2.pickup_location, "Grand Hotel");
        assert_eq!(leg2.dropoff_location, "Taoyuan International Airport");
        assert_eq!(
            leg2.start_time,
            date(2026, 1, 5).and_hms_opt(12, 0, 0).unwrap()
        );

        // price = 30 + distance * 30 + 2 * 80
        let distance = calculate_distance(25.0797, 121.2342, 25.0792, 121.5263);
        let expected = ((30.0 + distance * 30.0 + 160.0) * 100.0).round() / 100.0;
        assert!((leg1.price - expected).abs() < 1e-9);
        assert!((travel.total_price - round2(leg1.price + leg2.price)).abs() < 1e-9);
        assert!(trips.iter().all(|t| t.parent_travel_id.as_deref() == Some("travel-1")));
    }

    #[test]
    fn test_transfer_count_property() {
        let service = TravelService::new();
        let hotels = vec![
            stay("Hotel A", 25.03, 121.56, date(2026, 1, 1), date(2026, 1, 2)),
            stay("Hotel B", 24.14, 120.68, date(2026, 1, 2), date(2026, 1, 4)),
            stay("Hotel C", 22.64, 120.30, date(2026, 1, 4), date(2026, 1, 5)),
        ];

        // N stays, both transfers: N + 1 legs.
        let mut both = with_transfers(base_travel(hotels.clone()));
        assert_eq!(service.generate_trips(&mut both).unwrap().len(), 4);

        // No transfers: N - 1 legs.
        let mut none = base_travel(hotels);
        assert_eq!(service.generate_trips(&mut none).unwrap().len(), 2);
    }

    #[test]
    fn test_inter_hotel_leg_schedule_and_route() {
        let service = TravelService::new();
        let mut travel = base_travel(vec![
            stay("Hotel A", 25.03, 121.56, date(2026, 1, 1), date(2026, 1, 3)),
            stay("Hotel B", 24.14, 120.68, date(2026, 1, 3), date(2026, 1, 5)),
        ]);

        let trips = service.generate_trips(&mut travel).unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].pickup_location, "Hotel A");
        assert_eq!(trips[0].dropoff_location, "Hotel B");
        assert_eq!(
            trips[0].start_time,
            date(2026, 1, 3).and_hms_opt(11, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_checkout_time_override() {
        let service = TravelService::new();
        let mut travel = base_travel(vec![
            stay("Hotel A", 25.03, 121.56, date(2026, 1, 1), date(2026, 1, 3)),
            stay("Hotel B", 24.14, 120.68, date(2026, 1, 3), date(2026, 1, 5)),
        ]);
        travel.default_checkout_time = NaiveTime::from_hms_opt(9, 30, 0);

        let trips = service.generate_trips(&mut travel).unwrap();
        assert_eq!(
            trips[0].start_time,
            date(2026, 1, 3).and_hms_opt(9, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_luggage_fee_tiers() {
        let service = TravelService::new();
        let fee = service.luggage_fee(&[
            LuggageItem::new(20, 1),
            LuggageItem::new(24, 1),
            LuggageItem::new(25, 1),
        ]);
        assert!((fee - 230.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_luggage_when_unspecified() {
        let service = TravelService::new();
        let mut travel = with_transfers(base_travel(vec![stay(
            "Grand Hotel",
            25.0792,
            121.5263,
            date(2026, 1, 1),
            date(2026, 1, 5),
        )]));
        travel.luggage_count = 3;

        let trips = service.generate_trips(&mut travel).unwrap();
        assert_eq!(trips[0].luggage_items, vec![LuggageItem::new(24, 3)]);
    }

    #[test]
    fn test_price_monotonic_in_distance_and_luggage() {
        let service = TravelService::new();
        let luggage = vec![LuggageItem::new(24, 1)];

        let (near, _) = service.trip_price(25.03, 121.56, 25.05, 121.58, &luggage);
        let (far, _) = service.trip_price(25.03, 121.56, 24.14, 120.68, &luggage);
        assert!(far > near);

        let (light, _) = service.trip_price(25.03, 121.56, 25.05, 121.58, &luggage);
        let (heavy, _) =
            service.trip_price(25.03, 121.56, 25.05, 121.58, &[LuggageItem::new(24, 4)]);
        assert!(heavy > light);
    }

    #[test]
    fn test_end_time_floors_at_half_hour() {
        let service = TravelService::new();
        let start = date(2026, 1, 1).and_hms_opt(14, 0, 0).unwrap();

        // A hop shorter than half an hour of driving still books 30 minutes.
        let end = service.estimate_end_time(start, 1.0);
        assert_eq!(end, start + Duration::minutes(30));

        // 70 km at 35 km/h is two hours.
        let end = service.estimate_end_time(start, 70.0);
        assert_eq!(end, start + Duration::hours(2));
    }

    #[test]
    fn test_prices_round_to_two_decimals() {
        let service = TravelService::new();
        let (price, _) = service.trip_price(25.03, 121.56, 24.14, 120.68, &[]);
        assert!(((price * 100.0).round() / 100.0 - price).abs() < 1e-12);
    }
}
