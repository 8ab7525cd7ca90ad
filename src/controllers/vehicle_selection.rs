//! Vehicle Selection Controller
//!
//! Sub-flow entered after an instant booking is computed: recommends a
//! vehicle tier from the luggage count, quotes each tier off the trip's
//! base price, and provides the map context (route polyline, center, zoom)
//! the selection screen renders.

use log::{debug, info};
use rand::Rng;

use crate::controllers::BookingError;
use crate::models::Trip;
use crate::services::location_service::calculate_distance;
use crate::services::routing_service::{calculate_center, calculate_zoom_level, RoutePlanner};

const FALLBACK_MIN_PRICE: f64 = 350.0;
const FALLBACK_RATE_PER_KM: f64 = 80.0;
const ETA_MINUTES_PER_KM: f64 = 2.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleKind {
    Sedan,
    Suv,
    Van,
}

impl VehicleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleKind::Sedan => "sedan",
            VehicleKind::Suv => "suv",
            VehicleKind::Van => "van",
        }
    }
}

struct VehicleTier {
    kind: VehicleKind,
    label: &'static str,
    description: &'static str,
    capacity_text: &'static str,
    multiplier: f64,
    eta_window: (u32, u32),
}

const VEHICLE_LIBRARY: [VehicleTier; 3] = [
    VehicleTier {
        kind: VehicleKind::Sedan,
        label: "Comfort Sedan",
        description: "Up to 3 pieces of 24\" luggage",
        capacity_text: "3 pieces",
        multiplier: 1.0,
        eta_window: (2, 10),
    },
    VehicleTier {
        kind: VehicleKind::Suv,
        label: "Urban SUV",
        description: "Up to 5 pieces of 24\" luggage",
        capacity_text: "5 pieces",
        multiplier: 1.25,
        eta_window: (2, 10),
    },
    VehicleTier {
        kind: VehicleKind::Van,
        label: "7-seat Van",
        description: "Up to 7 pieces of 24\" luggage",
        capacity_text: "7 pieces",
        multiplier: 1.5,
        eta_window: (5, 20),
    },
];

/// One tier as presented to the selection screen.
#[derive(Debug, Clone)]
pub struct VehicleQuote {
    pub kind: VehicleKind,
    pub label: &'static str,
    pub description: &'static str,
    pub capacity_text: &'static str,
    pub eta_text: String,
    pub price: f64,
    pub is_selected: bool,
    pub is_recommended: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone)]
pub struct MapContext {
    pub center: (f64, f64),
    pub zoom: u8,
    pub polyline: Vec<[f64; 2]>,
    pub pickup: MapPoint,
    pub dropoff: MapPoint,
}

#[derive(Debug, Clone)]
pub struct TripSummary {
    pub pickup: String,
    pub dropoff: String,
    pub luggage_count: u32,
    pub luggage_note: String,
    pub distance_km: f64,
    pub eta_min: u32,
}

/// The confirmed choice handed back to the booking controller.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedVehicle {
    pub kind: VehicleKind,
    pub label: String,
    pub price: f64,
}

pub struct VehicleSelectionController {
    router: RoutePlanner,
    trip: Option<Trip>,
    pickup_display: String,
    dropoff_display: String,
    luggage_note: String,
    luggage_count: u32,
    base_price: f64,
    distance_km: f64,
    eta_min: u32,
    polyline: Vec<[f64; 2]>,
    center: (f64, f64),
    zoom: u8,
    selected: VehicleKind,
    recommended: VehicleKind,
}

impl VehicleSelectionController {
    pub fn new(router: RoutePlanner) -> Self {
        Self {
            router,
            trip: None,
            pickup_display: String::new(),
            dropoff_display: String::new(),
            luggage_note: String::new(),
            luggage_count: 0,
            base_price: 0.0,
            distance_km: 0.0,
            eta_min: 0,
            polyline: Vec::new(),
            center: (0.0, 0.0),
            zoom: 14,
            selected: VehicleKind::Sedan,
            recommended: VehicleKind::Sedan,
        }
    }

    /// Take over a freshly computed trip and build everything the selection
    /// screen needs. The route fetch is best-effort; on failure the map
    /// shows the straight two-point line.
    pub async fn prepare_from_trip(
        &mut self,
        trip: &Trip,
        pickup_display: &str,
        dropoff_display: &str,
        luggage_count: u32,
        luggage_note: &str,
    ) {
        info!("preparing vehicle selection for trip {}", trip.id);
        self.pickup_display = pickup_display.to_string();
        self.dropoff_display = dropoff_display.to_string();
        self.luggage_note = luggage_note.to_string();
        self.luggage_count = luggage_count.max(1);

        self.recommended = recommend_vehicle(self.luggage_count);
        self.selected = self.recommended;

        self.base_price = if trip.price > 0.0 {
            trip.price
        } else {
            estimate_price_fallback(trip)
        };
        self.distance_km = (calculate_distance(
            trip.pickup_lat,
            trip.pickup_lon,
            trip.dropoff_lat,
            trip.dropoff_lon,
        ) * 10.0)
            .round()
            / 10.0;
        let eta = (self.distance_km * ETA_MINUTES_PER_KM) as u32;
        self.eta_min = if eta == 0 { 5 } else { eta };

        self.polyline = self
            .router
            .fetch_route_polyline(
                trip.pickup_lat,
                trip.pickup_lon,
                trip.dropoff_lat,
                trip.dropoff_lon,
            )
            .await
            .unwrap_or_else(|| RoutePlanner::straight_line(trip));
        self.center = calculate_center(
            trip.pickup_lat,
            trip.pickup_lon,
            trip.dropoff_lat,
            trip.dropoff_lon,
        );
        self.zoom = calculate_zoom_level(
            trip.pickup_lat,
            trip.pickup_lon,
            trip.dropoff_lat,
            trip.dropoff_lon,
        );
        self.trip = Some(trip.clone());
    }

    pub fn get_vehicle_options(&self) -> Vec<VehicleQuote> {
        let mut rng = rand::thread_rng();
        VEHICLE_LIBRARY
            .iter()
            .map(|tier| {
                let eta = rng.gen_range(tier.eta_window.0..=tier.eta_window.1);
                VehicleQuote {
                    kind: tier.kind,
                    label: tier.label,
                    description: tier.description,
                    capacity_text: tier.capacity_text,
                    eta_text: format!("arrives in about {} min", eta),
                    price: tier_price(self.base_price, tier.multiplier),
                    is_selected: tier.kind == self.selected,
                    is_recommended: tier.kind == self.recommended,
                }
            })
            .collect()
    }

    pub fn get_map_context(&self) -> Option<MapContext> {
        let trip = self.trip.as_ref()?;
        Some(MapContext {
            center: self.center,
            zoom: self.zoom,
            polyline: self.polyline.clone(),
            pickup: MapPoint {
                label: self.pickup_display.clone(),
                lat: trip.pickup_lat,
                lon: trip.pickup_lon,
            },
            dropoff: MapPoint {
                label: self.dropoff_display.clone(),
                lat: trip.dropoff_lat,
                lon: trip.dropoff_lon,
            },
        })
    }

    pub fn get_trip_summary(&self) -> Option<TripSummary> {
        self.trip.as_ref()?;
        Some(TripSummary {
            pickup: self.pickup_display.clone(),
            dropoff: self.dropoff_display.clone(),
            luggage_count: self.luggage_count,
            luggage_note: self.luggage_note.clone(),
            distance_km: self.distance_km,
            eta_min: self.eta_min,
        })
    }

    pub fn select_vehicle(&mut self, kind: VehicleKind) {
        debug!("vehicle tier selected: {}", kind.as_str());
        self.selected = kind;
    }

    pub fn selected_vehicle(&self) -> VehicleKind {
        self.selected
    }

    pub fn recommended_vehicle(&self) -> VehicleKind {
        self.recommended
    }

    /// Confirm the current tier. The caller applies the result to its
    /// pending trip; this controller never mutates the booking's copy.
    pub fn confirm_choice(&self) -> Result<SelectedVehicle, BookingError> {
        if self.trip.is_none() {
            return Err(BookingError::Validation(
                "no trip has been prepared, please restart the booking".to_string(),
            ));
        }
        let tier = VEHICLE_LIBRARY
            .iter()
            .find(|tier| tier.kind == self.selected)
            .ok_or_else(|| BookingError::Validation("please select a vehicle".to_string()))?;

        Ok(SelectedVehicle {
            kind: tier.kind,
            label: tier.label.to_string(),
            price: tier_price(self.base_price, tier.multiplier),
        })
    }

    pub fn reset(&mut self) {
        self.trip = None;
        self.pickup_display.clear();
        self.dropoff_display.clear();
        self.luggage_note.clear();
        self.luggage_count = 0;
        self.base_price = 0.0;
        self.distance_km = 0.0;
        self.eta_min = 0;
        self.polyline.clear();
        self.center = (0.0, 0.0);
        self.zoom = 14;
        self.selected = VehicleKind::Sedan;
        self.recommended = VehicleKind::Sedan;
    }
}

/// Tier recommendation by total piece count.
pub fn recommend_vehicle(luggage_count: u32) -> VehicleKind {
    if luggage_count < 3 {
        VehicleKind::Sedan
    } else if luggage_count < 5 {
        VehicleKind::Suv
    } else {
        VehicleKind::Van
    }
}

fn tier_price(base_price: f64, multiplier: f64) -> f64 {
    (base_price * multiplier).round()
}

fn estimate_price_fallback(trip: &Trip) -> f64 {
    let distance_km = calculate_distance(
        trip.pickup_lat,
        trip.pickup_lon,
        trip.dropoff_lat,
        trip.dropoff_lon,
    );
    (distance_km * FALLBACK_RATE_PER_KM).max(FALLBACK_MIN_PRICE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_boundaries() {
        assert_eq!(recommend_vehicle(1), VehicleKind::Sedan);
        assert_eq!(recommend_vehicle(2), VehicleKind::Sedan);
        assert_eq!(recommend_vehicle(3), VehicleKind::Suv);
        assert_eq!(recommend_vehicle(4), VehicleKind::Suv);
        assert_eq!(recommend_vehicle(5), VehicleKind::Van);
        assert_eq!(recommend_vehicle(9), VehicleKind::Van);
    }

    #[test]
    fn test_tier_price_multipliers() {
        assert_eq!(tier_price(400.0, 1.0), 400.0);
        assert_eq!(tier_price(400.0, 1.25), 500.0);
        assert_eq!(tier_price(400.0, 1.5), 600.0);
        // Rounded to whole units.
        assert_eq!(tier_price(333.3, 1.25), 417.0);
    }
}
