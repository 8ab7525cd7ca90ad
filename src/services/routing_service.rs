//! Routing Service
//!
//! Best-effort road routing between the pickup and dropoff of a trip, used
//! to draw the route on the vehicle-selection map. Every consumer has a
//! straight two-point fallback, so any failure here degrades to that.

use log::warn;
use serde::Deserialize;

use crate::models::Trip;

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// OSRM-backed route polyline fetcher.
pub struct RoutePlanner {
    client: reqwest::Client,
    endpoint: String,
}

impl RoutePlanner {
    pub fn new(endpoint: &str, timeout: std::time::Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the driving route as `[lon, lat]` pairs. Returns `None` on any
    /// failure; callers fall back to `straight_line`.
    pub async fn fetch_route_polyline(
        &self,
        pickup_lat: f64,
        pickup_lon: f64,
        dropoff_lat: f64,
        dropoff_lon: f64,
    ) -> Option<Vec<[f64; 2]>> {
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}?overview=full&geometries=geojson",
            self.endpoint, pickup_lon, pickup_lat, dropoff_lon, dropoff_lat
        );

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("route fetch failed: {}", err);
                return None;
            }
        };

        let parsed: OsrmResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("route response parse failed: {}", err);
                return None;
            }
        };

        parsed
            .routes
            .into_iter()
            .next()
            .map(|route| route.geometry.coordinates)
            .filter(|coordinates| !coordinates.is_empty())
    }

    /// The two-point fallback polyline for a trip.
    pub fn straight_line(trip: &Trip) -> Vec<[f64; 2]> {
        vec![
            [trip.pickup_lon, trip.pickup_lat],
            [trip.dropoff_lon, trip.dropoff_lat],
        ]
    }
}

/// Midpoint of two coordinates, `(lat, lon)`.
pub fn calculate_center(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> (f64, f64) {
    ((lat1 + lat2) / 2.0, (lon1 + lon2) / 2.0)
}

/// Map zoom level (8-17) that fits both coordinates.
pub fn calculate_zoom_level(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> u8 {
    let max_diff = (lat1 - lat2).abs().max((lon1 - lon2).abs());

    if max_diff < 0.001 {
        17
    } else if max_diff < 0.005 {
        16
    } else if max_diff < 0.01 {
        15
    } else if max_diff < 0.05 {
        14
    } else if max_diff < 0.1 {
        13
    } else if max_diff < 0.2 {
        12
    } else if max_diff < 0.5 {
        11
    } else if max_diff < 1.0 {
        10
    } else {
        8
    }
}
