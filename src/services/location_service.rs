//! Location Service
//!
//! Geocoding and distance calculations for the booking flows. The live
//! implementation talks to a Nominatim endpoint with a fixed timeout and a
//! small bounded retry for transient failures; consumers always tolerate an
//! absent result by surfacing a user message instead of crashing.

use std::time::Duration;

use log::{error, info, warn};
use serde::Deserialize;

use crate::config::GeocoderConfig;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const COUNTRY_SUFFIXES: [&str; 2] = ["Taiwan", "Republic of China"];

/// Address resolution capability. Both operations return `None` when the
/// address/coordinates cannot be resolved; callers never crash on absence.
pub trait Geocoder {
    /// Address to `(lat, lon, formatted_address)`.
    async fn geocode(&self, address: &str, country_hint: Option<&str>)
        -> Option<(f64, f64, String)>;

    /// Coordinates to a formatted address.
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Option<String>;
}

/// Great-circle distance between two coordinates in kilometers (haversine).
pub fn calculate_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn validate_coordinates(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

pub fn format_coordinates(lat: f64, lon: f64, precision: usize) -> String {
    format!("{:.prec$}, {:.prec$}", lat, lon, prec = precision)
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    display_name: String,
}

/// Geocoder backed by the Nominatim HTTP API.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            max_retries: config.max_retries.max(1),
            retry_delay: config.retry_delay,
        })
    }

    /// Retry wrapper around one GET. Timeouts and connection errors are
    /// retried with linear backoff; anything else short-circuits.
    async fn get_with_retry(&self, url: &str) -> Option<reqwest::Response> {
        for attempt in 1..=self.max_retries {
            match self.client.get(url).send().await {
                Ok(response) => return Some(response),
                Err(err) if err.is_timeout() || err.is_connect() => {
                    warn!(
                        "geocoding request failed on attempt {}/{} (retryable): {}",
                        attempt, self.max_retries, err
                    );
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_delay * attempt).await;
                    }
                }
                Err(err) => {
                    error!("geocoding request failed: {}", err);
                    return None;
                }
            }
        }
        error!("geocoding request exhausted {} retries", self.max_retries);
        None
    }

    /// Strip postal codes and country parts from a display name, keeping the
    /// leading meaningful components.
    fn simplify_address(display_name: &str) -> String {
        let filtered: Vec<&str> = display_name
            .split(", ")
            .filter(|part| {
                !part.chars().all(|c| c.is_ascii_digit()) && !COUNTRY_SUFFIXES.contains(part)
            })
            .take(4)
            .collect();

        if filtered.is_empty() {
            display_name.to_string()
        } else {
            filtered.join(", ")
        }
    }
}

impl Geocoder for NominatimGeocoder {
    async fn geocode(
        &self,
        address: &str,
        country_hint: Option<&str>,
    ) -> Option<(f64, f64, String)> {
        if address.is_empty() {
            return None;
        }

        info!("geocoding address: {}", address);
        let url = format!(
            "{}/search?q={}&format=json&limit=1&countrycodes={}",
            self.endpoint,
            urlencode(address),
            country_hint.unwrap_or("tw"),
        );

        let response = self.get_with_retry(&url).await?;
        let places: Vec<NominatimPlace> = match response.json().await {
            Ok(places) => places,
            Err(err) => {
                error!("failed to parse geocoding response: {}", err);
                return None;
            }
        };

        let place = match places.into_iter().next() {
            Some(place) => place,
            None => {
                warn!("no location found for: {}", address);
                return None;
            }
        };

        let lat: f64 = place.lat.parse().ok()?;
        let lon: f64 = place.lon.parse().ok()?;
        info!("found location: {}", place.display_name);
        Some((lat, lon, place.display_name))
    }

    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Option<String> {
        if !validate_coordinates(lat, lon) {
            warn!("refusing to reverse-geocode invalid coordinates ({}, {})", lat, lon);
            return None;
        }

        info!("reverse geocoding: ({}, {})", lat, lon);
        let url = format!(
            "{}/reverse?lat={}&lon={}&format=json",
            self.endpoint, lat, lon
        );

        let response = self.get_with_retry(&url).await?;
        let place: NominatimReverse = match response.json().await {
            Ok(place) => place,
            Err(err) => {
                error!("failed to parse reverse geocoding response: {}", err);
                return None;
            }
        };

        let simplified = Self::simplify_address(&place.display_name);
        info!("resolved address: {}", simplified);
        Some(simplified)
    }
}

fn urlencode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(*byte as char)
            }
            b' ' => encoded.push('+'),
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}

/// Table-backed geocoder over well-known places. Stands in for the live
/// service in demos and tests, matching by case-insensitive containment.
pub struct StaticGeocoder;

const KNOWN_PLACES: &[(&str, f64, f64, &str)] = &[
    (
        "Taoyuan International Airport",
        25.0797,
        121.2342,
        "Taoyuan International Airport, Dayuan District, Taoyuan",
    ),
    (
        "Songshan Airport",
        25.0694,
        121.5521,
        "Taipei Songshan Airport, Songshan District, Taipei",
    ),
    (
        "Taipei Main Station",
        25.0478,
        121.5170,
        "Taipei Main Station, Zhongzheng District, Taipei",
    ),
    ("Taipei 101", 25.0340, 121.5645, "Taipei 101, Xinyi District, Taipei"),
    (
        "Grand Hotel",
        25.0792,
        121.5263,
        "The Grand Hotel, Zhongshan District, Taipei",
    ),
    ("Ximending", 25.0421, 121.5076, "Ximending, Wanhua District, Taipei"),
    (
        "W Hotel",
        25.0410,
        121.5637,
        "W Taipei, Zhongxiao East Road, Xinyi District, Taipei",
    ),
    (
        "Sun Moon Lake",
        23.8573,
        120.9154,
        "Sun Moon Lake, Yuchi Township, Nantou",
    ),
    (
        "Taichung Station",
        24.1369,
        120.6869,
        "Taichung Station, Central District, Taichung",
    ),
    (
        "Kaohsiung Station",
        22.6394,
        120.3020,
        "Kaohsiung Station, Sanmin District, Kaohsiung",
    ),
];

impl StaticGeocoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StaticGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Geocoder for StaticGeocoder {
    async fn geocode(
        &self,
        address: &str,
        _country_hint: Option<&str>,
    ) -> Option<(f64, f64, String)> {
        if address.is_empty() {
            return None;
        }
        let needle = address.to_lowercase();
        KNOWN_PLACES
            .iter()
            .find(|(name, _, _, _)| {
                let name = name.to_lowercase();
                name.contains(&needle) || needle.contains(&name)
            })
            .map(|(_, lat, lon, formatted)| (*lat, *lon, formatted.to_string()))
    }

    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Option<String> {
        if !validate_coordinates(lat, lon) {
            return None;
        }
        KNOWN_PLACES
            .iter()
            .map(|(_, p_lat, p_lon, formatted)| {
                (calculate_distance(lat, lon, *p_lat, *p_lon), formatted)
            })
            .filter(|(distance, _)| *distance <= 3.0)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, formatted)| formatted.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_same_point_is_zero() {
        let distance = calculate_distance(25.034, 121.5645, 25.034, 121.5645);
        assert!(distance < 0.001);
    }

    #[test]
    fn test_distance_known_pair() {
        // Taipei 101 to Taoyuan International Airport is roughly 33 km.
        let distance = calculate_distance(25.0340, 121.5645, 25.0797, 121.2342);
        assert!(distance > 30.0 && distance < 37.0, "got {}", distance);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let there = calculate_distance(25.0340, 121.5645, 22.6394, 120.3020);
        let back = calculate_distance(22.6394, 120.3020, 25.0340, 121.5645);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn test_validate_coordinates_bounds() {
        assert!(validate_coordinates(25.0, 121.5));
        assert!(!validate_coordinates(90.5, 121.5));
        assert!(!validate_coordinates(25.0, -181.0));
        assert!(!validate_coordinates(f64::NAN, 121.5));
    }

    #[test]
    fn test_format_coordinates() {
        assert_eq!(format_coordinates(25.04781, 121.51702, 2), "25.05, 121.52");
    }

    #[test]
    fn test_simplify_address_drops_postcode_and_country() {
        let simplified = NominatimGeocoder::simplify_address(
            "Taipei 101, Xinyi Road, Xinyi District, Taipei, 110, Taiwan",
        );
        assert_eq!(simplified, "Taipei 101, Xinyi Road, Xinyi District, Taipei");
    }

    #[tokio::test]
    async fn test_static_geocoder_matches_by_containment() {
        let geocoder = StaticGeocoder::new();
        let (lat, _, formatted) = geocoder
            .geocode("Grand Hotel", None)
            .await
            .expect("known place");
        assert!((lat - 25.0792).abs() < 1e-6);
        assert!(formatted.contains("Grand Hotel"));
        assert!(geocoder.geocode("Nonexistent Plaza", None).await.is_none());
    }

    #[tokio::test]
    async fn test_static_geocoder_reverse_finds_nearest() {
        let geocoder = StaticGeocoder::new();
        let address = geocoder.reverse_geocode(25.0341, 121.5646).await;
        assert_eq!(
            address.as_deref(),
            Some("Taipei 101, Xinyi District, Taipei")
        );
        // Middle of the Taiwan Strait: nothing within range.
        assert!(geocoder.reverse_geocode(24.0, 119.0).await.is_none());
    }
}
