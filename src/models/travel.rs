use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::luggage::LuggageItem;
use crate::models::trip::Trip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelStatus {
    Draft,
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl Default for TravelStatus {
    fn default() -> Self {
        TravelStatus::Draft
    }
}

/// One contiguous hotel stay inside a travel plan.
/// Invariant: `check_out_date > check_in_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelStay {
    pub hotel_name: String,
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    #[serde(default)]
    pub is_locked: bool,
}

impl HotelStay {
    pub fn nights(&self) -> i64 {
        (self.check_out_date - self.check_in_date).num_days().max(0)
    }
}

/// A multi-day plan composed of ordered hotel stays and the trips derived
/// from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Travel {
    pub id: String,
    pub total_start_date: NaiveDate,
    pub total_end_date: NaiveDate,
    #[serde(default)]
    pub status: TravelStatus,
    #[serde(default)]
    pub luggage_count: u32,
    #[serde(default)]
    pub arrival_transfer: bool,
    #[serde(default)]
    pub arrival_location: String,
    #[serde(default)]
    pub arrival_lat: Option<f64>,
    #[serde(default)]
    pub arrival_lon: Option<f64>,
    #[serde(default)]
    pub arrival_time: Option<NaiveTime>,
    #[serde(default)]
    pub departure_transfer: bool,
    #[serde(default)]
    pub departure_location: String,
    #[serde(default)]
    pub departure_lat: Option<f64>,
    #[serde(default)]
    pub departure_lon: Option<f64>,
    #[serde(default)]
    pub departure_time: Option<NaiveTime>,
    #[serde(default)]
    pub default_checkout_time: Option<NaiveTime>,
    #[serde(default)]
    pub luggage_items: Vec<LuggageItem>,
    #[serde(default)]
    pub hotels: Vec<HotelStay>,
    #[serde(default)]
    pub trips: Vec<Trip>,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub user_email: Option<String>,
}

impl Travel {
    /// Short display title, e.g. "01/01-01/05 Grand Hotel".
    pub fn title(&self) -> String {
        let start = self.total_start_date.format("%m/%d");
        let end = self.total_end_date.format("%m/%d");
        let primary_hotel = self
            .hotels
            .first()
            .map(|h| h.hotel_name.as_str())
            .unwrap_or("Travel");
        format!("{}-{} {}", start, end, primary_hotel)
    }
}
