use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::luggage::LuggageItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl Default for TripStatus {
    fn default() -> Self {
        TripStatus::Pending
    }
}

/// One priced point-to-point transport leg, the smallest unit a driver sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    #[serde(default)]
    pub parent_travel_id: Option<String>,
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    pub pickup_location: String,
    pub pickup_lat: f64,
    pub pickup_lon: f64,
    pub dropoff_location: String,
    pub dropoff_lat: f64,
    pub dropoff_lon: f64,
    #[serde(default)]
    pub status: TripStatus,
    #[serde(default = "default_vehicle_type")]
    pub vehicle_type: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub luggage_items: Vec<LuggageItem>,
}

fn default_vehicle_type() -> String {
    "sedan".to_string()
}

impl Trip {
    pub fn luggage_count(&self) -> u32 {
        self.luggage_items.iter().map(|item| item.quantity).sum()
    }
}
