use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::travel::Travel;
use crate::models::trip::Trip;

/// A persisted single-trip order: the trip fields plus the bookkeeping the
/// store stamps on every record. Unrecognized keys (display labels, notes)
/// are kept in `extra` so nothing is lost on a rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripOrderRecord {
    #[serde(flatten)]
    pub trip: Trip,
    pub user_email: String,
    pub created_at: NaiveDateTime,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A persisted travel order, referencing its generated trips by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelOrderRecord {
    #[serde(flatten)]
    pub travel: Travel,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub trip_ids: Vec<String>,
}

/// Typed view over the store's mixed order array, discriminated by the
/// `order_type` field each record carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "order_type", rename_all = "snake_case")]
pub enum OrderRecord {
    Trip(TripOrderRecord),
    TravelTrip(TripOrderRecord),
    InstantTrip(TripOrderRecord),
    Travel(TravelOrderRecord),
}

impl OrderRecord {
    /// Decode one raw order. Legacy records (unknown `order_type`, missing
    /// fields) come back as `None`; callers keep the raw value around for
    /// those.
    pub fn from_value(value: &Value) -> Option<OrderRecord> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn id(&self) -> &str {
        match self {
            OrderRecord::Trip(record)
            | OrderRecord::TravelTrip(record)
            | OrderRecord::InstantTrip(record) => &record.trip.id,
            OrderRecord::Travel(record) => &record.travel.id,
        }
    }

    pub fn user_email(&self) -> Option<&str> {
        match self {
            OrderRecord::Trip(record)
            | OrderRecord::TravelTrip(record)
            | OrderRecord::InstantTrip(record) => Some(&record.user_email),
            OrderRecord::Travel(record) => record.travel.user_email.as_deref(),
        }
    }
}
