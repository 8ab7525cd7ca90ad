//! Order Store
//!
//! Durable persistence for trips and travels as one JSON document with
//! whole-document read/write-back semantics. A missing or corrupt document
//! reads as the empty store, so the write path always succeeds by
//! re-initializing. Writes are plain full-file overwrites with no locking;
//! concurrent writers can lose updates. That is an accepted limitation of
//! the single-user demo scope.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{PartnerHotel, Travel, Trip};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write order store: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode order data: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    orders: Vec<Value>,
    #[serde(default)]
    users: Vec<Value>,
    #[serde(default)]
    scans: Vec<Value>,
    #[serde(default)]
    drivers: Vec<Value>,
    #[serde(default)]
    hotels: Vec<Value>,
    #[serde(default)]
    partner_hotels: Vec<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

pub struct OrderStore {
    path: PathBuf,
}

impl OrderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_document(&self) -> StoreDocument {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                info!(
                    "order store {} unreadable ({}), starting empty",
                    self.path.display(),
                    err
                );
                return StoreDocument::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(document) => document,
            Err(err) => {
                warn!(
                    "order store {} is corrupt ({}), starting empty",
                    self.path.display(),
                    err
                );
                StoreDocument::default()
            }
        }
    }

    fn write_document(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let encoded = serde_json::to_string_pretty(document)?;
        fs::write(&self.path, encoded)?;
        Ok(())
    }

    /// Append one trip record, re-sort the order array by `start_time`
    /// (falling back to `created_at`) descending, and rewrite the file.
    pub fn save_single_trip(
        &self,
        trip: &Trip,
        user_email: &str,
        order_type: &str,
        extra_fields: Map<String, Value>,
    ) -> Result<Value, StoreError> {
        let mut document = self.load_document();

        let entry = serialize_trip(trip, user_email, order_type, extra_fields)?;
        document.orders.push(entry.clone());
        sort_orders(&mut document.orders, "start_time", "created_at");
        self.write_document(&document)?;

        info!("trip {} saved ({})", trip.id, order_type);
        Ok(entry)
    }

    /// Append the travel itself (tagged `travel`, with its trips' ids) plus
    /// each generated trip individually (tagged `travel_trip`), then
    /// re-sort and rewrite.
    pub fn save_travel_with_trips(
        &self,
        travel: &Travel,
        user_email: &str,
    ) -> Result<(Value, Vec<Value>), StoreError> {
        let mut document = self.load_document();

        let created_at = serde_json::to_value(now())?;
        let mut travel_copy = travel.clone();
        travel_copy.user_email = Some(user_email.to_string());
        let mut travel_entry = serde_json::to_value(&travel_copy)?;
        if let Some(object) = travel_entry.as_object_mut() {
            object.insert("order_type".to_string(), Value::from("travel"));
            object.insert("created_at".to_string(), created_at);
            object.insert(
                "trip_ids".to_string(),
                Value::from(
                    travel
                        .trips
                        .iter()
                        .map(|trip| trip.id.clone())
                        .collect::<Vec<_>>(),
                ),
            );
        }

        let trip_entries: Vec<Value> = travel
            .trips
            .iter()
            .map(|trip| serialize_trip(trip, user_email, "travel_trip", Map::new()))
            .collect::<Result<_, _>>()?;

        document.orders.push(travel_entry.clone());
        document.orders.extend(trip_entries.iter().cloned());
        sort_orders(&mut document.orders, "created_at", "start_time");
        self.write_document(&document)?;

        info!(
            "travel {} saved ({} trips)",
            travel.id,
            travel.trips.len()
        );
        Ok((travel_entry, trip_entries))
    }

    /// Set a record's status, stamping `updated_at` (and `cancelled_at` for
    /// cancellations). Matches on `id` or `order_id`. The file is only
    /// rewritten when the record was found.
    pub fn update_order_status(&self, order_id: &str, new_status: &str) -> Result<bool, StoreError> {
        let mut document = self.load_document();
        let timestamp = serde_json::to_value(now())?;
        let mut updated = false;

        for order in document.orders.iter_mut() {
            if !order_matches_id(order, order_id) {
                continue;
            }
            if let Some(object) = order.as_object_mut() {
                object.insert("status".to_string(), Value::from(new_status));
                object.insert("updated_at".to_string(), timestamp.clone());
                if new_status == "cancelled" {
                    object.insert("cancelled_at".to_string(), timestamp.clone());
                }
                updated = true;
            }
            break;
        }

        if !updated {
            warn!("order {} not found, status not updated", order_id);
            return Ok(false);
        }

        self.write_document(&document)?;
        info!("order {} status updated to {}", order_id, new_status);
        Ok(true)
    }

    pub fn get_all_orders(&self) -> Vec<Value> {
        self.load_document().orders
    }

    pub fn get_orders_by_user(&self, user_email: &str) -> Vec<Value> {
        self.get_all_orders()
            .into_iter()
            .filter(|order| {
                order.get("user_email").and_then(Value::as_str) == Some(user_email)
            })
            .collect()
    }

    /// Orders sorted by their best-effort date: a legacy `date` field
    /// (`YYYY/MM/DD`), else the ISO `created_at`, else the epoch floor.
    pub fn get_orders_sorted_by_date(&self, reverse: bool) -> Vec<Value> {
        let mut orders = self.get_all_orders();
        orders.sort_by_key(order_date);
        if reverse {
            orders.reverse();
        }
        orders
    }

    pub fn find_order(&self, order_id: &str) -> Option<Value> {
        self.get_all_orders()
            .into_iter()
            .find(|order| order_matches_id(order, order_id))
    }

    pub fn load_hotels(&self) -> Vec<PartnerHotel> {
        decode_hotels(&self.load_document().hotels)
    }

    pub fn load_partner_hotels(&self) -> Vec<PartnerHotel> {
        decode_hotels(&self.load_document().partner_hotels)
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn serialize_trip(
    trip: &Trip,
    user_email: &str,
    order_type: &str,
    extra_fields: Map<String, Value>,
) -> Result<Value, StoreError> {
    let mut entry = serde_json::to_value(trip)?;
    if let Some(object) = entry.as_object_mut() {
        object.insert("order_type".to_string(), Value::from(order_type));
        object.insert("user_email".to_string(), Value::from(user_email));
        object.insert("created_at".to_string(), serde_json::to_value(now())?);
        for (key, value) in extra_fields {
            object.insert(key, value);
        }
    }
    Ok(entry)
}

fn order_matches_id(order: &Value, order_id: &str) -> bool {
    ["id", "order_id"].iter().any(|key| match order.get(key) {
        Some(Value::String(id)) => id == order_id,
        Some(Value::Number(id)) => id.to_string() == order_id,
        _ => false,
    })
}

/// Descending sort on an ISO-formatted primary key, falling back to the
/// secondary key. ISO-8601 strings order the same way lexicographically as
/// chronologically.
fn sort_orders(orders: &mut [Value], primary: &str, fallback: &str) {
    orders.sort_by(|a, b| {
        let key = |order: &Value| -> String {
            order
                .get(primary)
                .and_then(Value::as_str)
                .or_else(|| order.get(fallback).and_then(Value::as_str))
                .unwrap_or("")
                .to_string()
        };
        key(b).cmp(&key(a))
    });
}

fn order_date(order: &Value) -> NaiveDateTime {
    if let Some(date) = order.get("date").and_then(Value::as_str) {
        if let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y/%m/%d") {
            if let Some(datetime) = parsed.and_hms_opt(0, 0, 0) {
                return datetime;
            }
        }
    }
    if let Some(created_at) = order.get("created_at").and_then(Value::as_str) {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(created_at, "%Y-%m-%dT%H:%M:%S%.f") {
            return parsed;
        }
    }
    NaiveDateTime::MIN
}

fn decode_hotels(values: &[Value]) -> Vec<PartnerHotel> {
    values
        .iter()
        .filter_map(|value| serde_json::from_value(value.clone()).ok())
        .collect()
}
