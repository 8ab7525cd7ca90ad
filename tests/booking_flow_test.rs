use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use serial_test::serial;

use ebaggage_core::controllers::advance_booking::AddSegmentOutcome;
use ebaggage_core::controllers::{
    AdvanceBookingController, AdvanceStep, BookingError, InstantBookingController, InstantStep,
    VehicleKind, VehicleSelectionController,
};
use ebaggage_core::db::OrderStore;
use ebaggage_core::models::LuggageItem;
use ebaggage_core::services::{RoutePlanner, StaticGeocoder};

fn temp_store_path(tag: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("ebaggage-flow-{}-{}.json", tag, uuid::Uuid::new_v4()));
    path
}

/// A planner pointed at a dead endpoint: every fetch fails fast, so flows
/// exercise the straight-line fallback deterministically.
fn offline_planner() -> RoutePlanner {
    RoutePlanner::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
#[serial]
async fn instant_booking_full_flow() {
    let path = temp_store_path("instant");
    let store = OrderStore::new(&path);
    let mut booking = InstantBookingController::new(StaticGeocoder::new(), store);
    booking.set_user_email("rider@example.com").unwrap();

    // Step transitions are gated on required input.
    let err = booking.go_to_confirm().await.unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));

    booking.set_pickup_location("Taipei Main Station");
    booking.set_dropoff_location("Grand Hotel");
    let err = booking.go_to_confirm().await.unwrap_err();
    assert!(err.to_string().contains("scan"));

    booking.confirm_scan(vec![LuggageItem::new(24, 2)]);
    booking.go_to_confirm().await.expect("trip computes");

    let trip = booking.pending_trip().expect("pending trip exists").clone();
    assert!(trip.price > 0.0);
    assert_eq!(trip.pickup_location, "Taipei Main Station");
    assert_eq!(trip.luggage_count(), 2);

    // Vehicle sub-flow: two pieces recommend a sedan; the route falls back
    // to the straight two-point line when routing is unreachable.
    let mut vehicles = VehicleSelectionController::new(offline_planner());
    vehicles
        .prepare_from_trip(&trip, "Taipei Main Station", "Grand Hotel", 2, "")
        .await;
    assert_eq!(vehicles.recommended_vehicle(), VehicleKind::Sedan);
    let map = vehicles.get_map_context().expect("map context");
    assert_eq!(map.polyline.len(), 2);

    let options = vehicles.get_vehicle_options();
    assert_eq!(options.len(), 3);
    let sedan = options
        .iter()
        .find(|o| o.kind == VehicleKind::Sedan)
        .unwrap();
    assert!(sedan.is_recommended && sedan.is_selected);
    assert_eq!(sedan.price, trip.price.round());

    let summary = vehicles.get_trip_summary().expect("summary");
    assert_eq!(summary.luggage_count, 2);
    assert!(summary.distance_km > 0.0);

    vehicles.select_vehicle(VehicleKind::Van);
    let selection = vehicles.confirm_choice().expect("selection confirms");
    assert_eq!(selection.kind, VehicleKind::Van);
    assert_eq!(selection.price, (trip.price * 1.5).round());

    booking.present_vehicle_confirmation(selection).unwrap();
    assert_eq!(booking.current_step(), InstantStep::Confirm);

    let record = booking.finalize_booking().expect("booking persists");
    assert_eq!(record["order_type"], "instant_trip");
    assert_eq!(record["vehicle_type"], "van");
    assert_eq!(record["selected_vehicle"], "van");

    // The wizard resets for the next booking.
    assert_eq!(booking.current_step(), InstantStep::Collect);
    assert!(booking.pending_trip().is_none());
    assert!(booking.pickup_location().is_empty());

    fs::remove_file(&path).ok();
}

#[tokio::test]
#[serial]
async fn nearby_hotels_rank_by_distance_from_map_center() {
    let path = temp_store_path("nearby");
    let document = serde_json::json!({
        "orders": [],
        "partner_hotels": [
            {"name": "Far Hotel", "lat": 22.6394, "lon": 120.3020, "is_partner": true},
            {"name": "Near Hotel", "lat": 25.0480, "lon": 121.5172, "is_partner": true},
            {"name": "Mid Hotel", "lat": 25.0340, "lon": 121.5645, "is_partner": true}
        ]
    });
    fs::write(&path, serde_json::to_string(&document).unwrap()).unwrap();

    let store = OrderStore::new(&path);
    let mut booking = InstantBookingController::new(StaticGeocoder::new(), store);

    // Center on Taipei Main Station: the Kaohsiung hotel ranks last.
    booking.update_nearby_hotels(25.0478, 121.5170);
    let names: Vec<&str> = booking
        .nearby_hotels()
        .iter()
        .map(|h| h.name.as_str())
        .collect();
    assert_eq!(names, vec!["Near Hotel", "Mid Hotel", "Far Hotel"]);

    fs::remove_file(&path).ok();
}

#[tokio::test]
#[serial]
async fn instant_booking_unresolvable_dropoff_creates_no_trip() {
    let path = temp_store_path("instant-geo");
    let store = OrderStore::new(&path);
    let mut booking = InstantBookingController::new(StaticGeocoder::new(), store);

    booking.set_pickup_location("Taipei Main Station");
    booking.set_dropoff_location("Nonexistent Plaza");
    booking.confirm_scan(vec![LuggageItem::new(24, 1)]);

    let err = booking.go_to_confirm().await.unwrap_err();
    assert!(matches!(err, BookingError::Geocoding(_)));
    assert!(booking.pending_trip().is_none());

    fs::remove_file(&path).ok();
}

#[tokio::test]
#[serial]
async fn advance_booking_full_flow() {
    let path = temp_store_path("advance");
    let store = OrderStore::new(&path);
    let mut booking = AdvanceBookingController::new(StaticGeocoder::new(), store);
    booking.set_user_email("planner@example.com").unwrap();

    // Step 1: both dates are required and must be ordered.
    assert!(booking.go_to_planning().is_err());
    booking.set_start_date(date(2026, 1, 1));
    booking.set_end_date(date(2026, 1, 5));
    booking.set_arrival_transfer(true);
    booking.set_departure_transfer(true);
    booking.go_to_planning().expect("enters planning");
    assert_eq!(booking.current_step(), AdvanceStep::Planning);

    // The first segment is seeded with the travel start date.
    assert_eq!(booking.segments().len(), 1);
    assert_eq!(booking.segments()[0].check_in_date, Some(date(2026, 1, 1)));

    // Confirming an incomplete segment names the missing pieces.
    let err = booking.add_next_segment(0).unwrap_err();
    assert!(err.to_string().contains("check-out date"));
    assert!(err.to_string().contains("hotel name"));

    booking.set_segment_hotel_name(0, "Grand Hotel").unwrap();
    booking.set_segment_check_out(0, date(2026, 1, 3)).unwrap();
    assert_eq!(
        booking.add_next_segment(0).unwrap(),
        AddSegmentOutcome::Added
    );

    // The new segment chains from the previous check-out, and the confirmed
    // one is locked against edits.
    assert_eq!(booking.segments()[1].check_in_date, Some(date(2026, 1, 3)));
    assert!(booking.segments()[0].is_locked);
    assert!(booking.set_segment_hotel_name(0, "Other Hotel").is_err());

    booking.set_segment_hotel_name(1, "W Hotel").unwrap();
    booking.set_segment_check_out(1, date(2026, 1, 5)).unwrap();
    assert_eq!(
        booking.add_next_segment(1).unwrap(),
        AddSegmentOutcome::PlanningComplete
    );

    booking.go_to_confirm().await.expect("preview builds");
    assert_eq!(booking.current_step(), AdvanceStep::Confirm);

    let preview = booking.preview_travel().expect("preview exists");
    // Arrival leg + one inter-hotel leg + departure leg.
    assert_eq!(preview.trips.len(), 3);
    assert_eq!(preview.trips[0].pickup_location, "Taoyuan International Airport");
    assert_eq!(preview.trips[1].pickup_location, "Grand Hotel");
    assert_eq!(preview.trips[1].dropoff_location, "W Hotel");
    assert_eq!(
        preview.trips[1].start_time,
        date(2026, 1, 3).and_hms_opt(11, 0, 0).unwrap()
    );
    let total: f64 = preview.trips.iter().map(|t| t.price).sum();
    assert!((preview.total_price - (total * 100.0).round() / 100.0).abs() < 1e-9);
    let travel_id = preview.id.clone();

    let (travel_record, trip_records) = booking.submit_order().await.expect("submit persists");
    assert_eq!(travel_record["order_type"], "travel");
    assert_eq!(trip_records.len(), 3);
    assert!(trip_records
        .iter()
        .all(|r| r["order_type"] == "travel_trip"));

    // Reset happened, and the store now holds travel + trips.
    assert_eq!(booking.current_step(), AdvanceStep::DateRange);
    assert!(booking.segments().is_empty());

    let store = OrderStore::new(&path);
    let orders = store.get_orders_by_user("planner@example.com");
    assert_eq!(orders.len(), 4);
    assert!(store.update_order_status(&travel_id, "cancelled").unwrap());

    fs::remove_file(&path).ok();
}

#[tokio::test]
#[serial]
async fn advance_booking_rejects_gapped_stays_before_pricing() {
    let path = temp_store_path("advance-gap");
    let store = OrderStore::new(&path);
    let mut booking = AdvanceBookingController::new(StaticGeocoder::new(), store);

    booking.set_start_date(date(2026, 1, 1));
    booking.set_end_date(date(2026, 1, 5));
    booking.go_to_planning().unwrap();

    booking.set_segment_hotel_name(0, "Grand Hotel").unwrap();
    booking.set_segment_check_out(0, date(2026, 1, 3)).unwrap();
    booking.add_next_segment(0).unwrap();

    // Open a gap by moving the unlocked second segment's check-in.
    booking.set_segment_check_in(1, date(2026, 1, 4)).unwrap();
    booking.set_segment_hotel_name(1, "W Hotel").unwrap();
    booking.set_segment_check_out(1, date(2026, 1, 5)).unwrap();

    let err = booking.go_to_confirm().await.unwrap_err();
    assert!(err.to_string().contains("seamlessly"));
    assert!(booking.preview_travel().is_none());
    // The failed confirm leaves the last segment editable again.
    assert!(!booking.segments()[1].is_locked);

    fs::remove_file(&path).ok();
}

#[tokio::test]
#[serial]
async fn advance_booking_coverage_and_removal_rules() {
    let path = temp_store_path("advance-cover");
    let store = OrderStore::new(&path);
    let mut booking = AdvanceBookingController::new(StaticGeocoder::new(), store);

    booking.set_start_date(date(2026, 1, 1));
    // Picking an end at or before the start pushes it out a day.
    booking.set_end_date(date(2026, 1, 5));
    booking.set_start_date(date(2026, 1, 5));
    assert_eq!(
        booking.trip_config().total_end_date,
        Some(date(2026, 1, 6))
    );

    booking.set_start_date(date(2026, 1, 1));
    booking.set_end_date(date(2026, 1, 5));
    booking.go_to_planning().unwrap();

    booking.set_segment_hotel_name(0, "Grand Hotel").unwrap();
    booking.set_segment_check_out(0, date(2026, 1, 3)).unwrap();
    booking.add_next_segment(0).unwrap();

    // Coverage check: the last stay stops short of the travel end.
    booking.set_segment_hotel_name(1, "W Hotel").unwrap();
    booking.set_segment_check_out(1, date(2026, 1, 4)).unwrap();
    let err = booking.go_to_confirm().await.unwrap_err();
    assert!(err.to_string().contains("travel end date"));

    // Removing the last segment unlocks the previous one.
    booking.remove_last_segment();
    assert_eq!(booking.segments().len(), 1);
    assert!(!booking.segments()[0].is_locked);

    fs::remove_file(&path).ok();
}
