//! Core of the e-baggage luggage-transfer booking service: trip pricing and
//! generation, the JSON-file order store, and the booking wizard
//! controllers. The UI layer consumes these APIs in-process; there is no
//! network server surface here.

use env_logger::Env;

pub mod config;
pub mod controllers;
pub mod db;
pub mod models;
pub mod services;

pub use config::AppConfig;
pub use controllers::BookingError;
pub use db::OrderStore;
pub use services::{TravelError, TravelService};

/// Initialize env_logger once, defaulting to `info`. Call from the
/// embedding application's entry point.
pub fn init_logging() {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
}
