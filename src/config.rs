use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Fallback map center when nothing has been resolved yet (Taipei Main
/// Station).
pub const DEFAULT_MAP_CENTER: (f64, f64) = (25.0478, 121.5170);

/// Default endpoint label for airport transfers.
pub const DEFAULT_TRANSFER_LOCATION: &str = "Taoyuan International Airport";

const DEFAULT_STORE_PATH: &str = "demo_db.json";
const DEFAULT_GEOCODER_ENDPOINT: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_OSRM_ENDPOINT: &str = "http://router.project-osrm.org";
const DEFAULT_USER_AGENT: &str = "e-baggage-app";
const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 500;

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEOCODER_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_path: PathBuf,
    pub geocoder: GeocoderConfig,
    pub osrm_endpoint: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            geocoder: GeocoderConfig::default(),
            osrm_endpoint: DEFAULT_OSRM_ENDPOINT.to_string(),
        }
    }
}

impl AppConfig {
    /// Build the configuration from the environment, falling back to the
    /// defaults above for anything unset.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let store_path = env::var("EBAGGAGE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH));
        let geocoder_endpoint = env::var("EBAGGAGE_GEOCODER_URL")
            .unwrap_or_else(|_| DEFAULT_GEOCODER_ENDPOINT.to_string());
        let osrm_endpoint =
            env::var("EBAGGAGE_OSRM_URL").unwrap_or_else(|_| DEFAULT_OSRM_ENDPOINT.to_string());

        Self {
            store_path,
            geocoder: GeocoderConfig {
                endpoint: geocoder_endpoint,
                ..GeocoderConfig::default()
            },
            osrm_endpoint,
        }
    }
}
