use serde::{Deserialize, Serialize};

/// A hotel from the lookup table. Partner hotels carry pre-registered
/// coordinates; everything else is resolved ad hoc through geocoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerHotel {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
    #[serde(default)]
    pub is_partner: bool,
}
