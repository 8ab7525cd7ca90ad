use serde::{Deserialize, Serialize};

/// A batch of same-sized luggage pieces attached to a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LuggageItem {
    #[serde(default = "default_size")]
    pub size: u32,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_size() -> u32 {
    24
}

fn default_quantity() -> u32 {
    1
}

impl LuggageItem {
    pub fn new(size: u32, quantity: u32) -> Self {
        Self {
            size,
            quantity: quantity.max(1),
        }
    }

    /// The standard piece assumed when no scan details are available.
    pub fn standard(quantity: u32) -> Self {
        Self::new(default_size(), quantity)
    }
}
