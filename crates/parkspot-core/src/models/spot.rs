use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingSpot {
    pub id: i64,
    pub spot_number: String,
    pub active: bool,
}

impl ParkingSpot {
    pub fn status_display(&self) -> &'static str {
        if self.active {
            "active"
        } else {
            "inactive"
        }
    }
}

/// Payload for creating a spot. Spot numbers are unique server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParkingSpot {
    pub spot_number: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl NewParkingSpot {
    pub fn new(spot_number: impl Into<String>) -> Self {
        Self {
            spot_number: spot_number.into(),
            active: true,
        }
    }
}
