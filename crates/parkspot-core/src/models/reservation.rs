use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Display format for reservation times
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// A reservation as returned by the service.
/// Times are zone-less, matching what the server stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub name: String,
    pub household: String,
    pub phone: String,
    pub spot_id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

impl Reservation {
    /// Same overlap rule the server applies: `start < other_end && end > other_start`
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        start < self.end_time && end > self.start_time
    }

    pub fn window_display(&self) -> String {
        let end_format = if self.start_time.date() == self.end_time.date() {
            "%H:%M"
        } else {
            TIME_FORMAT
        };
        format!(
            "{} - {}",
            self.start_time.format(TIME_FORMAT),
            self.end_time.format(end_format)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservation {
    pub name: String,
    pub household: String,
    pub phone: String,
    pub spot_id: i64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}
