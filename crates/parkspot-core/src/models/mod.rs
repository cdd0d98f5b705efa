//! Data models for the parking reservation service.
//!
//! - `ParkingSpot`, `NewParkingSpot`: spots that can be reserved
//! - `Reservation`, `NewReservation`: time-boxed holds on a spot
//! - `HealthStatus`: liveness probe response

pub mod health;
pub mod reservation;
pub mod spot;

pub use health::HealthStatus;
pub use reservation::{NewReservation, Reservation};
pub use spot::{NewParkingSpot, ParkingSpot};
