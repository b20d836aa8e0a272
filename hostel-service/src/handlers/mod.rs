pub mod complaints;
pub mod health;
pub mod hostels;
pub mod managers;
pub mod payments;
pub mod reports;
pub mod rewards;
pub mod rooms;
pub mod students;

pub use health::{health_check, metrics_handler, readiness_check};
