//! Business logic layer

pub mod auth;
pub mod booking;
pub mod hotel;
pub mod statistics;

pub use auth::AuthService;
pub use booking::{BookingQuery, BookingService};
pub use hotel::HotelService;
pub use statistics::{StatisticsQuery, StatisticsService};
