//! Data access layer

pub mod booking;
pub mod hotel;
pub mod user;

pub use booking::BookingRepository;
pub use hotel::HotelRepository;
pub use user::UserRepository;
