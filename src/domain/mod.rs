//! Domain models for HotelHub Core

pub mod booking;
pub mod common;
pub mod hotel;
pub mod statistics;
pub mod user;

pub use booking::*;
pub use common::*;
pub use hotel::*;
pub use statistics::*;
pub use user::*;
