//! Revenue statistics

use super::booking::{Booking, BookingStatus};
use super::common::{round_money, StringUuid};
use super::hotel::Hotel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueStatistics {
    /// Sum of confirmed booking prices
    pub total_revenue: f64,
    /// Bookings of every status
    pub total_bookings: i64,
    pub confirmed_bookings: i64,
    pub pending_bookings: i64,
    pub avg_revenue_per_booking: f64,
    pub by_hotel: Vec<HotelRevenue>,
}

/// Per-hotel breakdown. `booking_count` counts confirmed bookings only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HotelRevenue {
    pub hotel_id: StringUuid,
    pub hotel_name: String,
    pub revenue: f64,
    pub booking_count: i64,
}

#[derive(Default)]
struct Tally {
    revenue: f64,
    confirmed: i64,
}

/// Aggregate bookings over the given hotels. Bookings on hotels outside the
/// slice are ignored, so the slice defines the scope.
pub fn aggregate(hotels: &[Hotel], bookings: &[Booking]) -> RevenueStatistics {
    let mut per_hotel: HashMap<StringUuid, Tally> =
        hotels.iter().map(|h| (h.id, Tally::default())).collect();

    let mut total_bookings = 0;
    let mut pending_bookings = 0;
    let mut confirmed_bookings = 0;
    let mut revenue = 0.0;

    for booking in bookings {
        let Some(tally) = per_hotel.get_mut(&booking.hotel_id) else {
            continue;
        };
        total_bookings += 1;
        match booking.status {
            BookingStatus::Confirmed => {
                confirmed_bookings += 1;
                revenue += booking.total_price;
                tally.confirmed += 1;
                tally.revenue += booking.total_price;
            }
            BookingStatus::Pending => pending_bookings += 1,
            BookingStatus::Cancelled | BookingStatus::Completed => {}
        }
    }

    let total_revenue = round_money(revenue);
    let avg_revenue_per_booking = if confirmed_bookings > 0 {
        round_money(total_revenue / confirmed_bookings as f64)
    } else {
        0.0
    };

    let by_hotel = hotels
        .iter()
        .map(|hotel| {
            let tally = per_hotel.remove(&hotel.id).unwrap_or_default();
            HotelRevenue {
                hotel_id: hotel.id,
                hotel_name: hotel.name.clone(),
                revenue: round_money(tally.revenue),
                booking_count: tally.confirmed,
            }
        })
        .collect();

    RevenueStatistics {
        total_revenue,
        total_bookings,
        confirmed_bookings,
        pending_bookings,
        avg_revenue_per_booking,
        by_hotel,
    }
}
