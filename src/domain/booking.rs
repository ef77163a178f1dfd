//! Booking domain model

use super::common::{StringUuid, UNSPECIFIED_PHONE};
use super::hotel::HotelSummary;
use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Booking state machine: `pending` is initial, `cancelled` and `completed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Holds rooms at the hotel
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Statuses a merchant or admin may write. `completed` is reserved for
    /// settlement outside the API.
    pub fn is_settable(&self) -> bool {
        !matches!(self, BookingStatus::Completed)
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            _ => Err(format!("Unknown booking status: {}", s)),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for BookingStatus {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::MySql> for BookingStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for BookingStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// Booking entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: StringUuid,
    pub hotel_id: StringUuid,
    /// `None` for guest bookings
    pub user_id: Option<StringUuid>,
    pub guest_name: String,
    pub guest_phone: String,
    pub guest_email: Option<String>,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub number_of_rooms: i32,
    pub number_of_guests: i32,
    pub total_price: f64,
    pub status: BookingStatus,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Booking {
    fn default() -> Self {
        let now = Utc::now();
        let today = now.date_naive();
        Self {
            id: StringUuid::new_v4(),
            hotel_id: StringUuid::nil(),
            user_id: None,
            guest_name: String::new(),
            guest_phone: UNSPECIFIED_PHONE.to_string(),
            guest_email: None,
            check_in_date: today,
            check_out_date: today.succ_opt().unwrap_or(today),
            number_of_rooms: 1,
            number_of_guests: 1,
            total_price: 0.0,
            status: BookingStatus::default(),
            remarks: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Booking request as sent by a client. Dates arrive as strings so that an
/// unparseable date is reported as a validation failure rather than a
/// framework rejection.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingInput {
    pub hotel_id: Option<String>,
    #[validate(length(max = 100))]
    pub guest_name: Option<String>,
    #[validate(length(max = 30))]
    pub guest_phone: Option<String>,
    #[validate(email(message = "guestEmail must be a valid email address"))]
    pub guest_email: Option<String>,
    pub check_in_date: Option<String>,
    pub check_out_date: Option<String>,
    #[validate(range(min = 1, message = "numberOfRooms must be at least 1"))]
    pub number_of_rooms: Option<i32>,
    #[validate(range(min = 1, message = "numberOfGuests must be at least 1"))]
    pub number_of_guests: Option<i32>,
    #[validate(range(min = 0.0, message = "totalPrice must not be negative"))]
    pub total_price: Option<f64>,
    pub remarks: Option<String>,
}

impl CreateBookingInput {
    /// Names of required fields that are absent or blank, in declaration order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        for (name, value) in [
            ("hotelId", &self.hotel_id),
            ("guestName", &self.guest_name),
            ("checkInDate", &self.check_in_date),
            ("checkOutDate", &self.check_out_date),
        ] {
            if value.as_deref().map(str::trim).map_or(true, str::is_empty) {
                missing.push(name);
            }
        }
        missing
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingInput {
    pub status: Option<String>,
    pub remarks: Option<String>,
}

/// Fully resolved booking ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub hotel_id: StringUuid,
    pub user_id: Option<StringUuid>,
    pub guest_name: String,
    pub guest_phone: String,
    pub guest_email: Option<String>,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub number_of_rooms: i32,
    pub number_of_guests: i32,
    pub total_price: f64,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingPatch {
    pub status: Option<BookingStatus>,
    pub remarks: Option<String>,
}

impl BookingPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.remarks.is_none()
    }

    /// Fail with `Validation` when the patch moves a terminal booking to a
    /// different status. Repositories call this again on the locked row.
    pub fn check_transition(&self, current: BookingStatus) -> Result<()> {
        match self.status {
            Some(next) if next != current && current.is_terminal() => Err(AppError::Validation(
                format!("Booking is already {} and cannot be changed to {}", current, next),
            )),
            _ => Ok(()),
        }
    }

    /// Whether applying this patch to a booking in `current` gives its rooms
    /// back to the hotel.
    pub fn releases_rooms(&self, current: BookingStatus) -> bool {
        current.is_active() && self.status.is_some_and(|s| s.is_terminal())
    }
}

/// Listing filter. `merchant_id` restricts to bookings on hotels owned by
/// that merchant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingFilter {
    pub user_id: Option<StringUuid>,
    pub hotel_id: Option<StringUuid>,
    pub merchant_id: Option<StringUuid>,
    pub status: Option<BookingStatus>,
}

/// Booking with the hotel it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub hotel: Option<HotelSummary>,
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_booking_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
}
