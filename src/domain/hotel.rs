//! Hotel domain model

use super::common::StringUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Approval state of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HotelStatus {
    Draft,
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl HotelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HotelStatus::Draft => "draft",
            HotelStatus::Pending => "pending",
            HotelStatus::Approved => "approved",
            HotelStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for HotelStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "draft" => Ok(HotelStatus::Draft),
            "pending" => Ok(HotelStatus::Pending),
            "approved" => Ok(HotelStatus::Approved),
            "rejected" => Ok(HotelStatus::Rejected),
            _ => Err(format!("Unknown hotel status: {}", s)),
        }
    }
}

impl std::fmt::Display for HotelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'r> sqlx::Decode<'r, sqlx::MySql> for HotelStatus {
    fn decode(
        value: sqlx::mysql::MySqlValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::MySql>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::MySql> for HotelStatus {
    fn type_info() -> sqlx::mysql::MySqlTypeInfo {
        <String as sqlx::Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::MySql>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::MySql> for HotelStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<u8>,
    ) -> std::result::Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::MySql>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// Hotel entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub id: StringUuid,
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub city: String,
    pub rating: f64,
    pub price_per_night: f64,
    pub total_rooms: i32,
    pub available_rooms: i32,
    pub phone_number: Option<String>,
    #[sqlx(json)]
    pub images: Vec<String>,
    #[sqlx(json)]
    pub amenities: Vec<String>,
    pub status: HotelStatus,
    /// Owning merchant. Never changes after creation.
    pub merchant_id: StringUuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Hotel {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: StringUuid::new_v4(),
            name: String::new(),
            description: None,
            location: String::new(),
            city: String::new(),
            rating: 0.0,
            price_per_night: 0.0,
            total_rooms: 0,
            available_rooms: 0,
            phone_number: None,
            images: Vec::new(),
            amenities: Vec::new(),
            status: HotelStatus::default(),
            merchant_id: StringUuid::nil(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Hotel fields as sent by a client on create.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateHotelInput {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub location: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(range(min = 0.0, max = 5.0, message = "rating must be between 0 and 5"))]
    pub rating: Option<f64>,
    #[validate(range(min = 0.0, message = "pricePerNight must not be negative"))]
    pub price_per_night: Option<f64>,
    #[validate(range(min = 0, message = "totalRooms must not be negative"))]
    pub total_rooms: Option<i32>,
    #[validate(range(min = 0, message = "availableRooms must not be negative"))]
    pub available_rooms: Option<i32>,
    pub phone_number: Option<String>,
    pub images: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
}

impl CreateHotelInput {
    /// Strip surrounding whitespace from the text fields so length rules see
    /// the value that will be stored.
    pub fn trimmed(mut self) -> Self {
        self.name = trim_field(self.name);
        self.location = trim_field(self.location);
        self.city = trim_field(self.city);
        self.phone_number = trim_field(self.phone_number);
        self
    }

    /// Names of required fields that are absent or blank, in declaration order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.name) {
            missing.push("name");
        }
        if is_blank(&self.location) {
            missing.push("location");
        }
        if is_blank(&self.city) {
            missing.push("city");
        }
        if self.price_per_night.is_none() {
            missing.push("pricePerNight");
        }
        missing
    }
}

/// Partial hotel update. `status` is only honoured for admins.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHotelInput {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub location: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(range(min = 0.0, max = 5.0, message = "rating must be between 0 and 5"))]
    pub rating: Option<f64>,
    #[validate(range(min = 0.0, message = "pricePerNight must not be negative"))]
    pub price_per_night: Option<f64>,
    #[validate(range(min = 0, message = "totalRooms must not be negative"))]
    pub total_rooms: Option<i32>,
    #[validate(range(min = 0, message = "availableRooms must not be negative"))]
    pub available_rooms: Option<i32>,
    pub phone_number: Option<String>,
    pub images: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    pub status: Option<String>,
}

impl UpdateHotelInput {
    pub fn trimmed(mut self) -> Self {
        self.name = trim_field(self.name);
        self.location = trim_field(self.location);
        self.city = trim_field(self.city);
        self.phone_number = trim_field(self.phone_number);
        self
    }
}

/// Fully resolved hotel ready to be inserted
#[derive(Debug, Clone)]
pub struct NewHotel {
    pub name: String,
    pub description: Option<String>,
    pub location: String,
    pub city: String,
    pub rating: f64,
    pub price_per_night: f64,
    pub total_rooms: i32,
    pub available_rooms: i32,
    pub phone_number: Option<String>,
    pub images: Vec<String>,
    pub amenities: Vec<String>,
    pub status: HotelStatus,
    pub merchant_id: StringUuid,
}

/// Changes applied by the repository in one statement. `None` keeps the
/// stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotelPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub rating: Option<f64>,
    pub price_per_night: Option<f64>,
    pub total_rooms: Option<i32>,
    pub available_rooms: Option<i32>,
    pub phone_number: Option<String>,
    pub images: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    pub status: Option<HotelStatus>,
}

impl HotelPatch {
    /// Content fields only; status is decided separately.
    pub fn content_from(input: &UpdateHotelInput) -> Self {
        Self {
            name: input.name.clone(),
            description: input.description.clone(),
            location: input.location.clone(),
            city: input.city.clone(),
            rating: input.rating,
            price_per_night: input.price_per_night,
            total_rooms: input.total_rooms,
            available_rooms: input.available_rooms,
            phone_number: input.phone_number.clone(),
            images: input.images.clone(),
            amenities: input.amenities.clone(),
            status: None,
        }
    }

    pub fn apply_to(&self, hotel: &mut Hotel) {
        if let Some(name) = &self.name {
            hotel.name = name.clone();
        }
        if let Some(description) = &self.description {
            hotel.description = Some(description.clone());
        }
        if let Some(location) = &self.location {
            hotel.location = location.clone();
        }
        if let Some(city) = &self.city {
            hotel.city = city.clone();
        }
        if let Some(rating) = self.rating {
            hotel.rating = rating;
        }
        if let Some(price) = self.price_per_night {
            hotel.price_per_night = price;
        }
        if let Some(total) = self.total_rooms {
            hotel.total_rooms = total;
        }
        if let Some(available) = self.available_rooms {
            hotel.available_rooms = available;
        }
        if let Some(phone) = &self.phone_number {
            hotel.phone_number = Some(phone.clone());
        }
        if let Some(images) = &self.images {
            hotel.images = images.clone();
        }
        if let Some(amenities) = &self.amenities {
            hotel.amenities = amenities.clone();
        }
        if let Some(status) = self.status {
            hotel.status = status;
        }
    }
}

/// Public listing filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HotelFilter {
    pub merchant_id: Option<StringUuid>,
    pub status: Option<HotelStatus>,
    pub city: Option<String>,
    /// Case-insensitive substring of the hotel name
    pub keyword: Option<String>,
}

impl HotelFilter {
    pub fn matches(&self, hotel: &Hotel) -> bool {
        if let Some(merchant_id) = self.merchant_id {
            if hotel.merchant_id != merchant_id {
                return false;
            }
        }
        if let Some(status) = self.status {
            if hotel.status != status {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if &hotel.city != city {
                return false;
            }
        }
        if let Some(keyword) = &self.keyword {
            if !hotel.name.to_lowercase().contains(&keyword.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

/// Compact hotel view embedded in booking responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HotelSummary {
    pub id: StringUuid,
    pub name: String,
    pub city: String,
    pub price_per_night: f64,
}

impl From<&Hotel> for HotelSummary {
    fn from(hotel: &Hotel) -> Self {
        Self {
            id: hotel.id,
            name: hotel.name.clone(),
            city: hotel.city.clone(),
            price_per_night: hotel.price_per_night,
        }
    }
}

fn trim_field(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).map_or(true, str::is_empty)
}
