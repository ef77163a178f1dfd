//! Hotel repository

use crate::domain::{Hotel, HotelFilter, HotelPatch, NewHotel, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HotelRepository: Send + Sync {
    async fn create(&self, input: &NewHotel) -> Result<Hotel>;
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Hotel>>;
    async fn find_by_ids(&self, ids: &[StringUuid]) -> Result<Vec<Hotel>>;
    /// Newest first
    async fn list(&self, filter: &HotelFilter) -> Result<Vec<Hotel>>;
    /// Single `UPDATE` touching only the fields present in `patch`.
    async fn update(&self, id: StringUuid, patch: &HotelPatch) -> Result<Hotel>;
    /// Deletes the hotel together with its cancelled/completed bookings.
    /// Fails with `Conflict` while pending or confirmed bookings exist.
    async fn delete(&self, id: StringUuid) -> Result<()>;
}

pub struct HotelRepositoryImpl {
    pool: MySqlPool,
}

impl HotelRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const HOTEL_COLUMNS: &str = "id, name, description, location, city, rating, price_per_night, total_rooms, available_rooms, phone_number, images, amenities, status, merchant_id, created_at, updated_at";

fn to_json(values: &[String]) -> Result<String> {
    serde_json::to_string(values).map_err(|e| AppError::Internal(e.into()))
}

/// `SET` assignments for the fields present in `patch`. Absent fields are
/// never written, so concurrent inventory changes survive a content edit.
fn patched_columns(patch: &HotelPatch) -> Vec<&'static str> {
    let mut columns = Vec::new();
    if patch.name.is_some() {
        columns.push("name = ?");
    }
    if patch.description.is_some() {
        columns.push("description = ?");
    }
    if patch.location.is_some() {
        columns.push("location = ?");
    }
    if patch.city.is_some() {
        columns.push("city = ?");
    }
    if patch.rating.is_some() {
        columns.push("rating = ?");
    }
    if patch.price_per_night.is_some() {
        columns.push("price_per_night = ?");
    }
    if patch.total_rooms.is_some() {
        columns.push("total_rooms = ?");
    }
    if patch.available_rooms.is_some() {
        columns.push("available_rooms = ?");
    }
    if patch.phone_number.is_some() {
        columns.push("phone_number = ?");
    }
    if patch.images.is_some() {
        columns.push("images = ?");
    }
    if patch.amenities.is_some() {
        columns.push("amenities = ?");
    }
    if patch.status.is_some() {
        columns.push("status = ?");
    }
    columns
}

/// Escape LIKE wildcards so a keyword matches literally
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl HotelRepository for HotelRepositoryImpl {
    async fn create(&self, input: &NewHotel) -> Result<Hotel> {
        let id = StringUuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO hotels (id, name, description, location, city, rating, price_per_night,
                                total_rooms, available_rooms, phone_number, images, amenities,
                                status, merchant_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NOW(), NOW())
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.location)
        .bind(&input.city)
        .bind(input.rating)
        .bind(input.price_per_night)
        .bind(input.total_rooms)
        .bind(input.available_rooms)
        .bind(&input.phone_number)
        .bind(to_json(&input.images)?)
        .bind(to_json(&input.amenities)?)
        .bind(input.status)
        .bind(input.merchant_id)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create hotel")))
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Hotel>> {
        let sql = format!("SELECT {} FROM hotels WHERE id = ?", HOTEL_COLUMNS);
        let hotel = sqlx::query_as::<_, Hotel>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(hotel)
    }

    async fn find_by_ids(&self, ids: &[StringUuid]) -> Result<Vec<Hotel>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM hotels WHERE id IN ({})",
            HOTEL_COLUMNS, placeholders
        );
        let mut query = sqlx::query_as::<_, Hotel>(&sql);
        for id in ids {
            query = query.bind(*id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn list(&self, filter: &HotelFilter) -> Result<Vec<Hotel>> {
        let mut sql = format!("SELECT {} FROM hotels WHERE 1=1", HOTEL_COLUMNS);

        if filter.merchant_id.is_some() {
            sql.push_str(" AND merchant_id = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.city.is_some() {
            sql.push_str(" AND city = ?");
        }
        if filter.keyword.is_some() {
            sql.push_str(" AND LOWER(name) LIKE ?");
        }

        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query_as::<_, Hotel>(&sql);

        if let Some(merchant_id) = filter.merchant_id {
            query = query.bind(merchant_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(ref city) = filter.city {
            query = query.bind(city);
        }
        if let Some(ref keyword) = filter.keyword {
            query = query.bind(like_pattern(keyword));
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn update(&self, id: StringUuid, patch: &HotelPatch) -> Result<Hotel> {
        let mut assignments = patched_columns(patch);
        assignments.push("updated_at = NOW()");
        let sql = format!("UPDATE hotels SET {} WHERE id = ?", assignments.join(", "));

        // Bind order must follow `patched_columns`
        let mut query = sqlx::query(&sql);
        if let Some(ref name) = patch.name {
            query = query.bind(name);
        }
        if let Some(ref description) = patch.description {
            query = query.bind(description);
        }
        if let Some(ref location) = patch.location {
            query = query.bind(location);
        }
        if let Some(ref city) = patch.city {
            query = query.bind(city);
        }
        if let Some(rating) = patch.rating {
            query = query.bind(rating);
        }
        if let Some(price) = patch.price_per_night {
            query = query.bind(price);
        }
        if let Some(total) = patch.total_rooms {
            query = query.bind(total);
        }
        if let Some(available) = patch.available_rooms {
            query = query.bind(available);
        }
        if let Some(ref phone) = patch.phone_number {
            query = query.bind(phone);
        }
        if let Some(ref images) = patch.images {
            query = query.bind(to_json(images)?);
        }
        if let Some(ref amenities) = patch.amenities {
            query = query.bind(to_json(amenities)?);
        }
        if let Some(status) = patch.status {
            query = query.bind(status);
        }
        query.bind(id).execute(&self.pool).await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Hotel not found".to_string()))
    }

    async fn delete(&self, id: StringUuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(StringUuid,)> =
            sqlx::query_as("SELECT id FROM hotels WHERE id = ? FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(AppError::NotFound("Hotel not found".to_string()));
        }

        let (active,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings WHERE hotel_id = ? AND status IN ('pending', 'confirmed')",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if active > 0 {
            return Err(AppError::Conflict(format!(
                "Hotel has {} active booking(s) and cannot be deleted",
                active
            )));
        }

        sqlx::query("DELETE FROM bookings WHERE hotel_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM hotels WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
