//! Booking repository

use crate::domain::{Booking, BookingFilter, BookingPatch, NewBooking, StringUuid};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a `pending` booking. With `reserve_rooms` the hotel's
    /// `available_rooms` is decremented in the same transaction and the call
    /// fails with `Conflict` when not enough rooms are left.
    async fn create(&self, input: &NewBooking, reserve_rooms: bool) -> Result<Booking>;
    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Booking>>;
    /// Newest first
    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>>;
    /// Re-checks the transition against the locked row and fails with
    /// `Validation` when the booking has meanwhile become terminal. With
    /// `release_rooms`, a transition from an active to a terminal status
    /// returns the booked rooms to the hotel atomically.
    async fn update(&self, id: StringUuid, patch: &BookingPatch, release_rooms: bool)
        -> Result<Booking>;
    async fn delete(&self, id: StringUuid, release_rooms: bool) -> Result<()>;
}

pub struct BookingRepositoryImpl {
    pool: MySqlPool,
}

impl BookingRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const BOOKING_COLUMNS: &str = "b.id, b.hotel_id, b.user_id, b.guest_name, b.guest_phone, b.guest_email, b.check_in_date, b.check_out_date, b.number_of_rooms, b.number_of_guests, b.total_price, b.status, b.remarks, b.created_at, b.updated_at";

#[async_trait]
impl BookingRepository for BookingRepositoryImpl {
    async fn create(&self, input: &NewBooking, reserve_rooms: bool) -> Result<Booking> {
        let id = StringUuid::new_v4();
        let mut tx = self.pool.begin().await?;

        if reserve_rooms {
            let reserved = sqlx::query(
                r#"
                UPDATE hotels
                SET available_rooms = available_rooms - ?, updated_at = NOW()
                WHERE id = ? AND available_rooms >= ?
                "#,
            )
            .bind(input.number_of_rooms)
            .bind(input.hotel_id)
            .bind(input.number_of_rooms)
            .execute(&mut *tx)
            .await?;

            if reserved.rows_affected() == 0 {
                return Err(AppError::Conflict("No rooms available".to_string()));
            }
        }

        sqlx::query(
            r#"
            INSERT INTO bookings (id, hotel_id, user_id, guest_name, guest_phone, guest_email,
                                  check_in_date, check_out_date, number_of_rooms, number_of_guests,
                                  total_price, status, remarks, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, NOW(3), NOW(3))
            "#,
        )
        .bind(id)
        .bind(input.hotel_id)
        .bind(input.user_id)
        .bind(&input.guest_name)
        .bind(&input.guest_phone)
        .bind(&input.guest_email)
        .bind(input.check_in_date)
        .bind(input.check_out_date)
        .bind(input.number_of_rooms)
        .bind(input.number_of_guests)
        .bind(input.total_price)
        .bind(&input.remarks)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create booking")))
    }

    async fn find_by_id(&self, id: StringUuid) -> Result<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings b WHERE b.id = ?", BOOKING_COLUMNS);
        let booking = sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(booking)
    }

    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>> {
        let mut sql = format!("SELECT {} FROM bookings b", BOOKING_COLUMNS);
        if filter.merchant_id.is_some() {
            sql.push_str(" INNER JOIN hotels h ON h.id = b.hotel_id");
        }
        sql.push_str(" WHERE 1=1");

        if filter.merchant_id.is_some() {
            sql.push_str(" AND h.merchant_id = ?");
        }
        if filter.user_id.is_some() {
            sql.push_str(" AND b.user_id = ?");
        }
        if filter.hotel_id.is_some() {
            sql.push_str(" AND b.hotel_id = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND b.status = ?");
        }

        sql.push_str(" ORDER BY b.created_at DESC");

        let mut query = sqlx::query_as::<_, Booking>(&sql);

        if let Some(merchant_id) = filter.merchant_id {
            query = query.bind(merchant_id);
        }
        if let Some(user_id) = filter.user_id {
            query = query.bind(user_id);
        }
        if let Some(hotel_id) = filter.hotel_id {
            query = query.bind(hotel_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn update(
        &self,
        id: StringUuid,
        patch: &BookingPatch,
        release_rooms: bool,
    ) -> Result<Booking> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM bookings b WHERE b.id = ? FOR UPDATE",
            BOOKING_COLUMNS
        );
        let current = sqlx::query_as::<_, Booking>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
        patch.check_transition(current.status)?;

        let status = patch.status.unwrap_or(current.status);
        let remarks = patch.remarks.clone().or(current.remarks.clone());

        sqlx::query(
            "UPDATE bookings SET status = ?, remarks = ?, updated_at = NOW(3) WHERE id = ?",
        )
        .bind(status)
        .bind(&remarks)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if release_rooms && patch.releases_rooms(current.status) {
            sqlx::query(
                "UPDATE hotels SET available_rooms = available_rooms + ?, updated_at = NOW() WHERE id = ?",
            )
            .bind(current.number_of_rooms)
            .bind(current.hotel_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update booking")))
    }

    async fn delete(&self, id: StringUuid, release_rooms: bool) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(StringUuid, i32, String)> = sqlx::query_as(
            "SELECT hotel_id, number_of_rooms, status FROM bookings WHERE id = ? FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let (hotel_id, rooms, status) =
            row.ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        sqlx::query("DELETE FROM bookings WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let active = matches!(status.as_str(), "pending" | "confirmed");
        if release_rooms && active {
            sqlx::query(
                "UPDATE hotels SET available_rooms = available_rooms + ?, updated_at = NOW() WHERE id = ?",
            )
            .bind(rooms)
            .bind(hotel_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
