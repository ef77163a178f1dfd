//! Booking lifecycle: creation, status transitions and scoped listing

use crate::config::BookingConfig;
use crate::domain::{
    parse_booking_date, Booking, BookingFilter, BookingPatch, BookingStatus, BookingView,
    CreateBookingInput, Hotel, HotelSummary, NewBooking, StringUuid, UpdateBookingInput,
    UserRole, UNSPECIFIED_PHONE,
};
use crate::error::{AppError, Result};
use crate::policy::{enforce, resolve, Capability, Principal, Resource};
use crate::repository::{BookingRepository, HotelRepository};
use metrics::counter;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

/// Caller-supplied narrowing of the booking list
#[derive(Debug, Clone, Default)]
pub struct BookingQuery {
    pub user_id: Option<StringUuid>,
    pub hotel_id: Option<StringUuid>,
    pub status: Option<String>,
}

pub struct BookingService<B: BookingRepository, H: HotelRepository> {
    repo: Arc<B>,
    hotel_repo: Arc<H>,
    config: BookingConfig,
}

impl<B: BookingRepository, H: HotelRepository> BookingService<B, H> {
    pub fn new(repo: Arc<B>, hotel_repo: Arc<H>, config: BookingConfig) -> Self {
        Self {
            repo,
            hotel_repo,
            config,
        }
    }

    /// Place a booking. `principal` is `None` only on the guest path, which
    /// must be enabled in configuration.
    pub async fn create(
        &self,
        principal: Option<&Principal>,
        input: CreateBookingInput,
    ) -> Result<BookingView> {
        match principal {
            Some(p) => enforce(p, &Resource::BookingCatalog, Capability::Create)?,
            None if self.config.allow_guest_bookings => {}
            None => return Err(AppError::Unauthorized("Authentication required".to_string())),
        }

        let missing = input.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }
        input.validate()?;

        let hotel_id = input
            .hotel_id
            .as_deref()
            .map(str::trim)
            .and_then(|id| StringUuid::parse_str(id).ok())
            .ok_or_else(|| AppError::Validation("hotelId is not a valid id".to_string()))?;
        let hotel = self
            .hotel_repo
            .find_by_id(hotel_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Hotel not found".to_string()))?;

        let check_in = required_date(input.check_in_date.as_deref(), "checkInDate")?;
        let check_out = required_date(input.check_out_date.as_deref(), "checkOutDate")?;
        if check_in >= check_out {
            return Err(AppError::Validation(
                "checkInDate must be before checkOutDate".to_string(),
            ));
        }

        let guest_phone = input
            .guest_phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| UNSPECIFIED_PHONE.to_string());

        let new_booking = NewBooking {
            hotel_id,
            user_id: principal.map(|p| p.id),
            guest_name: input.guest_name.unwrap_or_default().trim().to_string(),
            guest_phone,
            guest_email: input.guest_email.filter(|e| !e.is_empty()),
            check_in_date: check_in,
            check_out_date: check_out,
            number_of_rooms: input.number_of_rooms.unwrap_or(1),
            number_of_guests: input.number_of_guests.unwrap_or(1),
            total_price: input.total_price.unwrap_or(0.0),
            remarks: input.remarks,
        };

        let booking = self
            .repo
            .create(&new_booking, self.config.enforce_inventory)
            .await?;

        counter!("hotelhub_bookings_created_total").increment(1);
        info!(
            booking_id = %booking.id,
            hotel_id = %hotel.id,
            guest = principal.is_none(),
            rooms = booking.number_of_rooms,
            "booking created"
        );

        Ok(BookingView {
            booking,
            hotel: Some(HotelSummary::from(&hotel)),
        })
    }

    pub async fn get(&self, principal: &Principal, id: StringUuid) -> Result<BookingView> {
        let (booking, hotel) = self.load(id).await?;
        enforce(principal, &booking_resource(&booking, hotel.as_ref()), Capability::Read)?;

        Ok(BookingView {
            hotel: hotel.as_ref().map(HotelSummary::from),
            booking,
        })
    }

    /// Change status and/or remarks.
    ///
    /// Users may only cancel their own bookings and never touch remarks.
    /// Merchants and admins may write `pending`, `confirmed` or `cancelled`.
    /// Terminal bookings cannot move to another status.
    pub async fn update(
        &self,
        principal: &Principal,
        id: StringUuid,
        input: UpdateBookingInput,
    ) -> Result<BookingView> {
        let (booking, hotel) = self.load(id).await?;
        let resource = booking_resource(&booking, hotel.as_ref());
        enforce(principal, &resource, Capability::Update)?;
        let caps = resolve(principal, &resource);

        let mut patch = BookingPatch::default();

        if let Some(raw) = input.status.as_deref() {
            let status = if caps.contains(Capability::SetStatus) {
                raw.parse::<BookingStatus>()
                    .ok()
                    .filter(BookingStatus::is_settable)
                    .ok_or_else(|| {
                        AppError::Validation(
                            "status must be one of: pending, confirmed, cancelled".to_string(),
                        )
                    })?
            } else if caps.contains(Capability::Cancel) && raw == BookingStatus::Cancelled.as_str()
            {
                BookingStatus::Cancelled
            } else {
                return Err(AppError::Forbidden(
                    "You can only cancel this booking".to_string(),
                ));
            };

            if status != booking.status {
                patch.status = Some(status);
                patch.check_transition(booking.status)?;
            }
        }

        if let Some(remarks) = input.remarks {
            if !caps.contains(Capability::EditRemarks) {
                return Err(AppError::Forbidden(
                    "You are not allowed to edit remarks".to_string(),
                ));
            }
            patch.remarks = Some(remarks);
        }

        let updated = if patch.is_empty() {
            booking
        } else {
            let updated = self
                .repo
                .update(id, &patch, self.config.enforce_inventory)
                .await?;
            if let Some(status) = patch.status {
                counter!("hotelhub_booking_transitions_total", "to" => status.as_str())
                    .increment(1);
                info!(
                    booking_id = %id,
                    user_id = %principal.id,
                    from = %booking.status,
                    to = %status,
                    "booking status changed"
                );
            }
            updated
        };

        Ok(BookingView {
            hotel: hotel.as_ref().map(HotelSummary::from),
            booking: updated,
        })
    }

    pub async fn delete(&self, principal: &Principal, id: StringUuid) -> Result<()> {
        let (booking, hotel) = self.load(id).await?;
        enforce(principal, &booking_resource(&booking, hotel.as_ref()), Capability::Delete)?;

        self.repo.delete(id, self.config.enforce_inventory).await?;
        info!(booking_id = %id, user_id = %principal.id, "booking deleted");
        Ok(())
    }

    /// List bookings visible to the caller, newest first.
    pub async fn list(&self, principal: &Principal, query: BookingQuery) -> Result<Vec<BookingView>> {
        let status = query
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<BookingStatus>()
                    .map_err(|_| AppError::Validation(format!("Unknown booking status: {}", s)))
            })
            .transpose()?;

        let filter = match principal.role {
            UserRole::Admin => BookingFilter {
                user_id: query.user_id,
                hotel_id: query.hotel_id,
                merchant_id: None,
                status,
            },
            UserRole::Merchant => BookingFilter {
                user_id: None,
                hotel_id: query.hotel_id,
                merchant_id: Some(principal.id),
                status,
            },
            UserRole::User => BookingFilter {
                user_id: Some(principal.id),
                hotel_id: query.hotel_id,
                merchant_id: None,
                status,
            },
        };

        let bookings = self.repo.list(&filter).await?;
        self.attach_hotels(bookings).await
    }

    async fn load(&self, id: StringUuid) -> Result<(Booking, Option<Hotel>)> {
        let booking = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;
        let hotel = self.hotel_repo.find_by_id(booking.hotel_id).await?;
        Ok((booking, hotel))
    }

    async fn attach_hotels(&self, bookings: Vec<Booking>) -> Result<Vec<BookingView>> {
        let mut ids: Vec<StringUuid> = bookings.iter().map(|b| b.hotel_id).collect();
        ids.sort_unstable_by_key(|id| id.0);
        ids.dedup();

        let hotels: HashMap<StringUuid, HotelSummary> = self
            .hotel_repo
            .find_by_ids(&ids)
            .await?
            .iter()
            .map(|h| (h.id, HotelSummary::from(h)))
            .collect();

        Ok(bookings
            .into_iter()
            .map(|booking| BookingView {
                hotel: hotels.get(&booking.hotel_id).cloned(),
                booking,
            })
            .collect())
    }
}

/// A booking whose hotel has vanished is only reachable by admins.
fn booking_resource(booking: &Booking, hotel: Option<&Hotel>) -> Resource {
    let merchant_id = hotel.map(|h| h.merchant_id).unwrap_or_else(StringUuid::nil);
    Resource::booking(booking, merchant_id)
}

fn required_date(value: Option<&str>, field: &str) -> Result<chrono::NaiveDate> {
    value.and_then(parse_booking_date).ok_or_else(|| {
        AppError::Validation(format!("{} must be a date in YYYY-MM-DD format", field))
    })
}
