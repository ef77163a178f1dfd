//! Hotel registry and approval workflow

use crate::domain::{
    CreateHotelInput, Hotel, HotelFilter, HotelPatch, HotelStatus, NewHotel, StringUuid,
    UpdateHotelInput,
};
use crate::error::{AppError, Result};
use crate::policy::{enforce, resolve, Capability, Principal, Resource};
use crate::repository::HotelRepository;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

pub struct HotelService<R: HotelRepository> {
    repo: Arc<R>,
}

impl<R: HotelRepository> HotelService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Create a listing owned by the caller. New listings always start in
    /// `pending` and wait for an admin.
    pub async fn create(&self, principal: &Principal, input: CreateHotelInput) -> Result<Hotel> {
        enforce(principal, &Resource::HotelCatalog, Capability::Create)?;

        let input = input.trimmed();
        let missing = input.missing_fields();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }
        input.validate()?;

        let new_hotel = NewHotel {
            name: input.name.unwrap_or_default(),
            description: input.description,
            location: input.location.unwrap_or_default(),
            city: input.city.unwrap_or_default(),
            rating: input.rating.unwrap_or(0.0),
            price_per_night: input.price_per_night.unwrap_or_default(),
            total_rooms: input.total_rooms.unwrap_or(0),
            available_rooms: input.available_rooms.unwrap_or(0),
            phone_number: input.phone_number,
            images: input.images.unwrap_or_default(),
            amenities: input.amenities.unwrap_or_default(),
            status: HotelStatus::Pending,
            merchant_id: principal.id,
        };

        let hotel = self.repo.create(&new_hotel).await?;
        counter!("hotelhub_hotels_created_total").increment(1);
        info!(hotel_id = %hotel.id, merchant_id = %hotel.merchant_id, "hotel created");
        Ok(hotel)
    }

    pub async fn get(&self, id: StringUuid) -> Result<Hotel> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Hotel not found".to_string()))
    }

    pub async fn list(&self, filter: &HotelFilter) -> Result<Vec<Hotel>> {
        self.repo.list(filter).await
    }

    /// Apply a partial update. Merchants edit content only and any `status`
    /// they send is dropped; admins may also move the approval status.
    pub async fn update(
        &self,
        principal: &Principal,
        id: StringUuid,
        input: UpdateHotelInput,
    ) -> Result<Hotel> {
        let hotel = self.get(id).await?;
        let resource = Resource::hotel(&hotel);
        enforce(principal, &resource, Capability::Update)?;
        let input = input.trimmed();
        input.validate()?;

        let mut patch = HotelPatch::content_from(&input);
        if let Some(status) = input.status.as_deref() {
            if resolve(principal, &resource).contains(Capability::SetStatus) {
                let status: HotelStatus = status.parse().map_err(|_| {
                    AppError::Validation(
                        "status must be one of: draft, pending, approved, rejected".to_string(),
                    )
                })?;
                patch.status = Some(status);
            } else {
                debug!(hotel_id = %id, user_id = %principal.id, "ignoring hotel status from non-admin");
            }
        }

        if patch == HotelPatch::default() {
            return Ok(hotel);
        }

        let updated = self.repo.update(id, &patch).await?;
        if let Some(status) = patch.status.filter(|s| *s != hotel.status) {
            counter!("hotelhub_hotel_status_changes_total", "to" => status.as_str()).increment(1);
            info!(hotel_id = %id, from = %hotel.status, to = %status, "hotel status changed");
        }
        Ok(updated)
    }

    pub async fn delete(&self, principal: &Principal, id: StringUuid) -> Result<()> {
        let hotel = self.get(id).await?;
        enforce(principal, &Resource::hotel(&hotel), Capability::Delete)?;

        self.repo.delete(id).await?;
        info!(hotel_id = %id, user_id = %principal.id, "hotel deleted");
        Ok(())
    }
}
