//! Revenue aggregation over a merchant's (or the whole system's) bookings

use crate::domain::{aggregate, BookingFilter, HotelFilter, RevenueStatistics, StringUuid, UserRole};
use crate::error::Result;
use crate::policy::{enforce, Capability, Principal, Resource};
use crate::repository::{BookingRepository, HotelRepository};
use std::sync::Arc;
use tracing::debug;

/// Requested scope. `role=merchant&userId=X` is the legacy spelling of
/// `merchantId=X`.
#[derive(Debug, Clone, Default)]
pub struct StatisticsQuery {
    pub role: Option<String>,
    pub user_id: Option<StringUuid>,
    pub merchant_id: Option<StringUuid>,
}

impl StatisticsQuery {
    pub fn requested_merchant(&self) -> Option<StringUuid> {
        self.merchant_id.or_else(|| match self.role.as_deref() {
            Some("merchant") => self.user_id,
            _ => None,
        })
    }
}

pub struct StatisticsService<H: HotelRepository, B: BookingRepository> {
    hotel_repo: Arc<H>,
    booking_repo: Arc<B>,
}

impl<H: HotelRepository, B: BookingRepository> StatisticsService<H, B> {
    pub fn new(hotel_repo: Arc<H>, booking_repo: Arc<B>) -> Self {
        Self {
            hotel_repo,
            booking_repo,
        }
    }

    pub async fn revenue(
        &self,
        principal: &Principal,
        query: StatisticsQuery,
    ) -> Result<RevenueStatistics> {
        let requested = query.requested_merchant();
        let merchant_id = match principal.role {
            UserRole::Merchant => Some(requested.unwrap_or(principal.id)),
            UserRole::Admin | UserRole::User => requested,
        };
        enforce(
            principal,
            &Resource::Statistics { merchant_id },
            Capability::ReadStatistics,
        )?;

        let hotel_filter = HotelFilter {
            merchant_id,
            ..Default::default()
        };
        let booking_filter = BookingFilter {
            merchant_id,
            ..Default::default()
        };

        let hotels = self.hotel_repo.list(&hotel_filter).await?;
        let bookings = self.booking_repo.list(&booking_filter).await?;
        let stats = aggregate(&hotels, &bookings);

        debug!(
            user_id = %principal.id,
            scope = ?merchant_id,
            hotels = hotels.len(),
            bookings = bookings.len(),
            "revenue statistics computed"
        );
        Ok(stats)
    }
}
