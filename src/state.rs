//! Application state trait for dependency injection
//!
//! Handlers are generic over `HasServices`, so the production `AppState`
//! and the in-memory test state share the same router.

use crate::config::Config;
use crate::jwt::JwtManager;
use crate::repository::{BookingRepository, HotelRepository, UserRepository};
use crate::service::{AuthService, BookingService, HotelService, StatisticsService};
use metrics_exporter_prometheus::PrometheusHandle;

pub trait HasServices: Clone + Send + Sync + 'static {
    type UserRepo: UserRepository;
    type HotelRepo: HotelRepository;
    type BookingRepo: BookingRepository;

    fn config(&self) -> &Config;

    fn jwt_manager(&self) -> &JwtManager;

    fn auth_service(&self) -> &AuthService<Self::UserRepo>;

    fn hotel_service(&self) -> &HotelService<Self::HotelRepo>;

    fn booking_service(&self) -> &BookingService<Self::BookingRepo, Self::HotelRepo>;

    fn statistics_service(&self) -> &StatisticsService<Self::HotelRepo, Self::BookingRepo>;

    /// `None` when metrics are disabled
    fn prometheus_handle(&self) -> Option<&PrometheusHandle>;

    /// Returns `(db_ok, cache_ok)`
    fn check_ready(&self) -> impl std::future::Future<Output = (bool, bool)> + Send;
}
