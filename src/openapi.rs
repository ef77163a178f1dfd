//! OpenAPI 3 document assembled from handler annotations and domain schemas

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HotelHub Core API",
        version = "0.1.0",
        description = "Hotel listings, approval workflow, bookings and revenue statistics"
    ),
    tags(
        (name = "System", description = "Health checks"),
        (name = "Auth", description = "Registration, login and WeChat identity"),
        (name = "Hotels", description = "Hotel listings and approval"),
        (name = "Bookings", description = "Booking lifecycle"),
        (name = "Statistics", description = "Revenue aggregation"),
    ),
    security(
        ("bearer_jwt" = [])
    ),
    components(
        schemas(
            crate::api::MessageResponse,
            crate::api::health::HealthResponse,
            crate::domain::StringUuid,
            // Accounts
            crate::domain::UserRole,
            crate::domain::UserProfile,
            crate::domain::RegisterInput,
            crate::domain::RegisteredUser,
            crate::domain::LoginInput,
            crate::domain::LoginResponse,
            crate::domain::SendCodeInput,
            crate::domain::SendCodeResponse,
            crate::domain::WechatLoginInput,
            crate::domain::WechatBindInput,
            crate::domain::WechatBindResponse,
            // Hotels
            crate::domain::Hotel,
            crate::domain::HotelStatus,
            crate::domain::HotelSummary,
            crate::domain::CreateHotelInput,
            crate::domain::UpdateHotelInput,
            // Bookings
            crate::domain::Booking,
            crate::domain::BookingStatus,
            crate::domain::BookingView,
            crate::domain::CreateBookingInput,
            crate::domain::UpdateBookingInput,
            // Statistics
            crate::domain::RevenueStatistics,
            crate::domain::HotelRevenue,
        ),
    ),
    paths(
        crate::api::health::health,
        crate::api::health::ready,
        crate::api::auth::send_code,
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::wechat_login,
        crate::api::auth::wechat_bind,
        crate::api::hotel::list,
        crate::api::hotel::get,
        crate::api::hotel::create,
        crate::api::hotel::update,
        crate::api::hotel::delete,
        crate::api::booking::list,
        crate::api::booking::get,
        crate::api::booking::create,
        crate::api::booking::update,
        crate::api::booking::delete,
        crate::api::statistics::revenue,
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// The generated document plus the bearer JWT security scheme.
    pub fn build() -> utoipa::openapi::OpenApi {
        let mut doc = Self::openapi();
        if let Some(c) = doc.components.as_mut() {
            c.security_schemes.insert(
                "bearer_jwt".to_string(),
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
        doc
    }
}
