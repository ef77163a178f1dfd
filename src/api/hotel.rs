//! Hotel API handlers

use crate::api::{ApiResponse, MessageResponse};
use crate::domain::{CreateHotelInput, HotelFilter, HotelStatus, StringUuid, UpdateHotelInput};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::state::HasServices;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HotelListQuery {
    pub merchant_id: Option<StringUuid>,
    pub status: Option<String>,
    pub city: Option<String>,
    pub keyword: Option<String>,
    /// Legacy: `role=merchant&userId=X` means `merchantId=X`
    pub role: Option<String>,
    pub user_id: Option<StringUuid>,
}

impl HotelListQuery {
    pub fn into_filter(self) -> Result<HotelFilter> {
        let merchant_id = self.merchant_id.or(match self.role.as_deref() {
            Some("merchant") => self.user_id,
            _ => None,
        });
        let status = match self.status.as_deref().filter(|s| !s.is_empty()) {
            Some(s) => Some(
                s.parse::<HotelStatus>()
                    .map_err(|_| AppError::Validation(format!("Unknown hotel status: {}", s)))?,
            ),
            None => None,
        };

        Ok(HotelFilter {
            merchant_id,
            status,
            city: self.city.filter(|c| !c.is_empty()),
            keyword: self.keyword.filter(|k| !k.is_empty()),
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/hotels",
    tag = "Hotels",
    params(HotelListQuery),
    responses(
        (status = 200, description = "Hotels, newest first")
    ),
    security(())
)]
pub async fn list<S: HasServices>(
    State(state): State<S>,
    Query(query): Query<HotelListQuery>,
) -> Result<impl IntoResponse> {
    let hotels = state.hotel_service().list(&query.into_filter()?).await?;
    Ok(ApiResponse::ok(hotels))
}

#[utoipa::path(
    get,
    path = "/api/hotels/{id}",
    tag = "Hotels",
    responses(
        (status = 200, description = "Hotel"),
        (status = 404, description = "Hotel not found")
    ),
    security(())
)]
pub async fn get<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<StringUuid>,
) -> Result<impl IntoResponse> {
    let hotel = state.hotel_service().get(id).await?;
    Ok(ApiResponse::ok(hotel))
}

#[utoipa::path(
    post,
    path = "/api/hotels",
    tag = "Hotels",
    request_body = CreateHotelInput,
    responses(
        (status = 200, description = "Hotel created in pending state"),
        (status = 400, description = "Missing or invalid fields"),
        (status = 403, description = "Only merchants and admins may create hotels")
    )
)]
pub async fn create<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Json(input): Json<CreateHotelInput>,
) -> Result<impl IntoResponse> {
    let hotel = state
        .hotel_service()
        .create(&auth.principal(), input)
        .await?;
    Ok(ApiResponse::with_message("Hotel created", hotel))
}

#[utoipa::path(
    put,
    path = "/api/hotels/{id}",
    tag = "Hotels",
    request_body = UpdateHotelInput,
    responses(
        (status = 200, description = "Updated hotel"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Hotel not found")
    )
)]
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<StringUuid>,
    Json(input): Json<UpdateHotelInput>,
) -> Result<impl IntoResponse> {
    let hotel = state
        .hotel_service()
        .update(&auth.principal(), id, input)
        .await?;
    Ok(ApiResponse::with_message("Hotel updated", hotel))
}

#[utoipa::path(
    delete,
    path = "/api/hotels/{id}",
    tag = "Hotels",
    responses(
        (status = 200, description = "Hotel deleted"),
        (status = 409, description = "Hotel still has active bookings")
    )
)]
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<StringUuid>,
) -> Result<impl IntoResponse> {
    state
        .hotel_service()
        .delete(&auth.principal(), id)
        .await?;
    Ok(MessageResponse::new("Hotel deleted"))
}
