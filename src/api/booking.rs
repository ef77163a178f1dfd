//! Booking API handlers

use crate::api::{ApiResponse, MessageResponse};
use crate::domain::{CreateBookingInput, StringUuid, UpdateBookingInput};
use crate::error::Result;
use crate::middleware::auth::{AuthUser, OptionalAuth};
use crate::service::BookingQuery;
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
pub struct BookingListQuery {
    /// Admins only; ignored for other roles
    pub user_id: Option<StringUuid>,
    pub hotel_id: Option<StringUuid>,
    pub status: Option<String>,
}

impl From<BookingListQuery> for BookingQuery {
    fn from(q: BookingListQuery) -> Self {
        BookingQuery {
            user_id: q.user_id,
            hotel_id: q.hotel_id,
            status: q.status,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "Bookings",
    params(BookingListQuery),
    responses(
        (status = 200, description = "Bookings in the caller's scope, newest first")
    )
)]
pub async fn list<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Query(query): Query<BookingListQuery>,
) -> Result<impl IntoResponse> {
    let bookings = state
        .booking_service()
        .list(&auth.principal(), query.into())
        .await?;
    Ok(ApiResponse::ok(bookings))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    responses(
        (status = 200, description = "Booking with hotel summary"),
        (status = 403, description = "Outside the caller's scope"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<StringUuid>,
) -> Result<impl IntoResponse> {
    let booking = state.booking_service().get(&auth.principal(), id).await?;
    Ok(ApiResponse::ok(booking))
}

#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "Bookings",
    request_body = CreateBookingInput,
    responses(
        (status = 200, description = "Booking created as pending"),
        (status = 400, description = "Missing fields or invalid dates"),
        (status = 404, description = "Hotel not found"),
        (status = 409, description = "No rooms available")
    )
)]
pub async fn create<S: HasServices>(
    State(state): State<S>,
    OptionalAuth(auth): OptionalAuth,
    Json(input): Json<CreateBookingInput>,
) -> Result<impl IntoResponse> {
    let principal = auth.as_ref().map(AuthUser::principal);
    let booking = state
        .booking_service()
        .create(principal.as_ref(), input)
        .await?;
    Ok(ApiResponse::with_message("Booking created", booking))
}

#[utoipa::path(
    put,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    request_body = UpdateBookingInput,
    responses(
        (status = 200, description = "Updated booking"),
        (status = 400, description = "Invalid status transition"),
        (status = 403, description = "Not permitted for this role")
    )
)]
pub async fn update<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<StringUuid>,
    Json(input): Json<UpdateBookingInput>,
) -> Result<impl IntoResponse> {
    let booking = state
        .booking_service()
        .update(&auth.principal(), id, input)
        .await?;
    Ok(ApiResponse::with_message("Booking updated", booking))
}

#[utoipa::path(
    delete,
    path = "/api/bookings/{id}",
    tag = "Bookings",
    responses(
        (status = 200, description = "Booking deleted"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn delete<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Path(id): Path<StringUuid>,
) -> Result<impl IntoResponse> {
    state
        .booking_service()
        .delete(&auth.principal(), id)
        .await?;
    Ok(MessageResponse::new("Booking deleted"))
}
