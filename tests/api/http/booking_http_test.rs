//! Booking lifecycle HTTP tests

use crate::api::{create_test_booking, create_test_hotel, token_for};
use super::{
    build_test_router, create_test_config, delete_json, get_json, post_json, post_raw, put_json,
    TestAppState,
};
use axum::http::StatusCode;
use hotelhub_core::api::{ApiResponse, MessageResponse};
use hotelhub_core::domain::{BookingPatch, BookingStatus, BookingView, StringUuid, UserRole};
use hotelhub_core::error::AppError;
use hotelhub_core::repository::BookingRepository;
use serde_json::{json, Value};

fn booking_body(hotel_id: StringUuid) -> Value {
    json!({
        "hotelId": hotel_id.to_string(),
        "guestName": "Han Meimei",
        "guestPhone": "13900000000",
        "checkInDate": "2025-06-01",
        "checkOutDate": "2025-06-03",
        "numberOfRooms": 2,
        "totalPrice": 400.0
    })
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn test_create_booking_reserves_rooms() {
    let state = TestAppState::new();
    let hotel = create_test_hotel(StringUuid::new_v4());
    let hotel_id = hotel.id;
    state.hotel_repo.add_hotel(hotel).await;
    let hotel_repo = state.hotel_repo.clone();
    let app = build_test_router(state);

    let user = StringUuid::new_v4();
    let token = token_for(user, UserRole::User);
    let (status, body): (StatusCode, Option<ApiResponse<BookingView>>) =
        post_json(&app, "/api/bookings", Some(&token), &booking_body(hotel_id)).await;

    assert_eq!(status, StatusCode::OK);
    let view = body.unwrap().data.unwrap();
    assert_eq!(view.booking.status, BookingStatus::Pending);
    assert_eq!(view.booking.user_id, Some(user));
    assert_eq!(view.booking.number_of_rooms, 2);
    assert_eq!(view.hotel.unwrap().id, hotel_id);
    assert_eq!(hotel_repo.available_rooms(hotel_id).await, Some(8));
}

#[tokio::test]
async fn test_create_booking_without_rooms_is_409() {
    let state = TestAppState::new();
    let mut hotel = create_test_hotel(StringUuid::new_v4());
    hotel.available_rooms = 1;
    let hotel_id = hotel.id;
    state.hotel_repo.add_hotel(hotel).await;
    let hotel_repo = state.hotel_repo.clone();
    let app = build_test_router(state);

    let token = token_for(StringUuid::new_v4(), UserRole::User);
    let (status, body): (StatusCode, Option<Value>) =
        post_json(&app, "/api/bookings", Some(&token), &booking_body(hotel_id)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.unwrap()["code"], 409);
    assert_eq!(hotel_repo.available_rooms(hotel_id).await, Some(1));
}

#[tokio::test]
async fn test_create_booking_with_inverted_dates_is_400() {
    let state = TestAppState::new();
    let hotel = create_test_hotel(StringUuid::new_v4());
    let hotel_id = hotel.id;
    state.hotel_repo.add_hotel(hotel).await;
    let app = build_test_router(state);

    let mut body = booking_body(hotel_id);
    body["checkInDate"] = json!("2025-06-03");
    body["checkOutDate"] = json!("2025-06-03");

    let token = token_for(StringUuid::new_v4(), UserRole::User);
    let (status, response): (StatusCode, Option<Value>) =
        post_json(&app, "/api/bookings", Some(&token), &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response.unwrap()["message"]
        .as_str()
        .unwrap()
        .contains("checkInDate"));
}

#[tokio::test]
async fn test_create_booking_with_unparseable_date_is_400() {
    let state = TestAppState::new();
    let hotel = create_test_hotel(StringUuid::new_v4());
    let hotel_id = hotel.id;
    state.hotel_repo.add_hotel(hotel).await;
    let app = build_test_router(state);

    let mut body = booking_body(hotel_id);
    body["checkOutDate"] = json!("next friday");

    let token = token_for(StringUuid::new_v4(), UserRole::User);
    let (status, _): (StatusCode, Option<Value>) =
        post_json(&app, "/api/bookings", Some(&token), &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_booking_for_unknown_hotel_is_404() {
    let app = build_test_router(TestAppState::new());
    let token = token_for(StringUuid::new_v4(), UserRole::User);

    let (status, _): (StatusCode, Option<Value>) = post_json(
        &app,
        "/api/bookings",
        Some(&token),
        &booking_body(StringUuid::new_v4()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_booking_without_token_is_401() {
    let state = TestAppState::new();
    let hotel = create_test_hotel(StringUuid::new_v4());
    let hotel_id = hotel.id;
    state.hotel_repo.add_hotel(hotel).await;
    let app = build_test_router(state);

    let (status, body): (StatusCode, Option<Value>) =
        post_json(&app, "/api/bookings", None, &booking_body(hotel_id)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.unwrap()["code"], 401);
}

#[tokio::test]
async fn test_guest_booking_when_enabled() {
    let mut config = create_test_config(None);
    config.booking.allow_guest_bookings = true;
    let state = TestAppState::with_config(config);
    let hotel = create_test_hotel(StringUuid::new_v4());
    let hotel_id = hotel.id;
    state.hotel_repo.add_hotel(hotel).await;
    let app = build_test_router(state);

    let (status, body): (StatusCode, Option<ApiResponse<BookingView>>) =
        post_json(&app, "/api/bookings", None, &booking_body(hotel_id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap().data.unwrap().booking.user_id, None);
}

#[tokio::test]
async fn test_create_booking_with_garbage_token_is_401() {
    let mut config = create_test_config(None);
    config.booking.allow_guest_bookings = true;
    let state = TestAppState::with_config(config);
    let hotel = create_test_hotel(StringUuid::new_v4());
    let hotel_id = hotel.id;
    state.hotel_repo.add_hotel(hotel).await;
    let app = build_test_router(state);

    let (status, _): (StatusCode, Option<Value>) = post_json(
        &app,
        "/api/bookings",
        Some("not-a-jwt"),
        &booking_body(hotel_id),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_json_is_400_envelope() {
    let app = build_test_router(TestAppState::new());
    let token = token_for(StringUuid::new_v4(), UserRole::User);

    let (status, body) = post_raw(&app, "/api/bookings", Some(&token), "{\"hotelId\": ").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = body.unwrap();
    assert_eq!(body["code"], 400);
    assert!(body["message"].is_string());
}

// ============================================================================
// Read / List
// ============================================================================

#[tokio::test]
async fn test_merchant_cannot_read_foreign_booking() {
    let state = TestAppState::new();
    let merchant_a = StringUuid::new_v4();
    let merchant_b = StringUuid::new_v4();
    let hotel_b = create_test_hotel(merchant_b);
    let booking = create_test_booking(
        hotel_b.id,
        StringUuid::new_v4(),
        BookingStatus::Pending,
        100.0,
    );
    let booking_id = booking.id;
    state.hotel_repo.add_hotel(hotel_b).await;
    state.booking_repo.add_booking(booking).await;
    let app = build_test_router(state);

    let path = format!("/api/bookings/{}", booking_id);
    let (status, body): (StatusCode, Option<Value>) =
        get_json(&app, &path, Some(&token_for(merchant_a, UserRole::Merchant))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.unwrap()["code"], 403);

    let (status, _): (StatusCode, Option<Value>) =
        get_json(&app, &path, Some(&token_for(merchant_b, UserRole::Merchant))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_bookings_is_scoped_by_role() {
    let state = TestAppState::new();
    let merchant = StringUuid::new_v4();
    let own_hotel = create_test_hotel(merchant);
    let other_hotel = create_test_hotel(StringUuid::new_v4());
    let alice = StringUuid::new_v4();
    let bob = StringUuid::new_v4();

    for booking in [
        create_test_booking(own_hotel.id, alice, BookingStatus::Pending, 100.0),
        create_test_booking(own_hotel.id, bob, BookingStatus::Confirmed, 100.0),
        create_test_booking(other_hotel.id, alice, BookingStatus::Confirmed, 100.0),
    ] {
        state.booking_repo.add_booking(booking).await;
    }
    state.hotel_repo.add_hotel(own_hotel).await;
    state.hotel_repo.add_hotel(other_hotel).await;
    let app = build_test_router(state);

    let (_, body): (StatusCode, Option<ApiResponse<Vec<BookingView>>>) = get_json(
        &app,
        "/api/bookings",
        Some(&token_for(alice, UserRole::User)),
    )
    .await;
    let bookings = body.unwrap().data.unwrap();
    assert_eq!(bookings.len(), 2);
    assert!(bookings.iter().all(|b| b.booking.user_id == Some(alice)));

    let (_, body): (StatusCode, Option<ApiResponse<Vec<BookingView>>>) = get_json(
        &app,
        "/api/bookings",
        Some(&token_for(merchant, UserRole::Merchant)),
    )
    .await;
    assert_eq!(body.unwrap().data.unwrap().len(), 2);

    let (_, body): (StatusCode, Option<ApiResponse<Vec<BookingView>>>) = get_json(
        &app,
        "/api/bookings?status=confirmed",
        Some(&token_for(StringUuid::new_v4(), UserRole::Admin)),
    )
    .await;
    assert_eq!(body.unwrap().data.unwrap().len(), 2);
}

// ============================================================================
// Update / Delete
// ============================================================================

#[tokio::test]
async fn test_user_may_only_cancel() {
    let state = TestAppState::new();
    let hotel = create_test_hotel(StringUuid::new_v4());
    let hotel_id = hotel.id;
    let user = StringUuid::new_v4();
    let mut booking = create_test_booking(hotel_id, user, BookingStatus::Pending, 100.0);
    booking.number_of_rooms = 3;
    let booking_id = booking.id;
    state.hotel_repo.add_hotel(hotel).await;
    state.booking_repo.add_booking(booking).await;
    let hotel_repo = state.hotel_repo.clone();
    let app = build_test_router(state);

    let token = token_for(user, UserRole::User);
    let path = format!("/api/bookings/{}", booking_id);

    let (status, _): (StatusCode, Option<Value>) =
        put_json(&app, &path, Some(&token), &json!({ "status": "confirmed" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body): (StatusCode, Option<ApiResponse<BookingView>>) =
        put_json(&app, &path, Some(&token), &json!({ "status": "cancelled" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.unwrap().data.unwrap().booking.status,
        BookingStatus::Cancelled
    );
    assert_eq!(hotel_repo.available_rooms(hotel_id).await, Some(13));
}

#[tokio::test]
async fn test_user_cannot_edit_remarks() {
    let state = TestAppState::new();
    let hotel = create_test_hotel(StringUuid::new_v4());
    let user = StringUuid::new_v4();
    let booking = create_test_booking(hotel.id, user, BookingStatus::Pending, 100.0);
    let booking_id = booking.id;
    state.hotel_repo.add_hotel(hotel).await;
    state.booking_repo.add_booking(booking).await;
    let app = build_test_router(state);

    let (status, _): (StatusCode, Option<Value>) = put_json(
        &app,
        &format!("/api/bookings/{}", booking_id),
        Some(&token_for(user, UserRole::User)),
        &json!({ "remarks": "upgrade please" }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_merchant_confirms_booking_on_own_hotel() {
    let state = TestAppState::new();
    let merchant = StringUuid::new_v4();
    let hotel = create_test_hotel(merchant);
    let booking = create_test_booking(
        hotel.id,
        StringUuid::new_v4(),
        BookingStatus::Pending,
        100.0,
    );
    let booking_id = booking.id;
    state.hotel_repo.add_hotel(hotel).await;
    state.booking_repo.add_booking(booking).await;
    let app = build_test_router(state);

    let (status, body): (StatusCode, Option<ApiResponse<BookingView>>) = put_json(
        &app,
        &format!("/api/bookings/{}", booking_id),
        Some(&token_for(merchant, UserRole::Merchant)),
        &json!({ "status": "confirmed", "remarks": "late check-in" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let booking = body.unwrap().data.unwrap().booking;
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.remarks.as_deref(), Some("late check-in"));
}

#[tokio::test]
async fn test_terminal_booking_cannot_change_status() {
    let state = TestAppState::new();
    let hotel = create_test_hotel(StringUuid::new_v4());
    let booking = create_test_booking(
        hotel.id,
        StringUuid::new_v4(),
        BookingStatus::Cancelled,
        100.0,
    );
    let booking_id = booking.id;
    state.hotel_repo.add_hotel(hotel).await;
    state.booking_repo.add_booking(booking).await;
    let app = build_test_router(state);

    let (status, _): (StatusCode, Option<Value>) = put_json(
        &app,
        &format!("/api/bookings/{}", booking_id),
        Some(&token_for(StringUuid::new_v4(), UserRole::Admin)),
        &json!({ "status": "confirmed" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_confirm_after_concurrent_cancel_is_rejected() {
    let state = TestAppState::new();
    let merchant = StringUuid::new_v4();
    let mut hotel = create_test_hotel(merchant);
    hotel.available_rooms = 9;
    let hotel_id = hotel.id;
    let booking = create_test_booking(
        hotel_id,
        StringUuid::new_v4(),
        BookingStatus::Pending,
        100.0,
    );
    let booking_id = booking.id;
    state.hotel_repo.add_hotel(hotel).await;
    state.booking_repo.add_booking(booking).await;

    // Both writers validated against the same pending snapshot; the cancel
    // lands first and releases the room.
    let cancel = BookingPatch {
        status: Some(BookingStatus::Cancelled),
        remarks: None,
    };
    let confirm = BookingPatch {
        status: Some(BookingStatus::Confirmed),
        remarks: None,
    };
    state
        .booking_repo
        .update(booking_id, &cancel, true)
        .await
        .unwrap();
    let result = state.booking_repo.update(booking_id, &confirm, true).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    let stored = state
        .booking_repo
        .find_by_id(booking_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, BookingStatus::Cancelled);
    assert_eq!(state.hotel_repo.available_rooms(hotel_id).await, Some(10));

    // A repeated cancel is a no-op and must not release the room twice
    state
        .booking_repo
        .update(booking_id, &cancel, true)
        .await
        .unwrap();
    assert_eq!(state.hotel_repo.available_rooms(hotel_id).await, Some(10));
}

#[tokio::test]
async fn test_delete_active_booking_releases_rooms() {
    let state = TestAppState::new();
    let mut hotel = create_test_hotel(StringUuid::new_v4());
    hotel.available_rooms = 4;
    let hotel_id = hotel.id;
    let user = StringUuid::new_v4();
    let booking = create_test_booking(hotel_id, user, BookingStatus::Confirmed, 100.0);
    let booking_id = booking.id;
    state.hotel_repo.add_hotel(hotel).await;
    state.booking_repo.add_booking(booking).await;
    let hotel_repo = state.hotel_repo.clone();
    let app = build_test_router(state);

    let path = format!("/api/bookings/{}", booking_id);
    let token = token_for(user, UserRole::User);
    let (status, body): (StatusCode, Option<MessageResponse>) =
        delete_json(&app, &path, Some(&token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap().code, 200);
    assert_eq!(hotel_repo.available_rooms(hotel_id).await, Some(5));

    let (status, _): (StatusCode, Option<Value>) = get_json(&app, &path, Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
