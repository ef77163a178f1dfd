//! Hotel registry HTTP tests

use crate::api::{create_test_booking, create_test_hotel, token_for};
use super::{build_test_router, delete_json, get_json, post_json, put_json, TestAppState};
use axum::http::StatusCode;
use hotelhub_core::api::{ApiResponse, MessageResponse};
use hotelhub_core::domain::{BookingStatus, Hotel, HotelStatus, StringUuid, UserRole};
use serde_json::{json, Value};

fn hotel_body() -> Value {
    json!({
        "name": "Harbour View",
        "location": "88 Bund Road",
        "city": "Shanghai",
        "pricePerNight": 320.0,
        "totalRooms": 20,
        "availableRooms": 20,
        "amenities": ["wifi", "pool"]
    })
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_hotels_is_public() {
    let state = TestAppState::new();
    state
        .hotel_repo
        .add_hotel(create_test_hotel(StringUuid::new_v4()))
        .await;
    let app = build_test_router(state);

    let (status, body): (StatusCode, Option<ApiResponse<Vec<Hotel>>>) =
        get_json(&app, "/api/hotels", None).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body.code, 200);
    assert_eq!(body.data.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_hotels_filters_by_status_city_and_keyword() {
    let state = TestAppState::new();
    let merchant = StringUuid::new_v4();

    let mut pending = create_test_hotel(merchant);
    pending.status = HotelStatus::Pending;
    state.hotel_repo.add_hotel(pending).await;

    let mut beijing = create_test_hotel(merchant);
    beijing.name = "Forbidden City Lodge".to_string();
    beijing.city = "Beijing".to_string();
    state.hotel_repo.add_hotel(beijing).await;

    state.hotel_repo.add_hotel(create_test_hotel(merchant)).await;
    let app = build_test_router(state);

    let (_, body): (StatusCode, Option<ApiResponse<Vec<Hotel>>>) =
        get_json(&app, "/api/hotels?status=approved", None).await;
    assert_eq!(body.unwrap().data.unwrap().len(), 2);

    let (_, body): (StatusCode, Option<ApiResponse<Vec<Hotel>>>) =
        get_json(&app, "/api/hotels?status=approved&city=Beijing", None).await;
    let hotels = body.unwrap().data.unwrap();
    assert_eq!(hotels.len(), 1);
    assert_eq!(hotels[0].city, "Beijing");

    let (_, body): (StatusCode, Option<ApiResponse<Vec<Hotel>>>) =
        get_json(&app, "/api/hotels?keyword=lodge", None).await;
    assert_eq!(body.unwrap().data.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_hotels_legacy_merchant_alias() {
    let state = TestAppState::new();
    let mine = StringUuid::new_v4();
    state.hotel_repo.add_hotel(create_test_hotel(mine)).await;
    state
        .hotel_repo
        .add_hotel(create_test_hotel(StringUuid::new_v4()))
        .await;
    let app = build_test_router(state);

    let path = format!("/api/hotels?role=merchant&userId={}", mine);
    let (status, body): (StatusCode, Option<ApiResponse<Vec<Hotel>>>) =
        get_json(&app, &path, None).await;

    assert_eq!(status, StatusCode::OK);
    let hotels = body.unwrap().data.unwrap();
    assert_eq!(hotels.len(), 1);
    assert_eq!(hotels[0].merchant_id, mine);
}

#[tokio::test]
async fn test_list_hotels_unknown_status_is_400() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (StatusCode, Option<Value>) =
        get_json(&app, "/api/hotels?status=closed", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap()["code"], 400);
}

#[tokio::test]
async fn test_get_hotel_not_found_is_404_envelope() {
    let app = build_test_router(TestAppState::new());

    let path = format!("/api/hotels/{}", StringUuid::new_v4());
    let (status, body): (StatusCode, Option<Value>) = get_json(&app, &path, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let body = body.unwrap();
    assert_eq!(body["code"], 404);
    assert!(body.get("data").is_none());
}

// ============================================================================
// Create / Update
// ============================================================================

#[tokio::test]
async fn test_merchant_creates_pending_hotel() {
    let state = TestAppState::new();
    let merchant = StringUuid::new_v4();
    let token = token_for(merchant, UserRole::Merchant);
    let app = build_test_router(state);

    let (status, body): (StatusCode, Option<ApiResponse<Hotel>>) =
        post_json(&app, "/api/hotels", Some(&token), &hotel_body()).await;

    assert_eq!(status, StatusCode::OK);
    let hotel = body.unwrap().data.unwrap();
    assert_eq!(hotel.status, HotelStatus::Pending);
    assert_eq!(hotel.merchant_id, merchant);
    assert_eq!(hotel.amenities, vec!["wifi", "pool"]);
}

#[tokio::test]
async fn test_user_cannot_create_hotel() {
    let app = build_test_router(TestAppState::new());
    let token = token_for(StringUuid::new_v4(), UserRole::User);

    let (status, body): (StatusCode, Option<Value>) =
        post_json(&app, "/api/hotels", Some(&token), &hotel_body()).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body.unwrap()["code"], 403);
}

#[tokio::test]
async fn test_create_hotel_without_token_is_401_envelope() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (StatusCode, Option<Value>) =
        post_json(&app, "/api/hotels", None, &hotel_body()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body = body.unwrap();
    assert_eq!(body["code"], 401);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_create_hotel_missing_fields_is_400() {
    let app = build_test_router(TestAppState::new());
    let token = token_for(StringUuid::new_v4(), UserRole::Merchant);

    let (status, body): (StatusCode, Option<Value>) = post_json(
        &app,
        "/api/hotels",
        Some(&token),
        &json!({ "name": "No Address" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body.unwrap()["message"].as_str().unwrap().to_string();
    assert!(message.contains("Missing required fields"));
    assert!(message.contains("location"));
}

#[tokio::test]
async fn test_merchant_status_change_is_ignored() {
    let state = TestAppState::new();
    let merchant = StringUuid::new_v4();
    let mut hotel = create_test_hotel(merchant);
    hotel.status = HotelStatus::Pending;
    let id = hotel.id;
    state.hotel_repo.add_hotel(hotel).await;
    let app = build_test_router(state);

    let token = token_for(merchant, UserRole::Merchant);
    let (status, body): (StatusCode, Option<ApiResponse<Hotel>>) = put_json(
        &app,
        &format!("/api/hotels/{}", id),
        Some(&token),
        &json!({ "status": "approved", "name": "Renamed Inn" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let hotel = body.unwrap().data.unwrap();
    assert_eq!(hotel.name, "Renamed Inn");
    assert_eq!(hotel.status, HotelStatus::Pending);
}

#[tokio::test]
async fn test_admin_approves_hotel() {
    let state = TestAppState::new();
    let mut hotel = create_test_hotel(StringUuid::new_v4());
    hotel.status = HotelStatus::Pending;
    let id = hotel.id;
    state.hotel_repo.add_hotel(hotel).await;
    let app = build_test_router(state);

    let token = token_for(StringUuid::new_v4(), UserRole::Admin);
    let (status, body): (StatusCode, Option<ApiResponse<Hotel>>) = put_json(
        &app,
        &format!("/api/hotels/{}", id),
        Some(&token),
        &json!({ "status": "approved" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap().data.unwrap().status, HotelStatus::Approved);
}

#[tokio::test]
async fn test_merchant_cannot_update_foreign_hotel() {
    let state = TestAppState::new();
    let hotel = create_test_hotel(StringUuid::new_v4());
    let id = hotel.id;
    state.hotel_repo.add_hotel(hotel).await;
    let app = build_test_router(state);

    let token = token_for(StringUuid::new_v4(), UserRole::Merchant);
    let (status, _): (StatusCode, Option<Value>) = put_json(
        &app,
        &format!("/api/hotels/{}", id),
        Some(&token),
        &json!({ "name": "Hijacked" }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_hotel_with_active_booking_is_409() {
    let state = TestAppState::new();
    let merchant = StringUuid::new_v4();
    let hotel = create_test_hotel(merchant);
    let id = hotel.id;
    state.hotel_repo.add_hotel(hotel).await;
    state
        .booking_repo
        .add_booking(create_test_booking(
            id,
            StringUuid::new_v4(),
            BookingStatus::Confirmed,
            200.0,
        ))
        .await;
    let app = build_test_router(state);

    let token = token_for(merchant, UserRole::Merchant);
    let (status, body): (StatusCode, Option<Value>) =
        delete_json(&app, &format!("/api/hotels/{}", id), Some(&token)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body.unwrap()["code"], 409);
}

#[tokio::test]
async fn test_delete_hotel_with_only_finished_bookings() {
    let state = TestAppState::new();
    let merchant = StringUuid::new_v4();
    let hotel = create_test_hotel(merchant);
    let id = hotel.id;
    state.hotel_repo.add_hotel(hotel).await;
    state
        .booking_repo
        .add_booking(create_test_booking(
            id,
            StringUuid::new_v4(),
            BookingStatus::Cancelled,
            200.0,
        ))
        .await;
    let app = build_test_router(state);

    let token = token_for(merchant, UserRole::Merchant);
    let (status, body): (StatusCode, Option<MessageResponse>) =
        delete_json(&app, &format!("/api/hotels/{}", id), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap().code, 200);

    let (status, _): (StatusCode, Option<Value>) =
        get_json(&app, &format!("/api/hotels/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
