//! Account HTTP tests: phone codes, registration, login and WeChat

use crate::api::token_for;
use super::{build_test_router, get_json, post_json, TestAppState};
use axum::http::StatusCode;
use hotelhub_core::api::ApiResponse;
use hotelhub_core::domain::{
    LoginResponse, RegisteredUser, SendCodeResponse, StringUuid, UserRole, WechatBindResponse,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_code2session(server: &MockServer, code: &str, openid: &str) {
    Mock::given(method("GET"))
        .and(path("/sns/jscode2session"))
        .and(query_param("js_code", code))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            json!({ "openid": openid, "session_key": "sk" }).to_string(),
        ))
        .mount(server)
        .await;
}

async fn register(app: &axum::Router, username: &str, role: &str) -> StatusCode {
    let (status, _): (StatusCode, Option<Value>) = post_json(
        app,
        "/api/auth/register",
        None,
        &json!({ "username": username, "password": "secret-pass", "role": role }),
    )
    .await;
    status
}

// ============================================================================
// Register / Login
// ============================================================================

#[tokio::test]
async fn test_register_then_login() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (StatusCode, Option<ApiResponse<RegisteredUser>>) = post_json(
        &app,
        "/api/auth/register",
        None,
        &json!({ "username": "zhangsan", "password": "secret-pass", "role": "merchant" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let user = body.unwrap().data.unwrap();
    assert_eq!(user.username, "zhangsan");
    assert_eq!(user.role, UserRole::Merchant);

    let (status, body): (StatusCode, Option<ApiResponse<LoginResponse>>) = post_json(
        &app,
        "/api/auth/login",
        None,
        &json!({ "username": "zhangsan", "password": "secret-pass" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let login = body.unwrap().data.unwrap();
    assert!(login.token.starts_with("Bearer "));
    assert_eq!(login.user.id, user.id);
    assert_eq!(login.user.nickname, "zhangsan");
    assert!(!login.user.wechat_bound);

    // The issued token authenticates protected routes as-is
    let (status, _): (StatusCode, Option<Value>) = get_json(
        &app,
        "/api/statistics/revenue",
        Some(login.token.trim_start_matches("Bearer ")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_duplicate_username_is_409() {
    let app = build_test_router(TestAppState::new());

    assert_eq!(register(&app, "lisi", "user").await, StatusCode::OK);
    assert_eq!(register(&app, "lisi", "user").await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_lists_missing_fields() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (StatusCode, Option<Value>) = post_json(
        &app,
        "/api/auth/register",
        None,
        &json!({ "username": "wangwu" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body.unwrap()["message"],
        "Missing required fields: password, role"
    );
}

#[tokio::test]
async fn test_register_unknown_role_is_400() {
    let app = build_test_router(TestAppState::new());
    assert_eq!(
        register(&app, "zhaoliu", "superuser").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_login_with_wrong_password_is_401() {
    let state = TestAppState::new();
    let app = build_test_router(state);
    assert_eq!(register(&app, "sunqi", "user").await, StatusCode::OK);

    let (status, body): (StatusCode, Option<Value>) = post_json(
        &app,
        "/api/auth/login",
        None,
        &json!({ "username": "sunqi", "password": "wrong-pass" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let wrong_password = body.unwrap()["message"].clone();

    let (status, body): (StatusCode, Option<Value>) = post_json(
        &app,
        "/api/auth/login",
        None,
        &json!({ "username": "nobody", "password": "wrong-pass" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body.unwrap()["message"], wrong_password);
}

// ============================================================================
// Phone Verification
// ============================================================================

#[tokio::test]
async fn test_register_with_phone_requires_sent_code() {
    let state = TestAppState::new();
    let user_repo = state.user_repo.clone();
    let app = build_test_router(state);

    let body = json!({
        "username": "zhouba",
        "password": "secret-pass",
        "role": "user",
        "phone": "13700000000",
        "verifyCode": "123456"
    });

    let (status, _): (StatusCode, Option<Value>) =
        post_json(&app, "/api/auth/register", None, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, sent): (StatusCode, Option<ApiResponse<SendCodeResponse>>) = post_json(
        &app,
        "/api/auth/send-code",
        None,
        &json!({ "phone": "13700000000" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let sent = sent.unwrap().data.unwrap();
    assert_eq!(sent.expires_in, 300_000);
    assert_eq!(sent.code.as_deref(), Some("123456"));

    let (status, _): (StatusCode, Option<Value>) =
        post_json(&app, "/api/auth/register", None, &body).await;
    assert_eq!(status, StatusCode::OK);
    let stored = user_repo.find("zhouba").await.unwrap();
    assert_eq!(stored.phone.as_deref(), Some("13700000000"));
    assert_ne!(stored.password_hash, "secret-pass");

    // Codes are single use
    let mut again = body.clone();
    again["username"] = json!("zhouba2");
    let (status, _): (StatusCode, Option<Value>) =
        post_json(&app, "/api/auth/register", None, &again).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_send_code_without_phone_is_400() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (StatusCode, Option<Value>) =
        post_json(&app, "/api/auth/send-code", None, &json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap()["code"], 400);
}

// ============================================================================
// WeChat
// ============================================================================

#[tokio::test]
async fn test_wechat_login_creates_then_reuses_account() {
    let server = MockServer::start().await;
    mock_code2session(&server, "wx-code", "o6_bmjrPTlm6_2sgVt7hMZOPfL2M").await;
    let state = TestAppState::with_wechat(&server.uri());
    let app = build_test_router(state);

    let body = json!({ "code": "wx-code", "nickname": "Little Fox" });
    let (status, first): (StatusCode, Option<ApiResponse<LoginResponse>>) =
        post_json(&app, "/api/auth/wechat-login", None, &body).await;
    assert_eq!(status, StatusCode::OK);
    let first = first.unwrap().data.unwrap();
    assert_eq!(first.user.username, "wx_7hMZOPfL2M");
    assert_eq!(first.user.role, UserRole::User);
    assert_eq!(first.user.nickname, "Little Fox");
    assert!(first.user.wechat_bound);

    let body = json!({ "code": "wx-code", "nickname": "Big Fox" });
    let (status, second): (StatusCode, Option<ApiResponse<LoginResponse>>) =
        post_json(&app, "/api/auth/wechat-login", None, &body).await;
    assert_eq!(status, StatusCode::OK);
    let second = second.unwrap().data.unwrap();
    assert_eq!(second.user.id, first.user.id);
    assert_eq!(second.user.nickname, "Big Fox");
}

#[tokio::test]
async fn test_wechat_login_without_code_is_400() {
    let server = MockServer::start().await;
    let app = build_test_router(TestAppState::with_wechat(&server.uri()));

    let (status, _): (StatusCode, Option<Value>) =
        post_json(&app, "/api/auth/wechat-login", None, &json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wechat_login_upstream_error_is_500_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sns/jscode2session"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            json!({ "errcode": 40029, "errmsg": "invalid code" }).to_string(),
        ))
        .mount(&server)
        .await;
    let app = build_test_router(TestAppState::with_wechat(&server.uri()));

    let (status, body): (StatusCode, Option<Value>) = post_json(
        &app,
        "/api/auth/wechat-login",
        None,
        &json!({ "code": "expired" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = body.unwrap();
    assert_eq!(body["code"], 500);
    assert_eq!(body["message"], "Third-party login failed");
}

#[tokio::test]
async fn test_wechat_bind_conflict_and_success() {
    let server = MockServer::start().await;
    mock_code2session(&server, "taken-code", "openid-taken").await;
    mock_code2session(&server, "fresh-code", "openid-fresh").await;
    let state = TestAppState::with_wechat(&server.uri());
    let user_repo = state.user_repo.clone();
    let app = build_test_router(state);

    // First account owns openid-taken via WeChat login
    let (status, _): (StatusCode, Option<Value>) = post_json(
        &app,
        "/api/auth/wechat-login",
        None,
        &json!({ "code": "taken-code" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(register(&app, "qianjiu", "user").await, StatusCode::OK);
    let me = user_repo.find("qianjiu").await.unwrap();
    let token = token_for(me.id, UserRole::User);

    let (status, _): (StatusCode, Option<Value>) = post_json(
        &app,
        "/api/auth/wechat-bind",
        Some(&token),
        &json!({ "code": "taken-code" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body): (StatusCode, Option<ApiResponse<WechatBindResponse>>) = post_json(
        &app,
        "/api/auth/wechat-bind",
        Some(&token),
        &json!({ "code": "fresh-code" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let bound = body.unwrap().data.unwrap();
    assert_eq!(bound.user_id, me.id);
    assert!(bound.wechat_bound);
    assert_eq!(
        user_repo.find("qianjiu").await.unwrap().wechat_openid.as_deref(),
        Some("openid-fresh")
    );
}

#[tokio::test]
async fn test_wechat_bind_for_unknown_user_is_404() {
    let server = MockServer::start().await;
    mock_code2session(&server, "fresh-code", "openid-fresh").await;
    let app = build_test_router(TestAppState::with_wechat(&server.uri()));

    let token = token_for(StringUuid::new_v4(), UserRole::User);
    let (status, _): (StatusCode, Option<Value>) = post_json(
        &app,
        "/api/auth/wechat-bind",
        Some(&token),
        &json!({ "code": "fresh-code" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wechat_bind_requires_token() {
    let app = build_test_router(TestAppState::new());

    let (status, _): (StatusCode, Option<Value>) = post_json(
        &app,
        "/api/auth/wechat-bind",
        None,
        &json!({ "code": "any" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
