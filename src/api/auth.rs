//! Account endpoints: phone codes, registration, login and WeChat

use crate::api::ApiResponse;
use crate::domain::{
    LoginInput, LoginResponse, RegisterInput, RegisteredUser, SendCodeInput, SendCodeResponse,
    WechatBindInput, WechatBindResponse, WechatLoginInput,
};
use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::state::HasServices;
use axum::{extract::State, response::IntoResponse, Json};

#[utoipa::path(
    post,
    path = "/api/auth/send-code",
    tag = "Auth",
    request_body = SendCodeInput,
    responses(
        (status = 200, description = "Code issued", body = SendCodeResponse),
        (status = 400, description = "Missing phone")
    ),
    security(())
)]
pub async fn send_code<S: HasServices>(
    State(state): State<S>,
    Json(input): Json<SendCodeInput>,
) -> Result<impl IntoResponse> {
    let response = state.auth_service().send_code(input).await?;
    Ok(ApiResponse::with_message("Verification code sent", response))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterInput,
    responses(
        (status = 200, description = "Account created", body = RegisteredUser),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Username already exists")
    ),
    security(())
)]
pub async fn register<S: HasServices>(
    State(state): State<S>,
    Json(input): Json<RegisterInput>,
) -> Result<impl IntoResponse> {
    let user = state.auth_service().register(input).await?;
    Ok(ApiResponse::with_message("Registration successful", user))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginInput,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid username or password")
    ),
    security(())
)]
pub async fn login<S: HasServices>(
    State(state): State<S>,
    Json(input): Json<LoginInput>,
) -> Result<impl IntoResponse> {
    let response = state.auth_service().login(input).await?;
    Ok(ApiResponse::with_message("Login successful", response))
}

#[utoipa::path(
    post,
    path = "/api/auth/wechat-login",
    tag = "Auth",
    request_body = WechatLoginInput,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing code")
    ),
    security(())
)]
pub async fn wechat_login<S: HasServices>(
    State(state): State<S>,
    Json(input): Json<WechatLoginInput>,
) -> Result<impl IntoResponse> {
    let response = state.auth_service().wechat_login(input).await?;
    Ok(ApiResponse::with_message("Login successful", response))
}

#[utoipa::path(
    post,
    path = "/api/auth/wechat-bind",
    tag = "Auth",
    request_body = WechatBindInput,
    responses(
        (status = 200, description = "WeChat account bound", body = WechatBindResponse),
        (status = 409, description = "Bound to another user")
    )
)]
pub async fn wechat_bind<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Json(input): Json<WechatBindInput>,
) -> Result<impl IntoResponse> {
    let response = state
        .auth_service()
        .wechat_bind(&auth.principal(), input)
        .await?;
    Ok(ApiResponse::with_message("WeChat account bound", response))
}
