//! Account service: registration, login, phone codes and WeChat identity

use crate::cache::{VerificationCode, VerificationCodeStore};
use crate::config::VerificationConfig;
use crate::domain::{
    LoginInput, LoginResponse, NewUser, RegisterInput, RegisteredUser, SendCodeInput,
    SendCodeResponse, User, UserProfile, UserProfilePatch, UserRole, WechatBindInput,
    WechatBindResponse, WechatLoginInput,
};
use crate::error::{AppError, Result};
use crate::jwt::JwtManager;
use crate::policy::Principal;
use crate::repository::UserRepository;
use crate::wechat::WechatIdentityProvider;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use metrics::counter;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub struct AuthService<U: UserRepository> {
    repo: Arc<U>,
    code_store: Arc<dyn VerificationCodeStore>,
    wechat: Arc<dyn WechatIdentityProvider>,
    jwt: JwtManager,
    verification: VerificationConfig,
    /// Echo issued codes back to the caller (never in production)
    expose_codes: bool,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(
        repo: Arc<U>,
        code_store: Arc<dyn VerificationCodeStore>,
        wechat: Arc<dyn WechatIdentityProvider>,
        jwt: JwtManager,
        verification: VerificationConfig,
        expose_codes: bool,
    ) -> Self {
        Self {
            repo,
            code_store,
            wechat,
            jwt,
            verification,
            expose_codes,
        }
    }

    pub async fn send_code(&self, input: SendCodeInput) -> Result<SendCodeResponse> {
        let phone = non_blank(input.phone)
            .ok_or_else(|| AppError::Validation("phone is required".to_string()))?;

        let ttl = Duration::from_secs(self.verification.ttl_secs);
        let code = VerificationCode {
            code: self.verification.fixed_code.clone(),
            expires_at: Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64),
        };
        self.code_store.put(&phone, &code, ttl).await?;
        counter!("hotelhub_verification_codes_sent_total").increment(1);

        Ok(SendCodeResponse {
            expires_in: ttl.as_millis() as u64,
            code: self.expose_codes.then_some(code.code),
        })
    }

    pub async fn register(&self, input: RegisterInput) -> Result<RegisteredUser> {
        let mut missing = Vec::new();
        for (field, value) in [
            ("username", &input.username),
            ("password", &input.password),
            ("role", &input.role),
        ] {
            if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
                missing.push(field);
            }
        }
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }
        input.validate()?;

        let role: UserRole = input
            .role
            .as_deref()
            .unwrap_or_default()
            .trim()
            .parse()
            .map_err(|_| {
                AppError::Validation("role must be one of: admin, merchant, user".to_string())
            })?;
        let username = input.username.unwrap_or_default().trim().to_string();
        let password = input.password.unwrap_or_default();
        let phone = non_blank(input.phone);

        if let Some(phone) = &phone {
            let submitted = non_blank(input.verify_code).ok_or_else(|| {
                AppError::Validation("verifyCode is required when phone is provided".to_string())
            })?;
            match self.code_store.get(phone).await? {
                Some(stored) if stored.code == submitted => {}
                _ => {
                    return Err(AppError::Validation(
                        "Invalid or expired verification code".to_string(),
                    ))
                }
            }
        }

        if self.repo.find_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let user = self
            .repo
            .create(&NewUser {
                username,
                password_hash: hash_password(&password)?,
                role,
                phone: phone.clone(),
                avatar: None,
                nickname: None,
                wechat_openid: None,
            })
            .await?;

        if let Some(phone) = &phone {
            self.code_store.remove(phone).await?;
        }

        counter!("hotelhub_users_registered_total", "role" => role.as_str()).increment(1);
        info!(user_id = %user.id, role = %user.role, "user registered");

        Ok(RegisteredUser {
            id: user.id,
            username: user.username,
            role: user.role,
            phone: user.phone,
        })
    }

    pub async fn login(&self, input: LoginInput) -> Result<LoginResponse> {
        let (Some(username), Some(password)) = (non_blank(input.username), input.password) else {
            return Err(AppError::Validation(
                "username and password are required".to_string(),
            ));
        };

        let user = self
            .repo
            .find_by_username(&username)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&password, &user.password_hash) {
            counter!("hotelhub_login_failures_total").increment(1);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        info!(user_id = %user.id, "user logged in");
        self.issue(&user)
    }

    /// Log in with a WeChat code, creating a `user` account on first sight.
    pub async fn wechat_login(&self, input: WechatLoginInput) -> Result<LoginResponse> {
        let openid = self.exchange(input.code).await?;
        let nickname = non_blank(input.nickname);
        let avatar = non_blank(input.avatar);
        let phone = non_blank(input.phone);

        if let Some(user) = self.repo.find_by_wechat_openid(&openid).await? {
            let patch = UserProfilePatch {
                nickname: nickname.filter(|n| user.nickname.as_ref() != Some(n)),
                avatar: avatar.filter(|a| user.avatar.as_ref() != Some(a)),
                phone: phone.filter(|_| user.phone.as_deref().map_or(true, str::is_empty)),
            };
            let user = if patch.is_empty() {
                user
            } else {
                self.repo.update_profile(user.id, &patch).await?
            };
            info!(user_id = %user.id, "wechat login");
            return self.issue(&user);
        }

        let username = self.unique_wechat_username(&openid).await?;
        let user = self
            .repo
            .create(&NewUser {
                username,
                password_hash: hash_password(&random_password())?,
                role: UserRole::User,
                phone,
                avatar,
                nickname,
                wechat_openid: Some(openid),
            })
            .await?;

        counter!("hotelhub_users_registered_total", "role" => "wechat").increment(1);
        info!(user_id = %user.id, username = %user.username, "user created from wechat login");
        self.issue(&user)
    }

    pub async fn wechat_bind(
        &self,
        principal: &Principal,
        input: WechatBindInput,
    ) -> Result<WechatBindResponse> {
        let openid = self.exchange(input.code).await?;

        if let Some(owner) = self.repo.find_by_wechat_openid(&openid).await? {
            if owner.id != principal.id {
                return Err(AppError::Conflict(
                    "This WeChat account is bound to another user".to_string(),
                ));
            }
            return Ok(WechatBindResponse {
                user_id: owner.id,
                wechat_bound: true,
            });
        }

        let user = self
            .repo
            .find_by_id(principal.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        self.repo.bind_wechat(user.id, &openid).await?;
        info!(user_id = %user.id, "wechat account bound");

        Ok(WechatBindResponse {
            user_id: user.id,
            wechat_bound: true,
        })
    }

    async fn exchange(&self, code: Option<String>) -> Result<String> {
        let code =
            non_blank(code).ok_or_else(|| AppError::Validation("code is required".to_string()))?;
        self.wechat
            .exchange_code(&code)
            .await?
            .openid
            .ok_or_else(|| AppError::Validation("WeChat did not return an openid".to_string()))
    }

    async fn unique_wechat_username(&self, openid: &str) -> Result<String> {
        let tail: String = {
            let chars: Vec<char> = openid.chars().collect();
            chars[chars.len().saturating_sub(10)..].iter().collect()
        };
        let base = format!("wx_{}", tail);

        let mut candidate = base.clone();
        let mut suffix = 1u32;
        while self.repo.find_by_username(&candidate).await?.is_some() {
            candidate = format!("{}{}", base, suffix);
            suffix += 1;
        }
        Ok(candidate)
    }

    fn issue(&self, user: &User) -> Result<LoginResponse> {
        let token = self.jwt.create_token(user.id, &user.username, user.role)?;
        Ok(LoginResponse {
            token: format!("Bearer {}", token),
            user: UserProfile::from(user),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
