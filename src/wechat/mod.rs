//! WeChat mini-program login (`jscode2session`)

use crate::config::WechatConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Identity returned by a successful code exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WechatIdentity {
    /// Absent when WeChat accepted the code but returned no subject
    pub openid: Option<String>,
    pub unionid: Option<String>,
}

/// Exchanges a login code for an opaque WeChat subject.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WechatIdentityProvider: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<WechatIdentity>;
}

#[derive(Debug, Deserialize)]
struct Code2SessionResponse {
    openid: Option<String>,
    unionid: Option<String>,
    errcode: Option<i64>,
    errmsg: Option<String>,
}

/// HTTP client for the WeChat API
#[derive(Clone)]
pub struct WechatClient {
    config: WechatConfig,
    http_client: reqwest::Client,
}

impl WechatClient {
    pub fn new(config: WechatConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            config,
            http_client,
        }
    }
}

#[async_trait]
impl WechatIdentityProvider for WechatClient {
    async fn exchange_code(&self, code: &str) -> Result<WechatIdentity> {
        let (Some(app_id), Some(app_secret)) = (&self.config.app_id, &self.config.app_secret)
        else {
            return Err(AppError::IdentityProvider(
                "WECHAT_APPID or WECHAT_SECRET is not configured".to_string(),
            ));
        };

        let url = format!(
            "{}/sns/jscode2session",
            self.config.api_base_url.trim_end_matches('/')
        );

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("appid", app_id.as_str()),
                ("secret", app_secret.as_str()),
                ("js_code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("code2session request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::IdentityProvider(format!(
                "code2session returned HTTP {}",
                response.status()
            )));
        }

        // WeChat answers with text/plain, so decode the body by hand
        let body = response
            .text()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("code2session read failed: {}", e)))?;
        let data: Code2SessionResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::IdentityProvider(format!("code2session bad payload: {}", e)))?;

        if let Some(errcode) = data.errcode.filter(|c| *c != 0) {
            return Err(AppError::IdentityProvider(format!(
                "code2session failed: {}",
                data.errmsg.unwrap_or_else(|| errcode.to_string())
            )));
        }

        Ok(WechatIdentity {
            openid: data.openid.filter(|o| !o.is_empty()),
            unionid: data.unionid,
        })
    }
}
