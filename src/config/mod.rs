//! Configuration management for HotelHub Core

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment ("development", "production", ...)
    pub environment: String,
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Redis configuration
    pub redis: RedisConfig,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Phone verification code configuration
    pub verification: VerificationConfig,
    /// WeChat mini-program credentials
    pub wechat: WechatConfig,
    /// Booking behaviour switches
    pub booking: BookingConfig,
    /// Logging and metrics configuration
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    /// When disabled, verification codes are kept in process memory
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub token_ttl_secs: i64,
}

#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Code issued to every phone until an SMS gateway is wired in
    pub fixed_code: String,
    pub ttl_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            fixed_code: "123456".to_string(),
            ttl_secs: 300,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WechatConfig {
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
    pub api_base_url: String,
}

impl Default for WechatConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            app_secret: None,
            api_base_url: "https://api.weixin.qq.com".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Reserve `availableRooms` atomically when a booking is created
    pub enforce_inventory: bool,
    /// Accept unauthenticated bookings (stored without a user)
    pub allow_guest_bookings: bool,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            enforce_inventory: true,
            allow_guest_bookings: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "json" or "text"
    pub log_format: String,
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            environment: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
                run_migrations: parse_bool("DATABASE_RUN_MIGRATIONS", true),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
                enabled: parse_bool("REDIS_ENABLED", true),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").context("JWT_SECRET is required")?,
                issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "hotelhub".to_string()),
                token_ttl_secs: env::var("JWT_TOKEN_TTL_SECS")
                    .unwrap_or_else(|_| "604800".to_string())
                    .parse()
                    .context("Invalid JWT_TOKEN_TTL_SECS")?,
            },
            verification: VerificationConfig {
                fixed_code: env::var("VERIFY_CODE_FIXED").unwrap_or_else(|_| "123456".to_string()),
                ttl_secs: env::var("VERIFY_CODE_TTL_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .context("Invalid VERIFY_CODE_TTL_SECS")?,
            },
            wechat: WechatConfig {
                app_id: env::var("WECHAT_APPID").ok().filter(|v| !v.is_empty()),
                app_secret: env::var("WECHAT_SECRET").ok().filter(|v| !v.is_empty()),
                api_base_url: env::var("WECHAT_API_BASE_URL")
                    .unwrap_or_else(|_| "https://api.weixin.qq.com".to_string()),
            },
            booking: BookingConfig {
                enforce_inventory: parse_bool("BOOKING_ENFORCE_INVENTORY", true),
                allow_guest_bookings: parse_bool("ALLOW_GUEST_BOOKINGS", false),
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
                metrics_enabled: parse_bool("METRICS_ENABLED", true),
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn parse_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}
