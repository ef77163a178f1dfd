//! Server initialization and routing

use crate::api;
use crate::cache::{CacheManager, InMemoryCodeStore, VerificationCodeStore};
use crate::config::Config;
use crate::jwt::JwtManager;
use crate::middleware::{normalize_error_response, ObservabilityLayer};
use crate::migration;
use crate::openapi::ApiDoc;
use crate::repository::{
    booking::BookingRepositoryImpl, hotel::HotelRepositoryImpl, user::UserRepositoryImpl,
};
use crate::service::{AuthService, BookingService, HotelService, StatisticsService};
use crate::state::HasServices;
use crate::wechat::WechatClient;
use anyhow::Result;
use axum::{routing::get, routing::post, Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db_pool: MySqlPool,
    pub jwt_manager: JwtManager,
    pub code_store: Arc<dyn VerificationCodeStore>,
    pub auth_service: Arc<AuthService<UserRepositoryImpl>>,
    pub hotel_service: Arc<HotelService<HotelRepositoryImpl>>,
    pub booking_service: Arc<BookingService<BookingRepositoryImpl, HotelRepositoryImpl>>,
    pub statistics_service: Arc<StatisticsService<HotelRepositoryImpl, BookingRepositoryImpl>>,
    pub prometheus_handle: Option<PrometheusHandle>,
}

impl HasServices for AppState {
    type UserRepo = UserRepositoryImpl;
    type HotelRepo = HotelRepositoryImpl;
    type BookingRepo = BookingRepositoryImpl;

    fn config(&self) -> &Config {
        &self.config
    }

    fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }

    fn auth_service(&self) -> &AuthService<Self::UserRepo> {
        &self.auth_service
    }

    fn hotel_service(&self) -> &HotelService<Self::HotelRepo> {
        &self.hotel_service
    }

    fn booking_service(&self) -> &BookingService<Self::BookingRepo, Self::HotelRepo> {
        &self.booking_service
    }

    fn statistics_service(&self) -> &StatisticsService<Self::HotelRepo, Self::BookingRepo> {
        &self.statistics_service
    }

    fn prometheus_handle(&self) -> Option<&PrometheusHandle> {
        self.prometheus_handle.as_ref()
    }

    async fn check_ready(&self) -> (bool, bool) {
        let db_ok = sqlx::query("SELECT 1").execute(&self.db_pool).await.is_ok();
        let cache_ok = self.code_store.ping().await.is_ok();
        (db_ok, cache_ok)
    }
}

/// Connect dependencies, wire services and serve HTTP until shutdown.
pub async fn run(config: Config, prometheus_handle: Option<PrometheusHandle>) -> Result<()> {
    if config.database.run_migrations {
        migration::prepare_database(&config.database).await?;
    }

    let db_pool = MySqlPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;
    info!("Connected to database");

    if config.database.run_migrations {
        migration::run_migrations(&db_pool).await?;
    }

    let code_store: Arc<dyn VerificationCodeStore> = if config.redis.enabled {
        let cache = CacheManager::new(&config.redis).await?;
        info!("Connected to Redis");
        Arc::new(cache)
    } else {
        warn!("Redis disabled, verification codes are kept in process memory");
        Arc::new(InMemoryCodeStore::new())
    };

    let user_repo = Arc::new(UserRepositoryImpl::new(db_pool.clone()));
    let hotel_repo = Arc::new(HotelRepositoryImpl::new(db_pool.clone()));
    let booking_repo = Arc::new(BookingRepositoryImpl::new(db_pool.clone()));

    let jwt_manager = JwtManager::new(config.jwt.clone());
    let wechat = Arc::new(WechatClient::new(config.wechat.clone()));

    let auth_service = Arc::new(AuthService::new(
        user_repo,
        code_store.clone(),
        wechat,
        jwt_manager.clone(),
        config.verification.clone(),
        !config.is_production(),
    ));
    let hotel_service = Arc::new(HotelService::new(hotel_repo.clone()));
    let booking_service = Arc::new(BookingService::new(
        booking_repo.clone(),
        hotel_repo.clone(),
        config.booking.clone(),
    ));
    let statistics_service = Arc::new(StatisticsService::new(hotel_repo, booking_repo));

    let http_addr = config.http_addr();
    let state = AppState {
        config: Arc::new(config),
        db_pool,
        jwt_manager,
        code_store,
        auth_service,
        hotel_service,
        booking_service,
        statistics_service,
        prometheus_handle,
    };

    let app = build_router(state);
    let listener = TcpListener::bind(&http_addr).await?;
    info!("HTTP server started on {}", http_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::build())
}

/// Build the HTTP router.
///
/// Generic over the state so tests can drive the same routes against
/// in-memory repositories.
pub fn build_router<S: HasServices>(state: S) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        .route("/metrics", get(api::metrics::metrics_handler::<S>))
        // Accounts
        .route("/api/auth/send-code", post(api::auth::send_code::<S>))
        .route("/api/auth/register", post(api::auth::register::<S>))
        .route("/api/auth/login", post(api::auth::login::<S>))
        .route("/api/auth/wechat-login", post(api::auth::wechat_login::<S>))
        .route("/api/auth/wechat-bind", post(api::auth::wechat_bind::<S>))
        // Hotels
        .route(
            "/api/hotels",
            get(api::hotel::list::<S>).post(api::hotel::create::<S>),
        )
        .route(
            "/api/hotels/{id}",
            get(api::hotel::get::<S>)
                .put(api::hotel::update::<S>)
                .delete(api::hotel::delete::<S>),
        )
        // Bookings
        .route(
            "/api/bookings",
            get(api::booking::list::<S>).post(api::booking::create::<S>),
        )
        .route(
            "/api/bookings/{id}",
            get(api::booking::get::<S>)
                .put(api::booking::update::<S>)
                .delete(api::booking::delete::<S>),
        )
        // Statistics
        .route(
            "/api/statistics/revenue",
            get(api::statistics::revenue::<S>),
        );

    if !state.config().is_production() {
        router = router.route("/api-docs/openapi.json", get(openapi_json));
    }

    router
        .layer(axum::middleware::from_fn(normalize_error_response))
        .layer(ObservabilityLayer)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
