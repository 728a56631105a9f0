use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::process_lookup::ProcessLookupClient;
use crate::server::config::ServerConfig;
use crate::services::auth_service;
use crate::services::encryption_service::EncryptionService;
use crate::web::{
    middleware::auth::{self, AUTH_COOKIE},
    models::{LoginRequest, LoginResponse},
    routes::*,
};

pub use error::AppError;

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub config: Arc<ServerConfig>,
    pub encryption_service: Arc<EncryptionService>,
    pub lookup_client: Arc<ProcessLookupClient>,
}

async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let login_response = auth_service::login_user(&app_state.db_pool, payload, &app_state.config.jwt_secret).await?;

    let auth_cookie = Cookie::build((AUTH_COOKIE, login_response.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();

    Ok((jar.add(auth_cookie), Json(login_response)))
}

async fn logout_handler(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(AUTH_COOKIE).path("/"))
}

async fn health_check_handler() -> &'static str {
    "OK"
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let methods = vec![Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS];

    if let Some(frontend_url) = config.frontend_url.as_deref() {
        match frontend_url.parse::<HeaderValue>() {
            Ok(origin) => {
                return CorsLayer::new()
                    .allow_origin(origin)
                    .allow_methods(methods)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
                    .allow_credentials(true);
            }
            Err(e) => warn!(frontend_url, error = %e, "Invalid FRONTEND_URL, falling back to permissive CORS."),
        }
    }

    CorsLayer::new().allow_origin(Any).allow_methods(methods).allow_headers(Any)
}

pub fn create_axum_router(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&app_state.config);
    let require_admin = || axum_middleware::from_fn_with_state(app_state.clone(), auth::auth);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/me", get(auth_service::me).route_layer(require_admin()))
        .merge(process_routes::create_public_router())
        .merge(process_routes::create_protected_router().route_layer(require_admin()))
        .nest(
            "/api/settings",
            settings_routes::create_settings_router().route_layer(require_admin()),
        )
        .with_state(app_state.clone())
        .layer(cors)
}
