use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::get,
};
use std::sync::Arc;
use tracing::info;

use crate::db::services::{self as db_services, SiteSettingsUpdate, SiteSettingsView};
use crate::web::models::AuthenticatedUser;
use crate::web::{AppError, AppState};

// Mounted under /api/settings, admin only
pub fn create_settings_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_settings_handler).put(update_settings_handler))
}

async fn get_settings_handler(State(app_state): State<Arc<AppState>>) -> Result<Json<SiteSettingsView>, AppError> {
    let view = db_services::get_site_settings(&app_state.db_pool)
        .await?
        .map(SiteSettingsView::from)
        .unwrap_or_default();
    Ok(Json(view))
}

async fn update_settings_handler(
    Extension(authenticated_user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<SiteSettingsUpdate>, JsonRejection>,
) -> Result<Json<SiteSettingsView>, AppError> {
    let Json(update) = payload
        .map_err(|rejection| AppError::InvalidInput(format!("Corpo da requisição inválido: {}", rejection.body_text())))?;

    let api_fields_changed = update.api_url.is_some() || update.api_token.is_some() || update.api_port.is_some();
    let saved = db_services::upsert_site_settings(&app_state.db_pool, &app_state.encryption_service, update).await?;

    info!(
        username = %authenticated_user.username,
        api_fields_changed,
        "Site settings updated."
    );
    Ok(Json(SiteSettingsView::from(saved)))
}
