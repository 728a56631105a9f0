use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use std::sync::Arc;

use crate::db::services as db_services;
use crate::process_lookup::client::connection_test_failure;
use crate::process_lookup::{ApiConnection, ConnectionTestReport, ProcessQuery};
use crate::web::models::ProcessLookupRequest;
use crate::web::{AppError, AppState};

// Mounted at the root, public
pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new().route("/api/consulta-processo", post(consulta_processo_handler))
}

// Mounted at the root, wrapped in the auth middleware
pub fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new().route("/api/test-api-connection", post(test_api_connection_handler))
}

async fn consulta_processo_handler(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<ProcessLookupRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(payload) = payload
        .map_err(|rejection| AppError::InvalidInput(format!("Corpo da requisição inválido: {}", rejection.body_text())))?;

    let query = ProcessQuery::new(payload.numero_processo, payload.cpf)?;

    // Read on every request so admin changes apply immediately.
    let settings = db_services::get_site_settings(&app_state.db_pool).await?;
    let connection = ApiConnection::from_settings(settings.as_ref(), &app_state.encryption_service)?;

    let body = app_state.lookup_client.lookup(&connection, &query).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

async fn test_api_connection_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<ConnectionTestReport>), AppError> {
    let settings = db_services::get_site_settings(&app_state.db_pool).await?;
    let report = match ApiConnection::from_settings(settings.as_ref(), &app_state.encryption_service) {
        Ok(connection) => app_state.lookup_client.test_connection(&connection).await,
        Err(err) => connection_test_failure(err),
    };
    Ok((report.http_status, Json(report)))
}
