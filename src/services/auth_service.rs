use axum::Extension;
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::DatabaseConnection;
use tracing::info;

use crate::db::entities::user;
use crate::db::services as db_services;
use crate::web::error::AppError;
use crate::web::models::{AuthenticatedUser, Claims, LoginRequest, LoginResponse, UserResponse};

#[cfg(not(test))]
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const BCRYPT_COST: u32 = 4;

const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, BCRYPT_COST).map_err(|e| AppError::PasswordHashingError(e.to_string()))
}

pub async fn login_user(
    db: &DatabaseConnection,
    req: LoginRequest,
    jwt_secret: &str,
) -> Result<LoginResponse, AppError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidInput("Usuário e senha são obrigatórios.".to_string()));
    }

    let user = db_services::get_user_by_username(db, &req.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid_password = verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;
    if !valid_password {
        return Err(AppError::InvalidCredentials);
    }

    create_jwt_for_user(&user, jwt_secret)
}

pub fn create_jwt_for_user(user: &user::Model, jwt_secret: &str) -> Result<LoginResponse, AppError> {
    let expiration = (Utc::now() + Duration::hours(24)).timestamp() as usize;

    let claims = Claims {
        sub: user.username.clone(),
        user_id: user.id,
        role: user.role.clone(),
        exp: expiration,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt_secret.as_ref()))
        .map_err(|e| AppError::TokenCreationError(e.to_string()))?;

    Ok(LoginResponse {
        token,
        user_id: user.id,
        username: user.username.clone(),
    })
}

/// Creates the first admin when the users table is empty and credentials are configured.
/// Returns the created user, or `None` when nothing had to be done.
pub async fn bootstrap_admin(
    db: &DatabaseConnection,
    username: Option<&str>,
    password: Option<&str>,
) -> Result<Option<user::Model>, AppError> {
    let (Some(username), Some(password)) = (username, password) else {
        return Ok(None);
    };
    if db_services::count_users(db).await? > 0 {
        return Ok(None);
    }
    if username.trim().is_empty() || password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "Admin bootstrap requires a username and a password of at least {MIN_PASSWORD_LEN} characters."
        )));
    }

    let password_hash = hash_password(password)?;
    let admin = db_services::create_user(db, username.trim(), &password_hash, db_services::ADMIN_ROLE).await?;
    info!(username = %admin.username, "Bootstrapped initial admin user.");
    Ok(Some(admin))
}

pub async fn me(Extension(user): Extension<AuthenticatedUser>) -> Result<axum::Json<UserResponse>, AppError> {
    Ok(axum::Json(UserResponse {
        id: user.id,
        username: user.username,
        role: user.role,
    }))
}
