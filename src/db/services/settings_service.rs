use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, Set};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::entities::site_settings::{self, SITE_SETTINGS_ID};
use crate::services::encryption_service::{EncryptionError, EncryptionService};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Encryption error: {0}")]
    Encryption(#[from] EncryptionError),
    #[error("Invalid port: {0}")]
    InvalidPort(i32),
}

/// Partial update of the site settings row.
///
/// `None` leaves a field untouched, an empty string clears it. For ports, `0` clears.
/// Secrets (`apiToken`, `smtpPassword`) arrive in plain text and are encrypted before storage.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettingsUpdate {
    pub site_name: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub contact_email: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_secure: Option<bool>,
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub api_port: Option<i32>,
}

/// Settings as shown to administrators. Secrets are reduced to presence flags.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettingsView {
    pub site_name: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub contact_email: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub smtp_user: Option<String>,
    pub has_smtp_password: bool,
    pub smtp_secure: bool,
    pub api_url: Option<String>,
    pub api_port: Option<i32>,
    pub has_api_token: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<site_settings::Model> for SiteSettingsView {
    fn from(model: site_settings::Model) -> Self {
        Self {
            site_name: model.site_name,
            logo_url: model.logo_url,
            primary_color: model.primary_color,
            contact_email: model.contact_email,
            smtp_host: model.smtp_host,
            smtp_port: model.smtp_port,
            smtp_user: model.smtp_user,
            has_smtp_password: model.smtp_password.is_some(),
            smtp_secure: model.smtp_secure,
            api_url: model.api_url,
            api_port: model.api_port,
            has_api_token: model.api_token.is_some(),
            updated_at: Some(model.updated_at),
        }
    }
}

/// Retrieves the settings row, if it was ever written.
pub async fn get_site_settings(db: &DatabaseConnection) -> Result<Option<site_settings::Model>, DbErr> {
    site_settings::Entity::find_by_id(SITE_SETTINGS_ID).one(db).await
}

/// Applies a partial update, creating the row on first write. Last write wins.
pub async fn upsert_site_settings(
    db: &DatabaseConnection,
    encryption: &EncryptionService,
    update: SiteSettingsUpdate,
) -> Result<site_settings::Model, SettingsError> {
    let now = Utc::now();
    let existing = get_site_settings(db).await?;
    let is_new = existing.is_none();

    let mut active = match existing {
        Some(model) => model.into_active_model(),
        None => site_settings::ActiveModel {
            id: Set(SITE_SETTINGS_ID),
            site_name: Set(None),
            logo_url: Set(None),
            primary_color: Set(None),
            contact_email: Set(None),
            smtp_host: Set(None),
            smtp_port: Set(None),
            smtp_user: Set(None),
            smtp_password: Set(None),
            smtp_secure: Set(false),
            api_url: Set(None),
            api_token: Set(None),
            api_port: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        },
    };

    apply_text(&mut active.site_name, update.site_name);
    apply_text(&mut active.logo_url, update.logo_url);
    apply_text(&mut active.primary_color, update.primary_color);
    apply_text(&mut active.contact_email, update.contact_email);
    apply_text(&mut active.smtp_host, update.smtp_host);
    apply_port(&mut active.smtp_port, update.smtp_port)?;
    apply_text(&mut active.smtp_user, update.smtp_user);
    apply_secret(&mut active.smtp_password, update.smtp_password, encryption)?;
    if let Some(secure) = update.smtp_secure {
        active.smtp_secure = Set(secure);
    }
    apply_text(&mut active.api_url, update.api_url);
    apply_secret(&mut active.api_token, update.api_token, encryption)?;
    apply_port(&mut active.api_port, update.api_port)?;
    active.updated_at = Set(now);

    let saved = if is_new {
        active.insert(db).await?
    } else {
        active.update(db).await?
    };
    Ok(saved)
}

fn apply_text(field: &mut ActiveValue<Option<String>>, value: Option<String>) {
    if let Some(v) = value {
        let trimmed = v.trim();
        *field = Set((!trimmed.is_empty()).then(|| trimmed.to_owned()));
    }
}

fn apply_secret(
    field: &mut ActiveValue<Option<String>>,
    value: Option<String>,
    encryption: &EncryptionService,
) -> Result<(), EncryptionError> {
    if let Some(v) = value {
        let trimmed = v.trim();
        *field = if trimmed.is_empty() {
            Set(None)
        } else {
            Set(Some(encryption.encrypt(trimmed)?))
        };
    }
    Ok(())
}

fn apply_port(field: &mut ActiveValue<Option<i32>>, value: Option<i32>) -> Result<(), SettingsError> {
    match value {
        None => {}
        Some(0) => *field = Set(None),
        Some(port) if (1..=65535).contains(&port) => *field = Set(Some(port)),
        Some(port) => return Err(SettingsError::InvalidPort(port)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_test_db;

    const KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    #[tokio::test]
    async fn test_first_write_creates_row() {
        let db = setup_test_db().await;
        let encryption = EncryptionService::from_hex_key(KEY).unwrap();
        assert!(get_site_settings(&db).await.unwrap().is_none());

        let saved = upsert_site_settings(
            &db,
            &encryption,
            SiteSettingsUpdate {
                api_url: Some("api.example.com/".to_string()),
                api_port: Some(8443),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(saved.id, SITE_SETTINGS_ID);
        assert_eq!(saved.api_url.as_deref(), Some("api.example.com/"));
        assert_eq!(saved.api_port, Some(8443));
        assert!(saved.api_token.is_none());
        assert!(!saved.smtp_secure);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_untouched_fields() {
        let db = setup_test_db().await;
        let encryption = EncryptionService::from_hex_key(KEY).unwrap();

        upsert_site_settings(
            &db,
            &encryption,
            SiteSettingsUpdate {
                site_name: Some("1º Tabelionato".to_string()),
                api_url: Some("https://api.example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let saved = upsert_site_settings(
            &db,
            &encryption,
            SiteSettingsUpdate {
                site_name: Some("  ".to_string()),
                api_port: Some(9000),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(saved.site_name.is_none());
        assert_eq!(saved.api_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(saved.api_port, Some(9000));
    }

    #[tokio::test]
    async fn test_token_is_stored_encrypted() {
        let db = setup_test_db().await;
        let encryption = EncryptionService::from_hex_key(KEY).unwrap();

        let saved = upsert_site_settings(
            &db,
            &encryption,
            SiteSettingsUpdate {
                api_token: Some("super-secret".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stored = saved.api_token.clone().unwrap();
        assert_ne!(stored, "super-secret");
        assert_eq!(encryption.decrypt(&stored).unwrap(), "super-secret");

        let view = SiteSettingsView::from(saved);
        assert!(view.has_api_token);
        assert!(!view.has_smtp_password);
    }

    #[tokio::test]
    async fn test_port_zero_clears_and_out_of_range_is_rejected() {
        let db = setup_test_db().await;
        let encryption = EncryptionService::from_hex_key(KEY).unwrap();

        upsert_site_settings(
            &db,
            &encryption,
            SiteSettingsUpdate { api_port: Some(8080), ..Default::default() },
        )
        .await
        .unwrap();

        let cleared = upsert_site_settings(
            &db,
            &encryption,
            SiteSettingsUpdate { api_port: Some(0), ..Default::default() },
        )
        .await
        .unwrap();
        assert!(cleared.api_port.is_none());

        let result = upsert_site_settings(
            &db,
            &encryption,
            SiteSettingsUpdate { api_port: Some(70000), ..Default::default() },
        )
        .await;
        assert!(matches!(result, Err(SettingsError::InvalidPort(70000))));
    }
}
