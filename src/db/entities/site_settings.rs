use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Identifier of the single settings row.
pub const SITE_SETTINGS_ID: i32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "site_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)] // singleton, always SITE_SETTINGS_ID
    pub id: i32,
    pub site_name: Option<String>,
    pub logo_url: Option<String>,
    pub primary_color: Option<String>,
    pub contact_email: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<i32>,
    pub smtp_user: Option<String>,
    /// Hex AES-GCM ciphertext.
    pub smtp_password: Option<String>,
    pub smtp_secure: bool,
    pub api_url: Option<String>,
    /// Hex AES-GCM ciphertext of the upstream bearer token.
    pub api_token: Option<String>,
    pub api_port: Option<i32>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
