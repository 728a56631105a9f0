use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema};
use tracing::{debug, info};

use self::entities::{site_settings, user};

pub mod entities;
pub mod services;

pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(10).sqlx_logging(false);
    Database::connect(opt).await
}

/// Creates the tables owned by this backend if they do not exist yet.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());
    create_table_if_missing(db, &schema, site_settings::Entity).await?;
    create_table_if_missing(db, &schema, user::Entity).await?;
    info!("Database tables ensured.");
    Ok(())
}

async fn create_table_if_missing<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let table_name = entity.table_name().to_owned();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    debug!(table = %table_name, "Executing CREATE TABLE IF NOT EXISTS.");
    db.execute(db.get_database_backend().build(&stmt)).await?;
    Ok(())
}

// A single pooled connection keeps the in-memory database alive and shared.
#[cfg(test)]
pub(crate) async fn setup_test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.expect("in-memory sqlite");
    ensure_schema(&db).await.expect("schema");
    db
}
