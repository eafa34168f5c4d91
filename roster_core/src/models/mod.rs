use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use crate::config::RosterConfig;

pub mod migrator;

pub async fn open_or_create_db(config: &RosterConfig) -> Result<DatabaseConnection, DbErr> {
    tracing::debug!(url = %config.database_url, "connecting to database");
    Database::connect(&config.database_url).await
}

pub async fn migrate_up(db: &DatabaseConnection) -> Result<(), DbErr> {
    migrator::Migrator::up(db, None).await?;
    tracing::info!("database schema up to date");
    Ok(())
}
