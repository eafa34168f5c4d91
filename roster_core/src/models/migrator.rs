use sea_orm_migration::prelude::*;

mod m20260901_000001_create_account_table;
mod m20260901_000002_create_session_table;
mod m20260901_000003_create_student_table;
mod m20260901_000004_create_group_table;
mod m20260901_000005_create_group_member_table;
mod m20260901_000006_create_project_table;
mod m20260901_000007_create_task_table;
mod m20260901_000008_create_resource_table;
mod m20260901_000009_create_project_resource_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_000001_create_account_table::Migration),
            Box::new(m20260901_000002_create_session_table::Migration),
            Box::new(m20260901_000003_create_student_table::Migration),
            Box::new(m20260901_000004_create_group_table::Migration),
            Box::new(m20260901_000005_create_group_member_table::Migration),
            Box::new(m20260901_000006_create_project_table::Migration),
            Box::new(m20260901_000007_create_task_table::Migration),
            Box::new(m20260901_000008_create_resource_table::Migration),
            Box::new(m20260901_000009_create_project_resource_table::Migration),
        ]
    }
}

#[cfg(test)]
use sea_orm::{Database, DbErr};

#[tokio::test]
async fn test_migrations_okay() -> Result<(), DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    let schema_manager = SchemaManager::new(&db);

    Migrator::refresh(&db).await?;

    for table in [
        "account",
        "session",
        "student",
        "group",
        "group_member",
        "project",
        "task",
        "resource",
        "project_resource",
    ] {
        assert!(schema_manager.has_table(table).await?, "missing table {table}");
    }

    Ok(())
}

#[tokio::test]
async fn test_migrations_roll_back() -> Result<(), DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    let schema_manager = SchemaManager::new(&db);

    Migrator::up(&db, None).await?;
    Migrator::down(&db, None).await?;

    assert!(!schema_manager.has_table("task").await?);
    assert!(!schema_manager.has_table("account").await?);

    Ok(())
}
