use sea_orm_migration::{prelude::*, schema::*};

use super::m20260901_000001_create_account_table::Account;
use super::m20260901_000004_create_group_table::Group;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Project::Table)
                    .col(pk_uuid(Project::Id))
                    .col(uuid(Project::GroupId))
                    .col(string(Project::Title))
                    .col(text_null(Project::Description))
                    .col(string_len(Project::Status, 16).default("active"))
                    .col(uuid(Project::CreatedBy))
                    .col(timestamp_with_time_zone(Project::CreatedAt))
                    .col(timestamp_with_time_zone(Project::UpdatedAt))
                    .check(Expr::cust("status IN ('active', 'completed', 'archived')"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-project-group_id")
                            .from(Project::Table, Project::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-project-created_by")
                            .from(Project::Table, Project::CreatedBy)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_project_group_id")
                    .table(Project::Table)
                    .col(Project::GroupId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Project::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Project {
    Table,
    Id,
    GroupId,
    Title,
    Description,
    Status,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
