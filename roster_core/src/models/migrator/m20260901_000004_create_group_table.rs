use sea_orm_migration::{prelude::*, schema::*};

use super::m20260901_000001_create_account_table::Account;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Group::Table)
                    .col(pk_uuid(Group::Id))
                    .col(string(Group::Name))
                    .col(text_null(Group::Description))
                    .col(uuid(Group::CreatedBy))
                    .col(timestamp_with_time_zone(Group::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group-created_by")
                            .from(Group::Table, Group::CreatedBy)
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
                    .name("idx_group_created_by")
                    .table(Group::Table)
                    .col(Group::CreatedBy)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Group::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Group {
    Table,
    Id,
    Name,
    Description,
    CreatedBy,
    CreatedAt,
}
