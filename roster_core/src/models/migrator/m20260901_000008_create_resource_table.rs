use sea_orm_migration::{prelude::*, schema::*};

use super::m20260901_000001_create_account_table::Account;
use super::m20260901_000003_create_student_table::Student;
use super::m20260901_000004_create_group_table::Group;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Resource::Table)
                    .col(pk_uuid(Resource::Id))
                    .col(string_len(Resource::Kind, 16))
                    .col(string(Resource::Title))
                    .col(text_null(Resource::Description))
                    .col(text(Resource::Url))
                    .col(uuid_null(Resource::GroupId))
                    .col(uuid_null(Resource::StudentId))
                    .col(uuid(Resource::CreatedBy))
                    .col(timestamp_with_time_zone(Resource::CreatedAt))
                    .check(Expr::cust("kind IN ('link', 'image')"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-resource-group_id")
                            .from(Resource::Table, Resource::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-resource-student_id")
                            .from(Resource::Table, Resource::StudentId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-resource-created_by")
                            .from(Resource::Table, Resource::CreatedBy)
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
                    .name("idx_resource_group_id")
                    .table(Resource::Table)
                    .col(Resource::GroupId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Resource::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Resource {
    Table,
    Id,
    Kind,
    Title,
    Description,
    Url,
    GroupId,
    StudentId,
    CreatedBy,
    CreatedAt,
}
