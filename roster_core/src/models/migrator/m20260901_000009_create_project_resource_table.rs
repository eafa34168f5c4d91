use sea_orm_migration::{prelude::*, schema::*};

use super::m20260901_000001_create_account_table::Account;
use super::m20260901_000006_create_project_table::Project;
use super::m20260901_000008_create_resource_table::Resource;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProjectResource::Table)
                    .col(pk_uuid(ProjectResource::Id))
                    .col(uuid(ProjectResource::ProjectId))
                    .col(uuid(ProjectResource::ResourceId))
                    .col(uuid(ProjectResource::LinkedBy))
                    .col(timestamp_with_time_zone(ProjectResource::LinkedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-project_resource-project_id")
                            .from(ProjectResource::Table, ProjectResource::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-project_resource-resource_id")
                            .from(ProjectResource::Table, ProjectResource::ResourceId)
                            .to(Resource::Table, Resource::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-project_resource-linked_by")
                            .from(ProjectResource::Table, ProjectResource::LinkedBy)
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
                    .name("idx_project_resource_unique")
                    .table(ProjectResource::Table)
                    .col(ProjectResource::ProjectId)
                    .col(ProjectResource::ResourceId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProjectResource::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ProjectResource {
    Table,
    Id,
    ProjectId,
    ResourceId,
    LinkedBy,
    LinkedAt,
}
