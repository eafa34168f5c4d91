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
                    .table(Student::Table)
                    .col(pk_uuid(Student::Id))
                    .col(uuid(Student::TeacherId))
                    .col(string(Student::FirstName))
                    .col(string_len(Student::LastInitial, 1).default(""))
                    .col(string_len(Student::Status, 16).default("present"))
                    .col(timestamp_with_time_zone(Student::CreatedAt))
                    .col(timestamp_with_time_zone(Student::UpdatedAt))
                    .check(Expr::cust("status IN ('present', 'absent')"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-student-teacher_id")
                            .from(Student::Table, Student::TeacherId)
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
                    .name("idx_student_teacher_id")
                    .table(Student::Table)
                    .col(Student::TeacherId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Student::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Student {
    Table,
    Id,
    TeacherId,
    FirstName,
    LastInitial,
    Status,
    CreatedAt,
    UpdatedAt,
}
