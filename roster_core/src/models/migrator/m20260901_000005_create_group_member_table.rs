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
                    .table(GroupMember::Table)
                    .col(pk_uuid(GroupMember::Id))
                    .col(uuid(GroupMember::GroupId))
                    .col(string_len(GroupMember::Role, 16))
                    .col(uuid_null(GroupMember::UserId))
                    .col(uuid_null(GroupMember::StudentId))
                    .col(timestamp_with_time_zone(GroupMember::CreatedAt))
                    // Teachers are referenced by account, students by roster entry; never both.
                    .check(Expr::cust(
                        "(role = 'teacher' AND user_id IS NOT NULL AND student_id IS NULL) \
                         OR (role = 'student' AND student_id IS NOT NULL AND user_id IS NULL)",
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_member-group_id")
                            .from(GroupMember::Table, GroupMember::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_member-user_id")
                            .from(GroupMember::Table, GroupMember::UserId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-group_member-student_id")
                            .from(GroupMember::Table, GroupMember::StudentId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_member_group_user_unique")
                    .table(GroupMember::Table)
                    .col(GroupMember::GroupId)
                    .col(GroupMember::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_member_group_student_unique")
                    .table(GroupMember::Table)
                    .col(GroupMember::GroupId)
                    .col(GroupMember::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_group_member_student_id")
                    .table(GroupMember::Table)
                    .col(GroupMember::StudentId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GroupMember::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum GroupMember {
    Table,
    Id,
    GroupId,
    Role,
    UserId,
    StudentId,
    CreatedAt,
}
