use sea_orm_migration::{prelude::*, schema::*};

use super::m20260901_000001_create_account_table::Account;
use super::m20260901_000003_create_student_table::Student;
use super::m20260901_000006_create_project_table::Project;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Task::Table)
                    .col(pk_uuid(Task::Id))
                    .col(uuid(Task::ProjectId))
                    .col(string(Task::Title))
                    .col(text_null(Task::Description))
                    .col(string_len(Task::Status, 16).default("todo"))
                    .col(string_len_null(Task::AssigneeType, 16))
                    .col(uuid_null(Task::AssigneeId))
                    .col(uuid_null(Task::StudentAssigneeId))
                    .col(timestamp_with_time_zone(Task::CreatedAt))
                    .col(timestamp_with_time_zone(Task::UpdatedAt))
                    .check(Expr::cust("status IN ('todo', 'in-progress', 'completed')"))
                    // assignee_type names the single populated assignee column.
                    .check(Expr::cust(
                        "(assignee_type IS NULL AND assignee_id IS NULL AND student_assignee_id IS NULL) \
                         OR (assignee_type = 'teacher' AND assignee_id IS NOT NULL AND student_assignee_id IS NULL) \
                         OR (assignee_type = 'student' AND student_assignee_id IS NOT NULL AND assignee_id IS NULL)",
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-task-project_id")
                            .from(Task::Table, Task::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-task-assignee_id")
                            .from(Task::Table, Task::AssigneeId)
                            .to(Account::Table, Account::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-task-student_assignee_id")
                            .from(Task::Table, Task::StudentAssigneeId)
                            .to(Student::Table, Student::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_task_project_id")
                    .table(Task::Table)
                    .col(Task::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_task_student_assignee_id")
                    .table(Task::Table)
                    .col(Task::StudentAssigneeId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Task::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Task {
    Table,
    Id,
    ProjectId,
    Title,
    Description,
    Status,
    AssigneeType,
    AssigneeId,
    StudentAssigneeId,
    CreatedAt,
    UpdatedAt,
}
