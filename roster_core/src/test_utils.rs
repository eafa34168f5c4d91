//! Fixtures for tests in this crate and in `roster_server`.
//!
//! Every database handed out here is a fresh in-memory SQLite instance with
//! all migrations applied.

use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::{
    entity::prelude::*,
    ids::{AccountId, GroupId, MemberId, ProjectId, StudentId},
    models::migrator::Migrator,
    service::now,
};

/// Create and migrate an isolated in-memory database.
///
/// # Example
/// ```ignore
/// let db = roster_core::test_utils::setup_test_db().await;
/// ```
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

pub async fn insert_account(db: &DatabaseConnection, first_name: &str, is_admin: bool) -> AccountModel {
    let account = AccountActiveModel {
        id: Set(AccountId::new()),
        email: Set(format!("{}@school.test", first_name.to_lowercase())),
        first_name: Set(first_name.to_string()),
        last_name: Set("Teacher".to_string()),
        is_admin: Set(is_admin),
        created_at: Set(now()),
    };

    Account::insert(account)
        .exec_with_returning(db)
        .await
        .expect("Failed to insert account")
}

pub async fn insert_student(
    db: &DatabaseConnection,
    teacher_id: AccountId,
    first_name: &str,
) -> StudentModel {
    let student = StudentActiveModel {
        id: Set(StudentId::new()),
        teacher_id: Set(teacher_id),
        first_name: Set(first_name.to_string()),
        last_initial: Set("S".to_string()),
        status: Set(StudentStatus::Present),
        created_at: Set(now()),
        updated_at: Set(now()),
    };

    Student::insert(student)
        .exec_with_returning(db)
        .await
        .expect("Failed to insert student")
}

/// Insert a group created by `teacher_id`, with that account as a teacher member.
pub async fn insert_group(db: &DatabaseConnection, teacher_id: AccountId, name: &str) -> GroupModel {
    let group = GroupActiveModel {
        id: Set(GroupId::new()),
        name: Set(name.to_string()),
        description: Set(None),
        created_by: Set(teacher_id),
        created_at: Set(now()),
    };

    let group = Group::insert(group)
        .exec_with_returning(db)
        .await
        .expect("Failed to insert group");

    add_teacher_member(db, group.id, teacher_id).await;
    group
}

pub async fn add_teacher_member(
    db: &DatabaseConnection,
    group_id: GroupId,
    account_id: AccountId,
) -> GroupMemberModel {
    let member = GroupMemberActiveModel {
        id: Set(MemberId::new()),
        group_id: Set(group_id),
        role: Set(MemberRole::Teacher),
        user_id: Set(Some(account_id)),
        student_id: Set(None),
        created_at: Set(now()),
    };

    GroupMember::insert(member)
        .exec_with_returning(db)
        .await
        .expect("Failed to insert teacher member")
}

pub async fn add_student_member(
    db: &DatabaseConnection,
    group_id: GroupId,
    student_id: StudentId,
) -> GroupMemberModel {
    let member = GroupMemberActiveModel {
        id: Set(MemberId::new()),
        group_id: Set(group_id),
        role: Set(MemberRole::Student),
        user_id: Set(None),
        student_id: Set(Some(student_id)),
        created_at: Set(now()),
    };

    GroupMember::insert(member)
        .exec_with_returning(db)
        .await
        .expect("Failed to insert student member")
}

pub async fn insert_project(
    db: &DatabaseConnection,
    group_id: GroupId,
    created_by: AccountId,
    title: &str,
) -> ProjectModel {
    let project = ProjectActiveModel {
        id: Set(ProjectId::new()),
        group_id: Set(group_id),
        title: Set(title.to_string()),
        description: Set(None),
        status: Set(ProjectStatus::Active),
        created_by: Set(created_by),
        created_at: Set(now()),
        updated_at: Set(now()),
    };

    Project::insert(project)
        .exec_with_returning(db)
        .await
        .expect("Failed to insert project")
}
