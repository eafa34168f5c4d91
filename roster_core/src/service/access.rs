//! Membership queries shared by the services for permission checks.

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};

use crate::{
    entity::prelude::*,
    ids::{AccountId, GroupId, ProjectId, StudentId},
};

/// Whether `account` holds a teacher membership in `group`.
pub async fn is_teacher_in<C: ConnectionTrait>(
    db: &C,
    group_id: GroupId,
    account_id: AccountId,
) -> Result<bool, DbErr> {
    let member = GroupMember::find()
        .filter(GroupMemberColumn::GroupId.eq(group_id))
        .filter(GroupMemberColumn::UserId.eq(account_id))
        .filter(GroupMemberColumn::Role.eq(MemberRole::Teacher))
        .one(db)
        .await?;

    Ok(member.is_some())
}

/// Whether `account` is a teacher in at least one group.
pub async fn is_teacher_anywhere<C: ConnectionTrait>(
    db: &C,
    account_id: AccountId,
) -> Result<bool, DbErr> {
    let member = GroupMember::find()
        .filter(GroupMemberColumn::UserId.eq(account_id))
        .filter(GroupMemberColumn::Role.eq(MemberRole::Teacher))
        .one(db)
        .await?;

    Ok(member.is_some())
}

/// Groups the account can see: the ones it teaches in plus the ones it created.
pub async fn visible_group_ids<C: ConnectionTrait>(
    db: &C,
    account_id: AccountId,
) -> Result<Vec<GroupId>, DbErr> {
    let mut ids: Vec<GroupId> = GroupMember::find()
        .select_only()
        .column(GroupMemberColumn::GroupId)
        .filter(GroupMemberColumn::UserId.eq(account_id))
        .into_tuple()
        .all(db)
        .await?;

    let created: Vec<GroupId> = Group::find()
        .select_only()
        .column(GroupColumn::Id)
        .filter(GroupColumn::CreatedBy.eq(account_id))
        .into_tuple()
        .all(db)
        .await?;

    ids.extend(created);
    ids.sort();
    ids.dedup();
    Ok(ids)
}

/// Ids of the students on the account's roster.
pub async fn roster_student_ids<C: ConnectionTrait>(
    db: &C,
    account_id: AccountId,
) -> Result<Vec<StudentId>, DbErr> {
    Student::find()
        .select_only()
        .column(StudentColumn::Id)
        .filter(StudentColumn::TeacherId.eq(account_id))
        .into_tuple()
        .all(db)
        .await
}

/// The project, if it lives in a group the account can see.
pub async fn visible_project<C: ConnectionTrait>(
    db: &C,
    project_id: ProjectId,
    account_id: AccountId,
) -> Result<Option<ProjectModel>, DbErr> {
    let Some(project) = Project::find_by_id(project_id).one(db).await? else {
        return Ok(None);
    };

    let visible = visible_group_ids(db, account_id).await?;
    Ok(visible.contains(&project.group_id).then_some(project))
}
