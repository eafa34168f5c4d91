use std::collections::HashMap;

use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entity::prelude::*,
    ids::{AccountId, GroupId, MemberId, StudentId},
};

use super::{access, is_unique_violation, non_empty, now, optional_text};

#[derive(Debug, Error)]
pub enum GroupsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("Group not found")]
    GroupNotFound,

    #[error("Member not found")]
    MemberNotFound,

    #[error("Teacher not found")]
    TeacherNotFound,

    #[error("Student not found")]
    StudentNotFound,

    #[error("User is already a member of this group")]
    AlreadyMember,

    #[error("Only teachers of this group can do that")]
    NotGroupTeacher,

    #[error("{0}")]
    Validation(String),
}

/// Body of a group create or update.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct GroupInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AddMemberRequest {
    /// Account id for teachers, student id for students.
    pub user_id: Option<String>,
    pub role: Option<String>,
}

/// A membership row together with the member's display name.
#[derive(Debug, Clone, Serialize)]
pub struct MemberView {
    #[serde(flatten)]
    pub member: GroupMemberModel,
    pub first_name: String,
    pub last_name: String,
    pub last_initial: String,
}

impl MemberView {
    fn new(
        member: GroupMemberModel,
        account: Option<&AccountModel>,
        student: Option<&StudentModel>,
    ) -> Self {
        let mut view = MemberView {
            member,
            first_name: "Unknown".to_string(),
            last_name: String::new(),
            last_initial: String::new(),
        };

        if let Some(account) = account {
            if !account.first_name.is_empty() {
                view.first_name = account.first_name.clone();
            }
            view.last_name = account.last_name.clone();
        } else if let Some(student) = student {
            if !student.first_name.is_empty() {
                view.first_name = student.first_name.clone();
            }
            view.last_initial = student.last_initial.clone();
        }

        view
    }
}

#[derive(Clone)]
pub struct GroupsService {
    db: DatabaseConnection,
}

impl GroupsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a group and make the creator its first teacher.
    pub async fn create_group(
        &self,
        caller: AccountId,
        input: GroupInput,
    ) -> Result<GroupModel, GroupsServiceError> {
        let name = non_empty(input.name.as_deref())
            .ok_or_else(|| GroupsServiceError::Validation("Group name is required".to_string()))?;

        let txn = self.db.begin().await?;

        let created_at = now();
        let group = GroupActiveModel {
            id: Set(GroupId::new()),
            name: Set(name),
            description: Set(optional_text(input.description)),
            created_by: Set(caller),
            created_at: Set(created_at),
        };
        let group = Group::insert(group).exec_with_returning(&txn).await?;

        let teacher = GroupMemberActiveModel {
            id: Set(MemberId::new()),
            group_id: Set(group.id),
            role: Set(MemberRole::Teacher),
            user_id: Set(Some(caller)),
            student_id: Set(None),
            created_at: Set(created_at),
        };
        GroupMember::insert(teacher).exec(&txn).await?;

        txn.commit().await?;

        tracing::info!(group_id = %group.id, %caller, "created group");
        Ok(group)
    }

    /// Groups the caller teaches in or created, newest first.
    pub async fn list_groups(&self, caller: AccountId) -> Result<Vec<GroupModel>, GroupsServiceError> {
        let visible = access::visible_group_ids(&self.db, caller).await?;
        if visible.is_empty() {
            return Ok(Vec::new());
        }

        let groups = Group::find()
            .filter(GroupColumn::Id.is_in(visible))
            .order_by_desc(GroupColumn::CreatedAt)
            .all(&self.db)
            .await?;

        tracing::debug!(%caller, count = groups.len(), "listed groups");
        Ok(groups)
    }

    /// Get a group the caller can see. Groups outside the caller's reach are
    /// reported as missing.
    pub async fn get_group(
        &self,
        caller: AccountId,
        group_id: GroupId,
    ) -> Result<GroupModel, GroupsServiceError> {
        let group = Group::find_by_id(group_id)
            .one(&self.db)
            .await?
            .ok_or(GroupsServiceError::GroupNotFound)?;

        if group.created_by == caller || access::is_teacher_in(&self.db, group_id, caller).await? {
            Ok(group)
        } else {
            Err(GroupsServiceError::GroupNotFound)
        }
    }

    /// Like `get_group`, but the caller must also hold a teacher membership.
    async fn get_group_as_teacher(
        &self,
        caller: AccountId,
        group_id: GroupId,
    ) -> Result<GroupModel, GroupsServiceError> {
        let group = self.get_group(caller, group_id).await?;

        if !access::is_teacher_in(&self.db, group_id, caller).await? {
            tracing::warn!(%group_id, %caller, "rejected group change from non-teacher");
            return Err(GroupsServiceError::NotGroupTeacher);
        }

        Ok(group)
    }

    pub async fn update_group(
        &self,
        caller: AccountId,
        group_id: GroupId,
        input: GroupInput,
    ) -> Result<GroupModel, GroupsServiceError> {
        let name = non_empty(input.name.as_deref())
            .ok_or_else(|| GroupsServiceError::Validation("Group name is required".to_string()))?;

        let mut group = self
            .get_group_as_teacher(caller, group_id)
            .await?
            .into_active_model();
        group.name = Set(name);
        group.description = Set(optional_text(input.description));

        let group = group.update(&self.db).await?;
        tracing::info!(%group_id, "updated group");
        Ok(group)
    }

    /// Delete a group. Members, projects, tasks and group resources cascade.
    pub async fn delete_group(
        &self,
        caller: AccountId,
        group_id: GroupId,
    ) -> Result<(), GroupsServiceError> {
        let group = self.get_group_as_teacher(caller, group_id).await?;
        group.delete(&self.db).await?;

        tracing::info!(%group_id, "deleted group");
        Ok(())
    }

    /// Members in the order they joined.
    pub async fn list_members(
        &self,
        caller: AccountId,
        group_id: GroupId,
    ) -> Result<Vec<MemberView>, GroupsServiceError> {
        self.get_group(caller, group_id).await?;

        let members = GroupMember::find()
            .filter(GroupMemberColumn::GroupId.eq(group_id))
            .order_by_asc(GroupMemberColumn::CreatedAt)
            .all(&self.db)
            .await?;

        let account_ids: Vec<AccountId> = members.iter().filter_map(|m| m.user_id).collect();
        let student_ids: Vec<StudentId> = members.iter().filter_map(|m| m.student_id).collect();

        let accounts: HashMap<AccountId, AccountModel> = if account_ids.is_empty() {
            HashMap::new()
        } else {
            Account::find()
                .filter(AccountColumn::Id.is_in(account_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|a| (a.id, a))
                .collect()
        };

        let students: HashMap<StudentId, StudentModel> = if student_ids.is_empty() {
            HashMap::new()
        } else {
            Student::find()
                .filter(StudentColumn::Id.is_in(student_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|s| (s.id, s))
                .collect()
        };

        let views = members
            .into_iter()
            .map(|member| {
                let account = member.user_id.and_then(|id| accounts.get(&id));
                let student = member.student_id.and_then(|id| students.get(&id));
                MemberView::new(member, account, student)
            })
            .collect();

        Ok(views)
    }

    /// Add a teacher (by account id) or a student (by student id) to the group.
    pub async fn add_member(
        &self,
        caller: AccountId,
        group_id: GroupId,
        request: AddMemberRequest,
    ) -> Result<MemberView, GroupsServiceError> {
        let raw_id = non_empty(request.user_id.as_deref())
            .ok_or_else(|| GroupsServiceError::Validation("User ID is required".to_string()))?;
        let member_uuid = Uuid::parse_str(&raw_id)
            .map_err(|_| GroupsServiceError::Validation("User ID is not a valid id".to_string()))?;
        let role = request
            .role
            .as_deref()
            .and_then(MemberRole::parse)
            .ok_or_else(|| GroupsServiceError::Validation("Invalid role".to_string()))?;

        self.get_group_as_teacher(caller, group_id).await?;

        let (account, student) = match role {
            MemberRole::Teacher => {
                let account = Account::find_by_id(AccountId::from_uuid(member_uuid))
                    .one(&self.db)
                    .await?
                    .ok_or(GroupsServiceError::TeacherNotFound)?;
                (Some(account), None)
            }
            MemberRole::Student => {
                let student = Student::find_by_id(StudentId::from_uuid(member_uuid))
                    .filter(StudentColumn::TeacherId.eq(caller))
                    .one(&self.db)
                    .await?
                    .ok_or(GroupsServiceError::StudentNotFound)?;
                (None, Some(student))
            }
        };

        let member = GroupMemberActiveModel {
            id: Set(MemberId::new()),
            group_id: Set(group_id),
            role: Set(role),
            user_id: Set(account.as_ref().map(|a| a.id)),
            student_id: Set(student.as_ref().map(|s| s.id)),
            created_at: Set(now()),
        };

        let member = match GroupMember::insert(member).exec_with_returning(&self.db).await {
            Ok(member) => member,
            Err(err) if is_unique_violation(&err) => return Err(GroupsServiceError::AlreadyMember),
            Err(err) => return Err(err.into()),
        };

        tracing::info!(%group_id, member_id = %member.id, role = ?member.role, "added group member");
        Ok(MemberView::new(member, account.as_ref(), student.as_ref()))
    }

    pub async fn remove_member(
        &self,
        caller: AccountId,
        group_id: GroupId,
        member_id: Option<MemberId>,
    ) -> Result<(), GroupsServiceError> {
        let member_id = member_id
            .ok_or_else(|| GroupsServiceError::Validation("Member ID is required".to_string()))?;

        self.get_group_as_teacher(caller, group_id).await?;

        let result = GroupMember::delete_many()
            .filter(GroupMemberColumn::Id.eq(member_id))
            .filter(GroupMemberColumn::GroupId.eq(group_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(GroupsServiceError::MemberNotFound);
        }

        tracing::info!(%group_id, %member_id, "removed group member");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    async fn setup() -> (GroupsService, AccountModel) {
        let db = test_utils::setup_test_db().await;
        let teacher = test_utils::insert_account(&db, "Ada", false).await;
        (GroupsService::new(db), teacher)
    }

    fn named(name: &str) -> GroupInput {
        GroupInput {
            name: Some(name.to_string()),
            description: None,
        }
    }

    fn add_request(id: impl ToString, role: &str) -> AddMemberRequest {
        AddMemberRequest {
            user_id: Some(id.to_string()),
            role: Some(role.to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_group_makes_creator_teacher() {
        let (service, teacher) = setup().await;

        let group = service
            .create_group(
                teacher.id,
                GroupInput {
                    name: Some("  Robotics ".to_string()),
                    description: Some("   ".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(group.name, "Robotics");
        assert_eq!(group.description, None);
        assert!(access::is_teacher_in(&service.db, group.id, teacher.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_create_group_requires_name() {
        let (service, teacher) = setup().await;

        let result = service.create_group(teacher.id, GroupInput::default()).await;
        assert!(matches!(result, Err(GroupsServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_groups_only_shows_visible_groups() {
        let (service, teacher) = setup().await;
        let other = test_utils::insert_account(&service.db, "Grace", false).await;

        service.create_group(teacher.id, named("Mine")).await.unwrap();
        service.create_group(other.id, named("Theirs")).await.unwrap();

        let groups = service.list_groups(teacher.id).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Mine");
    }

    #[tokio::test]
    async fn test_outsider_cannot_see_group() {
        let (service, teacher) = setup().await;
        let other = test_utils::insert_account(&service.db, "Grace", false).await;
        let group = service.create_group(teacher.id, named("Mine")).await.unwrap();

        let result = service.get_group(other.id, group.id).await;
        assert!(matches!(result, Err(GroupsServiceError::GroupNotFound)));

        let result = service.delete_group(other.id, group.id).await;
        assert!(matches!(result, Err(GroupsServiceError::GroupNotFound)));
    }

    #[tokio::test]
    async fn test_update_group() {
        let (service, teacher) = setup().await;
        let group = service.create_group(teacher.id, named("Old")).await.unwrap();

        let updated = service
            .update_group(
                teacher.id,
                group.id,
                GroupInput {
                    name: Some("New".to_string()),
                    description: Some("Tuesdays".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "New");
        assert_eq!(updated.description.as_deref(), Some("Tuesdays"));
    }

    #[tokio::test]
    async fn test_delete_group_cascades_to_members() {
        let (service, teacher) = setup().await;
        let student = test_utils::insert_student(&service.db, teacher.id, "Alan").await;
        let group = service.create_group(teacher.id, named("Robotics")).await.unwrap();
        service
            .add_member(teacher.id, group.id, add_request(student.id, "student"))
            .await
            .unwrap();

        service.delete_group(teacher.id, group.id).await.unwrap();

        let remaining = GroupMember::find()
            .filter(GroupMemberColumn::GroupId.eq(group.id))
            .count(&service.db)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_add_members_with_display_fields() {
        let (service, teacher) = setup().await;
        let colleague = test_utils::insert_account(&service.db, "Grace", false).await;
        let student = test_utils::insert_student(&service.db, teacher.id, "Alan").await;
        let group = service.create_group(teacher.id, named("Robotics")).await.unwrap();

        let added = service
            .add_member(teacher.id, group.id, add_request(colleague.id, "teacher"))
            .await
            .unwrap();
        assert_eq!(added.first_name, "Grace");
        assert_eq!(added.member.user_id, Some(colleague.id));
        assert_eq!(added.member.student_id, None);

        let added = service
            .add_member(teacher.id, group.id, add_request(student.id, "student"))
            .await
            .unwrap();
        assert_eq!(added.last_initial, "S");
        assert_eq!(added.member.student_id, Some(student.id));

        let members = service.list_members(teacher.id, group.id).await.unwrap();
        let names: Vec<_> = members.iter().map(|m| m.first_name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Grace", "Alan"]);
    }

    #[tokio::test]
    async fn test_add_member_validation() {
        let (service, teacher) = setup().await;
        let group = service.create_group(teacher.id, named("Robotics")).await.unwrap();

        let result = service
            .add_member(teacher.id, group.id, AddMemberRequest::default())
            .await;
        assert!(matches!(result, Err(GroupsServiceError::Validation(_))));

        let result = service
            .add_member(teacher.id, group.id, add_request(teacher.id, "principal"))
            .await;
        assert!(matches!(result, Err(GroupsServiceError::Validation(_))));

        let result = service
            .add_member(teacher.id, group.id, add_request(StudentId::new(), "student"))
            .await;
        assert!(matches!(result, Err(GroupsServiceError::StudentNotFound)));
    }

    #[tokio::test]
    async fn test_cannot_add_another_teachers_student() {
        let (service, teacher) = setup().await;
        let grace = test_utils::insert_account(&service.db, "Grace", false).await;
        let hidden = test_utils::insert_student(&service.db, grace.id, "Secret").await;
        let group = service.create_group(teacher.id, named("Robotics")).await.unwrap();

        let result = service
            .add_member(teacher.id, group.id, add_request(hidden.id, "student"))
            .await;
        assert!(matches!(result, Err(GroupsServiceError::StudentNotFound)));

        let members = service.list_members(teacher.id, group.id).await.unwrap();
        assert_eq!(members.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_member_is_a_conflict() {
        let (service, teacher) = setup().await;
        let group = service.create_group(teacher.id, named("Robotics")).await.unwrap();

        let result = service
            .add_member(teacher.id, group.id, add_request(teacher.id, "teacher"))
            .await;
        assert!(matches!(result, Err(GroupsServiceError::AlreadyMember)));
    }

    #[tokio::test]
    async fn test_remove_member() {
        let (service, teacher) = setup().await;
        let student = test_utils::insert_student(&service.db, teacher.id, "Alan").await;
        let group = service.create_group(teacher.id, named("Robotics")).await.unwrap();
        let added = service
            .add_member(teacher.id, group.id, add_request(student.id, "student"))
            .await
            .unwrap();

        let result = service.remove_member(teacher.id, group.id, None).await;
        assert!(matches!(result, Err(GroupsServiceError::Validation(_))));

        service
            .remove_member(teacher.id, group.id, Some(added.member.id))
            .await
            .unwrap();

        let result = service
            .remove_member(teacher.id, group.id, Some(added.member.id))
            .await;
        assert!(matches!(result, Err(GroupsServiceError::MemberNotFound)));
    }
}
