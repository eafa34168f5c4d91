use sea_orm::DatabaseConnection;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    entity::prelude::*,
    ids::{AccountId, GroupId, ProjectId},
};

use super::{access, non_empty, now, nullable, optional_text};

#[derive(Debug, Error)]
pub enum ProjectsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("Project not found")]
    ProjectNotFound,

    #[error("You are not a member of this group")]
    NotGroupMember,

    #[error("Only teachers can create projects")]
    NotGroupTeacher,

    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct NewProject {
    pub group_id: Option<GroupId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

/// PUT body. `title` is required; `description` may be cleared with `null`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
}

fn parse_status(value: Option<&str>) -> Result<Option<ProjectStatus>, ProjectsServiceError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => ProjectStatus::parse(value).map(Some).ok_or_else(|| {
            ProjectsServiceError::Validation(
                "Status must be one of active, completed or archived".to_string(),
            )
        }),
        None => Ok(None),
    }
}

#[derive(Clone)]
pub struct ProjectsService {
    db: DatabaseConnection,
}

impl ProjectsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Projects in groups visible to the caller, newest first.
    pub async fn list(
        &self,
        caller: AccountId,
        group_id: Option<GroupId>,
    ) -> Result<Vec<ProjectModel>, ProjectsServiceError> {
        let mut visible = access::visible_group_ids(&self.db, caller).await?;
        if let Some(group_id) = group_id {
            visible.retain(|id| *id == group_id);
        }
        if visible.is_empty() {
            return Ok(Vec::new());
        }

        let projects = Project::find()
            .filter(ProjectColumn::GroupId.is_in(visible))
            .order_by_desc(ProjectColumn::CreatedAt)
            .all(&self.db)
            .await?;

        tracing::debug!(%caller, count = projects.len(), "listed projects");
        Ok(projects)
    }

    pub async fn create(
        &self,
        caller: AccountId,
        input: NewProject,
    ) -> Result<ProjectModel, ProjectsServiceError> {
        let title = non_empty(input.title.as_deref()).ok_or_else(|| {
            ProjectsServiceError::Validation("Project title is required".to_string())
        })?;
        let group_id = input
            .group_id
            .ok_or_else(|| ProjectsServiceError::Validation("Group ID is required".to_string()))?;
        let status = parse_status(input.status.as_deref())?.unwrap_or(ProjectStatus::Active);

        let membership = GroupMember::find()
            .filter(GroupMemberColumn::GroupId.eq(group_id))
            .filter(GroupMemberColumn::UserId.eq(caller))
            .one(&self.db)
            .await?
            .ok_or(ProjectsServiceError::NotGroupMember)?;

        if membership.role != MemberRole::Teacher {
            return Err(ProjectsServiceError::NotGroupTeacher);
        }

        let created_at = now();
        let project = ProjectActiveModel {
            id: Set(ProjectId::new()),
            group_id: Set(group_id),
            title: Set(title),
            description: Set(optional_text(input.description)),
            status: Set(status),
            created_by: Set(caller),
            created_at: Set(created_at),
            updated_at: Set(created_at),
        };

        let project = Project::insert(project)
            .exec_with_returning(&self.db)
            .await?;

        tracing::info!(project_id = %project.id, %group_id, "created project");
        Ok(project)
    }

    pub async fn get(
        &self,
        caller: AccountId,
        project_id: ProjectId,
    ) -> Result<ProjectModel, ProjectsServiceError> {
        access::visible_project(&self.db, project_id, caller)
            .await?
            .ok_or(ProjectsServiceError::ProjectNotFound)
    }

    async fn get_as_teacher(
        &self,
        caller: AccountId,
        project_id: ProjectId,
    ) -> Result<ProjectModel, ProjectsServiceError> {
        let project = self.get(caller, project_id).await?;

        if !access::is_teacher_in(&self.db, project.group_id, caller).await? {
            tracing::warn!(%project_id, %caller, "rejected project change from non-teacher");
            return Err(ProjectsServiceError::NotGroupMember);
        }

        Ok(project)
    }

    pub async fn update(
        &self,
        caller: AccountId,
        project_id: ProjectId,
        input: ProjectUpdate,
    ) -> Result<ProjectModel, ProjectsServiceError> {
        let title = non_empty(input.title.as_deref()).ok_or_else(|| {
            ProjectsServiceError::Validation("Project title is required".to_string())
        })?;
        let status = parse_status(input.status.as_deref())?;

        let mut project = self
            .get_as_teacher(caller, project_id)
            .await?
            .into_active_model();

        project.title = Set(title);
        if let Some(description) = input.description {
            project.description = Set(optional_text(description));
        }
        if let Some(status) = status {
            project.status = Set(status);
        }
        project.updated_at = Set(now());

        let project = project.update(&self.db).await?;
        tracing::info!(%project_id, "updated project");
        Ok(project)
    }

    /// Delete a project together with its tasks and resource links.
    pub async fn delete(
        &self,
        caller: AccountId,
        project_id: ProjectId,
    ) -> Result<(), ProjectsServiceError> {
        let project = self.get_as_teacher(caller, project_id).await?;
        project.delete(&self.db).await?;

        tracing::info!(%project_id, "deleted project");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    struct Fixture {
        service: ProjectsService,
        teacher: AccountModel,
        group: GroupModel,
    }

    async fn setup() -> Fixture {
        let db = test_utils::setup_test_db().await;
        let teacher = test_utils::insert_account(&db, "Ada", false).await;
        let group = test_utils::insert_group(&db, teacher.id, "Robotics").await;
        Fixture {
            service: ProjectsService::new(db),
            teacher,
            group,
        }
    }

    fn new_project(group_id: GroupId, title: &str) -> NewProject {
        NewProject {
            group_id: Some(group_id),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_active() {
        let f = setup().await;

        let project = f
            .service
            .create(f.teacher.id, new_project(f.group.id, "Arm"))
            .await
            .unwrap();

        assert_eq!(project.status, ProjectStatus::Active);
        assert_eq!(project.created_by, f.teacher.id);
    }

    #[tokio::test]
    async fn test_create_validation() {
        let f = setup().await;

        let result = f.service.create(f.teacher.id, NewProject::default()).await;
        assert!(matches!(result, Err(ProjectsServiceError::Validation(_))));

        let mut input = new_project(f.group.id, "Arm");
        input.status = Some("paused".to_string());
        let result = f.service.create(f.teacher.id, input).await;
        assert!(matches!(result, Err(ProjectsServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_non_member_cannot_create() {
        let f = setup().await;
        let outsider = test_utils::insert_account(&f.service.db, "Grace", false).await;

        let result = f
            .service
            .create(outsider.id, new_project(f.group.id, "Arm"))
            .await;
        assert!(matches!(result, Err(ProjectsServiceError::NotGroupMember)));
    }

    #[tokio::test]
    async fn test_list_filters_by_visibility_and_group() {
        let f = setup().await;
        let other_group = test_utils::insert_group(&f.service.db, f.teacher.id, "Chess").await;
        let outsider = test_utils::insert_account(&f.service.db, "Grace", false).await;

        f.service
            .create(f.teacher.id, new_project(f.group.id, "Arm"))
            .await
            .unwrap();
        f.service
            .create(f.teacher.id, new_project(other_group.id, "Openings"))
            .await
            .unwrap();

        assert_eq!(f.service.list(f.teacher.id, None).await.unwrap().len(), 2);

        let filtered = f.service.list(f.teacher.id, Some(other_group.id)).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "Openings");

        assert!(f.service.list(outsider.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_absent_fields() {
        let f = setup().await;
        let mut input = new_project(f.group.id, "Arm");
        input.description = Some("Six axes".to_string());
        let project = f.service.create(f.teacher.id, input).await.unwrap();

        let updated = f
            .service
            .update(
                f.teacher.id,
                project.id,
                ProjectUpdate {
                    title: Some("Robot arm".to_string()),
                    description: None,
                    status: Some("completed".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Robot arm");
        assert_eq!(updated.description.as_deref(), Some("Six axes"));
        assert_eq!(updated.status, ProjectStatus::Completed);

        let cleared = f
            .service
            .update(
                f.teacher.id,
                project.id,
                ProjectUpdate {
                    title: Some("Robot arm".to_string()),
                    description: Some(None),
                    status: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.description, None);
    }

    #[tokio::test]
    async fn test_delete_and_get() {
        let f = setup().await;
        let project = f
            .service
            .create(f.teacher.id, new_project(f.group.id, "Arm"))
            .await
            .unwrap();

        f.service.delete(f.teacher.id, project.id).await.unwrap();

        let result = f.service.get(f.teacher.id, project.id).await;
        assert!(matches!(result, Err(ProjectsServiceError::ProjectNotFound)));
    }
}
