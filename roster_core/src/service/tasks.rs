use std::collections::HashMap;

use sea_orm::{ConnectionTrait, DatabaseConnection};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    entity::prelude::*,
    ids::{AccountId, GroupId, ProjectId, StudentId, TaskId},
};

use super::{access, non_empty, now, nullable, optional_text};

#[derive(Debug, Error)]
pub enum TasksServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("Project not found")]
    ProjectNotFound,

    #[error("Task not found")]
    TaskNotFound,

    #[error("Only teachers can manage tasks")]
    NotGroupTeacher,

    #[error("{0}")]
    Validation(String),
}

impl TasksServiceError {
    fn validation(msg: &str) -> Self {
        TasksServiceError::Validation(msg.to_string())
    }
}

/// Who a task is delegated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignee {
    Teacher(AccountId),
    Student(StudentId),
}

/// Outcome of reading the assignment fields of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentChange {
    Keep,
    Clear,
    Assign(Assignee),
}

/// Assignment fields as they arrive on the wire. Absent fields are `None`,
/// explicit nulls are `Some(None)`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AssignmentRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub assignee_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub assignee_id: Option<Option<AccountId>>,
    #[serde(default, deserialize_with = "nullable")]
    pub student_assignee_id: Option<Option<StudentId>>,
}

impl AssignmentRequest {
    pub fn teacher(id: AccountId) -> Self {
        Self {
            assignee_type: Some(Some("teacher".to_string())),
            assignee_id: Some(Some(id)),
            student_assignee_id: None,
        }
    }

    pub fn student(id: StudentId) -> Self {
        Self {
            assignee_type: Some(Some("student".to_string())),
            assignee_id: None,
            student_assignee_id: Some(Some(id)),
        }
    }

    pub fn clear() -> Self {
        Self {
            assignee_type: Some(None),
            ..Default::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.assignee_type.is_none()
            && self.assignee_id.is_none()
            && self.student_assignee_id.is_none()
    }

    /// Decide what the request asks for, without touching the store.
    ///
    /// An explicit type picks the candidate column; without one the type is
    /// inferred from the single non-null id.
    pub fn resolve(&self) -> Result<AssignmentChange, TasksServiceError> {
        if self.is_empty() {
            return Ok(AssignmentChange::Keep);
        }

        let teacher = self.assignee_id.flatten();
        let student = self.student_assignee_id.flatten();

        let kind = match &self.assignee_type {
            Some(None) => return Ok(AssignmentChange::Clear),
            Some(Some(value)) => Some(AssigneeType::parse(value).ok_or_else(|| {
                TasksServiceError::validation("Assignee type must be either teacher or student")
            })?),
            None => None,
        };

        let change = match (kind, teacher, student) {
            (Some(AssigneeType::Teacher), Some(id), _) => {
                AssignmentChange::Assign(Assignee::Teacher(id))
            }
            (Some(AssigneeType::Student), _, Some(id)) => {
                AssignmentChange::Assign(Assignee::Student(id))
            }
            (Some(_), _, _) => AssignmentChange::Clear,
            (None, Some(_), Some(_)) => {
                return Err(TasksServiceError::validation(
                    "A task can only have one assignee",
                ))
            }
            (None, Some(id), None) => AssignmentChange::Assign(Assignee::Teacher(id)),
            (None, None, Some(id)) => AssignmentChange::Assign(Assignee::Student(id)),
            (None, None, None) => AssignmentChange::Clear,
        };

        Ok(change)
    }
}

impl AssignmentChange {
    fn apply(self, task: &mut TaskActiveModel) {
        let (kind, teacher, student) = match self {
            AssignmentChange::Keep => return,
            AssignmentChange::Clear => (None, None, None),
            AssignmentChange::Assign(Assignee::Teacher(id)) => {
                (Some(AssigneeType::Teacher), Some(id), None)
            }
            AssignmentChange::Assign(Assignee::Student(id)) => {
                (Some(AssigneeType::Student), None, Some(id))
            }
        };

        task.assignee_type = Set(kind);
        task.assignee_id = Set(teacher);
        task.student_assignee_id = Set(student);
    }
}

/// Confirm the candidate holds the matching role in `group_id`.
async fn confirm_assignee<C: ConnectionTrait>(
    db: &C,
    group_id: GroupId,
    assignee: Assignee,
) -> Result<(), TasksServiceError> {
    let query = GroupMember::find().filter(GroupMemberColumn::GroupId.eq(group_id));

    let (query, msg) = match assignee {
        Assignee::Teacher(id) => (
            query
                .filter(GroupMemberColumn::UserId.eq(id))
                .filter(GroupMemberColumn::Role.eq(MemberRole::Teacher)),
            "Teacher assignee is not a member of this group",
        ),
        Assignee::Student(id) => (
            query
                .filter(GroupMemberColumn::StudentId.eq(id))
                .filter(GroupMemberColumn::Role.eq(MemberRole::Student)),
            "Student assignee is not a member of this group",
        ),
    };

    if query.one(db).await?.is_none() {
        tracing::debug!(%group_id, ?assignee, "assignee is not a group member");
        return Err(TasksServiceError::validation(msg));
    }

    Ok(())
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct NewTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub assignment: AssignmentRequest,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TaskUpdate {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    #[serde(flatten)]
    pub assignment: AssignmentRequest,
}

impl TaskUpdate {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.assignment.is_empty()
    }
}

/// Display data of whoever a task is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssigneeView {
    pub id: Uuid,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_initial: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: AssigneeType,
}

impl From<&AccountModel> for AssigneeView {
    fn from(account: &AccountModel) -> Self {
        AssigneeView {
            id: account.id.into_uuid(),
            first_name: display_name(&account.first_name),
            last_name: Some(account.last_name.clone()),
            last_initial: None,
            email: Some(account.email.clone()),
            role: AssigneeType::Teacher,
        }
    }
}

impl From<&StudentModel> for AssigneeView {
    fn from(student: &StudentModel) -> Self {
        AssigneeView {
            id: student.id.into_uuid(),
            first_name: display_name(&student.first_name),
            last_name: None,
            last_initial: Some(student.last_initial.clone()),
            email: None,
            role: AssigneeType::Student,
        }
    }
}

fn display_name(name: &str) -> String {
    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name.to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: TaskModel,
    pub assignee: Option<AssigneeView>,
}

fn parse_status(value: Option<&str>) -> Result<Option<TaskStatus>, TasksServiceError> {
    match value {
        Some(value) => TaskStatus::parse(value.trim()).map(Some).ok_or_else(|| {
            TasksServiceError::validation("Status must be one of todo, in-progress or completed")
        }),
        None => Ok(None),
    }
}

#[derive(Clone)]
pub struct TasksService {
    db: DatabaseConnection,
}

impl TasksService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn project(
        &self,
        caller: AccountId,
        project_id: ProjectId,
    ) -> Result<ProjectModel, TasksServiceError> {
        access::visible_project(&self.db, project_id, caller)
            .await?
            .ok_or(TasksServiceError::ProjectNotFound)
    }

    async fn project_as_teacher(
        &self,
        caller: AccountId,
        project_id: ProjectId,
    ) -> Result<ProjectModel, TasksServiceError> {
        let project = self.project(caller, project_id).await?;

        if !access::is_teacher_in(&self.db, project.group_id, caller).await? {
            tracing::warn!(%project_id, %caller, "rejected task change from non-teacher");
            return Err(TasksServiceError::NotGroupTeacher);
        }

        Ok(project)
    }

    async fn find_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<TaskModel, TasksServiceError> {
        Task::find_by_id(task_id)
            .filter(TaskColumn::ProjectId.eq(project_id))
            .one(&self.db)
            .await?
            .ok_or(TasksServiceError::TaskNotFound)
    }

    /// Attach assignee display data to each task.
    async fn with_assignees(&self, tasks: Vec<TaskModel>) -> Result<Vec<TaskView>, TasksServiceError> {
        let account_ids: Vec<AccountId> = tasks.iter().filter_map(|t| t.assignee_id).collect();
        let student_ids: Vec<StudentId> =
            tasks.iter().filter_map(|t| t.student_assignee_id).collect();

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

        let views = tasks
            .into_iter()
            .map(|task| {
                let assignee = match (task.assignee_id, task.student_assignee_id) {
                    (Some(id), _) => accounts.get(&id).map(AssigneeView::from),
                    (_, Some(id)) => students.get(&id).map(AssigneeView::from),
                    _ => None,
                };
                TaskView { task, assignee }
            })
            .collect();

        Ok(views)
    }

    async fn view(&self, task: TaskModel) -> Result<TaskView, TasksServiceError> {
        let mut views = self.with_assignees(vec![task]).await?;
        views.pop().ok_or(TasksServiceError::TaskNotFound)
    }

    /// Tasks of a project in creation order.
    pub async fn list(
        &self,
        caller: AccountId,
        project_id: ProjectId,
    ) -> Result<Vec<TaskView>, TasksServiceError> {
        self.project(caller, project_id).await?;

        let tasks = Task::find()
            .filter(TaskColumn::ProjectId.eq(project_id))
            .order_by_asc(TaskColumn::CreatedAt)
            .all(&self.db)
            .await?;

        tracing::debug!(%project_id, count = tasks.len(), "listed tasks");
        self.with_assignees(tasks).await
    }

    pub async fn create(
        &self,
        caller: AccountId,
        project_id: ProjectId,
        input: NewTask,
    ) -> Result<TaskView, TasksServiceError> {
        let title = non_empty(input.title.as_deref())
            .ok_or_else(|| TasksServiceError::validation("Task title is required"))?;
        let status = parse_status(input.status.as_deref())?.unwrap_or(TaskStatus::Todo);
        let change = input.assignment.resolve()?;

        let project = self.project_as_teacher(caller, project_id).await?;

        if let AssignmentChange::Assign(assignee) = change {
            confirm_assignee(&self.db, project.group_id, assignee).await?;
        }

        let created_at = now();
        let mut task = TaskActiveModel {
            id: Set(TaskId::new()),
            project_id: Set(project_id),
            title: Set(title),
            description: Set(optional_text(input.description)),
            status: Set(status),
            assignee_type: Set(None),
            assignee_id: Set(None),
            student_assignee_id: Set(None),
            created_at: Set(created_at),
            updated_at: Set(created_at),
        };
        change.apply(&mut task);

        let task = Task::insert(task).exec_with_returning(&self.db).await?;

        tracing::info!(task_id = %task.id, %project_id, "created task");
        self.view(task).await
    }

    pub async fn get(
        &self,
        caller: AccountId,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<TaskView, TasksServiceError> {
        self.project(caller, project_id).await?;
        let task = self.find_task(project_id, task_id).await?;
        self.view(task).await
    }

    /// Apply the fields present in `update`; assignment fields go through
    /// [`AssignmentRequest::resolve`] and a membership check.
    pub async fn update(
        &self,
        caller: AccountId,
        project_id: ProjectId,
        task_id: TaskId,
        update: TaskUpdate,
    ) -> Result<TaskView, TasksServiceError> {
        if update.is_empty() {
            return Err(TasksServiceError::validation("No updates provided"));
        }

        let title = match update.title.as_deref() {
            Some(title) => Some(
                non_empty(Some(title))
                    .ok_or_else(|| TasksServiceError::validation("Task title cannot be empty"))?,
            ),
            None => None,
        };
        let status = parse_status(update.status.as_deref())?;
        let change = update.assignment.resolve()?;

        let project = self.project_as_teacher(caller, project_id).await?;
        let task = self.find_task(project_id, task_id).await?;

        if let AssignmentChange::Assign(assignee) = change {
            confirm_assignee(&self.db, project.group_id, assignee).await?;
        }

        let mut task = task.into_active_model();
        if let Some(title) = title {
            task.title = Set(title);
        }
        if let Some(description) = update.description {
            task.description = Set(optional_text(description));
        }
        if let Some(status) = status {
            task.status = Set(status);
        }
        change.apply(&mut task);
        task.updated_at = Set(now());

        let task = task.update(&self.db).await?;

        tracing::info!(%task_id, ?change, "updated task");
        self.view(task).await
    }

    pub async fn delete(
        &self,
        caller: AccountId,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> Result<(), TasksServiceError> {
        self.project_as_teacher(caller, project_id).await?;
        let task = self.find_task(project_id, task_id).await?;
        task.delete(&self.db).await?;

        tracing::info!(%task_id, "deleted task");
        Ok(())
    }
}
