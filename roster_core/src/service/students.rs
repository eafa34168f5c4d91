use sea_orm::{prelude::DateTimeUtc, DatabaseConnection};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    entity::prelude::*,
    ids::{AccountId, GroupId, StudentId},
};

use super::{non_empty, now};

#[derive(Debug, Error)]
pub enum StudentsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("Student not found")]
    StudentNotFound,

    #[error("{0}")]
    Validation(String),
}

/// Partial update. Only the fields present in the request are touched.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StudentPatch {
    pub status: Option<String>,
    pub first_name: Option<String>,
    pub last_initial: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentGroup {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    pub joined_at: DateTimeUtc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StudentStats {
    pub total: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub todo: u64,
    /// Percentage of completed tasks, rounded to the nearest integer.
    pub completion_rate: u64,
}

impl StudentStats {
    pub fn from_tasks(tasks: &[TaskModel]) -> Self {
        let mut stats = StudentStats::default();

        for task in tasks {
            stats.total += 1;
            match task.status {
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Todo => stats.todo += 1,
            }
        }

        if stats.total > 0 {
            stats.completion_rate =
                ((stats.completed as f64 * 100.0) / stats.total as f64).round() as u64;
        }

        stats
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentProfile {
    pub student: StudentModel,
    pub groups: Vec<StudentGroup>,
    pub projects: Vec<ProjectModel>,
    pub tasks: Vec<TaskModel>,
    pub stats: StudentStats,
}

/// First character of the input, upper-cased. Blank input gives an empty string.
fn initial_of(value: &str) -> String {
    value
        .trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

#[derive(Clone)]
pub struct StudentsService {
    db: DatabaseConnection,
}

impl StudentsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        teacher_id: AccountId,
        first_name: Option<&str>,
        last_initial: Option<&str>,
    ) -> Result<StudentModel, StudentsServiceError> {
        let first_name = non_empty(first_name).ok_or_else(|| {
            StudentsServiceError::Validation("First name is required".to_string())
        })?;

        let created_at = now();
        let student = StudentActiveModel {
            id: Set(StudentId::new()),
            teacher_id: Set(teacher_id),
            first_name: Set(first_name),
            last_initial: Set(last_initial.map(initial_of).unwrap_or_default()),
            status: Set(StudentStatus::Present),
            created_at: Set(created_at),
            updated_at: Set(created_at),
        };

        let student = Student::insert(student)
            .exec_with_returning(&self.db)
            .await?;

        tracing::info!(student_id = %student.id, %teacher_id, "created student");
        Ok(student)
    }

    pub async fn list(&self, teacher_id: AccountId) -> Result<Vec<StudentModel>, StudentsServiceError> {
        let students = Student::find()
            .filter(StudentColumn::TeacherId.eq(teacher_id))
            .order_by_asc(StudentColumn::FirstName)
            .all(&self.db)
            .await?;

        tracing::debug!(%teacher_id, count = students.len(), "listed students");
        Ok(students)
    }

    /// A student on `teacher_id`'s roster. Students owned by another teacher
    /// are reported as missing.
    pub async fn get(
        &self,
        teacher_id: AccountId,
        student_id: StudentId,
    ) -> Result<StudentModel, StudentsServiceError> {
        Student::find_by_id(student_id)
            .filter(StudentColumn::TeacherId.eq(teacher_id))
            .one(&self.db)
            .await?
            .ok_or(StudentsServiceError::StudentNotFound)
    }

    /// Full replacement of the editable name fields.
    pub async fn replace(
        &self,
        teacher_id: AccountId,
        student_id: StudentId,
        first_name: Option<&str>,
        last_initial: Option<&str>,
    ) -> Result<StudentModel, StudentsServiceError> {
        let first_name = non_empty(first_name).ok_or_else(|| {
            StudentsServiceError::Validation(
                "First name is required and must be a non-empty string".to_string(),
            )
        })?;
        let last_initial = non_empty(last_initial).ok_or_else(|| {
            StudentsServiceError::Validation(
                "Last initial is required and must be a non-empty string".to_string(),
            )
        })?;

        let mut student = self.get(teacher_id, student_id).await?.into_active_model();
        student.first_name = Set(first_name);
        student.last_initial = Set(initial_of(&last_initial));
        student.updated_at = Set(now());

        let student = student.update(&self.db).await?;
        tracing::info!(%student_id, "replaced student");
        Ok(student)
    }

    pub async fn patch(
        &self,
        teacher_id: AccountId,
        student_id: StudentId,
        patch: StudentPatch,
    ) -> Result<StudentModel, StudentsServiceError> {
        let status = match patch.status.as_deref() {
            Some(value) => Some(StudentStatus::parse(value).ok_or_else(|| {
                StudentsServiceError::Validation(
                    r#"Status must be either "present" or "absent""#.to_string(),
                )
            })?),
            None => None,
        };

        let first_name = match patch.first_name.as_deref() {
            Some(value) => Some(non_empty(Some(value)).ok_or_else(|| {
                StudentsServiceError::Validation("First name must be a non-empty string".to_string())
            })?),
            None => None,
        };

        let last_initial = match patch.last_initial.as_deref() {
            Some(value) => {
                let trimmed = non_empty(Some(value)).ok_or_else(|| {
                    StudentsServiceError::Validation(
                        "Last initial must be a non-empty string".to_string(),
                    )
                })?;
                Some(initial_of(&trimmed))
            }
            None => None,
        };

        if status.is_none() && first_name.is_none() && last_initial.is_none() {
            return Err(StudentsServiceError::Validation(
                "No valid updates provided".to_string(),
            ));
        }

        let mut student = self.get(teacher_id, student_id).await?.into_active_model();
        if let Some(status) = status {
            student.status = Set(status);
        }
        if let Some(first_name) = first_name {
            student.first_name = Set(first_name);
        }
        if let Some(last_initial) = last_initial {
            student.last_initial = Set(last_initial);
        }
        student.updated_at = Set(now());

        let student = student.update(&self.db).await?;
        tracing::info!(%student_id, "patched student");
        Ok(student)
    }

    /// Flip between present and absent.
    pub async fn toggle_status(
        &self,
        teacher_id: AccountId,
        student_id: StudentId,
    ) -> Result<StudentModel, StudentsServiceError> {
        let current = self.get(teacher_id, student_id).await?;
        let next = current.status.toggled();

        let mut student = current.into_active_model();
        student.status = Set(next);
        student.updated_at = Set(now());

        let student = student.update(&self.db).await?;
        tracing::info!(%student_id, status = ?student.status, "toggled student status");
        Ok(student)
    }

    /// Delete the student. Tasks assigned to them become unassigned; group
    /// memberships and student-scoped resources go with the row.
    pub async fn delete(
        &self,
        teacher_id: AccountId,
        student_id: StudentId,
    ) -> Result<(), StudentsServiceError> {
        let student = self.get(teacher_id, student_id).await?;

        let txn = self.db.begin().await?;

        Task::update_many()
            .set(TaskActiveModel {
                assignee_type: Set(None),
                student_assignee_id: Set(None),
                updated_at: Set(now()),
                ..Default::default()
            })
            .filter(TaskColumn::StudentAssigneeId.eq(student.id))
            .exec(&txn)
            .await?;

        student.delete(&txn).await?;

        txn.commit().await?;

        tracing::info!(%student_id, "deleted student");
        Ok(())
    }

    pub async fn profile(
        &self,
        teacher_id: AccountId,
        student_id: StudentId,
    ) -> Result<StudentProfile, StudentsServiceError> {
        let student = self.get(teacher_id, student_id).await?;

        let memberships = GroupMember::find()
            .filter(GroupMemberColumn::StudentId.eq(student.id))
            .order_by_asc(GroupMemberColumn::CreatedAt)
            .find_also_related(Group)
            .all(&self.db)
            .await?;

        let groups: Vec<StudentGroup> = memberships
            .into_iter()
            .filter_map(|(member, group)| {
                group.map(|group| StudentGroup {
                    id: group.id,
                    name: group.name,
                    description: group.description,
                    joined_at: member.created_at,
                })
            })
            .collect();

        let group_ids: Vec<GroupId> = groups.iter().map(|g| g.id).collect();
        let projects = if group_ids.is_empty() {
            Vec::new()
        } else {
            Project::find()
                .filter(ProjectColumn::GroupId.is_in(group_ids))
                .order_by_desc(ProjectColumn::CreatedAt)
                .all(&self.db)
                .await?
        };

        let tasks = Task::find()
            .filter(TaskColumn::StudentAssigneeId.eq(student.id))
            .order_by_desc(TaskColumn::UpdatedAt)
            .all(&self.db)
            .await?;

        let stats = StudentStats::from_tasks(&tasks);

        tracing::debug!(%student_id, groups = groups.len(), tasks = tasks.len(), "built student profile");
        Ok(StudentProfile {
            student,
            groups,
            projects,
            tasks,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ids::TaskId, test_utils};

    async fn setup() -> (StudentsService, AccountModel) {
        let db = test_utils::setup_test_db().await;
        let teacher = test_utils::insert_account(&db, "Ada", false).await;
        (StudentsService::new(db), teacher)
    }

    async fn insert_task(
        db: &DatabaseConnection,
        project_id: crate::ids::ProjectId,
        student_id: Option<StudentId>,
        status: TaskStatus,
    ) -> TaskModel {
        let task = TaskActiveModel {
            id: Set(TaskId::new()),
            project_id: Set(project_id),
            title: Set("Task".to_string()),
            description: Set(None),
            status: Set(status),
            assignee_type: Set(student_id.map(|_| AssigneeType::Student)),
            assignee_id: Set(None),
            student_assignee_id: Set(student_id),
            created_at: Set(now()),
            updated_at: Set(now()),
        };
        Task::insert(task).exec_with_returning(db).await.unwrap()
    }

    #[test]
    fn test_initial_of() {
        assert_eq!(initial_of("smith"), "S");
        assert_eq!(initial_of("  o'neil"), "O");
        assert_eq!(initial_of(""), "");
    }

    #[test]
    fn test_stats_from_tasks() {
        assert_eq!(StudentStats::from_tasks(&[]), StudentStats::default());
    }

    #[tokio::test]
    async fn test_create_and_get_student() {
        let (service, teacher) = setup().await;

        let created = service
            .create(teacher.id, Some("  Grace "), Some("hopper"))
            .await
            .unwrap();

        assert_eq!(created.first_name, "Grace");
        assert_eq!(created.last_initial, "H");
        assert_eq!(created.status, StudentStatus::Present);

        let fetched = service.get(teacher.id, created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_create_requires_first_name() {
        let (service, teacher) = setup().await;

        let result = service.create(teacher.id, Some("   "), None).await;
        assert!(matches!(result, Err(StudentsServiceError::Validation(_))));

        let result = service.create(teacher.id, None, None).await;
        assert!(matches!(result, Err(StudentsServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_students_are_scoped_to_their_teacher() {
        let (service, teacher) = setup().await;
        let other = test_utils::insert_account(&service.db, "Grace", false).await;

        let student = service.create(teacher.id, Some("Alan"), None).await.unwrap();

        let result = service.get(other.id, student.id).await;
        assert!(matches!(result, Err(StudentsServiceError::StudentNotFound)));
        assert!(service.list(other.id).await.unwrap().is_empty());

        let result = service.delete(other.id, student.id).await;
        assert!(matches!(result, Err(StudentsServiceError::StudentNotFound)));
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_first_name() {
        let (service, teacher) = setup().await;
        for name in ["Zoe", "Alan", "Maya"] {
            service.create(teacher.id, Some(name), None).await.unwrap();
        }

        let names: Vec<_> = service
            .list(teacher.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.first_name)
            .collect();
        assert_eq!(names, vec!["Alan", "Maya", "Zoe"]);
    }

    #[tokio::test]
    async fn test_toggle_status_flips_back_and_forth() {
        let (service, teacher) = setup().await;
        let student = service.create(teacher.id, Some("Alan"), None).await.unwrap();

        let toggled = service.toggle_status(teacher.id, student.id).await.unwrap();
        assert_eq!(toggled.status, StudentStatus::Absent);

        let toggled = service.toggle_status(teacher.id, student.id).await.unwrap();
        assert_eq!(toggled.status, StudentStatus::Present);
    }

    #[tokio::test]
    async fn test_replace_requires_both_fields() {
        let (service, teacher) = setup().await;
        let student = service.create(teacher.id, Some("Alan"), None).await.unwrap();

        let result = service
            .replace(teacher.id, student.id, Some("Alan"), None)
            .await;
        assert!(matches!(result, Err(StudentsServiceError::Validation(_))));

        let replaced = service
            .replace(teacher.id, student.id, Some("Alan"), Some("turing"))
            .await
            .unwrap();
        assert_eq!(replaced.last_initial, "T");
    }

    #[tokio::test]
    async fn test_patch_rules() {
        let (service, teacher) = setup().await;
        let student = service.create(teacher.id, Some("Alan"), None).await.unwrap();

        let result = service
            .patch(teacher.id, student.id, StudentPatch::default())
            .await;
        match result {
            Err(StudentsServiceError::Validation(msg)) => {
                assert_eq!(msg, "No valid updates provided")
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let bad_status = StudentPatch {
            status: Some("late".to_string()),
            ..Default::default()
        };
        let result = service.patch(teacher.id, student.id, bad_status).await;
        assert!(matches!(result, Err(StudentsServiceError::Validation(_))));

        let patch = StudentPatch {
            status: Some("absent".to_string()),
            last_initial: Some("t".to_string()),
            ..Default::default()
        };
        let patched = service.patch(teacher.id, student.id, patch).await.unwrap();
        assert_eq!(patched.status, StudentStatus::Absent);
        assert_eq!(patched.last_initial, "T");
        assert_eq!(patched.first_name, "Alan");
    }

    #[tokio::test]
    async fn test_delete_unassigns_tasks() {
        let (service, teacher) = setup().await;
        let student = service.create(teacher.id, Some("Alan"), None).await.unwrap();
        let group = test_utils::insert_group(&service.db, teacher.id, "Robotics").await;
        test_utils::add_student_member(&service.db, group.id, student.id).await;
        let project = test_utils::insert_project(&service.db, group.id, teacher.id, "Arm").await;
        let task = insert_task(&service.db, project.id, Some(student.id), TaskStatus::Todo).await;

        service.delete(teacher.id, student.id).await.unwrap();

        let task = Task::find_by_id(task.id).one(&service.db).await.unwrap().unwrap();
        assert_eq!(task.assignee_type, None);
        assert_eq!(task.student_assignee_id, None);

        let members = GroupMember::find()
            .filter(GroupMemberColumn::GroupId.eq(group.id))
            .count(&service.db)
            .await
            .unwrap();
        assert_eq!(members, 1);
    }

    #[tokio::test]
    async fn test_profile_collects_groups_projects_and_stats() {
        let (service, teacher) = setup().await;
        let student = service.create(teacher.id, Some("Alan"), None).await.unwrap();
        let group = test_utils::insert_group(&service.db, teacher.id, "Robotics").await;
        test_utils::add_student_member(&service.db, group.id, student.id).await;
        let project = test_utils::insert_project(&service.db, group.id, teacher.id, "Arm").await;

        insert_task(&service.db, project.id, Some(student.id), TaskStatus::Completed).await;
        insert_task(&service.db, project.id, Some(student.id), TaskStatus::InProgress).await;
        insert_task(&service.db, project.id, Some(student.id), TaskStatus::Todo).await;
        insert_task(&service.db, project.id, None, TaskStatus::Completed).await;

        let profile = service.profile(teacher.id, student.id).await.unwrap();

        assert_eq!(profile.groups.len(), 1);
        assert_eq!(profile.groups[0].name, "Robotics");
        assert_eq!(profile.projects.len(), 1);
        assert_eq!(profile.tasks.len(), 3);
        assert_eq!(
            profile.stats,
            StudentStats {
                total: 3,
                completed: 1,
                in_progress: 1,
                todo: 1,
                completion_rate: 33,
            }
        );
    }
}
