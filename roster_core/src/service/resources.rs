use std::collections::HashMap;

use sea_orm::{prelude::DateTimeUtc, Condition, DatabaseConnection};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    entity::prelude::*,
    ids::{AccountId, GroupId, ProjectId, ProjectResourceId, ResourceId, StudentId},
};

use super::{
    access, accounts::TeacherSummary, is_unique_violation, non_empty, now, nullable,
    optional_text, substring_pattern,
};

#[derive(Debug, Error)]
pub enum ResourcesServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("Resource not found")]
    ResourceNotFound,

    #[error("Project not found")]
    ProjectNotFound,

    #[error("Student not found")]
    StudentNotFound,

    #[error("Resource is not linked to this project")]
    LinkNotFound,

    #[error("Resource is already linked to this project")]
    AlreadyLinked,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Validation(String),
}

impl ResourcesServiceError {
    fn validation(msg: &str) -> Self {
        ResourcesServiceError::Validation(msg.to_string())
    }
}

/// Which resources a listing covers, by group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupScope {
    #[default]
    All,
    /// Neither group nor student scoped.
    Global,
    Group(GroupId),
}

impl GroupScope {
    pub fn parse(value: Option<&str>) -> Result<Self, ResourcesServiceError> {
        match value.map(str::trim) {
            None | Some("") | Some("all") => Ok(GroupScope::All),
            Some("global") => Ok(GroupScope::Global),
            Some(id) => GroupId::parse_str(id)
                .map(GroupScope::Group)
                .map_err(|_| ResourcesServiceError::validation("Invalid group filter")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub group: GroupScope,
    pub kind: Option<ResourceKind>,
    pub search: Option<String>,
}

impl ResourceFilter {
    /// Build a filter from raw query string values.
    pub fn from_query(
        group: Option<&str>,
        kind: Option<&str>,
        search: Option<&str>,
    ) -> Result<Self, ResourcesServiceError> {
        let kind = match non_empty(kind) {
            Some(kind) => Some(
                ResourceKind::parse(&kind)
                    .ok_or_else(|| ResourcesServiceError::validation("Invalid resource type"))?,
            ),
            None => None,
        };

        Ok(Self {
            group: GroupScope::parse(group)?,
            kind,
            search: non_empty(search),
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct NewResource {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub group_id: Option<GroupId>,
    pub student_id: Option<StudentId>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ResourceUpdate {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub group_id: Option<Option<GroupId>>,
}

impl ResourceUpdate {
    fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.url.is_none()
            && self.group_id.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceView {
    #[serde(flatten)]
    pub resource: ResourceModel,
    pub creator: Option<TeacherSummary>,
}

/// A resource as seen through one of its project links.
#[derive(Debug, Clone, Serialize)]
pub struct LinkedResourceView {
    pub link_id: ProjectResourceId,
    pub linked_at: DateTimeUtc,
    pub linked_by: AccountId,
    pub linker: Option<TeacherSummary>,
    #[serde(flatten)]
    pub resource: ResourceModel,
    pub creator: Option<TeacherSummary>,
}

/// Absolute `http` or `https` URL with a host and no whitespace.
pub fn is_web_url(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let lower = value.to_ascii_lowercase();
    let rest = match lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
    {
        Some(rest) => rest,
        None => return false,
    };

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    !host.is_empty()
}

#[derive(Clone)]
pub struct ResourcesService {
    db: DatabaseConnection,
}

impl ResourcesService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Resources the caller may see: their own, global ones, ones in groups
    /// they belong to, and ones scoped to students on their roster.
    async fn visibility(&self, caller: AccountId) -> Result<Condition, ResourcesServiceError> {
        let groups = access::visible_group_ids(&self.db, caller).await?;
        let students = access::roster_student_ids(&self.db, caller).await?;

        let mut condition = Condition::any()
            .add(ResourceColumn::CreatedBy.eq(caller))
            .add(
                Condition::all()
                    .add(ResourceColumn::GroupId.is_null())
                    .add(ResourceColumn::StudentId.is_null()),
            );
        if !groups.is_empty() {
            condition = condition.add(ResourceColumn::GroupId.is_in(groups));
        }
        if !students.is_empty() {
            condition = condition.add(ResourceColumn::StudentId.is_in(students));
        }

        Ok(condition)
    }

    async fn creators(
        &self,
        ids: impl IntoIterator<Item = AccountId>,
    ) -> Result<HashMap<AccountId, TeacherSummary>, ResourcesServiceError> {
        let mut ids: Vec<AccountId> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let accounts = Account::find()
            .filter(AccountColumn::Id.is_in(ids))
            .all(&self.db)
            .await?;

        Ok(accounts
            .into_iter()
            .map(|a| (a.id, TeacherSummary::from(a)))
            .collect())
    }

    async fn find_visible(
        &self,
        caller: AccountId,
        resource_id: ResourceId,
    ) -> Result<ResourceModel, ResourcesServiceError> {
        Resource::find_by_id(resource_id)
            .filter(self.visibility(caller).await?)
            .one(&self.db)
            .await?
            .ok_or(ResourcesServiceError::ResourceNotFound)
    }

    async fn require_teacher(
        &self,
        caller: AccountId,
        msg: &'static str,
    ) -> Result<(), ResourcesServiceError> {
        if access::is_teacher_anywhere(&self.db, caller).await? {
            Ok(())
        } else {
            tracing::warn!(%caller, "rejected resource change from non-teacher");
            Err(ResourcesServiceError::Forbidden(msg))
        }
    }

    async fn require_group_teacher(
        &self,
        caller: AccountId,
        group_id: GroupId,
        msg: &'static str,
    ) -> Result<(), ResourcesServiceError> {
        if access::is_teacher_in(&self.db, group_id, caller).await? {
            Ok(())
        } else {
            tracing::warn!(%caller, %group_id, "rejected resource change outside caller's groups");
            Err(ResourcesServiceError::Forbidden(msg))
        }
    }

    /// Newest first.
    pub async fn list(
        &self,
        caller: AccountId,
        filter: ResourceFilter,
    ) -> Result<Vec<ResourceView>, ResourcesServiceError> {
        let mut query = Resource::find()
            .filter(self.visibility(caller).await?)
            .order_by_desc(ResourceColumn::CreatedAt);

        query = match filter.group {
            GroupScope::All => query,
            GroupScope::Global => query
                .filter(ResourceColumn::GroupId.is_null())
                .filter(ResourceColumn::StudentId.is_null()),
            GroupScope::Group(group_id) => query.filter(ResourceColumn::GroupId.eq(group_id)),
        };

        if let Some(kind) = filter.kind {
            query = query.filter(ResourceColumn::Kind.eq(kind));
        }

        if let Some(term) = &filter.search {
            query = query.filter(
                Condition::any()
                    .add(ResourceColumn::Title.like(substring_pattern(term)))
                    .add(ResourceColumn::Description.like(substring_pattern(term)))
                    .add(ResourceColumn::Url.like(substring_pattern(term))),
            );
        }

        let resources = query.all(&self.db).await?;
        let creators = self.creators(resources.iter().map(|r| r.created_by)).await?;

        tracing::debug!(%caller, count = resources.len(), "listed resources");
        Ok(resources
            .into_iter()
            .map(|resource| ResourceView {
                creator: creators.get(&resource.created_by).cloned(),
                resource,
            })
            .collect())
    }

    pub async fn create(
        &self,
        caller: AccountId,
        input: NewResource,
    ) -> Result<ResourceModel, ResourcesServiceError> {
        let title = non_empty(input.title.as_deref())
            .ok_or_else(|| ResourcesServiceError::validation("Resource title is required"))?;
        let kind = non_empty(input.kind.as_deref())
            .ok_or_else(|| ResourcesServiceError::validation("Resource type is required"))?;
        let kind = ResourceKind::parse(&kind)
            .ok_or_else(|| ResourcesServiceError::validation("Invalid resource type"))?;
        let url = non_empty(input.url.as_deref())
            .ok_or_else(|| ResourcesServiceError::validation("Resource URL is required"))?;

        if kind == ResourceKind::Link && !is_web_url(&url) {
            return Err(ResourcesServiceError::validation("Invalid URL format"));
        }

        self.require_teacher(caller, "Only teachers can create resources")
            .await?;

        if let Some(group_id) = input.group_id {
            self.require_group_teacher(caller, group_id, "You do not have access to this group")
                .await?;
        }

        if let Some(student_id) = input.student_id {
            let on_roster = access::roster_student_ids(&self.db, caller)
                .await?
                .contains(&student_id);
            if !on_roster {
                return Err(ResourcesServiceError::StudentNotFound);
            }
        }

        let resource = ResourceActiveModel {
            id: Set(ResourceId::new()),
            kind: Set(kind),
            title: Set(title),
            description: Set(optional_text(input.description)),
            url: Set(url),
            group_id: Set(input.group_id),
            student_id: Set(input.student_id),
            created_by: Set(caller),
            created_at: Set(now()),
        };

        let resource = Resource::insert(resource)
            .exec_with_returning(&self.db)
            .await?;

        tracing::info!(resource_id = %resource.id, kind = ?resource.kind, "created resource");
        Ok(resource)
    }

    pub async fn get(
        &self,
        caller: AccountId,
        resource_id: ResourceId,
    ) -> Result<ResourceView, ResourcesServiceError> {
        let resource = self.find_visible(caller, resource_id).await?;
        let creator = self
            .creators([resource.created_by])
            .await?
            .remove(&resource.created_by);

        Ok(ResourceView { resource, creator })
    }

    pub async fn update(
        &self,
        caller: AccountId,
        resource_id: ResourceId,
        update: ResourceUpdate,
    ) -> Result<ResourceModel, ResourcesServiceError> {
        let resource = self.find_visible(caller, resource_id).await?;

        self.require_teacher(caller, "Only teachers can update resources")
            .await?;
        if let Some(group_id) = resource.group_id {
            self.require_group_teacher(
                caller,
                group_id,
                "You do not have access to this group resource",
            )
            .await?;
        }

        if update.is_empty() {
            return Err(ResourcesServiceError::validation("No updates provided"));
        }

        let kind = match update.kind.as_deref() {
            Some(kind) => ResourceKind::parse(kind.trim())
                .ok_or_else(|| ResourcesServiceError::validation("Invalid resource type"))?,
            None => resource.kind,
        };

        let title = match update.title.as_deref() {
            Some(title) => Some(non_empty(Some(title)).ok_or_else(|| {
                ResourcesServiceError::validation("Resource title cannot be empty")
            })?),
            None => None,
        };

        let url = match update.url.as_deref() {
            Some(url) => Some(non_empty(Some(url)).ok_or_else(|| {
                ResourcesServiceError::validation("Resource URL cannot be empty")
            })?),
            None => None,
        };

        let url_changed = url.is_some() || update.kind.is_some();
        let effective_url = url.as_deref().unwrap_or(&resource.url);
        if kind == ResourceKind::Link && url_changed && !is_web_url(effective_url) {
            return Err(ResourcesServiceError::validation("Invalid URL format"));
        }

        if let Some(Some(group_id)) = update.group_id {
            self.require_group_teacher(
                caller,
                group_id,
                "You do not have access to the specified group",
            )
            .await?;
        }

        let mut active = resource.into_active_model();
        active.kind = Set(kind);
        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(description) = update.description {
            active.description = Set(optional_text(description));
        }
        if let Some(url) = url {
            active.url = Set(url);
        }
        if let Some(group_id) = update.group_id {
            active.group_id = Set(group_id);
        }

        let resource = active.update(&self.db).await?;
        tracing::info!(%resource_id, "updated resource");
        Ok(resource)
    }

    pub async fn delete(
        &self,
        caller: AccountId,
        resource_id: ResourceId,
    ) -> Result<(), ResourcesServiceError> {
        let resource = self.find_visible(caller, resource_id).await?;

        self.require_teacher(caller, "Only teachers can delete resources")
            .await?;
        if let Some(group_id) = resource.group_id {
            self.require_group_teacher(
                caller,
                group_id,
                "You do not have access to this group resource",
            )
            .await?;
        }

        resource.delete(&self.db).await?;
        tracing::info!(%resource_id, "deleted resource");
        Ok(())
    }

    async fn project_as_teacher(
        &self,
        caller: AccountId,
        project_id: ProjectId,
        msg: &'static str,
    ) -> Result<ProjectModel, ResourcesServiceError> {
        let project = access::visible_project(&self.db, project_id, caller)
            .await?
            .ok_or(ResourcesServiceError::ProjectNotFound)?;

        self.require_group_teacher(caller, project.group_id, msg)
            .await?;
        Ok(project)
    }

    /// Resources linked to a project, most recently linked first.
    pub async fn list_for_project(
        &self,
        caller: AccountId,
        project_id: ProjectId,
    ) -> Result<Vec<LinkedResourceView>, ResourcesServiceError> {
        access::visible_project(&self.db, project_id, caller)
            .await?
            .ok_or(ResourcesServiceError::ProjectNotFound)?;

        let links = ProjectResource::find()
            .filter(ProjectResourceColumn::ProjectId.eq(project_id))
            .order_by_desc(ProjectResourceColumn::LinkedAt)
            .find_also_related(Resource)
            .all(&self.db)
            .await?;

        let people = self
            .creators(links.iter().flat_map(|(link, resource)| {
                std::iter::once(link.linked_by).chain(resource.as_ref().map(|r| r.created_by))
            }))
            .await?;

        Ok(links
            .into_iter()
            .filter_map(|(link, resource)| {
                resource.map(|resource| LinkedResourceView {
                    link_id: link.id,
                    linked_at: link.linked_at,
                    linked_by: link.linked_by,
                    linker: people.get(&link.linked_by).cloned(),
                    creator: people.get(&resource.created_by).cloned(),
                    resource,
                })
            })
            .collect())
    }

    pub async fn link(
        &self,
        caller: AccountId,
        project_id: ProjectId,
        resource_id: Option<ResourceId>,
    ) -> Result<ProjectResourceModel, ResourcesServiceError> {
        let resource_id =
            resource_id.ok_or_else(|| ResourcesServiceError::validation("Resource ID is required"))?;

        self.project_as_teacher(caller, project_id, "Only teachers can link resources to projects")
            .await?;
        self.find_visible(caller, resource_id).await?;

        let existing = ProjectResource::find()
            .filter(ProjectResourceColumn::ProjectId.eq(project_id))
            .filter(ProjectResourceColumn::ResourceId.eq(resource_id))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(ResourcesServiceError::AlreadyLinked);
        }

        let link = ProjectResourceActiveModel {
            id: Set(ProjectResourceId::new()),
            project_id: Set(project_id),
            resource_id: Set(resource_id),
            linked_by: Set(caller),
            linked_at: Set(now()),
        };

        let link = match ProjectResource::insert(link).exec_with_returning(&self.db).await {
            Ok(link) => link,
            Err(err) if is_unique_violation(&err) => return Err(ResourcesServiceError::AlreadyLinked),
            Err(err) => return Err(err.into()),
        };

        tracing::info!(%project_id, %resource_id, "linked resource to project");
        Ok(link)
    }

    pub async fn unlink(
        &self,
        caller: AccountId,
        project_id: ProjectId,
        resource_id: Option<ResourceId>,
    ) -> Result<(), ResourcesServiceError> {
        let resource_id =
            resource_id.ok_or_else(|| ResourcesServiceError::validation("Resource ID is required"))?;

        self.project_as_teacher(
            caller,
            project_id,
            "Only teachers can unlink resources from projects",
        )
        .await?;

        let result = ProjectResource::delete_many()
            .filter(ProjectResourceColumn::ProjectId.eq(project_id))
            .filter(ProjectResourceColumn::ResourceId.eq(resource_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ResourcesServiceError::LinkNotFound);
        }

        tracing::info!(%project_id, %resource_id, "unlinked resource from project");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    struct Fixture {
        service: ResourcesService,
        teacher: AccountModel,
        group: GroupModel,
    }

    async fn setup() -> Fixture {
        let db = test_utils::setup_test_db().await;
        let teacher = test_utils::insert_account(&db, "Ada", false).await;
        let group = test_utils::insert_group(&db, teacher.id, "Robotics").await;
        Fixture {
            service: ResourcesService::new(db),
            teacher,
            group,
        }
    }

    fn link(title: &str, url: &str) -> NewResource {
        NewResource {
            kind: Some("link".to_string()),
            title: Some(title.to_string()),
            url: Some(url.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_web_url() {
        assert!(is_web_url("https://example.com"));
        assert!(is_web_url("HTTP://example.com/path?q=1"));
        assert!(is_web_url("https://user@example.com:8443/x"));
        assert!(!is_web_url("example.com"));
        assert!(!is_web_url("ftp://example.com"));
        assert!(!is_web_url("https://"));
        assert!(!is_web_url("https://exa mple.com"));
    }

    #[test]
    fn test_group_scope_parse() {
        assert_eq!(GroupScope::parse(None).unwrap(), GroupScope::All);
        assert_eq!(GroupScope::parse(Some("all")).unwrap(), GroupScope::All);
        assert_eq!(GroupScope::parse(Some("global")).unwrap(), GroupScope::Global);

        let id = GroupId::new();
        assert_eq!(
            GroupScope::parse(Some(&id.to_string())).unwrap(),
            GroupScope::Group(id)
        );
        assert!(GroupScope::parse(Some("nonsense")).is_err());
    }

    #[tokio::test]
    async fn test_create_validation() {
        let f = setup().await;

        let result = f
            .service
            .create(f.teacher.id, link("Docs", "not a url"))
            .await;
        match result {
            Err(ResourcesServiceError::Validation(msg)) => assert_eq!(msg, "Invalid URL format"),
            other => panic!("unexpected result: {other:?}"),
        }

        let mut missing_type = link("Docs", "https://docs.rs");
        missing_type.kind = None;
        let result = f.service.create(f.teacher.id, missing_type).await;
        assert!(matches!(result, Err(ResourcesServiceError::Validation(_))));

        let image = NewResource {
            kind: Some("IMAGE".to_string()),
            title: Some("Diagram".to_string()),
            url: Some("uploads/diagram.png".to_string()),
            ..Default::default()
        };
        let created = f.service.create(f.teacher.id, image).await.unwrap();
        assert_eq!(created.kind, ResourceKind::Image);
    }

    #[tokio::test]
    async fn test_only_teachers_create() {
        let f = setup().await;
        let loner = test_utils::insert_account(&f.service.db, "Grace", false).await;

        let result = f
            .service
            .create(loner.id, link("Docs", "https://docs.rs"))
            .await;
        assert!(matches!(result, Err(ResourcesServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_group_resource_requires_group_teacher() {
        let f = setup().await;
        let other = test_utils::insert_account(&f.service.db, "Grace", false).await;
        test_utils::insert_group(&f.service.db, other.id, "Chess").await;

        let mut input = link("Docs", "https://docs.rs");
        input.group_id = Some(f.group.id);
        let result = f.service.create(other.id, input).await;
        assert!(matches!(result, Err(ResourcesServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_list_visibility_and_filters() {
        let f = setup().await;
        let other = test_utils::insert_account(&f.service.db, "Grace", false).await;
        let other_group = test_utils::insert_group(&f.service.db, other.id, "Chess").await;

        f.service
            .create(f.teacher.id, link("Rust book", "https://doc.rust-lang.org/book"))
            .await
            .unwrap();

        let mut grouped = link("Servo guide", "https://servos.example");
        grouped.group_id = Some(f.group.id);
        f.service.create(f.teacher.id, grouped).await.unwrap();

        let mut hidden = link("Openings", "https://chess.example");
        hidden.group_id = Some(other_group.id);
        f.service.create(other.id, hidden).await.unwrap();

        let all = f
            .service
            .list(f.teacher.id, ResourceFilter::default())
            .await
            .unwrap();
        let titles: Vec<_> = all.iter().map(|v| v.resource.title.as_str()).collect();
        assert_eq!(titles, vec!["Servo guide", "Rust book"]);
        assert_eq!(all[0].creator.as_ref().map(|c| c.id), Some(f.teacher.id));

        let global = f
            .service
            .list(
                f.teacher.id,
                ResourceFilter::from_query(Some("global"), None, None).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].resource.title, "Rust book");

        let searched = f
            .service
            .list(
                f.teacher.id,
                ResourceFilter::from_query(None, Some("link"), Some("servos")).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].resource.title, "Servo guide");

        for wildcard in ["%", "_"] {
            let literal = f
                .service
                .list(
                    f.teacher.id,
                    ResourceFilter::from_query(None, None, Some(wildcard)).unwrap(),
                )
                .await
                .unwrap();
            assert!(literal.is_empty(), "{wildcard} should match literally");
        }
    }

    #[tokio::test]
    async fn test_update_partial() {
        let f = setup().await;
        let resource = f
            .service
            .create(f.teacher.id, link("Docs", "https://docs.rs"))
            .await
            .unwrap();

        let result = f
            .service
            .update(f.teacher.id, resource.id, ResourceUpdate::default())
            .await;
        assert!(matches!(result, Err(ResourcesServiceError::Validation(_))));

        let bad_url = ResourceUpdate {
            url: Some("docs".to_string()),
            ..Default::default()
        };
        let result = f.service.update(f.teacher.id, resource.id, bad_url).await;
        assert!(matches!(result, Err(ResourcesServiceError::Validation(_))));

        let update = ResourceUpdate {
            title: Some("Crate docs".to_string()),
            group_id: Some(Some(f.group.id)),
            ..Default::default()
        };
        let updated = f.service.update(f.teacher.id, resource.id, update).await.unwrap();
        assert_eq!(updated.title, "Crate docs");
        assert_eq!(updated.url, "https://docs.rs");
        assert_eq!(updated.group_id, Some(f.group.id));
    }

    #[tokio::test]
    async fn test_project_links() {
        let f = setup().await;
        let project =
            test_utils::insert_project(&f.service.db, f.group.id, f.teacher.id, "Arm").await;
        let resource = f
            .service
            .create(f.teacher.id, link("Docs", "https://docs.rs"))
            .await
            .unwrap();

        let result = f.service.link(f.teacher.id, project.id, None).await;
        assert!(matches!(result, Err(ResourcesServiceError::Validation(_))));

        f.service
            .link(f.teacher.id, project.id, Some(resource.id))
            .await
            .unwrap();

        let result = f
            .service
            .link(f.teacher.id, project.id, Some(resource.id))
            .await;
        assert!(matches!(result, Err(ResourcesServiceError::AlreadyLinked)));

        let linked = f
            .service
            .list_for_project(f.teacher.id, project.id)
            .await
            .unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].resource.id, resource.id);
        assert_eq!(linked[0].linker.as_ref().map(|l| l.id), Some(f.teacher.id));

        f.service
            .unlink(f.teacher.id, project.id, Some(resource.id))
            .await
            .unwrap();
        let result = f
            .service
            .unlink(f.teacher.id, project.id, Some(resource.id))
            .await;
        assert!(matches!(result, Err(ResourcesServiceError::LinkNotFound)));
    }

    #[tokio::test]
    async fn test_deleting_resource_removes_links() {
        let f = setup().await;
        let project =
            test_utils::insert_project(&f.service.db, f.group.id, f.teacher.id, "Arm").await;
        let resource = f
            .service
            .create(f.teacher.id, link("Docs", "https://docs.rs"))
            .await
            .unwrap();
        f.service
            .link(f.teacher.id, project.id, Some(resource.id))
            .await
            .unwrap();

        f.service.delete(f.teacher.id, resource.id).await.unwrap();

        let links = ProjectResource::find().count(&f.service.db).await.unwrap();
        assert_eq!(links, 0);
    }
}
