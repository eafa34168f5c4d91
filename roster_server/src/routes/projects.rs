use axum::{extract::State, Json};
use http::StatusCode;
use roster_core::{
    entity::prelude::ProjectModel,
    ids::{GroupId, ProjectId},
    service::projects::{NewProject, ProjectUpdate},
};
use serde::Deserialize;

use crate::{
    auth::AuthenticatedUser,
    error::{query_id, ApiError, IdPath, JsonBody, QueryParams},
    state::AppState,
};

use super::{deleted, Deleted};

#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    #[serde(rename = "groupId")]
    pub group_id: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    QueryParams(query): QueryParams<ProjectQuery>,
) -> Result<Json<Vec<ProjectModel>>, ApiError> {
    let group_id: Option<GroupId> = query_id(query.group_id.as_deref(), "group id")?;
    Ok(Json(
        state.core.projects.list(user.account.id, group_id).await?,
    ))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(input): JsonBody<NewProject>,
) -> Result<(StatusCode, Json<ProjectModel>), ApiError> {
    let project = state.core.projects.create(user.account.id, input).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(project_id): IdPath<ProjectId>,
) -> Result<Json<ProjectModel>, ApiError> {
    Ok(Json(
        state.core.projects.get(user.account.id, project_id).await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(project_id): IdPath<ProjectId>,
    JsonBody(input): JsonBody<ProjectUpdate>,
) -> Result<Json<ProjectModel>, ApiError> {
    let project = state
        .core
        .projects
        .update(user.account.id, project_id, input)
        .await?;
    Ok(Json(project))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(project_id): IdPath<ProjectId>,
) -> Result<Json<Deleted>, ApiError> {
    state
        .core
        .projects
        .delete(user.account.id, project_id)
        .await?;
    Ok(deleted())
}
