use axum::{extract::State, Json};
use http::StatusCode;
use roster_core::{
    entity::prelude::{ProjectResourceModel, ResourceModel},
    ids::{ProjectId, ResourceId},
    service::resources::{
        LinkedResourceView, NewResource, ResourceFilter, ResourceUpdate, ResourceView,
    },
};
use serde::Deserialize;

use crate::{
    auth::AuthenticatedUser,
    error::{query_id, ApiError, IdPath, JsonBody, QueryParams},
    state::AppState,
};

use super::{deleted, Deleted};

#[derive(Debug, Default, Deserialize)]
pub struct ResourceQuery {
    #[serde(rename = "groupId")]
    pub group_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub search: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    QueryParams(query): QueryParams<ResourceQuery>,
) -> Result<Json<Vec<ResourceView>>, ApiError> {
    let filter = ResourceFilter::from_query(
        query.group_id.as_deref(),
        query.kind.as_deref(),
        query.search.as_deref(),
    )?;
    Ok(Json(
        state.core.resources.list(user.account.id, filter).await?,
    ))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(input): JsonBody<NewResource>,
) -> Result<(StatusCode, Json<ResourceModel>), ApiError> {
    let resource = state.core.resources.create(user.account.id, input).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(resource_id): IdPath<ResourceId>,
) -> Result<Json<ResourceView>, ApiError> {
    Ok(Json(
        state.core.resources.get(user.account.id, resource_id).await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(resource_id): IdPath<ResourceId>,
    JsonBody(update): JsonBody<ResourceUpdate>,
) -> Result<Json<ResourceModel>, ApiError> {
    let resource = state
        .core
        .resources
        .update(user.account.id, resource_id, update)
        .await?;
    Ok(Json(resource))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(resource_id): IdPath<ResourceId>,
) -> Result<Json<Deleted>, ApiError> {
    state
        .core
        .resources
        .delete(user.account.id, resource_id)
        .await?;
    Ok(deleted())
}

pub async fn list_for_project(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(project_id): IdPath<ProjectId>,
) -> Result<Json<Vec<LinkedResourceView>>, ApiError> {
    let links = state
        .core
        .resources
        .list_for_project(user.account.id, project_id)
        .await?;
    Ok(Json(links))
}

#[derive(Debug, Default, Deserialize)]
pub struct LinkBody {
    pub resource_id: Option<ResourceId>,
}

pub async fn link(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(project_id): IdPath<ProjectId>,
    JsonBody(body): JsonBody<LinkBody>,
) -> Result<(StatusCode, Json<ProjectResourceModel>), ApiError> {
    let link = state
        .core
        .resources
        .link(user.account.id, project_id, body.resource_id)
        .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

#[derive(Debug, Default, Deserialize)]
pub struct UnlinkQuery {
    pub resource_id: Option<String>,
}

pub async fn unlink(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(project_id): IdPath<ProjectId>,
    QueryParams(query): QueryParams<UnlinkQuery>,
) -> Result<Json<Deleted>, ApiError> {
    let resource_id: Option<ResourceId> = query_id(query.resource_id.as_deref(), "resource id")?;
    state
        .core
        .resources
        .unlink(user.account.id, project_id, resource_id)
        .await?;
    Ok(deleted())
}
