use axum::{extract::State, Json};
use http::StatusCode;
use roster_core::{
    entity::prelude::GroupModel,
    ids::{GroupId, MemberId},
    service::groups::{AddMemberRequest, GroupInput, MemberView},
};
use serde::Deserialize;

use crate::{
    auth::AuthenticatedUser,
    error::{query_id, ApiError, IdPath, JsonBody, QueryParams},
    state::AppState,
};

use super::{deleted, Deleted};

pub async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<GroupModel>>, ApiError> {
    Ok(Json(state.core.groups.list_groups(user.account.id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(input): JsonBody<GroupInput>,
) -> Result<(StatusCode, Json<GroupModel>), ApiError> {
    let group = state.core.groups.create_group(user.account.id, input).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(group_id): IdPath<GroupId>,
) -> Result<Json<GroupModel>, ApiError> {
    Ok(Json(
        state.core.groups.get_group(user.account.id, group_id).await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(group_id): IdPath<GroupId>,
    JsonBody(input): JsonBody<GroupInput>,
) -> Result<Json<GroupModel>, ApiError> {
    let group = state
        .core
        .groups
        .update_group(user.account.id, group_id, input)
        .await?;
    Ok(Json(group))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(group_id): IdPath<GroupId>,
) -> Result<Json<Deleted>, ApiError> {
    state
        .core
        .groups
        .delete_group(user.account.id, group_id)
        .await?;
    Ok(deleted())
}

pub async fn members(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(group_id): IdPath<GroupId>,
) -> Result<Json<Vec<MemberView>>, ApiError> {
    let members = state
        .core
        .groups
        .list_members(user.account.id, group_id)
        .await?;
    Ok(Json(members))
}

pub async fn add_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(group_id): IdPath<GroupId>,
    JsonBody(request): JsonBody<AddMemberRequest>,
) -> Result<(StatusCode, Json<MemberView>), ApiError> {
    let member = state
        .core
        .groups
        .add_member(user.account.id, group_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[derive(Debug, Default, Deserialize)]
pub struct MemberQuery {
    #[serde(rename = "memberId")]
    pub member_id: Option<String>,
}

pub async fn remove_member(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(group_id): IdPath<GroupId>,
    QueryParams(query): QueryParams<MemberQuery>,
) -> Result<Json<Deleted>, ApiError> {
    let member_id: Option<MemberId> = query_id(query.member_id.as_deref(), "member id")?;
    state
        .core
        .groups
        .remove_member(user.account.id, group_id, member_id)
        .await?;
    Ok(deleted())
}
