use axum::{extract::State, Json};
use http::StatusCode;
use roster_core::{
    ids::{ProjectId, TaskId},
    service::tasks::{NewTask, TaskUpdate, TaskView},
};

use crate::{
    auth::AuthenticatedUser,
    error::{ApiError, IdPath, JsonBody},
    state::AppState,
};

use super::{deleted, Deleted};

pub async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(project_id): IdPath<ProjectId>,
) -> Result<Json<Vec<TaskView>>, ApiError> {
    Ok(Json(
        state.core.tasks.list(user.account.id, project_id).await?,
    ))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(project_id): IdPath<ProjectId>,
    JsonBody(input): JsonBody<NewTask>,
) -> Result<(StatusCode, Json<TaskView>), ApiError> {
    let task = state
        .core
        .tasks
        .create(user.account.id, project_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath((project_id, task_id)): IdPath<(ProjectId, TaskId)>,
) -> Result<Json<TaskView>, ApiError> {
    Ok(Json(
        state
            .core
            .tasks
            .get(user.account.id, project_id, task_id)
            .await?,
    ))
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath((project_id, task_id)): IdPath<(ProjectId, TaskId)>,
    JsonBody(update): JsonBody<TaskUpdate>,
) -> Result<Json<TaskView>, ApiError> {
    let task = state
        .core
        .tasks
        .update(user.account.id, project_id, task_id, update)
        .await?;
    Ok(Json(task))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath((project_id, task_id)): IdPath<(ProjectId, TaskId)>,
) -> Result<Json<Deleted>, ApiError> {
    state
        .core
        .tasks
        .delete(user.account.id, project_id, task_id)
        .await?;
    Ok(deleted())
}
