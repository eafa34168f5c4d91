use axum::{extract::State, Json};
use http::StatusCode;
use roster_core::{
    entity::prelude::StudentModel,
    ids::StudentId,
    service::students::{StudentPatch, StudentProfile},
};
use serde::Deserialize;

use crate::{
    auth::AuthenticatedUser,
    error::{ApiError, IdPath, JsonBody},
    state::AppState,
};

use super::{deleted, Deleted};

#[derive(Debug, Default, Deserialize)]
pub struct StudentBody {
    pub first_name: Option<String>,
    pub last_initial: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<StudentModel>>, ApiError> {
    Ok(Json(state.core.students.list(user.account.id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(body): JsonBody<StudentBody>,
) -> Result<(StatusCode, Json<StudentModel>), ApiError> {
    let student = state
        .core
        .students
        .create(
            user.account.id,
            body.first_name.as_deref(),
            body.last_initial.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(student)))
}

pub async fn get(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(student_id): IdPath<StudentId>,
) -> Result<Json<StudentModel>, ApiError> {
    Ok(Json(state.core.students.get(user.account.id, student_id).await?))
}

pub async fn replace(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(student_id): IdPath<StudentId>,
    JsonBody(body): JsonBody<StudentBody>,
) -> Result<Json<StudentModel>, ApiError> {
    let student = state
        .core
        .students
        .replace(
            user.account.id,
            student_id,
            body.first_name.as_deref(),
            body.last_initial.as_deref(),
        )
        .await?;
    Ok(Json(student))
}

pub async fn patch(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(student_id): IdPath<StudentId>,
    JsonBody(body): JsonBody<StudentPatch>,
) -> Result<Json<StudentModel>, ApiError> {
    let student = state
        .core
        .students
        .patch(user.account.id, student_id, body)
        .await?;
    Ok(Json(student))
}

pub async fn toggle_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(student_id): IdPath<StudentId>,
) -> Result<Json<StudentModel>, ApiError> {
    let student = state
        .core
        .students
        .toggle_status(user.account.id, student_id)
        .await?;
    Ok(Json(student))
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(student_id): IdPath<StudentId>,
) -> Result<Json<Deleted>, ApiError> {
    state.core.students.delete(user.account.id, student_id).await?;
    Ok(deleted())
}

pub async fn profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(student_id): IdPath<StudentId>,
) -> Result<Json<StudentProfile>, ApiError> {
    Ok(Json(
        state.core.students.profile(user.account.id, student_id).await?,
    ))
}
