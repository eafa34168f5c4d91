//! HTTP error type and the request extractors that produce it.
//!
//! Every service error converts into [`ApiError`], which renders as
//! `{"error": "<message>"}` with a matching status code.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Query, Request},
    response::{IntoResponse, Response},
    Json,
};
use http::{request::Parts, StatusCode};
use roster_core::service::{
    accounts::AccountsServiceError, groups::GroupsServiceError, projects::ProjectsServiceError,
    resources::ResourcesServiceError, stats::StatsServiceError, students::StudentsServiceError,
    tasks::TasksServiceError,
};
use sea_orm::{DbErr, SqlErr};
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Store failures. Unique index violations surface as 409, anything
    /// else is logged and hidden behind a generic 500.
    pub fn database(err: &DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            tracing::debug!(%detail, "unique constraint violation");
            return Self::conflict("Record already exists");
        }

        tracing::error!(error = %err, "database error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

impl From<AccountsServiceError> for ApiError {
    fn from(error: AccountsServiceError) -> Self {
        match &error {
            AccountsServiceError::DbError(err) => ApiError::database(err),
            AccountsServiceError::AccountNotFound => ApiError::not_found(error.to_string()),
            AccountsServiceError::EmailTaken => ApiError::conflict(error.to_string()),
            AccountsServiceError::InvalidSession => ApiError::unauthorized(error.to_string()),
            AccountsServiceError::Validation(msg) => ApiError::bad_request(msg),
        }
    }
}

impl From<StudentsServiceError> for ApiError {
    fn from(error: StudentsServiceError) -> Self {
        match &error {
            StudentsServiceError::DbError(err) => ApiError::database(err),
            StudentsServiceError::StudentNotFound => ApiError::not_found(error.to_string()),
            StudentsServiceError::Validation(msg) => ApiError::bad_request(msg),
        }
    }
}

impl From<GroupsServiceError> for ApiError {
    fn from(error: GroupsServiceError) -> Self {
        match &error {
            GroupsServiceError::DbError(err) => ApiError::database(err),
            GroupsServiceError::GroupNotFound
            | GroupsServiceError::MemberNotFound
            | GroupsServiceError::TeacherNotFound
            | GroupsServiceError::StudentNotFound => ApiError::not_found(error.to_string()),
            GroupsServiceError::AlreadyMember => ApiError::conflict(error.to_string()),
            GroupsServiceError::NotGroupTeacher => ApiError::forbidden(error.to_string()),
            GroupsServiceError::Validation(msg) => ApiError::bad_request(msg),
        }
    }
}

impl From<ProjectsServiceError> for ApiError {
    fn from(error: ProjectsServiceError) -> Self {
        match &error {
            ProjectsServiceError::DbError(err) => ApiError::database(err),
            ProjectsServiceError::ProjectNotFound => ApiError::not_found(error.to_string()),
            ProjectsServiceError::NotGroupMember | ProjectsServiceError::NotGroupTeacher => {
                ApiError::forbidden(error.to_string())
            }
            ProjectsServiceError::Validation(msg) => ApiError::bad_request(msg),
        }
    }
}

impl From<TasksServiceError> for ApiError {
    fn from(error: TasksServiceError) -> Self {
        match &error {
            TasksServiceError::DbError(err) => ApiError::database(err),
            TasksServiceError::ProjectNotFound | TasksServiceError::TaskNotFound => {
                ApiError::not_found(error.to_string())
            }
            TasksServiceError::NotGroupTeacher => ApiError::forbidden(error.to_string()),
            TasksServiceError::Validation(msg) => ApiError::bad_request(msg),
        }
    }
}

impl From<ResourcesServiceError> for ApiError {
    fn from(error: ResourcesServiceError) -> Self {
        match &error {
            ResourcesServiceError::DbError(err) => ApiError::database(err),
            ResourcesServiceError::ResourceNotFound
            | ResourcesServiceError::ProjectNotFound
            | ResourcesServiceError::StudentNotFound
            | ResourcesServiceError::LinkNotFound => ApiError::not_found(error.to_string()),
            ResourcesServiceError::AlreadyLinked => ApiError::conflict(error.to_string()),
            ResourcesServiceError::Forbidden(msg) => ApiError::forbidden(*msg),
            ResourcesServiceError::Validation(msg) => ApiError::bad_request(msg),
        }
    }
}

impl From<StatsServiceError> for ApiError {
    fn from(error: StatsServiceError) -> Self {
        match &error {
            StatsServiceError::DbError(err) => ApiError::database(err),
            StatsServiceError::NotAdmin => ApiError::forbidden(error.to_string()),
        }
    }
}

/// `Json` whose rejection is an [`ApiError`].
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!(reason = %rejection.body_text(), "rejected request body");
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::bad_request("Expected a JSON request body")
        }
        _ => ApiError::bad_request("Invalid JSON in request body"),
    }
}

/// `Path` whose rejection is an [`ApiError`]; malformed ids are a 400.
pub struct IdPath<T>(pub T);

impl<S, T> FromRequestParts<S> for IdPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(IdPath(value)),
            Err(rejection) => {
                tracing::debug!(reason = %rejection.body_text(), "rejected path");
                Err(ApiError::bad_request("Invalid id in path"))
            }
        }
    }
}

/// `Query` whose rejection is an [`ApiError`].
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => {
                tracing::debug!(reason = %rejection.body_text(), "rejected query string");
                Err(ApiError::bad_request("Invalid query string"))
            }
        }
    }
}

/// Parse an optional id taken from the query string. Missing or blank
/// values are `None`; malformed ones are a 400.
pub fn query_id<T: std::str::FromStr>(value: Option<&str>, name: &str) -> Result<Option<T>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Invalid {name}"))),
        None => Ok(None),
    }
}
