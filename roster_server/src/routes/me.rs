use axum::{
    extract::State,
    response::{AppendHeaders, IntoResponse},
    Json,
};
use roster_core::{entity::prelude::AccountModel, service::accounts::TeacherSummary};
use serde::Deserialize;

use crate::{
    auth::{clear_session_cookie, AuthenticatedUser},
    error::{ApiError, QueryParams},
    state::AppState,
};

use super::deleted;

pub async fn me(user: AuthenticatedUser) -> Json<AccountModel> {
    Json(user.account)
}

/// Revoke the current session and clear the cookie.
pub async fn signout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    state.core.accounts.revoke_session(&user.token).await?;
    tracing::info!(account_id = %user.account.id, "signed out");

    let cookie = clear_session_cookie(&state.core.config.session_cookie);
    Ok((
        AppendHeaders([(http::header::SET_COOKIE, cookie)]),
        deleted(),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct TeacherQuery {
    pub search: Option<String>,
}

pub async fn teachers(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    QueryParams(query): QueryParams<TeacherQuery>,
) -> Result<Json<Vec<TeacherSummary>>, ApiError> {
    let teachers = state
        .core
        .accounts
        .list_teachers(query.search.as_deref())
        .await?;
    Ok(Json(teachers))
}
