use axum::{extract::State, Json};
use roster_core::service::stats::AdminStats;

use crate::{auth::AuthenticatedUser, error::ApiError, state::AppState};

pub async fn stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<AdminStats>, ApiError> {
    Ok(Json(state.core.stats.admin_stats(&user.account).await?))
}
