//! Router assembly. `/health` is open; everything under `/api` sits behind
//! the session layer.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use roster_core::RosterCore;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::{auth::AuthLayer, state::AppState};

mod admin;
mod groups;
mod me;
mod projects;
mod resources;
mod students;
mod tasks;

/// Body returned by every successful delete.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub success: bool,
}

pub(crate) fn deleted() -> Json<Deleted> {
    Json(Deleted { success: true })
}

pub fn app(core: RosterCore) -> Router {
    let auth = AuthLayer::new(
        Arc::new(core.accounts.clone()),
        core.config.session_cookie.as_str(),
    );
    let state = AppState::new(core);

    let api = Router::new()
        .route("/auth/signout", post(me::signout))
        .route("/me", get(me::me))
        .route("/teachers", get(me::teachers))
        .route("/students", get(students::list).post(students::create))
        .route(
            "/students/{student_id}",
            get(students::get)
                .put(students::replace)
                .patch(students::patch)
                .delete(students::delete),
        )
        .route(
            "/students/{student_id}/toggle-status",
            post(students::toggle_status),
        )
        .route("/students/{student_id}/profile", get(students::profile))
        .route("/groups", get(groups::list).post(groups::create))
        .route(
            "/groups/{group_id}",
            get(groups::get).put(groups::update).delete(groups::delete),
        )
        .route(
            "/groups/{group_id}/members",
            get(groups::members)
                .post(groups::add_member)
                .delete(groups::remove_member),
        )
        .route("/projects", get(projects::list).post(projects::create))
        .route(
            "/projects/{project_id}",
            get(projects::get)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route(
            "/projects/{project_id}/tasks",
            get(tasks::list).post(tasks::create),
        )
        .route(
            "/projects/{project_id}/tasks/{task_id}",
            get(tasks::get).put(tasks::update).delete(tasks::delete),
        )
        .route(
            "/projects/{project_id}/resources",
            get(resources::list_for_project)
                .post(resources::link)
                .delete(resources::unlink),
        )
        .route("/resources", get(resources::list).post(resources::create))
        .route(
            "/resources/{resource_id}",
            get(resources::get)
                .put(resources::update)
                .delete(resources::delete),
        )
        .route("/admin/stats", get(admin::stats))
        .route_layer(auth);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
