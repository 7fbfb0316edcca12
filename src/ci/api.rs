use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::models::TriggerOutcome;
use super::orchestrator::BuildOrchestrator;
use super::registry::ProjectRegistry;
use super::render;
use super::status::{badge_state, project_status};
use crate::config::SharedSecret;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub registry: Arc<ProjectRegistry>,
    pub orchestrator: Arc<BuildOrchestrator>,
    pub badge_dir: PathBuf,
    pub secret: SharedSecret,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BuildQuery {
    pub secret: Option<String>,
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    Unauthorized,
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(root_redirect))
        .route("/projects", get(list_projects))
        .route("/projects/{name}", get(get_project_status))
        .route("/projects/{name}/badge", get(get_badge))
        .route("/projects/{name}/build", get(trigger_build))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn root_redirect() -> impl IntoResponse {
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, "/projects")],
    )
}

async fn list_projects(State(state): State<SharedState>) -> Html<String> {
    Html(render::index_page(state.registry.names()))
}

async fn get_project_status(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Html<String> {
    let status = project_status(&state.registry, &name);
    Html(render::status_page(&name, status.as_ref()))
}

async fn get_badge(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let file = badge_state(&state.registry, &name).badge_file();
    let path = state.badge_dir.join(file);

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        warn!(badge = %path.display(), error = %e, "badge asset unavailable");
        ApiError::NotFound("404 page not found\n".into())
    })?;

    Ok((
        StatusCode::OK,
        [
            (header::CACHE_CONTROL, "no-cache, private"),
            (header::CONTENT_TYPE, "image/png"),
        ],
        bytes,
    ))
}

async fn trigger_build(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    query: Result<Query<BuildQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let authorized = match &query {
        Ok(Query(BuildQuery {
            secret: Some(secret),
        })) => state.secret.matches(secret),
        _ => false,
    };
    if !authorized {
        debug!(project = %name, "build trigger rejected: bad or missing secret");
        return Err(ApiError::Unauthorized);
    }

    let outcome = state.orchestrator.trigger(&name);
    info!(project = %name, ?outcome, "build trigger accepted");

    Ok(match outcome {
        TriggerOutcome::Started | TriggerOutcome::UnknownProject => "Build scheduled.\n",
        TriggerOutcome::Queued => "Build queued.\n",
    })
}
