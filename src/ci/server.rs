use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use super::api::{self, AppState};
use super::orchestrator::BuildOrchestrator;
use super::registry::{BuildSlot, ProjectRegistry};
use super::runner::ShellRunner;
use crate::config::Settings;

/// Build the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wire the registry, runner and orchestrator together from settings.
pub fn build_state(settings: &Settings, registry: ProjectRegistry) -> Arc<AppState> {
    let registry = Arc::new(registry);
    let runner = Arc::new(ShellRunner::new(settings.shell.clone()));
    let orchestrator = Arc::new(BuildOrchestrator::new(
        registry.clone(),
        runner,
        settings.workspace_dir.clone(),
    ));

    Arc::new(AppState {
        registry,
        orchestrator,
        badge_dir: settings.badge_dir.clone(),
        secret: settings.secret.clone(),
    })
}

/// Start the server and block until Ctrl+C.
pub async fn start_server(settings: Settings, registry: ProjectRegistry) -> Result<()> {
    let missing = settings.missing_badges();
    if !missing.is_empty() {
        warn!(
            badge_dir = %settings.badge_dir.display(),
            missing = ?missing,
            "badge assets missing; those badges will 404"
        );
    }

    let project_count = registry.len();
    let state = build_state(&settings, registry);
    let app = build_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&settings.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", settings.addr))?;

    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, projects = project_count, "forge-ci listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Builds are never cancelled; say so if any are still going.
    let busy: Vec<&str> = state
        .registry
        .names()
        .filter(|name| {
            state
                .registry
                .get(name)
                .is_some_and(|entry| entry.slot() != BuildSlot::Idle)
        })
        .collect();
    if !busy.is_empty() {
        warn!(projects = ?busy, "shutting down with builds still running");
    }

    info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
