use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::admin::{self, ProjectNode};
use crate::catalog::ProjectSource;
use crate::config::Config;
use crate::error::ExportError;
use crate::export::{self, ExportArchive, ExportRequest};
use crate::links::{self, LinkRequest, LinkResponse};
use crate::request::{select_formats, ExportQuery};
use crate::security;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub source: Arc<dyn ProjectSource>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    pub api_key: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/export/project", get(export_without_project))
        .route("/export/project/*path", get(export_project))
        .route("/export/projects", get(export_projects))
        .route("/admin", get(admin_page))
        .route("/admin/api/projects", get(admin_projects))
        .route("/admin/api/link", post(admin_link))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve(state: AppState) -> Result<()> {
    let addr = format!("0.0.0.0:{}", state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

fn api_key_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok())
}

fn archive_response(archive: ExportArchive) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", archive.file_name);
    (
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, archive.bytes.len().to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        archive.bytes,
    )
        .into_response()
}

async fn health() -> &'static str {
    "OK"
}

// ==================== Export Routes ====================

async fn run(
    state: &AppState,
    projects: Vec<String>,
    query: &ExportQuery,
    headers: &HeaderMap,
) -> Result<Response, ExportError> {
    if !security::download_allowed(&state.config, query.key.as_deref(), api_key_header(headers)) {
        return Err(ExportError::Forbidden);
    }

    let request = ExportRequest {
        projects,
        flatten: query.flatten(),
        formats: select_formats(&state.config.export_formats, query.formats.as_deref())?,
    };
    let archive = export::run_export(state.source.as_ref(), &state.config, request).await?;
    Ok(archive_response(archive))
}

async fn export_without_project() -> Result<Response, ExportError> {
    Err(ExportError::MissingProject)
}

async fn export_project(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<ExportQuery>,
    headers: HeaderMap,
) -> Result<Response, ExportError> {
    let path = path.trim_matches('/');
    let projects = if path.is_empty() {
        Vec::new()
    } else {
        vec![path.to_string()]
    };
    run(&state, projects, &query, &headers).await
}

async fn export_projects(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
    headers: HeaderMap,
) -> Result<Response, ExportError> {
    run(&state, query.project_list(), &query, &headers).await
}

// ==================== Admin Routes ====================

fn authorize_admin(
    config: &Config,
    headers: &HeaderMap,
    query: &AdminQuery,
) -> Result<(), ExportError> {
    let presented = api_key_header(headers).or(query.api_key.as_deref());
    if security::admin_allowed(config, presented) {
        Ok(())
    } else {
        Err(ExportError::Forbidden)
    }
}

async fn project_tree(state: &AppState) -> Result<Vec<ProjectNode>, ExportError> {
    let projects = state.source.list_projects().await?;
    Ok(admin::build_tree(&projects))
}

async fn admin_page(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
    headers: HeaderMap,
) -> Result<Html<String>, ExportError> {
    authorize_admin(&state.config, &headers, &query)?;

    let tree = project_tree(&state).await?;
    let formats = select_formats(&state.config.export_formats, None)?;
    Ok(Html(admin::render_page(
        &tree,
        &formats,
        state.config.download_access_key.is_some(),
        &state.config.public_base_url,
    )))
}

async fn admin_projects(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProjectNode>>, ExportError> {
    authorize_admin(&state.config, &headers, &query)?;
    Ok(Json(project_tree(&state).await?))
}

async fn admin_link(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
    headers: HeaderMap,
    Json(request): Json<LinkRequest>,
) -> Result<Json<LinkResponse>, ExportError> {
    authorize_admin(&state.config, &headers, &query)?;
    Ok(Json(links::build_link(&state.config, &request)?))
}
