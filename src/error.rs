//! Error type returned by the export pipeline and the HTTP handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ExportError {
    /// No project path was supplied
    #[error("No project was specified. Pass a project path or a comma-separated list of projects.")]
    MissingProject,

    /// A requested format is not enabled
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    /// Every requested project was skipped or had no translation sets
    #[error("No translation files were found for the requested projects.")]
    NothingToExport,

    /// Missing or invalid access key
    #[error("A valid access key is required to download translations.")]
    Forbidden,

    /// Catalog lookup failed
    #[error("Catalog error: {0}")]
    Catalog(#[from] anyhow::Error),

    /// A format failed to render a translation set
    #[error("Rendering failed: {0}")]
    Render(#[source] anyhow::Error),

    /// Scratch directory or file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive packaging failed
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The blocking export task panicked or was cancelled
    #[error("Export task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ExportError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingProject | Self::UnknownFormat(_) => StatusCode::BAD_REQUEST,
            Self::NothingToExport => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Catalog(_) | Self::Render(_) | Self::Io(_) | Self::Zip(_) | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ExportError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = if status.is_server_error() {
            error!("Export failed: {:#}", self);
            "The export could not be completed. Please try again later.".to_string()
        } else {
            self.to_string()
        };
        (status, body).into_response()
    }
}
