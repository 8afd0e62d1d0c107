//! Query-string parsing shared by the export routes and the CLI.

use serde::Deserialize;

use crate::error::ExportError;
use crate::formats::{self, Format};

/// Query parameters accepted by both export routes
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExportQuery {
    /// Comma-separated project paths (multi-project route only)
    pub projects: Option<String>,
    /// `flat` is accepted for links built by older installs
    #[serde(alias = "flat")]
    pub flatten: Option<String>,
    /// Comma-separated subset of the configured formats
    pub formats: Option<String>,
    /// Download access key from a shared link
    #[serde(alias = "download_key")]
    pub key: Option<String>,
}

impl ExportQuery {
    pub fn flatten(&self) -> bool {
        parse_flag(self.flatten.as_deref())
    }

    pub fn project_list(&self) -> Vec<String> {
        self.projects
            .as_deref()
            .map(parse_project_list)
            .unwrap_or_default()
    }
}

/// `1`, `true`, `yes` and `on` (any case) are true; anything else is false
pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

/// Split a comma-separated project list, trimming items and slashes and
/// dropping empties and repeats (first occurrence wins)
pub fn parse_project_list(value: &str) -> Vec<String> {
    let mut projects: Vec<String> = Vec::new();
    for item in value.split(',') {
        let path = item.trim().trim_matches('/');
        if path.is_empty() || projects.iter().any(|p| p == path) {
            continue;
        }
        projects.push(path.to_string());
    }
    projects
}

/// Formats for one request: the configured formats, optionally narrowed by
/// `requested`. The result keeps the configured order.
pub fn select_formats(
    configured: &[String],
    requested: Option<&str>,
) -> Result<Vec<&'static dyn Format>, ExportError> {
    let requested: Vec<String> = requested
        .unwrap_or("")
        .split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if let Some(unknown) = requested.iter().find(|r| !configured.contains(r)) {
        return Err(ExportError::UnknownFormat(unknown.clone()));
    }

    configured
        .iter()
        .filter(|slug| requested.is_empty() || requested.contains(slug))
        .map(|slug| formats::get(slug).ok_or_else(|| ExportError::UnknownFormat(slug.clone())))
        .collect()
}
