//! Shareable download links for the admin page.

use serde::{Deserialize, Serialize};
use url::form_urlencoded::byte_serialize;

use crate::config::Config;
use crate::error::ExportError;
use crate::export::{package_archive_name, project_archive_name};
use crate::request::parse_project_list;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkRequest {
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub flatten: bool,
    #[serde(default)]
    pub include_key: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkResponse {
    pub url: String,
    /// Name the archive will be downloaded as
    pub filename: String,
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

/// Percent-encode each path segment, keeping the `/` separators
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| encode(segment).replace('+', "%20"))
        .collect::<Vec<_>>()
        .join("/")
}

/// Build the absolute download URL for a set of projects, plus the name of
/// the archive it will produce.
///
/// A single project uses the path route; several use the list route.
/// The access key is only embedded when asked for and configured.
pub fn build_link(config: &Config, request: &LinkRequest) -> Result<LinkResponse, ExportError> {
    let projects = parse_project_list(&request.projects.join(","));

    let mut query: Vec<(&str, String)> = Vec::new();
    let (mut url, filename) = match projects.as_slice() {
        [] => return Err(ExportError::MissingProject),
        [project] => (
            format!("{}/export/project/{}", config.public_base_url, encode_path(project)),
            project_archive_name(project, &config.site_locale),
        ),
        [first, ..] => {
            query.push(("projects", projects.join(",")));
            // project slugs are the last segment of their path
            let slug = first.rsplit('/').next().unwrap_or(first);
            (
                format!("{}/export/projects", config.public_base_url),
                package_archive_name(slug, &config.site_locale),
            )
        }
    };

    if request.flatten {
        query.push(("flatten", "1".to_string()));
    }
    if request.include_key {
        if let Some(key) = &config.download_access_key {
            query.push(("key", key.clone()));
        }
    }

    if !query.is_empty() {
        let encoded: Vec<String> = query
            .iter()
            .map(|(name, value)| format!("{}={}", name, encode(value)))
            .collect();
        url.push('?');
        url.push_str(&encoded.join("&"));
    }

    Ok(LinkResponse { url, filename })
}
