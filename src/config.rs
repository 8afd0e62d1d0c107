use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use crate::formats;

/// Which locale code ends up in exported file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileLocale {
    /// GlotPress locale slug, e.g. `pt-br`
    Slug,
    /// WordPress locale, e.g. `pt_BR`
    WpLocale,
}

impl FileLocale {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "slug" | "" => Ok(Self::Slug),
            "wp_locale" | "wp-locale" => Ok(Self::WpLocale),
            other => bail!("Invalid FILE_LOCALE: {}. Expected slug or wp_locale", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Catalog
    pub catalog_url: String,
    pub table_prefix: String,
    pub db_max_connections: u32,

    // HTTP
    pub port: u16,
    pub public_base_url: String,

    // Export
    pub export_root: PathBuf,
    pub export_formats: Vec<String>,
    pub file_locale: FileLocale,
    /// Locale suffix of archive names, e.g. `en_US`
    pub site_locale: String,

    // Access
    pub admin_api_key: Option<String>,
    pub download_access_key: Option<String>,

    // Scratch sweeper
    pub sweep_cron: String,
    pub sweep_max_age_minutes: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        let table_prefix = std::env::var("GP_TABLE_PREFIX").unwrap_or_else(|_| "gp_".to_string());
        if !table_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            bail!("GP_TABLE_PREFIX may only contain letters, digits and underscores");
        }

        let export_formats = parse_format_list(
            &std::env::var("EXPORT_FORMATS").unwrap_or_else(|_| "po,mo,php".to_string()),
        )?;

        Ok(Self {
            // Catalog
            catalog_url: std::env::var("CATALOG_URL").context("CATALOG_URL not set")?,
            table_prefix,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),

            // HTTP
            port,
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),

            // Export
            export_root: std::env::var("EXPORT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            export_formats,
            file_locale: FileLocale::parse(
                &std::env::var("FILE_LOCALE").unwrap_or_else(|_| "slug".to_string()),
            )?,
            site_locale: non_empty_var("SITE_LOCALE").unwrap_or_else(|| "en_US".to_string()),

            // Access (empty values count as unset)
            admin_api_key: non_empty_var("ADMIN_API_KEY"),
            download_access_key: non_empty_var("DOWNLOAD_ACCESS_KEY"),

            // Scratch sweeper
            sweep_cron: std::env::var("SWEEP_CRON")
                .unwrap_or_else(|_| "0 */15 * * * *".to_string()),
            sweep_max_age_minutes: std::env::var("SWEEP_MAX_AGE_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),
        })
    }

    /// Whether the catalog lives in PostgreSQL rather than a JSON seed file
    pub fn catalog_is_postgres(&self) -> bool {
        self.catalog_url.starts_with("postgres://") || self.catalog_url.starts_with("postgresql://")
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a comma-separated format list, rejecting slugs the registry does not know
pub fn parse_format_list(value: &str) -> Result<Vec<String>> {
    let mut slugs: Vec<String> = Vec::new();
    for slug in value.split(',').map(|s| s.trim().to_ascii_lowercase()) {
        if slug.is_empty() || slugs.contains(&slug) {
            continue;
        }
        if formats::get(&slug).is_none() {
            let known: Vec<&str> = formats::all().iter().map(|f| f.slug()).collect();
            bail!(
                "Unknown export format: {}. Available: {}",
                slug,
                known.join(", ")
            );
        }
        slugs.push(slug);
    }

    if slugs.is_empty() {
        bail!("EXPORT_FORMATS must name at least one format");
    }

    Ok(slugs)
}
