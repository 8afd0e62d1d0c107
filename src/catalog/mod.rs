//! Read-only access to the GlotPress translation catalog.
//!
//! The catalog is owned by the host GlotPress installation; this service
//! never writes to it. Two sources are provided:
//!
//! - `PgCatalog`: the GlotPress tables in PostgreSQL
//! - `MemoryCatalog`: a JSON seed file, for local runs and tests

mod memory;
mod postgres;

pub use memory::MemoryCatalog;
pub use postgres::PgCatalog;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// Slash-separated slug path, unique across the catalog
    pub path: String,
    #[serde(default)]
    pub parent_project_id: Option<i64>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Project {
    /// Project path made safe for a single file or directory name
    pub fn dashed_path(&self) -> String {
        self.path.trim_matches('/').replace('/', "-")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationSet {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub locale: String,
    pub project_id: i64,
}

impl TranslationSet {
    pub fn is_default(&self) -> bool {
        self.slug == "default"
    }
}

/// One original string with its current translation (if any)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub context: Option<String>,
    pub singular: String,
    #[serde(default)]
    pub plural: Option<String>,
    /// One string per plural form; empty when untranslated
    #[serde(default)]
    pub translations: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub extracted_comments: Option<String>,
    #[serde(default)]
    pub translator_comments: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
}

impl Entry {
    pub fn is_plural(&self) -> bool {
        self.plural.is_some()
    }

    /// An entry counts as translated once any form has text
    pub fn is_translated(&self) -> bool {
        self.translations.iter().any(|t| !t.is_empty())
    }

    /// Lookup key shared by MO, PHP and Jed: `context\x04singular`
    pub fn key(&self) -> String {
        match &self.context {
            Some(ctx) => format!("{}\u{4}{}", ctx, self.singular),
            None => self.singular.clone(),
        }
    }
}

fn default_active() -> bool {
    true
}

#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// All active projects, ordered by path
    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// Resolve a slug path; `None` for unknown or inactive projects
    async fn find_project(&self, path: &str) -> Result<Option<Project>>;

    /// Translation sets of a project, ordered by locale then slug
    async fn translation_sets(&self, project_id: i64) -> Result<Vec<TranslationSet>>;

    /// Active originals of the set's project paired with current translations
    async fn entries(&self, set: &TranslationSet) -> Result<Vec<Entry>>;
}

/// Open the catalog named by `CATALOG_URL`
pub async fn connect(config: &Config) -> Result<Arc<dyn ProjectSource>> {
    if config.catalog_is_postgres() {
        info!("Using PostgreSQL catalog (table prefix {})", config.table_prefix);
        let catalog = PgCatalog::connect(
            &config.catalog_url,
            &config.table_prefix,
            config.db_max_connections,
        )
        .await?;
        Ok(Arc::new(catalog))
    } else {
        info!("Using JSON catalog from {}", config.catalog_url);
        let catalog = MemoryCatalog::from_file(&config.catalog_url)?;
        Ok(Arc::new(catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_key_with_context() {
        let entry = Entry {
            context: Some("verb".into()),
            singular: "Post".into(),
            ..Default::default()
        };
        assert_eq!(entry.key(), "verb\u{4}Post");
    }

    #[test]
    fn test_entry_translated_ignores_empty_forms() {
        let mut entry = Entry {
            singular: "File".into(),
            translations: vec![String::new(), String::new()],
            ..Default::default()
        };
        assert!(!entry.is_translated());

        entry.translations[1] = "Fichiers".into();
        assert!(entry.is_translated());
    }

    #[test]
    fn test_dashed_path() {
        let project = Project {
            id: 1,
            name: "Akismet".into(),
            slug: "akismet".into(),
            path: "wp-plugins/akismet/".into(),
            parent_project_id: Some(2),
            active: true,
        };
        assert_eq!(project.dashed_path(), "wp-plugins-akismet");
    }
}
