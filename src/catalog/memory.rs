use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use super::{Entry, Project, ProjectSource, TranslationSet};

/// Catalog held in memory, usually loaded from a JSON seed:
///
/// ```json
/// {
///   "projects": [{"id": 1, "name": "Akismet", "slug": "akismet", "path": "akismet"}],
///   "translation_sets": [{"id": 1, "name": "French", "slug": "default", "locale": "fr", "project_id": 1}],
///   "entries": {"1": [{"singular": "Settings", "translations": ["Réglages"]}]}
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryCatalog {
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    translation_sets: Vec<TranslationSet>,
    /// Entries keyed by translation set id
    #[serde(default)]
    entries: BTreeMap<i64, Vec<Entry>>,
}

impl MemoryCatalog {
    pub fn new(
        projects: Vec<Project>,
        translation_sets: Vec<TranslationSet>,
        entries: BTreeMap<i64, Vec<Entry>>,
    ) -> Self {
        Self {
            projects,
            translation_sets,
            entries,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse catalog JSON")
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read catalog file {}", path.display()))?;
        Self::from_json(&content)
    }
}

#[async_trait]
impl ProjectSource for MemoryCatalog {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> =
            self.projects.iter().filter(|p| p.active).cloned().collect();
        projects.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(projects)
    }

    async fn find_project(&self, path: &str) -> Result<Option<Project>> {
        let wanted = path.trim_matches('/');
        Ok(self
            .projects
            .iter()
            .find(|p| p.active && p.path.trim_matches('/') == wanted)
            .cloned())
    }

    async fn translation_sets(&self, project_id: i64) -> Result<Vec<TranslationSet>> {
        let mut sets: Vec<TranslationSet> = self
            .translation_sets
            .iter()
            .filter(|s| s.project_id == project_id)
            .cloned()
            .collect();
        sets.sort_by(|a, b| a.locale.cmp(&b.locale).then_with(|| a.slug.cmp(&b.slug)));
        Ok(sets)
    }

    async fn entries(&self, set: &TranslationSet) -> Result<Vec<Entry>> {
        Ok(self.entries.get(&set.id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"{
        "projects": [
            {"id": 2, "name": "Hello Dolly", "slug": "hello-dolly", "path": "wp-plugins/hello-dolly", "parent_project_id": 1},
            {"id": 1, "name": "WP Plugins", "slug": "wp-plugins", "path": "wp-plugins"},
            {"id": 3, "name": "Retired", "slug": "retired", "path": "retired", "active": false}
        ],
        "translation_sets": [
            {"id": 11, "name": "German", "slug": "default", "locale": "de", "project_id": 2},
            {"id": 10, "name": "French (formal)", "slug": "formal", "locale": "fr", "project_id": 2},
            {"id": 12, "name": "French", "slug": "default", "locale": "fr", "project_id": 2}
        ],
        "entries": {
            "12": [{"singular": "Hello", "translations": ["Bonjour"]}]
        }
    }"#;

    #[tokio::test]
    async fn test_list_projects_sorted_and_active() {
        let catalog = MemoryCatalog::from_json(SEED).expect("seed");
        let projects = catalog.list_projects().await.expect("list");
        let paths: Vec<_> = projects.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["wp-plugins", "wp-plugins/hello-dolly"]);
    }

    #[tokio::test]
    async fn test_find_project_ignores_slashes_and_inactive() {
        let catalog = MemoryCatalog::from_json(SEED).expect("seed");
        let found = catalog
            .find_project("/wp-plugins/hello-dolly/")
            .await
            .expect("find");
        assert_eq!(found.map(|p| p.id), Some(2));

        assert!(catalog.find_project("retired").await.expect("find").is_none());
        assert!(catalog.find_project("missing").await.expect("find").is_none());
    }

    #[tokio::test]
    async fn test_translation_sets_ordered_by_locale_then_slug() {
        let catalog = MemoryCatalog::from_json(SEED).expect("seed");
        let sets = catalog.translation_sets(2).await.expect("sets");
        let ids: Vec<_> = sets.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![11, 12, 10]);
    }

    #[tokio::test]
    async fn test_entries_missing_set_is_empty() {
        let catalog = MemoryCatalog::from_json(SEED).expect("seed");
        let sets = catalog.translation_sets(2).await.expect("sets");
        assert!(catalog.entries(&sets[0]).await.expect("entries").is_empty());
        assert_eq!(catalog.entries(&sets[1]).await.expect("entries").len(), 1);
    }

    #[test]
    fn test_invalid_json() {
        assert!(MemoryCatalog::from_json("{not json").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(MemoryCatalog::from_file("/non/existent/catalog.json").is_err());
    }
}
