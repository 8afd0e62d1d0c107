//! Shared fixtures for unit tests.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::catalog::{Entry, MemoryCatalog, Project, TranslationSet};
use crate::config::{Config, FileLocale};
use crate::locales::{Locale, LocaleRegistry};

/// Config with no secrets, exporting po and mo into `export_root`
pub fn test_config(export_root: PathBuf) -> Config {
    Config {
        catalog_url: "catalog.json".to_string(),
        table_prefix: "gp_".to_string(),
        db_max_connections: 1,
        port: 8080,
        public_base_url: "https://translate.example.com".to_string(),
        export_root,
        export_formats: vec!["po".to_string(), "mo".to_string()],
        file_locale: FileLocale::Slug,
        site_locale: "en_US".to_string(),
        admin_api_key: None,
        download_access_key: None,
        sweep_cron: "0 */15 * * * *".to_string(),
        sweep_max_age_minutes: 60,
    }
}

pub fn simple_entry(singular: &str, translation: &str) -> Entry {
    Entry {
        singular: singular.to_string(),
        translations: if translation.is_empty() {
            Vec::new()
        } else {
            vec![translation.to_string()]
        },
        ..Default::default()
    }
}

pub fn plural_entry(singular: &str, plural: &str, forms: &[&str]) -> Entry {
    Entry {
        singular: singular.to_string(),
        plural: Some(plural.to_string()),
        translations: forms.iter().map(|f| f.to_string()).collect(),
        ..Default::default()
    }
}

fn project(id: i64, name: &str, path: &str, parent: Option<i64>) -> Project {
    Project {
        id,
        name: name.to_string(),
        slug: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        parent_project_id: parent,
        active: true,
    }
}

fn set(id: i64, locale: &str, slug: &str, project_id: i64) -> TranslationSet {
    TranslationSet {
        id,
        name: format!("{} ({})", locale, slug),
        slug: slug.to_string(),
        locale: locale.to_string(),
        project_id,
    }
}

/// Project, default set and resolved locale for rendering a single document
pub fn sample_document_parts(locale: &str) -> (Project, TranslationSet, Locale, Vec<Entry>) {
    (
        project(2, "Hello Dolly", "wp-plugins/hello-dolly", Some(1)),
        set(20, locale, "default", 2),
        LocaleRegistry::get().resolve(locale),
        vec![simple_entry("Hello", "Bonjour")],
    )
}

/// Catalog with a parent project, two plugins and one inactive project:
///
/// - `wp-plugins` (no sets)
/// - `wp-plugins/hello-dolly`: `de/default`, `fr/default`, `fr/formal`
/// - `wp-plugins/akismet`: `pt-br/default`
/// - `retired` (inactive)
pub fn sample_catalog() -> MemoryCatalog {
    let mut retired = project(4, "Retired", "retired", None);
    retired.active = false;

    let projects = vec![
        project(1, "WP Plugins", "wp-plugins", None),
        project(2, "Hello Dolly", "wp-plugins/hello-dolly", Some(1)),
        project(3, "Akismet", "wp-plugins/akismet", Some(1)),
        retired,
    ];
    let sets = vec![
        set(20, "fr", "default", 2),
        set(21, "de", "default", 2),
        set(22, "fr", "formal", 2),
        set(30, "pt-br", "default", 3),
        set(40, "fr", "default", 4),
    ];

    let mut entries = BTreeMap::new();
    entries.insert(
        20,
        vec![
            simple_entry("Hello", "Bonjour"),
            plural_entry("%d song", "%d songs", &["%d chanson", "%d chansons"]),
        ],
    );
    entries.insert(21, vec![simple_entry("Hello", "Hallo")]);
    entries.insert(22, vec![simple_entry("Hello", "Bonjour à vous")]);
    entries.insert(30, vec![simple_entry("Spam", "Spam"), simple_entry("Ham", "")]);
    entries.insert(40, vec![simple_entry("Old", "Vieux")]);

    MemoryCatalog::new(projects, sets, entries)
}
