//! Bulk export pipeline.
//!
//! resolve projects -> scratch directory -> one file per (set x format)
//! -> zip -> read back -> remove scratch directory

use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::archive;
use crate::catalog::{Entry, Project, ProjectSource, TranslationSet};
use crate::config::{Config, FileLocale};
use crate::error::ExportError;
use crate::formats::{ExportDocument, Format};
use crate::locales::{Locale, LocaleRegistry};

/// Prefix of every scratch directory; the sweeper only touches these
pub const SCRATCH_PREFIX: &str = "gp-bulk-export-";

const ARCHIVE_FILE: &str = "archive.zip";

#[derive(Clone)]
pub struct ExportRequest {
    /// Project paths in the order they should appear in the archive
    pub projects: Vec<String>,
    /// Put every file at the archive root instead of one directory per project
    pub flatten: bool,
    pub formats: Vec<&'static dyn Format>,
}

#[derive(Debug)]
pub struct ExportArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub file_count: usize,
}

/// A resolved project with everything needed to render its files
struct ProjectBundle {
    project: Project,
    sets: Vec<(TranslationSet, Locale, Vec<Entry>)>,
}

fn unsafe_chars() -> &'static Regex {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    UNSAFE.get_or_init(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"))
}

/// Make a catalog value safe as a single path component
pub fn sanitize_component(value: &str) -> String {
    let cleaned = unsafe_chars().replace_all(value, "-");
    let cleaned = cleaned
        .trim_start_matches(|c| c == '.' || c == '-')
        .trim_end_matches('-');
    if cleaned.is_empty() {
        "project".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `<project-path-dashed>-<locale>[-<set-slug>]`; the format adds the extension
pub fn export_file_stem(
    project: &Project,
    set: &TranslationSet,
    locale: &Locale,
    file_locale: FileLocale,
) -> String {
    let locale_code = match file_locale {
        FileLocale::Slug => set.locale.as_str(),
        FileLocale::WpLocale => locale.wp_locale.as_str(),
    };
    let mut stem = format!("{}-{}", project.dashed_path(), locale_code);
    if !set.is_default() {
        stem.push('-');
        stem.push_str(&set.slug);
    }
    sanitize_component(&stem)
}

/// Archive name for a single requested project: `<project-path-dashed>-<site-locale>.zip`
pub fn project_archive_name(project_path: &str, site_locale: &str) -> String {
    let dashed = project_path.trim_matches('/').replace('/', "-");
    format!("{}.zip", sanitize_component(&format!("{}-{}", dashed, site_locale)))
}

/// Archive name for a project list: `<first-project-slug>-package-<site-locale>.zip`
pub fn package_archive_name(first_slug: &str, site_locale: &str) -> String {
    format!(
        "{}.zip",
        sanitize_component(&format!("{}-package-{}", first_slug, site_locale))
    )
}

/// Run a bulk export and return the finished archive.
///
/// Unknown projects are skipped with a warning. The scratch directory is
/// removed before this returns, whatever the outcome.
pub async fn run_export(
    source: &dyn ProjectSource,
    config: &Config,
    request: ExportRequest,
) -> Result<ExportArchive, ExportError> {
    let mut requested: Vec<&str> = Vec::new();
    for path in &request.projects {
        let path = path.trim().trim_matches('/');
        if !path.is_empty() && !requested.contains(&path) {
            requested.push(path);
        }
    }
    if requested.is_empty() {
        return Err(ExportError::MissingProject);
    }

    let registry = LocaleRegistry::get();
    let mut bundles: Vec<ProjectBundle> = Vec::new();
    for path in &requested {
        let project = match source.find_project(path).await? {
            Some(project) => project,
            None => {
                warn!("Skipping unknown project: {}", path);
                continue;
            }
        };
        if bundles.iter().any(|b| b.project.id == project.id) {
            debug!("{} already resolved, skipping repeat", path);
            continue;
        }

        let mut sets = Vec::new();
        for set in source.translation_sets(project.id).await? {
            let entries = source.entries(&set).await?;
            let locale = registry.resolve(&set.locale);
            sets.push((set, locale, entries));
        }
        debug!("Resolved {} with {} translation sets", project.path, sets.len());
        bundles.push(ProjectBundle { project, sets });
    }

    let single = requested.len() == 1;
    let export_root = config.export_root.clone();
    let site_locale = config.site_locale.clone();
    let file_locale = config.file_locale;
    let formats = request.formats;
    let flatten = request.flatten;

    tokio::task::spawn_blocking(move || {
        let layout = Layout {
            formats: &formats,
            flatten,
            file_locale,
        };
        build_archive(&export_root, &bundles, &layout, single, &site_locale, Utc::now())
    })
    .await?
}

/// How files are named and placed inside the archive
struct Layout<'a> {
    formats: &'a [&'static dyn Format],
    flatten: bool,
    file_locale: FileLocale,
}

/// Write every file into a fresh scratch directory and zip it
fn build_archive(
    export_root: &Path,
    bundles: &[ProjectBundle],
    layout: &Layout<'_>,
    single: bool,
    site_locale: &str,
    now: DateTime<Utc>,
) -> Result<ExportArchive, ExportError> {
    std::fs::create_dir_all(export_root)?;
    let scratch = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir_in(export_root)?;

    let written = write_files(scratch.path(), bundles, layout, now)?;
    let first = match (bundles.first(), written.is_empty()) {
        (Some(bundle), false) => &bundle.project,
        _ => return Err(ExportError::NothingToExport),
    };

    let archive_path = scratch.path().join(ARCHIVE_FILE);
    let size = archive::zip_files(scratch.path(), &written, &archive_path)?;
    let bytes = std::fs::read(&archive_path)?;

    let file_name = if single {
        project_archive_name(&first.path, site_locale)
    } else {
        package_archive_name(&first.slug, site_locale)
    };

    info!(
        "Built {} with {} files ({} bytes)",
        file_name,
        written.len(),
        size
    );

    let scratch_path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        warn!(
            "Failed to remove scratch directory {}: {}",
            scratch_path.display(),
            e
        );
    }

    Ok(ExportArchive {
        file_name,
        bytes,
        file_count: written.len(),
    })
}

/// Pick a free archive path for `<stem>.<ext>`, suffixing the set id
/// (and then a counter) when another file already took the name
fn unique_file(
    used: &mut HashSet<PathBuf>,
    dir: &Path,
    stem: &str,
    extension: &str,
    set_id: i64,
) -> PathBuf {
    let wanted = dir.join(format!("{}.{}", stem, extension));
    if used.insert(wanted.clone()) {
        return wanted;
    }

    let mut candidate = dir.join(format!("{}-{}.{}", stem, set_id, extension));
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = dir.join(format!("{}-{}-{}.{}", stem, set_id, n, extension));
        n += 1;
    }
    warn!(
        "{} is already in the archive, writing {} instead",
        wanted.display(),
        candidate.display()
    );
    candidate
}

/// Render all (set x format) files, returning their paths relative to `base`
/// in the order written
fn write_files(
    base: &Path,
    bundles: &[ProjectBundle],
    layout: &Layout<'_>,
    now: DateTime<Utc>,
) -> Result<Vec<PathBuf>, ExportError> {
    let mut written = Vec::new();
    let mut used: HashSet<PathBuf> = HashSet::new();
    // project directory -> id of the project that owns it
    let mut dirs: HashMap<PathBuf, i64> = HashMap::new();

    for bundle in bundles {
        let project_dir = if layout.flatten {
            PathBuf::new()
        } else {
            let dir = PathBuf::from(sanitize_component(&bundle.project.dashed_path()));
            match dirs.get(&dir).copied() {
                Some(owner) if owner != bundle.project.id => {
                    let renamed = PathBuf::from(format!(
                        "{}-{}",
                        dir.display(),
                        bundle.project.id
                    ));
                    warn!(
                        "Directory {} is taken by project {}, using {} for {}",
                        dir.display(),
                        owner,
                        renamed.display(),
                        bundle.project.path
                    );
                    dirs.insert(renamed.clone(), bundle.project.id);
                    renamed
                }
                _ => {
                    dirs.insert(dir.clone(), bundle.project.id);
                    dir
                }
            }
        };
        if !bundle.sets.is_empty() {
            std::fs::create_dir_all(base.join(&project_dir))?;
        }

        for (set, locale, entries) in &bundle.sets {
            let doc = ExportDocument {
                project: &bundle.project,
                set,
                locale,
                entries,
                generated_at: now,
            };

            let stem = export_file_stem(&bundle.project, set, locale, layout.file_locale);
            for format in layout.formats {
                let bytes = format.render(&doc).map_err(ExportError::Render)?;
                let relative =
                    unique_file(&mut used, &project_dir, &stem, format.extension(), set.id);
                std::fs::write(base.join(&relative), bytes)?;
                written.push(relative);
            }
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::formats;
    use crate::test_support::{sample_catalog, sample_document_parts, simple_entry, test_config};
    use std::collections::BTreeMap;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn request(projects: &[&str], flatten: bool) -> ExportRequest {
        ExportRequest {
            projects: projects.iter().map(|p| p.to_string()).collect(),
            flatten,
            formats: vec![
                formats::get("po").expect("po"),
                formats::get("mo").expect("mo"),
            ],
        }
    }

    fn member_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = ZipArchive::new(std::io::Cursor::new(bytes)).expect("valid zip");
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    fn scratch_dirs(root: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(root)
            .map(|rd| {
                rd.filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| {
                        p.file_name()
                            .and_then(|n| n.to_str())
                            .map(|n| n.starts_with(SCRATCH_PREFIX))
                            .unwrap_or(false)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    // ==================== Naming Tests ====================

    #[test]
    fn test_export_file_stem_default_set() {
        let (project, set, locale, _) = sample_document_parts("pt-br");
        assert_eq!(
            export_file_stem(&project, &set, &locale, FileLocale::Slug),
            "wp-plugins-hello-dolly-pt-br"
        );
        assert_eq!(
            export_file_stem(&project, &set, &locale, FileLocale::WpLocale),
            "wp-plugins-hello-dolly-pt_BR"
        );
    }

    #[test]
    fn test_export_file_stem_named_set() {
        let (project, mut set, locale, _) = sample_document_parts("de");
        set.slug = "formal".into();
        assert_eq!(
            export_file_stem(&project, &set, &locale, FileLocale::Slug),
            "wp-plugins-hello-dolly-de-formal"
        );
    }

    #[test]
    fn test_unique_file_suffixes_set_id() {
        let mut used = HashSet::new();
        let dir = Path::new("proj");
        assert_eq!(
            unique_file(&mut used, dir, "proj-fr", "po", 7),
            PathBuf::from("proj/proj-fr.po")
        );
        assert_eq!(
            unique_file(&mut used, dir, "proj-fr", "po", 7),
            PathBuf::from("proj/proj-fr-7.po")
        );
        assert_eq!(
            unique_file(&mut used, dir, "proj-fr", "po", 7),
            PathBuf::from("proj/proj-fr-7-2.po")
        );
        // other extensions are independent
        assert_eq!(
            unique_file(&mut used, dir, "proj-fr", "mo", 7),
            PathBuf::from("proj/proj-fr.mo")
        );
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("../../etc"), "etc");
        assert_eq!(sanitize_component("a b/c"), "a-b-c");
        assert_eq!(sanitize_component("..."), "project");
    }

    #[test]
    fn test_archive_names() {
        assert_eq!(
            project_archive_name("wp-plugins/hello-dolly", "en_US"),
            "wp-plugins-hello-dolly-en_US.zip"
        );
        assert_eq!(
            project_archive_name("/akismet/", "de_DE"),
            "akismet-de_DE.zip"
        );
        assert_eq!(
            package_archive_name("akismet", "en_US"),
            "akismet-package-en_US.zip"
        );
        assert_eq!(
            package_archive_name("../x", "en US"),
            "x-package-en-US.zip"
        );
    }

    // ==================== run_export Tests ====================

    #[tokio::test]
    async fn test_single_project_hierarchical() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = test_config(temp_dir.path().to_path_buf());
        let catalog = sample_catalog();

        let archive = run_export(&catalog, &config, request(&["wp-plugins/hello-dolly"], false))
            .await
            .expect("export");

        assert_eq!(archive.file_name, "wp-plugins-hello-dolly-en_US.zip");
        assert_eq!(archive.file_count, 6);
        assert_eq!(
            member_names(&archive.bytes),
            vec![
                "wp-plugins-hello-dolly/",
                "wp-plugins-hello-dolly/wp-plugins-hello-dolly-de.po",
                "wp-plugins-hello-dolly/wp-plugins-hello-dolly-de.mo",
                "wp-plugins-hello-dolly/wp-plugins-hello-dolly-fr.po",
                "wp-plugins-hello-dolly/wp-plugins-hello-dolly-fr.mo",
                "wp-plugins-hello-dolly/wp-plugins-hello-dolly-fr-formal.po",
                "wp-plugins-hello-dolly/wp-plugins-hello-dolly-fr-formal.mo",
            ]
        );
    }

    #[tokio::test]
    async fn test_multi_project_flattened_in_request_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = test_config(temp_dir.path().to_path_buf());
        let catalog = sample_catalog();

        let mut req = request(&["wp-plugins/akismet", "wp-plugins/hello-dolly"], true);
        req.formats = vec![formats::get("po").unwrap()];
        let archive = run_export(&catalog, &config, req).await.expect("export");

        assert_eq!(archive.file_name, "akismet-package-en_US.zip");
        assert_eq!(
            member_names(&archive.bytes),
            vec![
                "wp-plugins-akismet-pt-br.po",
                "wp-plugins-hello-dolly-de.po",
                "wp-plugins-hello-dolly-fr.po",
                "wp-plugins-hello-dolly-fr-formal.po",
            ]
        );

        let mut zip = ZipArchive::new(std::io::Cursor::new(&archive.bytes)).unwrap();
        let mut po = String::new();
        zip.by_name("wp-plugins-hello-dolly-fr.po")
            .unwrap()
            .read_to_string(&mut po)
            .unwrap();
        assert!(po.contains("msgstr \"Bonjour\""));
        assert!(po.contains("msgstr[1] \"%d chansons\""));
    }

    #[tokio::test]
    async fn test_unknown_projects_are_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = test_config(temp_dir.path().to_path_buf());
        let catalog = sample_catalog();

        let archive = run_export(
            &catalog,
            &config,
            request(&["missing", "retired", "wp-plugins/akismet"], false),
        )
        .await
        .expect("export");

        // a list names the archive after the first project that resolved
        assert_eq!(archive.file_name, "akismet-package-en_US.zip");
        assert_eq!(archive.file_count, 2);
    }

    #[tokio::test]
    async fn test_missing_project() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = test_config(temp_dir.path().to_path_buf());

        let result = run_export(&sample_catalog(), &config, request(&[], false)).await;
        assert!(matches!(result, Err(ExportError::MissingProject)));
    }

    #[tokio::test]
    async fn test_nothing_to_export() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = test_config(temp_dir.path().to_path_buf());

        // wp-plugins exists but has no translation sets
        let result =
            run_export(&sample_catalog(), &config, request(&["wp-plugins", "nope"], false)).await;
        assert!(matches!(result, Err(ExportError::NothingToExport)));
        assert!(scratch_dirs(temp_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_scratch_directory_removed_after_success() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = test_config(temp_dir.path().to_path_buf());

        run_export(&sample_catalog(), &config, request(&["wp-plugins/akismet"], true))
            .await
            .expect("export");
        assert!(scratch_dirs(temp_dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_export_root_created_when_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("nested").join("exports");
        let config = test_config(root.clone());

        run_export(&sample_catalog(), &config, request(&["wp-plugins/akismet"], true))
            .await
            .expect("export");
        assert!(root.is_dir());
    }

    // ==================== Name Collision Tests ====================

    fn project(id: i64, path: &str) -> Project {
        Project {
            id,
            name: path.to_string(),
            slug: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            parent_project_id: None,
            active: true,
        }
    }

    fn set(id: i64, locale: &str, slug: &str, project_id: i64) -> TranslationSet {
        TranslationSet {
            id,
            name: locale.to_string(),
            slug: slug.to_string(),
            locale: locale.to_string(),
            project_id,
        }
    }

    fn colliding_projects() -> MemoryCatalog {
        let mut entries = BTreeMap::new();
        entries.insert(10, vec![simple_entry("Hello", "Bonjour")]);
        entries.insert(11, vec![simple_entry("Hello", "Salut")]);
        MemoryCatalog::new(
            vec![project(1, "foo/bar"), project(2, "foo-bar")],
            vec![set(10, "fr", "default", 1), set(11, "fr", "default", 2)],
            entries,
        )
    }

    fn po_only(projects: &[&str], flatten: bool) -> ExportRequest {
        let mut req = request(projects, flatten);
        req.formats = vec![formats::get("po").unwrap()];
        req
    }

    #[tokio::test]
    async fn test_colliding_project_paths_flattened() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = test_config(temp_dir.path().to_path_buf());

        let archive = run_export(
            &colliding_projects(),
            &config,
            po_only(&["foo/bar", "foo-bar"], true),
        )
        .await
        .expect("export");

        assert_eq!(archive.file_count, 2);
        assert_eq!(
            member_names(&archive.bytes),
            vec!["foo-bar-fr.po", "foo-bar-fr-11.po"]
        );

        let mut zip = ZipArchive::new(std::io::Cursor::new(&archive.bytes)).unwrap();
        let mut po = String::new();
        zip.by_name("foo-bar-fr-11.po")
            .unwrap()
            .read_to_string(&mut po)
            .unwrap();
        assert!(po.contains("msgstr \"Salut\""));
    }

    #[tokio::test]
    async fn test_colliding_project_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = test_config(temp_dir.path().to_path_buf());

        let archive = run_export(
            &colliding_projects(),
            &config,
            po_only(&["foo/bar", "foo-bar"], false),
        )
        .await
        .expect("export");

        assert_eq!(
            member_names(&archive.bytes),
            vec![
                "foo-bar/",
                "foo-bar/foo-bar-fr.po",
                "foo-bar-2/",
                "foo-bar-2/foo-bar-fr.po",
            ]
        );
    }

    #[tokio::test]
    async fn test_colliding_locale_and_set_slug() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = test_config(temp_dir.path().to_path_buf());

        // `pt-br/default` and `pt/br` both give `proj-pt-br`
        let mut entries = BTreeMap::new();
        entries.insert(10, vec![simple_entry("Hello", "Olá")]);
        entries.insert(11, vec![simple_entry("Hello", "Olá!")]);
        let catalog = MemoryCatalog::new(
            vec![project(1, "proj")],
            vec![set(10, "pt-br", "default", 1), set(11, "pt", "br", 1)],
            entries,
        );

        let archive = run_export(&catalog, &config, request(&["proj"], true))
            .await
            .expect("export");

        assert_eq!(archive.file_count, 4);
        assert_eq!(
            member_names(&archive.bytes),
            vec![
                "proj-pt-br.po",
                "proj-pt-br.mo",
                "proj-pt-br-10.po",
                "proj-pt-br-10.mo",
            ]
        );
    }

    #[tokio::test]
    async fn test_repeated_project_exported_once() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = test_config(temp_dir.path().to_path_buf());

        let archive = run_export(
            &sample_catalog(),
            &config,
            request(&["wp-plugins/akismet", "/wp-plugins/akismet/"], true),
        )
        .await
        .expect("export");

        assert_eq!(archive.file_count, 2);
        // both spellings are the same request
        assert_eq!(archive.file_name, "wp-plugins-akismet-en_US.zip");
    }
}
