use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;

use super::{Entry, Project, ProjectSource, TranslationSet};

/// GlotPress tables in PostgreSQL.
///
/// Expected columns (GlotPress schema, BIGINT ids, `active` stored as SMALLINT):
/// - `<prefix>projects(id, name, slug, path, parent_project_id, active)`
/// - `<prefix>translation_sets(id, name, slug, project_id, locale)`
/// - `<prefix>originals(id, project_id, context, singular, plural, "references", comment, status)`
/// - `<prefix>translations(original_id, translation_set_id, translation_0..translation_5, status)`
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
    prefix: String,
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: i64,
    name: String,
    slug: String,
    path: String,
    parent_project_id: Option<i64>,
    active: bool,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            name: row.name,
            slug: row.slug,
            path: row.path,
            parent_project_id: row.parent_project_id,
            active: row.active,
        }
    }
}

#[derive(Debug, FromRow)]
struct SetRow {
    id: i64,
    name: String,
    slug: String,
    locale: String,
    project_id: i64,
}

#[derive(Debug, Default, FromRow)]
struct EntryRow {
    context: Option<String>,
    singular: String,
    plural: Option<String>,
    references: Option<String>,
    comment: Option<String>,
    translation_0: Option<String>,
    translation_1: Option<String>,
    translation_2: Option<String>,
    translation_3: Option<String>,
    translation_4: Option<String>,
    translation_5: Option<String>,
}

impl From<EntryRow> for Entry {
    fn from(row: EntryRow) -> Self {
        let forms = [
            row.translation_0,
            row.translation_1,
            row.translation_2,
            row.translation_3,
            row.translation_4,
            row.translation_5,
        ];
        // Keep forms up to the last stored one; gaps become empty strings
        let last = forms.iter().rposition(|f| f.is_some());
        let translations = match last {
            Some(last) => forms[..=last]
                .iter()
                .map(|f| f.clone().unwrap_or_default())
                .collect(),
            None => Vec::new(),
        };

        Entry {
            context: row.context.filter(|c| !c.is_empty()),
            singular: row.singular,
            plural: row.plural.filter(|p| !p.is_empty()),
            translations,
            references: row
                .references
                .map(|r| r.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            extracted_comments: row.comment.filter(|c| !c.trim().is_empty()),
            translator_comments: None,
            flags: Vec::new(),
        }
    }
}

impl PgCatalog {
    pub async fn connect(url: &str, prefix: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .context("Failed to connect to the GlotPress database")?;

        Ok(Self {
            pool,
            prefix: prefix.to_string(),
        })
    }

    fn table(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    fn project_query(&self, filter: &str) -> String {
        format!(
            "SELECT id, name, slug, path, parent_project_id, (active = 1) AS active
             FROM {} WHERE active = 1 {} ORDER BY path",
            self.table("projects"),
            filter
        )
    }
}

#[async_trait]
impl ProjectSource for PgCatalog {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        let rows: Vec<ProjectRow> = sqlx::query_as(&self.project_query(""))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list projects")?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    async fn find_project(&self, path: &str) -> Result<Option<Project>> {
        let sql = self.project_query("AND TRIM(BOTH '/' FROM path) = $1");
        let row: Option<ProjectRow> = sqlx::query_as(&sql)
            .bind(path.trim_matches('/'))
            .fetch_optional(&self.pool)
            .await
            .context(format!("Failed to look up project {}", path))?;

        Ok(row.map(Project::from))
    }

    async fn translation_sets(&self, project_id: i64) -> Result<Vec<TranslationSet>> {
        let sql = format!(
            "SELECT id, name, slug, locale, project_id
             FROM {} WHERE project_id = $1 ORDER BY locale, slug",
            self.table("translation_sets")
        );
        let rows: Vec<SetRow> = sqlx::query_as(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .context(format!("Failed to list translation sets of project {}", project_id))?;

        Ok(rows
            .into_iter()
            .map(|r| TranslationSet {
                id: r.id,
                name: r.name,
                slug: r.slug,
                locale: r.locale,
                project_id: r.project_id,
            })
            .collect())
    }

    async fn entries(&self, set: &TranslationSet) -> Result<Vec<Entry>> {
        let sql = format!(
            "SELECT o.context, o.singular, o.plural, o.\"references\", o.comment,
                    t.translation_0, t.translation_1, t.translation_2,
                    t.translation_3, t.translation_4, t.translation_5
             FROM {originals} o
             LEFT JOIN {translations} t
               ON t.original_id = o.id
              AND t.translation_set_id = $1
              AND t.status = 'current'
             WHERE o.project_id = $2 AND o.status = '+active'
             ORDER BY o.id",
            originals = self.table("originals"),
            translations = self.table("translations"),
        );
        let rows: Vec<EntryRow> = sqlx::query_as(&sql)
            .bind(set.id)
            .bind(set.project_id)
            .fetch_all(&self.pool)
            .await
            .context(format!("Failed to load entries of translation set {}", set.id))?;

        Ok(rows.into_iter().map(Entry::from).collect())
    }
}
