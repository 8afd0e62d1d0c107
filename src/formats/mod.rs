//! Export formats for translation sets.
//!
//! Each format turns one `ExportDocument` (a project's translation set in one
//! locale) into the bytes of a single file. Formats are looked up by slug,
//! the same slugs used in `EXPORT_FORMATS` and the `formats=` query parameter.

mod jed;
mod mo;
mod php;
mod po;

pub use jed::Jed1x;
pub use mo::Mo;
pub use php::Php;
pub use po::Po;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::catalog::{Entry, Project, TranslationSet};
use crate::locales::Locale;

/// Value of the generator header written into every export
pub const GENERATOR: &str = concat!("gp-bulk-export/", env!("CARGO_PKG_VERSION"));

/// Everything a format needs to render one file
#[derive(Debug, Clone)]
pub struct ExportDocument<'a> {
    pub project: &'a Project,
    pub set: &'a TranslationSet,
    pub locale: &'a Locale,
    pub entries: &'a [Entry],
    pub generated_at: DateTime<Utc>,
}

impl ExportDocument<'_> {
    /// Revision date in gettext header form, e.g. `2024-01-15 10:30:00+0000`
    pub fn revision_date(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M:%S%z").to_string()
    }

    /// Translated entries only, in catalog order
    pub fn translated(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.is_translated())
    }

    /// Translation forms sized for this locale: one for singular entries,
    /// `nplurals` (padded with empty strings) for plural entries
    pub fn forms<'e>(&self, entry: &'e Entry) -> Vec<&'e str> {
        let wanted = if entry.is_plural() {
            self.locale.nplurals.max(1) as usize
        } else {
            1
        };
        (0..wanted)
            .map(|i| entry.translations.get(i).map(String::as_str).unwrap_or(""))
            .collect()
    }
}

pub trait Format: Send + Sync {
    /// Slug used in configuration and query strings
    fn slug(&self) -> &'static str;

    /// Human-readable name for the admin page
    fn name(&self) -> &'static str;

    /// File extension without the leading dot
    fn extension(&self) -> &'static str;

    fn render(&self, doc: &ExportDocument<'_>) -> Result<Vec<u8>>;
}

static FORMATS: &[&dyn Format] = &[&Po, &Mo, &Php, &Jed1x];

/// All built-in formats
pub fn all() -> &'static [&'static dyn Format] {
    FORMATS
}

/// Look up a format by slug (case-insensitive)
pub fn get(slug: &str) -> Option<&'static dyn Format> {
    FORMATS
        .iter()
        .copied()
        .find(|f| f.slug().eq_ignore_ascii_case(slug))
}
