use anyhow::{Context, Result};
use serde_json::{json, Map, Value};

use super::{ExportDocument, Format, GENERATOR};

/// Jed 1.x JSON, as consumed by `wp.i18n` in the browser
pub struct Jed1x;

const DOMAIN: &str = "messages";

impl Format for Jed1x {
    fn slug(&self) -> &'static str {
        "jed1x"
    }

    fn name(&self) -> &'static str {
        "Jed 1.x (.json)"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, doc: &ExportDocument<'_>) -> Result<Vec<u8>> {
        let mut messages = Map::new();
        messages.insert(
            String::new(),
            json!({
                "domain": DOMAIN,
                "plural-forms": doc.locale.plural_forms(),
                "lang": doc.locale.wp_locale,
            }),
        );
        for entry in doc.translated() {
            let forms: Vec<Value> = doc
                .forms(entry)
                .into_iter()
                .map(|f| Value::String(f.to_string()))
                .collect();
            messages.insert(entry.key(), Value::Array(forms));
        }

        let document = json!({
            "translation-revision-date": doc.revision_date(),
            "generator": GENERATOR,
            "domain": DOMAIN,
            "locale_data": { "messages": messages },
        });

        serde_json::to_vec(&document).context("Failed to serialize Jed JSON")
    }
}
