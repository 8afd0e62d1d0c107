use anyhow::Result;

use super::{ExportDocument, Format, GENERATOR};

/// WordPress `.l10n.php` translation file
pub struct Php;

/// PHP string literal. NUL and EOT (the plural and context separators) are
/// emitted as double-quoted escapes concatenated onto single-quoted parts.
fn php_literal(s: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();

    for ch in s.chars() {
        match ch {
            '\0' | '\u{4}' => {
                parts.push(format!("'{}'", current));
                current.clear();
                parts.push(if ch == '\0' { "\"\\0\"" } else { "\"\\4\"" }.to_string());
            }
            '\\' => current.push_str("\\\\"),
            '\'' => current.push_str("\\'"),
            _ => current.push(ch),
        }
    }
    parts.push(format!("'{}'", current));

    // Drop empty single-quoted parts next to an escape
    if parts.len() > 1 {
        parts.retain(|p| p != "''");
    }
    parts.join(" . ")
}

impl Format for Php {
    fn slug(&self) -> &'static str {
        "php"
    }

    fn name(&self) -> &'static str {
        "PHP Translation File"
    }

    fn extension(&self) -> &'static str {
        "l10n.php"
    }

    fn render(&self, doc: &ExportDocument<'_>) -> Result<Vec<u8>> {
        let headers = [
            ("project-id-version", doc.project.name.clone()),
            ("po-revision-date", doc.revision_date()),
            ("plural-forms", doc.locale.plural_forms()),
            ("language", doc.locale.wp_locale.clone()),
            ("x-generator", GENERATOR.to_string()),
        ];

        let mut fields: Vec<String> = headers
            .iter()
            .map(|(k, v)| format!("{}=>{}", php_literal(k), php_literal(v)))
            .collect();

        let messages: Vec<String> = doc
            .translated()
            .map(|entry| {
                format!(
                    "{}=>{}",
                    php_literal(&entry.key()),
                    php_literal(&doc.forms(entry).join("\0"))
                )
            })
            .collect();
        fields.push(format!("'messages'=>[{}]", messages.join(",")));

        Ok(format!("<?php\nreturn [{}];\n", fields.join(",")).into_bytes())
    }
}
