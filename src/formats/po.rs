use anyhow::Result;

use super::{ExportDocument, Format, GENERATOR};
use crate::catalog::Entry;

/// GNU gettext PO; keeps untranslated entries with an empty msgstr
pub struct Po;

/// Escape a string for use inside PO double quotes
pub(crate) fn escape_po(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Write `keyword "value"`, switching to the multi-line form when the value
/// has a newline before its end:
///
/// ```text
/// msgid ""
/// "first line\n"
/// "second line"
/// ```
fn push_keyword(out: &mut String, keyword: &str, value: &str) {
    let interior_newline = value
        .find('\n')
        .map(|i| i + 1 < value.len())
        .unwrap_or(false);

    if !interior_newline {
        out.push_str(&format!("{} \"{}\"\n", keyword, escape_po(value)));
        return;
    }

    out.push_str(&format!("{} \"\"\n", keyword));
    for chunk in value.split_inclusive('\n') {
        out.push_str(&format!("\"{}\"\n", escape_po(chunk)));
    }
}

fn push_comment(out: &mut String, prefix: &str, text: &str) {
    for line in text.lines() {
        if line.is_empty() {
            out.push_str(prefix.trim_end());
        } else {
            out.push_str(prefix);
            out.push_str(line);
        }
        out.push('\n');
    }
}

fn push_header(out: &mut String, doc: &ExportDocument<'_>) {
    let headers = [
        ("Project-Id-Version", doc.project.name.clone()),
        ("PO-Revision-Date", doc.revision_date()),
        ("MIME-Version", "1.0".to_string()),
        ("Content-Type", "text/plain; charset=UTF-8".to_string()),
        ("Content-Transfer-Encoding", "8bit".to_string()),
        ("Plural-Forms", doc.locale.plural_forms()),
        ("X-Generator", GENERATOR.to_string()),
        ("Language", doc.locale.wp_locale.clone()),
    ];

    out.push_str("# Translation of ");
    out.push_str(&doc.project.name);
    out.push_str(" in ");
    out.push_str(&doc.locale.english_name);
    out.push('\n');
    out.push_str("msgid \"\"\nmsgstr \"\"\n");
    for (name, value) in headers {
        out.push_str(&format!("\"{}: {}\\n\"\n", name, escape_po(&value)));
    }
}

fn push_entry(out: &mut String, doc: &ExportDocument<'_>, entry: &Entry) {
    out.push('\n');

    if let Some(comment) = &entry.translator_comments {
        push_comment(out, "# ", comment);
    }
    if let Some(comment) = &entry.extracted_comments {
        push_comment(out, "#. ", comment);
    }
    if !entry.references.is_empty() {
        out.push_str("#: ");
        out.push_str(&entry.references.join(" "));
        out.push('\n');
    }
    if !entry.flags.is_empty() {
        out.push_str("#, ");
        out.push_str(&entry.flags.join(", "));
        out.push('\n');
    }

    if let Some(ctx) = &entry.context {
        push_keyword(out, "msgctxt", ctx);
    }
    push_keyword(out, "msgid", &entry.singular);

    match &entry.plural {
        Some(plural) => {
            push_keyword(out, "msgid_plural", plural);
            for (i, form) in doc.forms(entry).into_iter().enumerate() {
                push_keyword(out, &format!("msgstr[{}]", i), form);
            }
        }
        None => {
            let form = doc.forms(entry).first().copied().unwrap_or("");
            push_keyword(out, "msgstr", form);
        }
    }
}

impl Format for Po {
    fn slug(&self) -> &'static str {
        "po"
    }

    fn name(&self) -> &'static str {
        "Portable Object Message Catalog"
    }

    fn extension(&self) -> &'static str {
        "po"
    }

    fn render(&self, doc: &ExportDocument<'_>) -> Result<Vec<u8>> {
        let mut out = String::with_capacity(256 + doc.entries.len() * 96);
        push_header(&mut out, doc);
        for entry in doc.entries {
            push_entry(&mut out, doc, entry);
        }
        Ok(out.into_bytes())
    }
}
