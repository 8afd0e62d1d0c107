use anyhow::{bail, Result};

use super::{ExportDocument, Format, GENERATOR};

const MAGIC: u32 = 0x9504_12de;
const HEADER_SIZE: u32 = 28;

/// GNU MO binary catalog (little endian, no hash table)
pub struct Mo;

fn header_value(doc: &ExportDocument<'_>) -> String {
    format!(
        "Project-Id-Version: {}\n\
         PO-Revision-Date: {}\n\
         MIME-Version: 1.0\n\
         Content-Type: text/plain; charset=UTF-8\n\
         Content-Transfer-Encoding: 8bit\n\
         Plural-Forms: {}\n\
         X-Generator: {}\n\
         Language: {}\n",
        doc.project.name,
        doc.revision_date(),
        doc.locale.plural_forms(),
        GENERATOR,
        doc.locale.wp_locale,
    )
}

/// Key/value pairs sorted by key bytes, header first (its key is empty)
fn pairs(doc: &ExportDocument<'_>) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut pairs = vec![(Vec::new(), header_value(doc).into_bytes())];

    for entry in doc.translated() {
        let mut key = entry.key().into_bytes();
        if let Some(plural) = &entry.plural {
            key.push(0);
            key.extend_from_slice(plural.as_bytes());
        }
        let value = doc.forms(entry).join("\0").into_bytes();
        pairs.push((key, value));
    }

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs.dedup_by(|a, b| a.0 == b.0);
    pairs
}

fn to_u32(n: usize) -> Result<u32> {
    match u32::try_from(n) {
        Ok(n) => Ok(n),
        Err(_) => bail!("MO catalog exceeds 4 GiB"),
    }
}

impl Format for Mo {
    fn slug(&self) -> &'static str {
        "mo"
    }

    fn name(&self) -> &'static str {
        "Machine Object Message Catalog"
    }

    fn extension(&self) -> &'static str {
        "mo"
    }

    fn render(&self, doc: &ExportDocument<'_>) -> Result<Vec<u8>> {
        let pairs = pairs(doc);
        let count = to_u32(pairs.len())?;

        let originals_offset = HEADER_SIZE;
        let translations_offset = originals_offset + count * 8;
        let hash_offset = translations_offset + count * 8;
        // Strings follow both descriptor tables; each one is NUL-terminated
        let mut string_offset = hash_offset;

        let mut originals_table = Vec::with_capacity(pairs.len() * 8);
        let mut translations_table = Vec::with_capacity(pairs.len() * 8);
        let mut strings = Vec::new();

        for (key, _) in &pairs {
            let len = to_u32(key.len())?;
            originals_table.extend_from_slice(&len.to_le_bytes());
            originals_table.extend_from_slice(&string_offset.to_le_bytes());
            strings.extend_from_slice(key);
            strings.push(0);
            string_offset += len + 1;
        }
        for (_, value) in &pairs {
            let len = to_u32(value.len())?;
            translations_table.extend_from_slice(&len.to_le_bytes());
            translations_table.extend_from_slice(&string_offset.to_le_bytes());
            strings.extend_from_slice(value);
            strings.push(0);
            string_offset += len + 1;
        }

        let mut out = Vec::with_capacity(string_offset as usize);
        for word in [
            MAGIC,
            0, // revision
            count,
            originals_offset,
            translations_offset,
            0, // hash table size
            hash_offset,
        ] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&originals_table);
        out.extend_from_slice(&translations_table);
        out.extend_from_slice(&strings);
        Ok(out)
    }
}
