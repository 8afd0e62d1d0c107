//! Zip packaging of a scratch directory.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Component, Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;

/// Archive member name for a relative path, always `/`-separated
pub fn member_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Zip `files` (relative to `base`) into `dest`, in the given order.
/// Parent directories get their own entries the first time they appear.
/// Returns the archive size in bytes.
pub fn zip_files(base: &Path, files: &[PathBuf], dest: &Path) -> Result<u64, ExportError> {
    let mut writer = ZipWriter::new(BufWriter::new(File::create(dest)?));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut directories: HashSet<String> = HashSet::new();
    for relative in files {
        let name = member_name(relative);
        if let Some((dir, _)) = name.rsplit_once('/') {
            if directories.insert(dir.to_string()) {
                writer.add_directory(format!("{}/", dir), options.unix_permissions(0o755))?;
            }
        }

        writer.start_file(name, options)?;
        let mut source = File::open(base.join(relative))?;
        io::copy(&mut source, &mut writer)?;
    }

    let mut inner = writer.finish()?;
    io::Write::flush(&mut inner)?;
    drop(inner);

    Ok(std::fs::metadata(dest)?.len())
}
