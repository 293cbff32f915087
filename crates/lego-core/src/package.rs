//! Zip packaging of a composite for distribution.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;

/// Write every file under `composite_dir` into a deflated zip at
/// `archive_path`. Entry names are relative to the composite root.
///
/// Returns the number of files archived.
pub fn package(composite_dir: &Path, archive_path: &Path) -> Result<usize> {
    if !composite_dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("composite directory {} does not exist", composite_dir.display()),
        )
        .into());
    }

    if let Some(parent) = archive_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(archive_path)?;
    let archive_real = fs::canonicalize(archive_path)?;

    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut count = 0;

    for entry in WalkDir::new(composite_dir).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        if fs::canonicalize(entry.path())? == archive_real {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(composite_dir)
            .unwrap_or(entry.path());
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        debug!("Adding {}", name);
        writer.start_file(name, options)?;
        let mut source = BufReader::new(File::open(entry.path())?);
        io::copy(&mut source, &mut writer)?;
        count += 1;
    }

    writer.finish()?;
    info!("Packaged {} files into {}", count, archive_path.display());
    Ok(count)
}
