//! Archiving of the bundle tree.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::layout::BundleLayout;

/// A written bundle archive.
#[derive(Debug, Clone)]
pub struct BundleArchive {
    pub path: PathBuf,
    pub size: u64,
}

/// Write the bundle tree to `<output_dir>/<bundle_name>.tar.gz`.
///
/// Entries are stored below a top-level `<bundle_name>/` directory.
pub fn create_bundle_archive(layout: &BundleLayout) -> Result<BundleArchive> {
    let path = layout.archive_path();
    let archive_error = |e: std::io::Error| Error::Archive {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let file = File::create(&path).map_err(archive_error)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut archive = tar::Builder::new(encoder);
    archive.follow_symlinks(false);

    archive
        .append_dir_all(layout.bundle_name(), layout.root())
        .map_err(archive_error)?;

    let encoder = archive.into_inner().map_err(archive_error)?;
    encoder.finish().map_err(archive_error)?;

    let size = std::fs::metadata(&path).map_err(archive_error)?.len();
    tracing::info!("Wrote {} ({} bytes)", path.display(), size);

    Ok(BundleArchive { path, size })
}
