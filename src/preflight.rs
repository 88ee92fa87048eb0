//! Checks made before anything is written.

use std::path::{Path, PathBuf};
use sysinfo::Disks;

use crate::error::{Error, Result};

/// Free space of the filesystem holding `dir`, if its disk can be found.
///
/// The disk is the one whose mount point is the longest prefix of the
/// canonical path of `dir`.
pub fn available_space(dir: &Path) -> Result<Option<u64>> {
    let canonical = dir.canonicalize().map_err(|e| Error::io(dir, e))?;
    let disks = Disks::new_with_refreshed_list();

    let mounts = disks
        .iter()
        .map(|disk| (disk.mount_point().to_path_buf(), disk.available_space()));

    Ok(best_mount(&canonical, mounts))
}

fn best_mount(path: &Path, mounts: impl Iterator<Item = (PathBuf, u64)>) -> Option<u64> {
    mounts
        .filter(|(mount, _)| path.starts_with(mount))
        .max_by_key(|(mount, _)| mount.components().count())
        .map(|(_, available)| available)
}

/// Fail unless at least `required` bytes are free in `dir`.
///
/// When no disk matches `dir` the check is skipped with a warning, since
/// some platforms do not report every mount.
pub fn ensure_free_space(dir: &Path, required: u64) -> Result<()> {
    match available_space(dir)? {
        Some(available) if available < required => Err(Error::InsufficientSpace {
            path: dir.display().to_string(),
            available,
            required,
        }),
        Some(available) => {
            tracing::debug!(
                "{} bytes available in {}, {} required",
                available,
                dir.display(),
                required
            );
            Ok(())
        }
        None => {
            tracing::warn!(
                "Could not determine free space in {}, continuing",
                dir.display()
            );
            Ok(())
        }
    }
}

/// Check if running as root.
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_mount_prefers_longest_prefix() {
        let mounts = vec![
            (PathBuf::from("/"), 10),
            (PathBuf::from("/var"), 20),
            (PathBuf::from("/var/tmp"), 30),
            (PathBuf::from("/var/tmpfs"), 40),
        ];

        assert_eq!(
            best_mount(Path::new("/var/tmp/bundle"), mounts.clone().into_iter()),
            Some(30)
        );
        assert_eq!(
            best_mount(Path::new("/home/user"), mounts.clone().into_iter()),
            Some(10)
        );
        assert_eq!(best_mount(Path::new("/var/log"), mounts.into_iter()), Some(20));
    }

    #[test]
    fn test_best_mount_none() {
        let mounts = vec![(PathBuf::from("/data"), 10)];
        assert_eq!(best_mount(Path::new("/tmp"), mounts.into_iter()), None);
    }

    #[test]
    fn test_missing_dir_is_error() {
        assert!(ensure_free_space(Path::new("/nonexistent/hostdiag"), 0).is_err());
    }
}
