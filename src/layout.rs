//! The on-disk layout of a diagnostic bundle.
//!
//! Every bundle is a directory `<output_dir>/<bundle_name>/` with a fixed set
//! of category subdirectories. Checks write into exactly one category, and the
//! whole tree is archived to `<output_dir>/<bundle_name>.tar.gz` at the end of
//! a run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// The subdirectory a check writes its output into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// CPU, memory, disk and process usage.
    Resources,
    /// Kernel, OS release and installed packages.
    System,
    /// Copies of configuration files from `/etc`.
    SystemEtc,
    /// Listings and configuration of the supported product.
    EnterpriseFind,
    /// Interfaces, routes and sockets.
    Networking,
    /// System and product logs.
    Logs,
}

impl Category {
    /// All categories, in the order their directories are created.
    pub const ALL: [Category; 6] = [
        Category::Resources,
        Category::System,
        Category::SystemEtc,
        Category::EnterpriseFind,
        Category::Networking,
        Category::Logs,
    ];

    /// Directory of this category relative to the bundle root.
    pub fn relative_dir(&self) -> &'static str {
        match self {
            Category::Resources => "resources",
            Category::System => "system",
            Category::SystemEtc => "system/etc",
            Category::EnterpriseFind => "enterprise/find",
            Category::Networking => "networking",
            Category::Logs => "logs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.relative_dir())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "resources" => Ok(Category::Resources),
            "system" => Ok(Category::System),
            "system/etc" | "system-etc" | "etc" => Ok(Category::SystemEtc),
            "enterprise/find" | "enterprise-find" | "enterprise" => Ok(Category::EnterpriseFind),
            "networking" | "network" => Ok(Category::Networking),
            "logs" => Ok(Category::Logs),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Check that `name` is usable as a bundle name.
///
/// The name becomes a directory directly below the output directory that is
/// later removed, so it must be a single normal path component.
pub fn validate_bundle_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single || name.contains(['/', '\\', '\0']) {
        return Err(Error::Config(format!("invalid bundle name '{}'", name)));
    }
    Ok(())
}

/// Paths of a single bundle on disk.
#[derive(Debug, Clone)]
pub struct BundleLayout {
    output_dir: PathBuf,
    bundle_name: String,
    root: PathBuf,
}

impl BundleLayout {
    /// Describe a bundle named `bundle_name` below `output_dir`.
    ///
    /// Nothing is created on disk until [`BundleLayout::create`] is called.
    pub fn new(output_dir: impl Into<PathBuf>, bundle_name: impl Into<String>) -> Self {
        let output_dir = output_dir.into();
        let bundle_name = bundle_name.into();
        let root = output_dir.join(&bundle_name);
        Self {
            output_dir,
            bundle_name,
            root,
        }
    }

    /// Create the bundle root and every category directory.
    pub fn create(&self) -> Result<()> {
        for category in Category::ALL {
            let dir = self.dir(category);
            std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        }
        Ok(())
    }

    /// Directory the bundle tree lives in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory the archive is written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Name of the bundle, also the top-level directory inside the archive.
    pub fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    /// Absolute directory of a category.
    pub fn dir(&self, category: Category) -> PathBuf {
        self.root.join(category.relative_dir())
    }

    /// Path a check with the given category and output name writes to.
    pub fn output_path(&self, category: Category, file_name: &str) -> PathBuf {
        self.dir(category).join(file_name)
    }

    /// Path of the finished archive.
    pub fn archive_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.tar.gz", self.bundle_name))
    }

    /// Remove the bundle tree. A tree that is already gone is not an error.
    pub fn discard(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&self.root, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_makes_all_category_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let layout = BundleLayout::new(temp_dir.path(), "bundle");
        layout.create().unwrap();
        // second call is a no-op
        layout.create().unwrap();

        for category in Category::ALL {
            assert!(layout.dir(category).is_dir(), "{} missing", category);
        }
        assert!(temp_dir.path().join("bundle/system/etc").is_dir());
        assert!(temp_dir.path().join("bundle/enterprise/find").is_dir());
    }

    #[test]
    fn test_paths() {
        let layout = BundleLayout::new("/tmp", "diag");
        assert_eq!(
            layout.output_path(Category::SystemEtc, "hosts"),
            PathBuf::from("/tmp/diag/system/etc/hosts")
        );
        assert_eq!(layout.archive_path(), PathBuf::from("/tmp/diag.tar.gz"));
    }

    #[test]
    fn test_discard_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let layout = BundleLayout::new(temp_dir.path(), "bundle");
        layout.create().unwrap();
        layout.discard().unwrap();
        assert!(!layout.root().exists());
        layout.discard().unwrap();
    }

    #[test]
    fn test_validate_bundle_name() {
        assert!(validate_bundle_name("hostdiag-db01-20240305-070809").is_ok());
        assert!(validate_bundle_name("bundle.v2").is_ok());
        for name in ["", ".", "..", "../escape", "a/b", "/abs", "a\\b", "nul\0byte"] {
            assert!(
                matches!(validate_bundle_name(name), Err(Error::Config(_))),
                "{:?} accepted",
                name
            );
        }
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("system/etc".parse::<Category>(), Ok(Category::SystemEtc));
        assert_eq!("Logs".parse::<Category>(), Ok(Category::Logs));
        assert!("kernel".parse::<Category>().is_err());
    }
}
