//! The table of diagnostic checks.
//!
//! A [`Check`] names one piece of output in the bundle and the [`Action`]
//! that produces it. [`builtin_checks`] builds the table for a platform by
//! dispatching on OS family and package manager, then appends the product
//! snapshots and any user-defined checks from the configuration.

pub mod logs;
pub mod networking;
pub mod product;
pub mod resources;
pub mod snapshot;
pub mod system;

pub use snapshot::SnapshotKind;

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::config::DiagConfig;
use crate::layout::Category;
use crate::platform::Platform;

/// How a check produces its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run a program and capture stdout and stderr into the output file.
    Command { program: String, args: Vec<String> },
    /// Run a script through `/bin/sh -c`. Used for shell builtins.
    Shell(String),
    /// Copy a single file.
    CopyFile(PathBuf),
    /// Copy a directory tree, descending at most `max_depth` levels.
    CopyTree { source: PathBuf, max_depth: usize },
    /// Write a `find -ls` style listing of a directory tree.
    FindListing { root: PathBuf, max_depth: usize },
    /// Write a summary gathered in-process.
    Snapshot(SnapshotKind),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Command { program, args } if args.is_empty() => write!(f, "{}", program),
            Action::Command { program, args } => write!(f, "{} {}", program, args.join(" ")),
            Action::Shell(script) => write!(f, "sh -c '{}'", script),
            Action::CopyFile(path) => write!(f, "copy {}", path.display()),
            Action::CopyTree { source, max_depth } => {
                write!(f, "copy tree {} (depth {})", source.display(), max_depth)
            }
            Action::FindListing { root, max_depth } => {
                write!(f, "list {} (depth {})", root.display(), max_depth)
            }
            Action::Snapshot(kind) => write!(f, "snapshot {}", kind),
        }
    }
}

/// A single registered diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    /// Unique name, used in logs and the manifest.
    pub name: String,
    /// Directory the output goes into.
    pub category: Category,
    /// File (or directory, for tree copies) name inside the category.
    pub output: String,
    pub action: Action,
}

impl Check {
    pub fn new(
        name: impl Into<String>,
        category: Category,
        output: impl Into<String>,
        action: Action,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            output: output.into(),
            action,
        }
    }

    /// A command check writing `<name>.txt`.
    pub fn command(name: &str, category: Category, program: &str, args: &[&str]) -> Self {
        Self::new(
            name,
            category,
            format!("{}.txt", name),
            Action::Command {
                program: program.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
            },
        )
    }

    /// A shell check writing `<name>.txt`.
    pub fn shell(name: &str, category: Category, script: &str) -> Self {
        Self::new(
            name,
            category,
            format!("{}.txt", name),
            Action::Shell(script.to_string()),
        )
    }

    /// Copy `source` into `category`, keeping its file name.
    pub fn copy_file(name: &str, category: Category, source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let output = file_name_of(&source).unwrap_or_else(|| name.to_string());
        Self::new(name, category, output, Action::CopyFile(source))
    }

    /// A native snapshot writing `<name>.txt`.
    pub fn snapshot(name: &str, category: Category, kind: SnapshotKind) -> Self {
        Self::new(
            name,
            category,
            format!("{}.txt", name),
            Action::Snapshot(kind),
        )
    }
}

pub(crate) fn file_name_of(path: &std::path::Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().to_string())
}

/// Claim `preferred` in `used`, falling back to the first free `rename(n)`
/// for `n = 0, 1, ...`.
pub(crate) fn claim_unique(
    used: &mut HashSet<String>,
    preferred: String,
    rename: impl Fn(usize) -> String,
) -> String {
    if used.insert(preferred.clone()) {
        return preferred;
    }
    (0..)
        .map(rename)
        .find(|name| used.insert(name.clone()))
        .unwrap_or(preferred)
}

/// Build the full check table for a platform.
pub fn builtin_checks(platform: &Platform, config: &DiagConfig) -> Vec<Check> {
    let mut checks = Vec::new();

    resources::register(platform, &mut checks);
    system::register(platform, &mut checks);
    networking::register(platform, &mut checks);
    logs::register(platform, config, &mut checks);
    product::register(config, &mut checks);

    for extra in &config.extra_checks {
        let category = match extra.category() {
            Ok(category) => category,
            Err(e) => {
                tracing::warn!("Skipping extra check: {}", e);
                continue;
            }
        };
        checks.push(Check::new(
            extra.name.clone(),
            category,
            extra.output.clone(),
            Action::Command {
                program: extra.program.clone(),
                args: extra.args.clone(),
            },
        ));
    }

    dedup(checks)
}

/// Drop checks whose name or output path was already registered.
fn dedup(checks: Vec<Check>) -> Vec<Check> {
    let mut names = HashSet::new();
    let mut outputs = HashSet::new();

    checks
        .into_iter()
        .filter(|check| {
            if !names.insert(check.name.clone()) {
                tracing::warn!("Dropping duplicate check name '{}'", check.name);
                return false;
            }
            if !outputs.insert((check.category, check.output.clone())) {
                tracing::warn!(
                    "Dropping check '{}': {}/{} is already written by another check",
                    check.name,
                    check.category,
                    check.output
                );
                return false;
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtraCheck;
    use crate::platform::{OsFamily, PackageManager};

    fn names(checks: &[Check]) -> Vec<&str> {
        checks.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_linux_rpm_dispatch() {
        let platform = Platform::new(OsFamily::Linux, Some(PackageManager::Rpm));
        let checks = builtin_checks(&platform, &DiagConfig::default());
        let names = names(&checks);

        assert!(names.contains(&"rpm-packages"));
        assert!(!names.contains(&"dpkg-packages"));
        assert!(names.contains(&"free"));
        assert!(names.contains(&"ip-addr"));
        assert!(!names.contains(&"prstat"));
        assert!(!names.contains(&"product-find"));
    }

    #[test]
    fn test_solaris_dispatch() {
        let platform = Platform::new(OsFamily::Solaris, Some(PackageManager::Pkgadd));
        let checks = builtin_checks(&platform, &DiagConfig::default());

        let messages = checks.iter().find(|c| c.name == "messages").unwrap();
        assert_eq!(
            messages.action,
            Action::CopyFile(PathBuf::from("/var/adm/messages"))
        );
        assert!(checks.iter().any(|c| c.name == "pkginfo"));
        assert!(checks.iter().any(|c| c.name == "vfstab"));
        assert!(!checks.iter().any(|c| c.name == "free"));
    }

    #[test]
    fn test_no_package_manager() {
        let platform = Platform::new(OsFamily::Linux, None);
        let checks = builtin_checks(&platform, &DiagConfig::default());
        assert!(!checks
            .iter()
            .any(|c| c.name.ends_with("packages") || c.name == "pkginfo"));
    }

    #[test]
    fn test_outputs_are_unique() {
        for os in [OsFamily::Linux, OsFamily::Solaris] {
            let platform = Platform::new(os, Some(PackageManager::Dpkg));
            let checks = builtin_checks(&platform, &DiagConfig::default());
            let mut seen = HashSet::new();
            for check in &checks {
                assert!(seen.insert((check.category, check.output.clone())));
            }
        }
    }

    #[test]
    fn test_extra_checks_appended_and_deduped() {
        let mut config = DiagConfig::default();
        config.extra_checks.push(ExtraCheck {
            name: "custom".to_string(),
            category: "system".to_string(),
            output: "custom.txt".to_string(),
            program: "echo".to_string(),
            args: vec!["hi".to_string()],
        });
        config.extra_checks.push(ExtraCheck {
            name: "uname-again".to_string(),
            category: "system".to_string(),
            output: "uname.txt".to_string(),
            program: "uname".to_string(),
            args: Vec::new(),
        });

        let platform = Platform::new(OsFamily::Linux, None);
        let checks = builtin_checks(&platform, &config);

        assert_eq!(checks.last().unwrap().name, "custom");
        assert!(!checks.iter().any(|c| c.name == "uname-again"));
    }

    #[test]
    fn test_action_display() {
        let check = Check::command("df", Category::Resources, "df", &["-k"]);
        assert_eq!(check.output, "df.txt");
        assert_eq!(check.action.to_string(), "df -k");
    }
}
