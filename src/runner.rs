//! Sequential execution of the check table.
//!
//! Every check runs on its own: a failure is logged, recorded in the
//! returned [`CheckRecord`] and the run moves on. Nothing here aborts a
//! collection.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;
use walkdir::WalkDir;

use crate::checks::{Action, Check, SnapshotKind};
use crate::error::{Error, Result};
use crate::layout::{BundleLayout, Category};

/// Result of running a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// The command ran. Its exit code is `None` when it was killed by a signal.
    Captured { exit_code: Option<i32> },
    /// A file or tree was copied.
    Copied { bytes: u64 },
    /// A directory listing was written.
    Listed { entries: u64 },
    /// A native snapshot was written.
    Generated { bytes: u64 },
    /// The program or source path does not exist. No output was written.
    Missing { reason: String },
    /// The check could not complete. Partial output may remain.
    Failed { reason: String },
}

impl CheckOutcome {
    /// Whether the check produced complete output.
    pub fn is_success(&self) -> bool {
        match self {
            CheckOutcome::Captured { exit_code } => *exit_code == Some(0),
            CheckOutcome::Copied { .. }
            | CheckOutcome::Listed { .. }
            | CheckOutcome::Generated { .. } => true,
            CheckOutcome::Missing { .. } | CheckOutcome::Failed { .. } => false,
        }
    }

    /// Short label used in the bundle summary.
    pub fn label(&self) -> &'static str {
        match self {
            CheckOutcome::Captured { exit_code: Some(0) } => "ok",
            CheckOutcome::Captured { .. } => "nonzero-exit",
            CheckOutcome::Copied { .. } => "copied",
            CheckOutcome::Listed { .. } => "listed",
            CheckOutcome::Generated { .. } => "generated",
            CheckOutcome::Missing { .. } => "missing",
            CheckOutcome::Failed { .. } => "failed",
        }
    }
}

/// What happened to one check, as stored in the bundle manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRecord {
    pub name: String,
    pub category: Category,
    /// Output path relative to the bundle root.
    pub output: String,
    pub outcome: CheckOutcome,
    pub duration_ms: u64,
}

/// Runs checks into a bundle layout.
pub struct Runner<'a> {
    layout: &'a BundleLayout,
}

impl<'a> Runner<'a> {
    pub fn new(layout: &'a BundleLayout) -> Self {
        Self { layout }
    }

    /// Run every check in order and record the outcome of each.
    pub fn run(&self, checks: &[Check]) -> Vec<CheckRecord> {
        checks.iter().map(|check| self.run_one(check)).collect()
    }

    /// Run a single check. Never fails; errors become [`CheckOutcome::Failed`].
    pub fn run_one(&self, check: &Check) -> CheckRecord {
        tracing::info!("Running check {} ({})", check.name, check.action);
        let start = Instant::now();

        let path = self.layout.output_path(check.category, &check.output);
        let outcome = self
            .execute(&check.action, &path)
            .unwrap_or_else(|e| CheckOutcome::Failed {
                reason: e.to_string(),
            });

        match &outcome {
            CheckOutcome::Missing { reason } => {
                tracing::warn!("Check {} skipped: {}", check.name, reason)
            }
            CheckOutcome::Failed { reason } => {
                tracing::warn!("Check {} failed: {}", check.name, reason)
            }
            CheckOutcome::Captured {
                exit_code: Some(code),
            } if *code != 0 => {
                tracing::debug!("Check {} exited with status {}", check.name, code)
            }
            _ => {}
        }

        CheckRecord {
            name: check.name.clone(),
            category: check.category,
            output: format!("{}/{}", check.category.relative_dir(), check.output),
            outcome,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn execute(&self, action: &Action, path: &Path) -> Result<CheckOutcome> {
        match action {
            Action::Command { program, args } => run_command(program, args, path),
            Action::Shell(script) => run_command(SHELL, &["-c".to_string(), script.clone()], path),
            Action::CopyFile(source) => copy_file(source, path),
            Action::CopyTree { source, max_depth } => copy_tree(source, *max_depth, path),
            Action::FindListing { root, max_depth } => write_listing(root, *max_depth, path),
            Action::Snapshot(kind) => write_snapshot(*kind, path),
        }
    }
}

/// Interpreter for [`Action::Shell`], independent of `PATH`.
const SHELL: &str = "/bin/sh";

/// Run `program` with stdout and stderr both redirected into `path`.
fn run_command(program: &str, args: &[String], path: &Path) -> Result<CheckOutcome> {
    let resolved = match which::which(program) {
        Ok(resolved) => resolved,
        Err(e) => {
            return Ok(CheckOutcome::Missing {
                reason: format!("{}: {}", program, e),
            })
        }
    };

    tracing::debug!("Executing {} {:?} > {}", resolved.display(), args, path.display());

    let stdout = File::create(path).map_err(|e| Error::io(path, e))?;
    let stderr = stdout.try_clone().map_err(|e| Error::io(path, e))?;

    let status = Command::new(&resolved)
        .args(args)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .status()
        .map_err(|e| Error::Collection(format!("failed to execute {}: {}", program, e)))?;

    Ok(CheckOutcome::Captured {
        exit_code: status.code(),
    })
}

fn copy_file(source: &Path, dest: &Path) -> Result<CheckOutcome> {
    if !source.exists() {
        return Ok(CheckOutcome::Missing {
            reason: format!("{} does not exist", source.display()),
        });
    }

    let bytes = std::fs::copy(source, dest).map_err(|e| Error::io(source, e))?;
    Ok(CheckOutcome::Copied { bytes })
}

/// Copy regular files and directories below `source` into `dest`.
///
/// Unreadable entries are logged and skipped so one bad file does not lose
/// the rest of the tree. Symlinks are not followed.
fn copy_tree(source: &Path, max_depth: usize, dest: &Path) -> Result<CheckOutcome> {
    if !source.is_dir() {
        return Ok(CheckOutcome::Missing {
            reason: format!("{} is not a directory", source.display()),
        });
    }

    std::fs::create_dir_all(dest).map_err(|e| Error::io(dest, e))?;
    let mut bytes = 0;

    for entry in WalkDir::new(source).max_depth(max_depth).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping entry in {}: {}", source.display(), e);
                continue;
            }
        };

        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| Error::io(&target, e))?;
        } else if entry.file_type().is_file() {
            match std::fs::copy(entry.path(), &target) {
                Ok(n) => bytes += n,
                Err(e) => tracing::warn!("Failed to copy {}: {}", entry.path().display(), e),
            }
        }
    }

    Ok(CheckOutcome::Copied { bytes })
}

/// Write one line per entry below `root`: type, size, mtime and path.
fn write_listing(root: &Path, max_depth: usize, dest: &Path) -> Result<CheckOutcome> {
    if !root.exists() {
        return Ok(CheckOutcome::Missing {
            reason: format!("{} does not exist", root.display()),
        });
    }

    let file = File::create(dest).map_err(|e| Error::io(dest, e))?;
    let mut out = BufWriter::new(file);
    let mut entries = 0;

    for entry in WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name()
    {
        let line = match entry {
            Ok(entry) => match entry.metadata() {
                Ok(meta) => {
                    let kind = if meta.is_dir() {
                        'd'
                    } else if meta.file_type().is_symlink() {
                        'l'
                    } else {
                        '-'
                    };
                    let modified = meta
                        .modified()
                        .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|_| "-".to_string());
                    format!(
                        "{} {:>12} {} {}",
                        kind,
                        meta.len(),
                        modified,
                        entry.path().display()
                    )
                }
                Err(e) => format!("? {}: {}", entry.path().display(), e),
            },
            Err(e) => format!("? {}", e),
        };

        writeln!(out, "{}", line).map_err(|e| Error::io(dest, e))?;
        entries += 1;
    }

    out.flush().map_err(|e| Error::io(dest, e))?;
    Ok(CheckOutcome::Listed { entries })
}

fn write_snapshot(kind: SnapshotKind, dest: &Path) -> Result<CheckOutcome> {
    let text = kind.render();
    std::fs::write(dest, &text).map_err(|e| Error::io(dest, e))?;
    Ok(CheckOutcome::Generated {
        bytes: text.len() as u64,
    })
}
