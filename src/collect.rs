//! End-to-end collection: preflight, checks, manifest, archive, cleanup.

use chrono::{DateTime, Local};
use std::path::PathBuf;

use crate::archive::{create_bundle_archive, BundleArchive};
use crate::checks::{builtin_checks, Check};
use crate::config::DiagConfig;
use crate::error::{Error, Result};
use crate::layout::{validate_bundle_name, BundleLayout};
use crate::platform::Platform;
use crate::preflight;
use crate::privacy::Redactor;
use crate::report::BundleManifest;
use crate::runner::{CheckRecord, Runner};

/// Outcome of a finished collection.
#[derive(Debug)]
pub struct Collection {
    pub archive: BundleArchive,
    pub records: Vec<CheckRecord>,
    /// The bundle tree, if it was kept after archiving.
    pub tree: Option<PathBuf>,
}

impl Collection {
    /// Number of checks that did not produce complete output.
    pub fn incomplete(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !r.outcome.is_success())
            .count()
    }
}

/// Default bundle name: `<prefix>-<hostname>-<YYYYmmdd-HHMMSS>`.
pub fn default_bundle_name(prefix: &str, hostname: &str, now: DateTime<Local>) -> String {
    let host: String = hostname
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-{}-{}", prefix, host, now.format("%Y%m%d-%H%M%S"))
}

/// Runs a whole collection for one platform and configuration.
pub struct Collector {
    config: DiagConfig,
    platform: Platform,
}

impl Collector {
    pub fn new(config: DiagConfig, platform: Platform) -> Self {
        Self { config, platform }
    }

    pub fn config(&self) -> &DiagConfig {
        &self.config
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// The check table for this platform and configuration.
    pub fn checks(&self) -> Vec<Check> {
        builtin_checks(&self.platform, &self.config)
    }

    /// Bundle name for a collection started now.
    ///
    /// The hostname is left out when hostnames are being redacted.
    pub fn bundle_name(&self) -> String {
        let redaction = &self.config.redaction;
        let host = if redaction.enabled && redaction.redact_hostnames {
            "redacted"
        } else {
            &self.platform.hostname
        };
        default_bundle_name(&self.config.bundle_prefix, host, Local::now())
    }

    /// Run the registered checks into a bundle named `bundle_name`.
    pub fn run(&self, bundle_name: &str) -> Result<Collection> {
        let checks = self.checks();
        self.run_checks(bundle_name, &checks)
    }

    /// Run the given checks into a bundle named `bundle_name`.
    ///
    /// Fails only on an invalid bundle name, the preflight space check, if
    /// the tree cannot be created, or if the manifest, redaction or archive
    /// cannot be written. A tree that was already created is removed again
    /// on failure.
    pub fn run_checks(&self, bundle_name: &str, checks: &[Check]) -> Result<Collection> {
        validate_bundle_name(bundle_name)?;

        let redactor = if self.config.redaction.enabled {
            Some(Redactor::new(
                self.config.redaction.clone(),
                &self.platform.hostname,
            )?)
        } else {
            None
        };

        let output_dir = &self.config.output_dir;
        std::fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;
        preflight::ensure_free_space(output_dir, self.config.min_free_bytes())?;

        let layout = BundleLayout::new(output_dir, bundle_name);
        layout.create()?;

        let (archive, records) = match self.fill(&layout, checks, redactor.as_ref()) {
            Ok(done) => done,
            Err(e) => {
                if let Err(discard_err) = layout.discard() {
                    tracing::warn!("Failed to remove bundle tree: {}", discard_err);
                }
                let archive_path = layout.archive_path();
                if archive_path.is_file() {
                    let _ = std::fs::remove_file(&archive_path);
                }
                return Err(e);
            }
        };

        let tree = if self.config.keep_tree {
            Some(layout.root().to_path_buf())
        } else {
            layout.discard()?;
            None
        };

        Ok(Collection {
            archive,
            records,
            tree,
        })
    }

    /// Run the checks, write the manifest, redact and archive.
    fn fill(
        &self,
        layout: &BundleLayout,
        checks: &[Check],
        redactor: Option<&Redactor>,
    ) -> Result<(BundleArchive, Vec<CheckRecord>)> {
        tracing::info!(
            "Collecting {} checks into {}",
            checks.len(),
            layout.root().display()
        );

        let records = Runner::new(layout).run(checks);

        let manifest = BundleManifest::new(
            layout.bundle_name(),
            self.platform.clone(),
            self.config.product.name.clone(),
            records,
            redactor.is_some(),
        );
        manifest.write_to(layout)?;

        // The manifest and summary are redacted along with the check output
        if let Some(redactor) = redactor {
            let changed = redactor.redact_tree(layout.root())?;
            tracing::info!("Redacted {} files", changed);
        }

        let archive = create_bundle_archive(layout)?;
        Ok((archive, manifest.checks))
    }
}
