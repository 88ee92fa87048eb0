//! The bundle manifest and human-readable summary.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::layout::BundleLayout;
use crate::platform::Platform;
use crate::runner::CheckRecord;

/// File name of the JSON manifest at the bundle root.
pub const MANIFEST_FILE: &str = "manifest.json";

/// File name of the text summary at the bundle root.
pub const SUMMARY_FILE: &str = "summary.txt";

/// Record of what a collection did, stored inside the bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleManifest {
    pub metadata: BundleMetadata,
    pub platform: Platform,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    pub checks: Vec<CheckRecord>,
}

/// Metadata about the bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleMetadata {
    /// Unique bundle ID.
    pub id: String,
    pub bundle_name: String,
    /// Timestamp when the collection finished.
    pub generated_at: String,
    /// Timezone of the system.
    pub timezone: String,
    /// Tool version that generated the bundle.
    pub tool_version: String,
    pub hostname: String,
    /// Whether captured output was redacted.
    pub redacted: bool,
}

impl BundleManifest {
    pub fn new(
        bundle_name: &str,
        platform: Platform,
        product: Option<String>,
        checks: Vec<CheckRecord>,
        redacted: bool,
    ) -> Self {
        let now: DateTime<Utc> = Utc::now();
        let local: DateTime<Local> = Local::now();

        Self {
            metadata: BundleMetadata {
                id: uuid::Uuid::new_v4().to_string(),
                bundle_name: bundle_name.to_string(),
                generated_at: now.to_rfc3339(),
                timezone: local.offset().to_string(),
                tool_version: env!("CARGO_PKG_VERSION").to_string(),
                hostname: platform.hostname.clone(),
                redacted,
            },
            platform,
            product,
            checks,
        }
    }

    /// Number of checks per outcome label, sorted by label.
    pub fn outcome_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.checks {
            *counts.entry(record.outcome.label()).or_insert(0) += 1;
        }
        counts
    }

    /// Write `manifest.json` and `summary.txt` to the bundle root.
    pub fn write_to(&self, layout: &BundleLayout) -> Result<()> {
        let manifest_path = layout.root().join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        std::fs::write(&manifest_path, json).map_err(|e| Error::io(&manifest_path, e))?;

        let summary_path = layout.root().join(SUMMARY_FILE);
        std::fs::write(&summary_path, self.to_text())
            .map_err(|e| Error::io(&summary_path, e))?;

        Ok(())
    }

    /// Convert the manifest to human-readable text format.
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("=== Host Diagnostic Bundle ===\n\n");
        output.push_str(&format!("Bundle: {}\n", self.metadata.bundle_name));
        output.push_str(&format!("Bundle ID: {}\n", self.metadata.id));
        output.push_str(&format!("Generated: {}\n", self.metadata.generated_at));
        output.push_str(&format!("Tool Version: {}\n", self.metadata.tool_version));
        output.push_str(&format!("Hostname: {}\n", self.metadata.hostname));
        output.push_str(&format!("OS Family: {}\n", self.platform.os));
        output.push_str(&format!(
            "Package Manager: {}\n",
            self.platform
                .package_manager
                .map(|pm| pm.to_string())
                .unwrap_or_else(|| "none".to_string())
        ));
        if let Some(product) = &self.product {
            output.push_str(&format!("Product: {}\n", product));
        }
        if self.metadata.redacted {
            output.push_str("Redacted: yes\n");
        }
        output.push('\n');

        output.push_str("--- Outcomes ---\n\n");
        for (label, count) in self.outcome_counts() {
            output.push_str(&format!("  {}: {}\n", label, count));
        }
        output.push('\n');

        output.push_str("--- Checks ---\n\n");
        for record in &self.checks {
            output.push_str(&format!(
                "  [{}] {} -> {} ({} ms)\n",
                record.outcome.label(),
                record.name,
                record.output,
                record.duration_ms
            ));
            if let crate::runner::CheckOutcome::Missing { reason }
            | crate::runner::CheckOutcome::Failed { reason } = &record.outcome
            {
                output.push_str(&format!("      {}\n", reason));
            }
        }
        output.push('\n');

        output.push_str("=== End of Summary ===\n");
        output
    }
}
