//! Optional redaction of collected output before it is archived.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Redaction settings, read from the `[redaction]` config table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionSettings {
    /// Whether captured files are rewritten at all.
    pub enabled: bool,
    /// Whether to redact the current username.
    pub redact_usernames: bool,
    /// Whether to redact the current user's home directory in paths.
    pub redact_home_paths: bool,
    /// Whether to redact IPv4 addresses.
    pub redact_ips: bool,
    /// Whether to redact the hostname.
    pub redact_hostnames: bool,
    /// Whether to redact MAC addresses.
    pub redact_macs: bool,
    /// Custom patterns to redact (as regex strings).
    pub custom_patterns: Vec<String>,
}

impl Default for RedactionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            redact_usernames: true,
            redact_home_paths: true,
            redact_ips: true,
            redact_hostnames: false,
            redact_macs: true,
            custom_patterns: Vec::new(),
        }
    }
}

/// Redactor that applies [`RedactionSettings`] to collected text.
pub struct Redactor {
    settings: RedactionSettings,
    username: String,
    hostname: String,
    home: Option<String>,
    ip_regex: Regex,
    mac_regex: Regex,
    custom: Vec<Regex>,
}

impl Redactor {
    /// Create a redactor for the current user and host.
    pub fn new(settings: RedactionSettings, hostname: &str) -> Result<Self> {
        let username = std::env::var("USER")
            .or_else(|_| std::env::var("LOGNAME"))
            .unwrap_or_default();
        let redactor = Self::with_identity(settings, &username, hostname)?;
        Ok(match std::env::var("HOME") {
            Ok(home) => redactor.with_home(home),
            Err(_) => redactor,
        })
    }

    /// Create a redactor for an explicit username and hostname.
    pub fn with_identity(settings: RedactionSettings, username: &str, hostname: &str) -> Result<Self> {
        let ip_regex = Regex::new(
            r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
        )
        .map_err(|e| Error::Config(e.to_string()))?;

        let mac_regex = Regex::new(r"\b(?:[0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}\b")
            .map_err(|e| Error::Config(e.to_string()))?;

        let custom = settings
            .custom_patterns
            .iter()
            .map(|p| {
                Regex::new(p)
                    .map_err(|e| Error::Config(format!("invalid redaction pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            settings,
            username: username.to_string(),
            hostname: hostname.to_string(),
            home: None,
            ip_regex,
            mac_regex,
            custom,
        })
    }

    /// Set the home directory redacted by `redact_home_paths`.
    ///
    /// A home of `/` is ignored.
    pub fn with_home(mut self, home: impl Into<String>) -> Self {
        let home = home.into();
        let trimmed = home.trim_end_matches('/');
        self.home = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    /// Redact sensitive information from a string.
    pub fn redact(&self, input: &str) -> String {
        let mut result = input.to_string();

        // Before usernames, so /home/<user> goes as one piece
        if self.settings.redact_home_paths {
            if let Some(home) = &self.home {
                result = result.replace(home.as_str(), "[REDACTED_HOME]");
            }
        }

        // Names shorter than 3 characters match too much unrelated text
        if self.settings.redact_usernames && self.username.len() >= 3 {
            result = result.replace(&self.username, "[REDACTED_USER]");
        }

        if self.settings.redact_hostnames && !self.hostname.is_empty() {
            result = result.replace(&self.hostname, "[REDACTED_HOST]");
        }

        if self.settings.redact_macs {
            result = self.mac_regex.replace_all(&result, "[REDACTED_MAC]").to_string();
        }

        if self.settings.redact_ips {
            result = self.ip_regex.replace_all(&result, "[REDACTED_IP]").to_string();
        }

        for re in &self.custom {
            result = re.replace_all(&result, "[REDACTED]").to_string();
        }

        result
    }

    /// Rewrite every UTF-8 text file below `root` in place.
    ///
    /// Returns the number of files that changed. Binary files are skipped.
    pub fn redact_tree(&self, root: &Path) -> Result<usize> {
        let mut changed = 0;

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| Error::Io {
                path: root.display().to_string(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
            let Ok(text) = String::from_utf8(bytes) else {
                tracing::debug!("Skipping redaction of binary file {}", path.display());
                continue;
            };

            let redacted = self.redact(&text);
            if redacted != text {
                make_owner_writable(path)?;
                std::fs::write(path, redacted).map_err(|e| Error::io(path, e))?;
                changed += 1;
            }
        }

        Ok(changed)
    }
}

/// Copies keep the source mode, so read-only files need `u+w` to be rewritten.
fn make_owner_writable(path: &Path) -> Result<()> {
    let mut perms = std::fs::metadata(path)
        .map_err(|e| Error::io(path, e))?
        .permissions();
    if perms.mode() & 0o200 == 0 {
        perms.set_mode(perms.mode() | 0o200);
        std::fs::set_permissions(path, perms).map_err(|e| Error::io(path, e))?;
    }
    Ok(())
}
