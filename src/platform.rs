//! Platform and package-manager detection.
//!
//! Checks are chosen by a simple dispatch on the OS family and on which
//! package manager is installed. Both can be forced through environment
//! variables, which is how a collection is reproduced for another platform.

use serde::{Deserialize, Serialize};
use std::fmt;
use sysinfo::System;

use crate::error::{Error, Result};

/// Environment variable that overrides OS family detection.
pub const OS_OVERRIDE_ENV: &str = "HOSTDIAG_OS";

/// Environment variable that overrides package manager detection.
pub const PKG_OVERRIDE_ENV: &str = "HOSTDIAG_PKG";

/// Operating system family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Linux,
    /// Solaris and illumos derivatives.
    Solaris,
    Other(String),
}

impl OsFamily {
    /// Map a `std::env::consts::OS` style name to a family.
    pub fn from_os_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "linux" => OsFamily::Linux,
            "solaris" | "illumos" | "sunos" => OsFamily::Solaris,
            other => OsFamily::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsFamily::Linux => f.write_str("linux"),
            OsFamily::Solaris => f.write_str("solaris"),
            OsFamily::Other(name) => f.write_str(name),
        }
    }
}

/// Package manager family installed on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Rpm,
    Dpkg,
    /// SVR4 packaging (`pkgadd`/`pkginfo`).
    Pkgadd,
}

impl PackageManager {
    /// Lookup order used by [`PackageManager::detect`].
    pub const DETECT_ORDER: [PackageManager; 3] =
        [PackageManager::Rpm, PackageManager::Dpkg, PackageManager::Pkgadd];

    /// Binary whose presence identifies this package manager.
    pub fn binary(&self) -> &'static str {
        match self {
            PackageManager::Rpm => "rpm",
            PackageManager::Dpkg => "dpkg",
            PackageManager::Pkgadd => "pkgadd",
        }
    }

    /// Find the first package manager available on `PATH`.
    pub fn detect() -> Option<Self> {
        Self::DETECT_ORDER
            .into_iter()
            .find(|pm| which::which(pm.binary()).is_ok())
    }

    /// Parse an override value. `none` means no package manager.
    pub fn parse_override(value: &str) -> Result<Option<Self>> {
        match value.trim().to_lowercase().as_str() {
            "rpm" => Ok(Some(PackageManager::Rpm)),
            "dpkg" | "deb" => Ok(Some(PackageManager::Dpkg)),
            "pkgadd" | "pkg" | "svr4" => Ok(Some(PackageManager::Pkgadd)),
            "none" | "" => Ok(None),
            other => Err(Error::Config(format!(
                "{} must be one of rpm, dpkg, pkgadd or none, got '{}'",
                PKG_OVERRIDE_ENV, other
            ))),
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

/// Everything the check registry needs to know about the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub os: OsFamily,
    pub package_manager: Option<PackageManager>,
    pub hostname: String,
    pub arch: String,
}

impl Platform {
    /// Build a platform description by hand, without touching the host.
    pub fn new(os: OsFamily, package_manager: Option<PackageManager>) -> Self {
        Self {
            os,
            package_manager,
            hostname: String::from("localhost"),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Detect the running platform, honoring the override variables.
    pub fn detect() -> Result<Self> {
        let os = match std::env::var(OS_OVERRIDE_ENV) {
            Ok(value) => parse_os_override(&value)?,
            Err(_) => OsFamily::from_os_name(std::env::consts::OS),
        };

        let package_manager = match std::env::var(PKG_OVERRIDE_ENV) {
            Ok(value) => PackageManager::parse_override(&value)?,
            Err(_) => PackageManager::detect(),
        };

        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .ok()
            .or_else(System::host_name)
            .unwrap_or_else(|| String::from("localhost"));

        tracing::debug!(
            "Detected platform: os={} package_manager={:?} hostname={}",
            os,
            package_manager,
            hostname
        );

        Ok(Self {
            os,
            package_manager,
            hostname,
            arch: std::env::consts::ARCH.to_string(),
        })
    }
}

fn parse_os_override(value: &str) -> Result<OsFamily> {
    match OsFamily::from_os_name(value.trim()) {
        OsFamily::Other(name) => Err(Error::Config(format!(
            "{} must be linux or solaris, got '{}'",
            OS_OVERRIDE_ENV, name
        ))),
        os => Ok(os),
    }
}
