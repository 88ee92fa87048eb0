//! Host Diagnostic Collector
//!
//! This crate collects diagnostic information from a host into a single
//! gzip-compressed tar archive for offline support analysis. It captures:
//!
//! - **Resources**: disk, memory, load and process usage
//! - **System**: kernel, OS release, installed packages and `/etc` files
//! - **Networking**: interfaces, routes and sockets
//! - **Logs**: system messages and product log directories
//! - **Product**: a listing of the product installation and its config files
//!
//! Checks are a table of OS commands and file copies chosen per platform
//! (Linux or Solaris) and package manager (rpm, dpkg or pkgadd). They run
//! one after another, and a failing check never stops the collection.
//!
//! # Example
//!
//! ```no_run
//! use hostdiag::{collect::Collector, config::DiagConfig, platform::Platform};
//!
//! let collector = Collector::new(DiagConfig::default(), Platform::detect().unwrap());
//! let collection = collector.run(&collector.bundle_name()).unwrap();
//! println!("{}", collection.archive.path.display());
//! ```

pub mod archive;
pub mod checks;
pub mod cli;
pub mod collect;
pub mod config;
pub mod error;
pub mod layout;
pub mod platform;
pub mod preflight;
pub mod privacy;
pub mod report;
pub mod runner;

pub use error::{Error, Result};
pub use layout::{BundleLayout, Category};

/// Serializes unit tests that change process environment variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Run `f` with `vars` set (`Some`) or removed (`None`), restoring them after.
#[cfg(test)]
pub(crate) fn with_env<T>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
    struct Restore(Vec<(String, Option<std::ffi::OsString>)>);

    impl Drop for Restore {
        fn drop(&mut self) {
            for (key, value) in &self.0 {
                match value {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
    }

    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _restore = Restore(
        vars.iter()
            .map(|(key, _)| (key.to_string(), std::env::var_os(key)))
            .collect(),
    );
    for (key, value) in vars {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
    f()
}
