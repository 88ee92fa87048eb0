//! System and product log snapshots.

use std::collections::HashSet;

use super::{claim_unique, file_name_of, Action, Check};
use crate::config::DiagConfig;
use crate::layout::Category::Logs;
use crate::platform::{OsFamily, Platform};

pub fn register(platform: &Platform, config: &DiagConfig, checks: &mut Vec<Check>) {
    match platform.os {
        OsFamily::Linux => {
            checks.push(Check::copy_file("messages", Logs, "/var/log/messages"));
            checks.push(Check::copy_file("syslog", Logs, "/var/log/syslog"));
        }
        OsFamily::Solaris => {
            checks.push(Check::copy_file("messages", Logs, "/var/adm/messages"));
        }
        OsFamily::Other(_) => {}
    }
    checks.push(Check::command("dmesg", Logs, "dmesg", &[]));

    let mut used = HashSet::new();
    for (index, dir) in config.product.log_dirs.iter().enumerate() {
        let base = file_name_of(dir).unwrap_or_else(|| format!("dir{}", index));
        let output = claim_unique(&mut used, format!("product-{}", base), |n| {
            format!("product-{}-{}", base, index + n)
        });

        checks.push(Check::new(
            format!("product-logs-{}", index),
            Logs,
            output,
            Action::CopyTree {
                source: dir.clone(),
                max_depth: config.product.log_max_depth,
            },
        ));
    }
}
