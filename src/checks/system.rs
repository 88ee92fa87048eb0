//! OS configuration checks, including the copies under `system/etc`.

use super::{Check, SnapshotKind};
use crate::layout::Category::{System, SystemEtc};
use crate::platform::{OsFamily, PackageManager, Platform};

/// Files copied on every platform.
const COMMON_ETC_FILES: &[(&str, &str)] = &[
    ("hosts", "/etc/hosts"),
    ("resolv-conf", "/etc/resolv.conf"),
    ("nsswitch-conf", "/etc/nsswitch.conf"),
];

const LINUX_ETC_FILES: &[(&str, &str)] = &[
    ("fstab", "/etc/fstab"),
    ("os-release", "/etc/os-release"),
    ("limits-conf", "/etc/security/limits.conf"),
    ("sysctl-conf", "/etc/sysctl.conf"),
];

const SOLARIS_ETC_FILES: &[(&str, &str)] = &[
    ("vfstab", "/etc/vfstab"),
    ("release", "/etc/release"),
    ("project", "/etc/project"),
];

pub fn register(platform: &Platform, checks: &mut Vec<Check>) {
    checks.push(Check::command("uname", System, "uname", &["-a"]));
    checks.push(Check::snapshot("os", System, SnapshotKind::OsRelease));
    checks.push(Check::command("id", System, "id", &[]));

    match platform.package_manager {
        Some(PackageManager::Rpm) => {
            checks.push(Check::command("rpm-packages", System, "rpm", &["-qa"]));
        }
        Some(PackageManager::Dpkg) => {
            checks.push(Check::command("dpkg-packages", System, "dpkg", &["-l"]));
        }
        Some(PackageManager::Pkgadd) => {
            checks.push(Check::command("pkginfo", System, "pkginfo", &["-l"]));
        }
        None => {}
    }

    let etc_files: &[(&str, &str)] = match platform.os {
        OsFamily::Linux => {
            checks.push(Check::command("sysctl", System, "sysctl", &["-a"]));
            checks.push(Check::command("lsmod", System, "lsmod", &[]));
            LINUX_ETC_FILES
        }
        OsFamily::Solaris => {
            checks.push(Check::copy_file("etc-system", System, "/etc/system"));
            checks.push(Check::command("zonename", System, "zonename", &[]));
            checks.push(Check::command("showrev", System, "showrev", &[]));
            SOLARIS_ETC_FILES
        }
        OsFamily::Other(_) => &[],
    };

    for (name, path) in COMMON_ETC_FILES.iter().chain(etc_files) {
        checks.push(Check::copy_file(name, SystemEtc, *path));
    }
}
