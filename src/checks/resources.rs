//! Resource usage checks.

use super::{Check, SnapshotKind};
use crate::layout::Category::Resources;
use crate::platform::{OsFamily, Platform};

pub fn register(platform: &Platform, checks: &mut Vec<Check>) {
    checks.push(Check::snapshot("summary", Resources, SnapshotKind::Resources));
    checks.push(Check::command("df", Resources, "df", &["-k"]));

    match platform.os {
        OsFamily::Linux => {
            checks.push(Check::command("free", Resources, "free", &["-m"]));
            checks.push(Check::command("top", Resources, "top", &["-b", "-n", "1"]));
            checks.push(Check::command("iostat", Resources, "iostat", &["-x", "1", "3"]));
        }
        OsFamily::Solaris => {
            checks.push(Check::command("swap", Resources, "swap", &["-l"]));
            checks.push(Check::command("prtconf", Resources, "prtconf", &[]));
            checks.push(Check::command("prstat", Resources, "prstat", &["1", "1"]));
            checks.push(Check::command("iostat", Resources, "iostat", &["-xn", "1", "3"]));
        }
        OsFamily::Other(_) => {}
    }

    checks.push(Check::command("vmstat", Resources, "vmstat", &["1", "5"]));
    checks.push(Check::command("ps", Resources, "ps", &["-ef"]));
    checks.push(Check::command("uptime", Resources, "uptime", &[]));
    checks.push(Check::shell("ulimit", Resources, "ulimit -a"));
}
