//! Network state checks.

use super::Check;
use crate::layout::Category::Networking;
use crate::platform::{OsFamily, Platform};

pub fn register(platform: &Platform, checks: &mut Vec<Check>) {
    checks.push(Check::command("netstat-an", Networking, "netstat", &["-an"]));
    checks.push(Check::command("netstat-rn", Networking, "netstat", &["-rn"]));
    checks.push(Check::command("ifconfig", Networking, "ifconfig", &["-a"]));
    checks.push(Check::command("arp", Networking, "arp", &["-a"]));

    match platform.os {
        OsFamily::Linux => {
            checks.push(Check::command("ip-addr", Networking, "ip", &["addr"]));
            checks.push(Check::command("ip-route", Networking, "ip", &["route"]));
            checks.push(Check::command("ss", Networking, "ss", &["-tanp"]));
        }
        OsFamily::Solaris => {
            checks.push(Check::command("dladm", Networking, "dladm", &["show-link"]));
            checks.push(Check::command("netstat-s", Networking, "netstat", &["-s"]));
        }
        OsFamily::Other(_) => {}
    }
}
