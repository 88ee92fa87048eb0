//! In-process snapshots gathered through sysinfo.
//!
//! These complement the command output with a platform-neutral summary that
//! is present even when the usual tools are missing from `PATH`.

use std::fmt;
use std::fmt::Write as _;
use sysinfo::{Disks, System};

/// Which snapshot to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    /// CPU, load, memory, swap, disks and top processes.
    Resources,
    /// OS name, version, kernel and uptime.
    OsRelease,
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotKind::Resources => f.write_str("resources"),
            SnapshotKind::OsRelease => f.write_str("os-release"),
        }
    }
}

impl SnapshotKind {
    /// Take the snapshot and render it as text.
    pub fn render(&self) -> String {
        match self {
            SnapshotKind::Resources => render_resources(),
            SnapshotKind::OsRelease => render_os_release(),
        }
    }
}

/// Number of processes listed in the resources snapshot.
const TOP_PROCESSES: usize = 10;

fn render_resources() -> String {
    let mut sys = System::new_all();
    sys.refresh_all();

    let mut out = String::new();
    let cpus = sys.cpus();
    let brand = cpus
        .first()
        .map(|c| c.brand().to_string())
        .unwrap_or_default();
    let load = System::load_average();

    let _ = writeln!(out, "CPU:");
    let _ = writeln!(out, "  Brand: {}", brand);
    let _ = writeln!(
        out,
        "  Physical Cores: {}",
        sys.physical_core_count().unwrap_or(0)
    );
    let _ = writeln!(out, "  Logical Cores: {}", cpus.len());
    let _ = writeln!(
        out,
        "  Load Average: {:.2} {:.2} {:.2}",
        load.one, load.five, load.fifteen
    );
    out.push('\n');

    let _ = writeln!(out, "Memory:");
    let _ = writeln!(out, "  Total RAM: {}", format_bytes(sys.total_memory()));
    let _ = writeln!(
        out,
        "  Used RAM: {} ({:.1}%)",
        format_bytes(sys.used_memory()),
        percent(sys.used_memory(), sys.total_memory())
    );
    let _ = writeln!(
        out,
        "  Available RAM: {}",
        format_bytes(sys.available_memory())
    );
    let _ = writeln!(out, "  Total Swap: {}", format_bytes(sys.total_swap()));
    let _ = writeln!(
        out,
        "  Used Swap: {} ({:.1}%)",
        format_bytes(sys.used_swap()),
        percent(sys.used_swap(), sys.total_swap())
    );
    out.push('\n');

    let _ = writeln!(out, "Disks:");
    let disks = Disks::new_with_refreshed_list();
    for disk in disks.iter() {
        let _ = writeln!(
            out,
            "  {} on {} ({}): {} available of {}",
            disk.name().to_string_lossy(),
            disk.mount_point().display(),
            disk.file_system().to_string_lossy(),
            format_bytes(disk.available_space()),
            format_bytes(disk.total_space())
        );
    }
    out.push('\n');

    let processes = sys.processes();
    let mut by_memory: Vec<_> = processes.iter().collect();
    by_memory.sort_by(|a, b| b.1.memory().cmp(&a.1.memory()));

    let _ = writeln!(out, "Processes: {}", processes.len());
    let _ = writeln!(out, "  Top by Memory:");
    for (i, (pid, process)) in by_memory.iter().take(TOP_PROCESSES).enumerate() {
        let _ = writeln!(
            out,
            "    {}. {} (PID {}): {}",
            i + 1,
            process.name(),
            pid,
            format_bytes(process.memory())
        );
    }

    out
}

fn render_os_release() -> String {
    let unknown = || "Unknown".to_string();
    let mut out = String::new();

    let _ = writeln!(out, "Name: {}", System::name().unwrap_or_else(unknown));
    let _ = writeln!(
        out,
        "Version: {}",
        System::long_os_version().unwrap_or_else(unknown)
    );
    let _ = writeln!(
        out,
        "Kernel: {}",
        System::kernel_version().unwrap_or_else(unknown)
    );
    let _ = writeln!(out, "Architecture: {}", std::env::consts::ARCH);
    let _ = writeln!(
        out,
        "Hostname: {}",
        System::host_name().unwrap_or_else(unknown)
    );
    let _ = writeln!(out, "Boot Time: {}", System::boot_time());
    let _ = writeln!(out, "Uptime: {}", format_uptime(System::uptime()));

    out
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Format bytes into a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration from seconds into a human-readable string.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, secs)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5.0 GB");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(42), "42s");
        assert_eq!(format_uptime(3661), "1h 1m 1s");
        assert_eq!(format_uptime(90061), "1d 1h 1m 1s");
    }

    #[test]
    fn test_os_release_snapshot_has_fields() {
        let text = SnapshotKind::OsRelease.render();
        assert!(text.contains("Kernel: "));
        assert!(text.contains("Uptime: "));
    }
}
