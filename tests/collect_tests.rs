//! End-to-end collection tests against a temporary output directory.

use flate2::read::GzDecoder;
use std::collections::HashSet;
use std::fs::File;

use hostdiag::checks::Check;
use hostdiag::collect::Collector;
use hostdiag::config::DiagConfig;
use hostdiag::layout::Category;
use hostdiag::platform::{OsFamily, Platform};
use hostdiag::preflight;
use hostdiag::report::BundleManifest;
use hostdiag::runner::CheckOutcome;
use hostdiag::Error;
use tempfile::TempDir;

fn create_test_config(temp_dir: &TempDir) -> DiagConfig {
    DiagConfig {
        output_dir: temp_dir.path().join("out"),
        min_free_mb: 0,
        ..Default::default()
    }
}

fn test_checks() -> Vec<Check> {
    vec![
        Check::command("echo", Category::Resources, "echo", &["10.0.0.7 is up"]),
        Check::command(
            "missing",
            Category::Networking,
            "hostdiag-no-such-program",
            &[],
        ),
        Check::shell("fails", Category::Logs, "echo broken >&2; exit 1"),
    ]
}

/// Read every entry path of a .tar.gz archive
fn archive_entries(path: &std::path::Path) -> HashSet<String> {
    let decoder = GzDecoder::new(File::open(path).unwrap());
    let mut archive = tar::Archive::new(decoder);
    archive
        .entries()
        .unwrap()
        .map(|e| {
            e.unwrap()
                .path()
                .unwrap()
                .to_string_lossy()
                .trim_end_matches('/')
                .to_string()
        })
        .collect()
}

fn read_archive_file(path: &std::path::Path, name: &str) -> String {
    use std::io::Read;

    let decoder = GzDecoder::new(File::open(path).unwrap());
    let mut archive = tar::Archive::new(decoder);
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        if entry.path().unwrap().to_string_lossy() == name {
            let mut content = String::new();
            entry.read_to_string(&mut content).unwrap();
            return content;
        }
    }
    panic!("{} not found in archive", name);
}

#[test]
fn test_collection_archives_tree_and_discards_it() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir);
    let collector = Collector::new(config, Platform::new(OsFamily::Linux, None));

    let collection = collector.run_checks("bundle", &test_checks()).unwrap();

    assert_eq!(
        collection.archive.path,
        temp_dir.path().join("out/bundle.tar.gz")
    );
    assert!(collection.archive.size > 0);
    assert!(collection.tree.is_none());
    assert!(!temp_dir.path().join("out/bundle").exists());
    assert_eq!(collection.records.len(), 3);
    assert_eq!(collection.incomplete(), 2);

    let entries = archive_entries(&collection.archive.path);
    for dir in [
        "bundle/resources",
        "bundle/system",
        "bundle/system/etc",
        "bundle/enterprise/find",
        "bundle/networking",
        "bundle/logs",
    ] {
        assert!(entries.contains(dir), "{} missing from {:?}", dir, entries);
    }
    assert!(entries.contains("bundle/manifest.json"));
    assert!(entries.contains("bundle/summary.txt"));
    assert!(entries.contains("bundle/resources/echo.txt"));
    assert!(entries.contains("bundle/logs/fails.txt"));
    assert!(!entries.contains("bundle/networking/missing.txt"));
}

#[test]
fn test_manifest_records_outcomes() {
    let temp_dir = TempDir::new().unwrap();
    let collector = Collector::new(
        create_test_config(&temp_dir),
        Platform::new(OsFamily::Solaris, None),
    );

    let collection = collector.run_checks("bundle", &test_checks()).unwrap();
    let json = read_archive_file(&collection.archive.path, "bundle/manifest.json");
    let manifest: BundleManifest = serde_json::from_str(&json).unwrap();

    assert_eq!(manifest.metadata.bundle_name, "bundle");
    assert_eq!(manifest.platform.os, OsFamily::Solaris);
    assert!(!manifest.metadata.redacted);
    assert_eq!(
        manifest.checks[0].outcome,
        CheckOutcome::Captured { exit_code: Some(0) }
    );
    assert!(matches!(
        manifest.checks[1].outcome,
        CheckOutcome::Missing { .. }
    ));
    assert_eq!(
        manifest.checks[2].outcome,
        CheckOutcome::Captured { exit_code: Some(1) }
    );

    let summary = read_archive_file(&collection.archive.path, "bundle/summary.txt");
    assert!(summary.contains("missing: 1"));
    assert!(summary.contains("nonzero-exit: 1"));
}

#[test]
fn test_keep_tree_and_redaction() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&temp_dir);
    config.keep_tree = true;
    config.redaction.enabled = true;
    let collector = Collector::new(config, Platform::new(OsFamily::Linux, None));

    let collection = collector.run_checks("bundle", &test_checks()).unwrap();

    let tree = collection.tree.expect("tree should be kept");
    let echoed = std::fs::read_to_string(tree.join("resources/echo.txt")).unwrap();
    assert_eq!(echoed, "[REDACTED_IP] is up\n");

    let archived = read_archive_file(&collection.archive.path, "bundle/resources/echo.txt");
    assert_eq!(archived, "[REDACTED_IP] is up\n");
}

#[test]
fn test_insufficient_space_aborts_before_writing() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&temp_dir);
    config.min_free_mb = u64::MAX;
    std::fs::create_dir_all(&config.output_dir).unwrap();

    // Some sandboxes do not report the mount holding the temp dir
    if preflight::available_space(&config.output_dir)
        .unwrap()
        .is_none()
    {
        return;
    }

    let collector = Collector::new(config, Platform::new(OsFamily::Linux, None));
    let result = collector.run_checks("bundle", &test_checks());

    assert!(matches!(result, Err(Error::InsufficientSpace { .. })));
    assert!(!temp_dir.path().join("out/bundle").exists());
    assert!(!temp_dir.path().join("out/bundle.tar.gz").exists());
}

#[test]
fn test_rejects_bundle_name_with_separator() {
    let temp_dir = TempDir::new().unwrap();
    let collector = Collector::new(
        create_test_config(&temp_dir),
        Platform::new(OsFamily::Linux, None),
    );

    assert!(matches!(
        collector.run_checks("../escape", &test_checks()),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_rejects_dot_bundle_names_without_touching_output_dir() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir);
    std::fs::create_dir_all(&config.output_dir).unwrap();
    let precious = config.output_dir.join("precious.txt");
    std::fs::write(&precious, "keep me").unwrap();
    let sibling = temp_dir.path().join("sibling.txt");
    std::fs::write(&sibling, "keep me too").unwrap();

    let collector = Collector::new(config, Platform::new(OsFamily::Linux, None));
    for name in [".", ".."] {
        assert!(matches!(
            collector.run_checks(name, &test_checks()),
            Err(Error::Config(_))
        ));
    }

    assert_eq!(std::fs::read_to_string(&precious).unwrap(), "keep me");
    assert_eq!(std::fs::read_to_string(&sibling).unwrap(), "keep me too");
}

#[test]
fn test_redaction_covers_manifest_and_summary() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&temp_dir);
    config.redaction.enabled = true;
    config.redaction.redact_hostnames = true;
    let mut platform = Platform::new(OsFamily::Linux, None);
    platform.hostname = "secrethost.example.com".to_string();
    let collector = Collector::new(config, platform);

    let bundle_name = collector.bundle_name();
    assert!(!bundle_name.contains("secrethost"));

    let checks = vec![Check::command(
        "uname",
        Category::System,
        "echo",
        &["running on secrethost.example.com"],
    )];
    let collection = collector.run_checks(&bundle_name, &checks).unwrap();

    let json = read_archive_file(
        &collection.archive.path,
        &format!("{}/manifest.json", bundle_name),
    );
    assert!(!json.contains("secrethost"), "{}", json);
    let manifest: BundleManifest = serde_json::from_str(&json).unwrap();
    assert!(manifest.metadata.redacted);
    assert_eq!(manifest.metadata.hostname, "[REDACTED_HOST]");

    let summary = read_archive_file(
        &collection.archive.path,
        &format!("{}/summary.txt", bundle_name),
    );
    assert!(!summary.contains("secrethost"), "{}", summary);

    let output = read_archive_file(
        &collection.archive.path,
        &format!("{}/system/uname.txt", bundle_name),
    );
    assert_eq!(output, "running on [REDACTED_HOST]\n");
}

#[test]
fn test_failed_archive_removes_bundle_tree() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&temp_dir);
    // A directory in the archive's place makes writing the archive fail
    let blocker = config.output_dir.join("bundle.tar.gz");
    std::fs::create_dir_all(&blocker).unwrap();

    let collector = Collector::new(config, Platform::new(OsFamily::Linux, None));
    let result = collector.run_checks("bundle", &test_checks());

    assert!(matches!(result, Err(Error::Archive { .. })));
    assert!(!temp_dir.path().join("out/bundle").exists());
    assert!(blocker.is_dir());
}

#[test]
fn test_redacts_read_only_copies() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("hosts");
    std::fs::write(&source, "10.9.8.7 gateway\n").unwrap();
    std::fs::set_permissions(&source, std::fs::Permissions::from_mode(0o444)).unwrap();

    let mut config = create_test_config(&temp_dir);
    config.keep_tree = true;
    config.redaction.enabled = true;
    let collector = Collector::new(config, Platform::new(OsFamily::Linux, None));

    let checks = vec![Check::copy_file("hosts", Category::SystemEtc, &source)];
    let collection = collector.run_checks("bundle", &checks).unwrap();

    let tree = collection.tree.expect("tree should be kept");
    assert_eq!(
        std::fs::read_to_string(tree.join("system/etc/hosts")).unwrap(),
        "[REDACTED_IP] gateway\n"
    );
    assert_eq!(
        std::fs::read_to_string(&source).unwrap(),
        "10.9.8.7 gateway\n"
    );
}
