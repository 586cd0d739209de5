use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

const TRACKER: &str = "http://tracker.example.com:6969/tracker/announce";

fn createtorrent(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_createtorrent"));
    // Keep the user's config file out of the tests.
    let config = config_dir.join("config.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    cmd.arg("--config").arg(config);
    cmd
}

#[test]
fn test_help() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_createtorrent"));
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "A CLI utility to create BitTorrent metainfo files",
        ));
}

#[test]
fn test_version() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_createtorrent"));
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!(
            "createtorrent ",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_create_basic() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source_file = temp_dir.path().join("test.txt");
    fs::write(&source_file, "random data").unwrap();
    let output_file = temp_dir.path().join("test.torrent");

    createtorrent(temp_dir.path())
        .arg("-a")
        .arg(TRACKER)
        .arg(&source_file)
        .arg(&output_file)
        .assert()
        .success()
        .stderr(predicate::str::contains("Created:"));

    let bytes = fs::read(&output_file).unwrap();
    assert!(bytes.starts_with(b"d8:announce"));
}

#[test]
fn test_announce_required() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source_file = temp_dir.path().join("test.txt");
    fs::write(&source_file, "random data").unwrap();

    createtorrent(temp_dir.path())
        .arg(&source_file)
        .arg(temp_dir.path().join("test.torrent"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("announce"));
}

#[test]
fn test_missing_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output_file = temp_dir.path().join("out.torrent");

    createtorrent(temp_dir.path())
        .arg("-a")
        .arg(TRACKER)
        .arg(temp_dir.path().join("non_existent_file.txt"))
        .arg(&output_file)
        .assert()
        .failure();

    assert!(!output_file.exists());
}

#[test]
fn test_existing_output_needs_force() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source_file = temp_dir.path().join("data.txt");
    fs::write(&source_file, "some data").unwrap();
    let output_file = temp_dir.path().join("data.torrent");
    fs::write(&output_file, "existing").unwrap();

    createtorrent(temp_dir.path())
        .arg("-a")
        .arg(TRACKER)
        .arg(&source_file)
        .arg(&output_file)
        .assert()
        .failure();
    assert_eq!(fs::read_to_string(&output_file).unwrap(), "existing");

    createtorrent(temp_dir.path())
        .arg("-f")
        .arg("-a")
        .arg(TRACKER)
        .arg(&source_file)
        .arg(&output_file)
        .assert()
        .success();
    assert!(fs::read(&output_file).unwrap().starts_with(b"d8:announce"));
}

#[test]
fn test_output_json() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source_file = temp_dir.path().join("json_test.txt");
    fs::write(&source_file, "json test data").unwrap();

    createtorrent(temp_dir.path())
        .arg("--json")
        .arg("-a")
        .arg(TRACKER)
        .arg(&source_file)
        .arg(temp_dir.path().join("out.torrent"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"json_test.txt\""))
        .stdout(predicate::str::contains("\"info_hash\""));
}

#[test]
fn test_dry_run() {
    let temp_dir = tempfile::tempdir().unwrap();
    let content_dir = temp_dir.path().join("content");
    fs::create_dir(&content_dir).unwrap();
    fs::write(content_dir.join("a.txt"), "aaaa").unwrap();
    fs::write(content_dir.join("b.txt"), "bbbb").unwrap();

    createtorrent(temp_dir.path())
        .arg("--dry-run")
        .arg("--json")
        .arg("-a")
        .arg(TRACKER)
        .arg(&content_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_size\": 8"))
        .stdout(predicate::str::contains("\"piece_count\": 1"));

    let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
    // Only the content directory and the config file.
    assert_eq!(entries.len(), 2);
}

#[test]
fn test_profile_from_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("config.toml"),
        format!(
            "piece-length = 16384\n\n[profiles.home]\nannounce = [\"{}\"]\ncomment = \"from profile\"\n",
            TRACKER
        ),
    )
    .unwrap();
    let source_file = temp_dir.path().join("p.txt");
    fs::write(&source_file, "profile data").unwrap();

    createtorrent(temp_dir.path())
        .arg("--profile")
        .arg("home")
        .arg("--json")
        .arg(&source_file)
        .arg(temp_dir.path().join("p.torrent"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"piece_length\": 16384"))
        .stdout(predicate::str::contains(TRACKER));

    let bytes = fs::read(temp_dir.path().join("p.torrent")).unwrap();
    assert!(bytes.windows(12).any(|w| w == b"from profile"));
}

#[test]
fn test_legacy_tracker_warning() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source_file = temp_dir.path().join("legacy.txt");
    fs::write(&source_file, "legacy").unwrap();

    createtorrent(temp_dir.path())
        .arg("-a")
        .arg("http://example.com")
        .arg("-p")
        .arg("6969")
        .arg(&source_file)
        .arg(temp_dir.path().join("legacy.torrent"))
        .assert()
        .success()
        .stderr(predicate::str::contains("deprecated use of announce"));

    let bytes = fs::read(temp_dir.path().join("legacy.torrent")).unwrap();
    let expected = b"http://example.com:6969/announce";
    assert!(bytes.windows(expected.len()).any(|w| w == expected));
}
