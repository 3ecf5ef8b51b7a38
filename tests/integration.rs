//! Integration tests for the contactbook CLI

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command as AssertCommand;
use image::GenericImageView;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Test environment with an isolated config file and vdir
struct TestEnv {
    temp_dir: TempDir,
    config_path: PathBuf,
    vdir_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let vdir_path = temp_dir.path().join("vdir");
        fs::create_dir_all(&vdir_path).unwrap();

        fs::write(
            &config_path,
            format!("source = {:?}\n", vdir_path.to_str().unwrap()),
        )
        .unwrap();

        Self {
            temp_dir,
            config_path,
            vdir_path,
        }
    }

    fn add_card(&self, file_name: &str, body: &str) {
        let card = format!("BEGIN:VCARD\r\nVERSION:4.0\r\n{body}END:VCARD\r\n");
        fs::write(self.vdir_path.join(file_name), card).unwrap();
    }

    /// Run contactbook with this test env's config
    fn contactbook(&self) -> AssertCommand {
        let mut cmd = contactbook_cmd();
        cmd.env("HOME", self.temp_dir.path())
            .env_remove("RUST_LOG")
            .args(["--config", self.config_path.to_str().unwrap()]);
        cmd
    }
}

/// Get the contactbook binary command
fn contactbook_cmd() -> AssertCommand {
    AssertCommand::cargo_bin("contactbook").unwrap()
}

fn sample_env() -> TestEnv {
    let env = TestEnv::new();
    env.add_card("bob.vcf", "FN:Bob Lee\r\n");
    env.add_card("amy.vcf", "FN:Amy\r\nTEL;TYPE=cell:123\r\n");
    env
}

fn png_dimensions(path: &Path) -> (u32, u32) {
    let image = image::open(path).unwrap();
    (image.width(), image.height())
}

// =============================================================================
// list / titles
// =============================================================================

#[test]
fn test_list_groups_contacts_by_letter() {
    let env = sample_env();

    env.contactbook()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("A\n  0. Amy\tmobile: 123"))
        .stdout(predicate::str::contains(
            "B\n  0. Bob Lee\tUnknown type: Unable to get contact number",
        ));
}

#[test]
fn test_list_json_output() {
    let env = sample_env();

    let output = env.contactbook().args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());

    let sections: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let sections = sections.as_array().unwrap();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["title"], "A");
    assert_eq!(sections[0]["contacts"][0]["title"], "Amy");
    assert_eq!(sections[0]["contacts"][0]["phones"][0]["number"], "123");
    assert_eq!(sections[1]["title"], "B");
    assert_eq!(sections[1]["contacts"][0]["initials"], "B L");
    assert_eq!(sections[1]["contacts"][0]["image"]["generated"], true);
    assert_eq!(sections[1]["contacts"][0]["image"]["width"], 100);
}

#[test]
fn test_titles() {
    let env = sample_env();
    env.add_card("zoe.vcf", "FN:Zoe\r\n");

    env.contactbook()
        .arg("titles")
        .assert()
        .success()
        .stdout("A B Z\n");
}

#[test]
fn test_list_empty_vdir() {
    let env = TestEnv::new();

    env.contactbook()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No contacts."));
}

#[test]
fn test_source_flag_overrides_config() {
    let env = sample_env();
    let other = env.temp_dir.path().join("other");
    fs::create_dir_all(&other).unwrap();
    fs::write(
        other.join("carl.vcf"),
        "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:Carl\r\nEND:VCARD\r\n",
    )
    .unwrap();

    env.contactbook()
        .args(["--source", other.to_str().unwrap(), "titles"])
        .assert()
        .success()
        .stdout("C\n");
}

#[test]
fn test_missing_source_file_is_not_created() {
    let env = TestEnv::new();
    let typo = env.temp_dir.path().join("typo").join("contacts.vcf");

    env.contactbook()
        .args(["--source", typo.to_str().unwrap(), "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
    assert!(!env.temp_dir.path().join("typo").exists());
}

#[test]
fn test_create_source_makes_empty_vdir() {
    let env = TestEnv::new();
    let fresh = env.temp_dir.path().join("fresh");
    fs::write(
        &env.config_path,
        format!("source = {:?}\ncreate_source = true\n", fresh.to_str().unwrap()),
    )
    .unwrap();

    env.contactbook()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No contacts."));
    assert!(fresh.is_dir());
}

#[test]
fn test_missing_config_file_fails() {
    let env = TestEnv::new();
    contactbook_cmd()
        .env("HOME", env.temp_dir.path())
        .args(["--config", "/nonexistent/contactbook.toml", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

// =============================================================================
// show
// =============================================================================

#[test]
fn test_show_contact_details() {
    let env = sample_env();

    env.contactbook()
        .args(["show", "1", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bob Lee"))
        .stdout(predicate::str::contains("Initials: B L"))
        .stdout(predicate::str::contains("Image: 100x100 (generated)"))
        .stdout(predicate::str::contains(
            "Unknown type: Unable to get contact number",
        ));
}

#[test]
fn test_show_out_of_range() {
    let env = sample_env();

    env.contactbook()
        .args(["show", "7", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No information to show"));
}

#[test]
fn test_show_nameless_contact_keeps_placeholder_phone() {
    let env = TestEnv::new();
    env.add_card("blank.vcf", "FN: \r\n");

    env.contactbook()
        .arg("titles")
        .assert()
        .success()
        .stdout("*\n");

    env.contactbook()
        .args(["show", "0", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No name"))
        .stdout(predicate::str::contains("Initials").not())
        .stdout(predicate::str::contains(
            "Unknown type: Unable to get contact number",
        ));
}

// =============================================================================
// avatar
// =============================================================================

#[test]
fn test_avatar_writes_png() {
    let env = TestEnv::new();
    let out = env.temp_dir.path().join("js.png");

    env.contactbook()
        .args(["avatar", "John Smith", "--seed", "4", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("100x100"));

    assert_eq!(png_dimensions(&out), (100, 100));
}

#[test]
fn test_avatar_uses_configured_size() {
    let env = TestEnv::new();
    fs::write(&env.config_path, "[avatar]\nside = 40\nscale = 2\n").unwrap();
    let out = env.temp_dir.path().join("m.png");

    env.contactbook()
        .args(["avatar", "Madonna", "--out"])
        .arg(&out)
        .assert()
        .success();

    assert_eq!(png_dimensions(&out), (80, 80));
}

#[test]
fn test_avatar_font_larger_than_frame_is_rejected() {
    let env = TestEnv::new();
    fs::write(&env.config_path, "[avatar]\nfont_size = 1e10\n").unwrap();
    let out = env.temp_dir.path().join("big.png");

    env.contactbook()
        .args(["avatar", "Madonna", "--out"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("avatar.font_size"));
    assert!(!out.exists());
}

#[test]
fn test_avatar_seed_is_reproducible() {
    let env = TestEnv::new();
    let first = env.temp_dir.path().join("a.png");
    let second = env.temp_dir.path().join("b.png");

    for out in [&first, &second] {
        env.contactbook()
            .args(["avatar", "Amy", "--seed", "11", "--out"])
            .arg(out)
            .assert()
            .success();
    }

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_avatar_rejects_blank_name() {
    let env = TestEnv::new();
    let out = env.temp_dir.path().join("blank.png");

    env.contactbook()
        .args(["avatar", "   ", "--out"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("initials"));
    assert!(!out.exists());
}
