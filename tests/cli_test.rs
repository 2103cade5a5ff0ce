//! End-to-end tests of the notarun binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn notarun() -> Command {
    let mut cmd = Command::cargo_bin("notarun").unwrap();
    cmd.env_remove("AC_USERNAME")
        .env_remove("AC_PASSWORD")
        .env_remove("AC_PROVIDER");
    cmd
}

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("notarun.toml");
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_help() {
    notarun()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Notarize and staple"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    notarun()
        .arg(dir.path().join("missing.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to notarize from"));
}

#[test]
fn test_config_without_items_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        r#"
bundle_id = "com.example.app"

[apple_id]
username = "dev@example.com"
password = "secret"
"#,
    );
    notarun()
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("[[notarize]]"));
}

#[test]
fn test_missing_password_names_env_var() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        r#"
bundle_id = "com.example.app"

[apple_id]
username = "dev@example.com"

[[notarize]]
path = "app.zip"
"#,
    );
    notarun()
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("AC_PASSWORD"));
}

#[cfg(unix)]
mod fake_xcrun {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    const SUBMITTED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>notarization-upload</key>
	<dict>
		<key>RequestUUID</key>
		<string>edc8a846-9fb1-4b1e-8bd1-7b7b4f1b0d5a</string>
	</dict>
	<key>success-message</key>
	<string>No errors uploading 'app.zip'.</string>
</dict>
</plist>"#;

    const APPROVED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>notarization-info</key>
	<dict>
		<key>RequestUUID</key>
		<string>edc8a846-9fb1-4b1e-8bd1-7b7b4f1b0d5a</string>
		<key>Status</key>
		<string>success</string>
		<key>Status Message</key>
		<string>Package Approved</string>
	</dict>
</dict>
</plist>"#;

    const REJECTED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>product-errors</key>
	<array>
		<dict>
			<key>code</key>
			<integer>-18000</integer>
			<key>message</key>
			<string>ERROR ITMS-90732: "Duplicate package."</string>
		</dict>
	</array>
</dict>
</plist>"#;

    /// Write a stand-in for `xcrun` that answers from canned documents
    fn install(dir: &Path, submit_reply: &str) -> std::path::PathBuf {
        std::fs::write(dir.join("submit.plist"), submit_reply).unwrap();
        std::fs::write(dir.join("info.plist"), APPROVED).unwrap();

        let script = format!(
            r#"#!/bin/sh
case "$2" in
  --notarize-app) cat "{dir}/submit.plist" ;;
  --notarization-info) cat "{dir}/info.plist" ;;
  staple) exit 0 ;;
  *) echo "unexpected arguments: $*" >&2; exit 2 ;;
esac
"#,
            dir = dir.display()
        );
        let path = dir.join("xcrun");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn config(dir: &TempDir, xcrun: &Path) -> std::path::PathBuf {
        write_config(
            dir,
            &format!(
                r#"
bundle_id = "com.example.app"

[apple_id]
username = "dev@example.com"
password = "secret"

[[notarize]]
path = "app.zip"
staple = true

[poll]
slow_interval_secs = 1
fast_interval_secs = 1

[tool]
xcrun = "{}"
"#,
                xcrun.display()
            ),
        )
    }

    #[test]
    fn test_notarize_and_staple() {
        let dir = TempDir::new().unwrap();
        let xcrun = install(dir.path(), SUBMITTED);
        let config = config(&dir, &xcrun);

        notarun()
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Submitted. Request UUID: edc8a846-9fb1-4b1e-8bd1-7b7b4f1b0d5a",
            ))
            .stdout(predicate::str::contains("Status: success"))
            .stdout(predicate::str::contains("app.zip (notarized and stapled)"));
    }

    #[test]
    fn test_rejected_submission_exits_with_failure() {
        let dir = TempDir::new().unwrap();
        let xcrun = install(dir.path(), REJECTED);
        let config = config(&dir, &xcrun);

        notarun()
            .arg(&config)
            .assert()
            .failure()
            .stdout(predicate::str::contains("Notarization failed for 1 of 1 files"))
            .stdout(predicate::str::contains("Duplicate package"));
    }
}
