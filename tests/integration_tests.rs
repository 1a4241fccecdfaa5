use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn test_help_command() {
    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Usage: s2i-create"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_version_command() {
    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("s2i-create"));
}

#[test]
fn test_list_command() {
    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("list");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("test-run-script"))
        .stdout(predicate::str::contains("test/test-app/index.html"))
        .stdout(predicate::str::contains("s2i/bin/assemble"));
}

#[test]
fn test_create_full_project() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("myapp");

    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("create").arg("myapp").arg(&project);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("created"))
        .stdout(predicate::str::contains("Dockerfile"));

    let dockerfile = fs::read_to_string(project.join("Dockerfile")).unwrap();
    assert!(dockerfile.contains("io.openshift.tags=\"builder,myapp\""));
    assert!(dockerfile.contains("COPY ./s2i/bin/ /usr/libexec/s2i"));

    let makefile = fs::read_to_string(project.join("Makefile")).unwrap();
    assert!(makefile.starts_with("IMAGE_NAME = myapp\n"));
    assert!(makefile.contains("\t$(DOCKER_BINARY) build -t $(IMAGE_NAME) ."));

    let test_run = fs::read_to_string(project.join("test/run")).unwrap();
    assert!(test_run.starts_with("#!/bin/bash"));
    assert!(test_run.contains("IMAGE_NAME=${IMAGE_NAME-myapp-candidate}"));
    assert!(test_run.contains(r#"--format="{{(index .HostConfig.PortBindings"#));

    assert!(project.join("s2i/bin/save-artifacts").is_file());
    assert!(project.join("test/test-app/index.html").is_file());

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        for script in ["test/run", "s2i/bin/assemble", "s2i/bin/run"] {
            let mode = fs::metadata(project.join(script))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o755, "{}", script);
        }
        let mode = fs::metadata(project.join("Makefile"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}

#[test]
fn test_create_without_builder() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("create")
        .arg("myapp")
        .arg(temp_dir.path())
        .arg("--without")
        .arg("builder");

    cmd.assert().success();

    assert!(temp_dir.path().join("Makefile").exists());
    assert!(temp_dir.path().join("test/run").exists());
    assert!(!temp_dir.path().join("Dockerfile").exists());
    assert!(!temp_dir.path().join("s2i").exists());
}

#[test]
fn test_create_refuses_existing_files() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("Makefile"), "mine").unwrap();

    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("create").arg("myapp").arg(temp_dir.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("already exist"))
        .stderr(predicate::str::contains("Makefile"));

    assert_eq!(
        fs::read_to_string(temp_dir.path().join("Makefile")).unwrap(),
        "mine"
    );
    assert!(!temp_dir.path().join("Dockerfile").exists());
}

#[test]
fn test_create_skip_policy() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("Makefile"), "mine").unwrap();

    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("create")
        .arg("myapp")
        .arg(temp_dir.path())
        .arg("--policy")
        .arg("skip-if-exists");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("skipped"));

    assert_eq!(
        fs::read_to_string(temp_dir.path().join("Makefile")).unwrap(),
        "mine"
    );
    assert!(temp_dir.path().join("Dockerfile").exists());
}

#[test]
fn test_create_overwrite_policy() {
    let temp_dir = TempDir::new().unwrap();

    let mut first = Command::cargo_bin("s2i-create").unwrap();
    first.arg("create").arg("first").arg(temp_dir.path());
    first.assert().success();

    let mut second = Command::cargo_bin("s2i-create").unwrap();
    second
        .arg("create")
        .arg("second")
        .arg(temp_dir.path())
        .arg("--policy")
        .arg("overwrite");
    second
        .assert()
        .success()
        .stdout(predicate::str::contains("overwritten"));

    let makefile = fs::read_to_string(temp_dir.path().join("Makefile")).unwrap();
    assert!(makefile.contains("IMAGE_NAME = second"));
    assert!(!makefile.contains("first"));
}

#[test]
fn test_create_dry_run_json() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("project");

    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("create")
        .arg("myapp")
        .arg(&project)
        .arg("--dry-run")
        .arg("--json");

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["files"].as_array().unwrap().len(), 9);
    assert_eq!(report["files"][0]["template"], "dockerfile");
    assert_eq!(report["files"][0]["outcome"], "created");
    assert!(!project.exists());
}

#[test]
fn test_create_named_template() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("create")
        .arg("myapp")
        .arg(temp_dir.path())
        .arg("--template")
        .arg("makefile");

    cmd.assert().success();

    assert!(temp_dir.path().join("Makefile").exists());
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

#[test]
fn test_create_unknown_template() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("create")
        .arg("myapp")
        .arg(temp_dir.path())
        .arg("-t")
        .arg("nope");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Template 'nope' does not exist."));
}

#[test]
fn test_create_requires_arguments() {
    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("create");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("IMAGE_NAME"));
}

#[test]
fn test_create_reports_partial_progress_on_failure() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("test"), "not a directory").unwrap();

    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("create").arg("myapp").arg(temp_dir.path()).arg("--json");

    let output = cmd.output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Scaffold stopped after 6 file(s)"));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let files = report["files"].as_array().unwrap();
    assert_eq!(files.len(), 7);
    assert_eq!(files[0]["template"], "dockerfile");
    assert_eq!(files[0]["outcome"], "created");
    assert_eq!(files[6]["template"], "test-run-script");
    assert_eq!(files[6]["outcome"], "failed");
}

#[test]
fn test_create_prints_partial_report_as_text() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("test"), "not a directory").unwrap();

    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("create").arg("myapp").arg(temp_dir.path());

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Dockerfile"))
        .stdout(predicate::str::contains("failed"));
}

#[test]
fn test_create_rejects_empty_selection() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("create")
        .arg("myapp")
        .arg(temp_dir.path())
        .arg("--without")
        .arg("builder")
        .arg("--without")
        .arg("tests");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No templates selected."));
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_create_template_conflicts_with_without() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("s2i-create").unwrap();
    cmd.arg("create")
        .arg("myapp")
        .arg(temp_dir.path())
        .arg("--template")
        .arg("makefile")
        .arg("--without")
        .arg("tests");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
    assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}
