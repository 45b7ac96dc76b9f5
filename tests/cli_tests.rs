//! CLI interface tests

use assert_cmd::Command;
use flate2::Compression;
use flate2::write::GzEncoder;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_chart(dir: &Path, chart: &str, values: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("Chart.yaml"), chart).unwrap();
    fs::write(dir.join("values.yaml"), values).unwrap();
}

fn write_tgz(path: &Path, files: &[(&str, &str)]) {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, contents.as_bytes()).unwrap();
    }
    let bytes = builder.into_inner().unwrap().finish().unwrap();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::cargo_bin("chartdoc").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chartdoc"));
}

#[test]
fn test_help_flag() {
    let mut cmd = Command::cargo_bin("chartdoc").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Generate documentation for Helm charts"));
}

#[test]
fn test_templates_lists_formats() {
    let mut cmd = Command::cargo_bin("chartdoc").unwrap();
    cmd.arg("templates")
        .assert()
        .success()
        .stdout("markdown\nrst\n");
}

#[test]
fn test_gen_markdown() {
    let temp_dir = TempDir::new().unwrap();
    let chart = temp_dir.path().join("web");
    write_chart(
        &chart,
        "name: web\ndescription: A web server\nversion: 0.1.0\n",
        "image:\n  repository: nginx  # container image\nreplicas: 2\n",
    );

    let mut cmd = Command::cargo_bin("chartdoc").unwrap();
    cmd.current_dir(temp_dir.path())
        .arg("gen")
        .arg(&chart)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# web\n\nA web server\n"))
        .stdout(predicate::str::contains(
            r#"| `image.repository` | container image | `"nginx"` |"#,
        ))
        .stdout(predicate::str::contains("| `replicas` |  | `2` |"))
        .stdout(predicate::str::contains("generated by chartdoc"));
}

#[test]
fn test_gen_rst_without_credits() {
    let temp_dir = TempDir::new().unwrap();
    let chart = temp_dir.path().join("web");
    write_chart(&chart, "name: web\n", "replicas: 2\n");

    let mut cmd = Command::cargo_bin("chartdoc").unwrap();
    cmd.current_dir(temp_dir.path())
        .args(["gen", "web", "-o", "rst", "--no-credits"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("web\n===\n"))
        .stdout(predicate::str::contains("   * - ``replicas``"))
        .stdout(predicate::str::contains("generated by chartdoc").not());
}

#[test]
fn test_gen_uses_bundled_archives() {
    let temp_dir = TempDir::new().unwrap();
    let chart = temp_dir.path().join("app");
    write_chart(
        &chart,
        "name: app\ndependencies:\n  - name: nginx\n    version: 15.0.0\n",
        "replicas: 1\n",
    );
    write_tgz(
        &chart.join("charts/nginx-15.0.0.tgz"),
        &[
            ("nginx/Chart.yaml", "name: nginx\nversion: 15.0.0\n"),
            ("nginx/values.yaml", "image:\n  repository: nginx  # nginx image\n"),
        ],
    );

    let mut cmd = Command::cargo_bin("chartdoc").unwrap();
    cmd.current_dir(temp_dir.path())
        .args(["gen", "app", "--no-dependency-update"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"| `nginx.image.repository` | nginx image | `"nginx"` |"#,
        ));
}

#[test]
fn test_gen_strict_dependencies_fails_on_missing_archive() {
    let temp_dir = TempDir::new().unwrap();
    let chart = temp_dir.path().join("app");
    write_chart(
        &chart,
        "name: app\ndependencies:\n  - name: redis\n    version: 17.0.0\n",
        "replicas: 1\n",
    );

    let mut cmd = Command::cargo_bin("chartdoc").unwrap();
    cmd.current_dir(temp_dir.path())
        .args(["gen", "app", "--no-dependency-update", "--strict-dependencies"])
        .assert()
        .failure()
        .code(6)
        .stderr(predicate::str::contains("redis"));

    let mut cmd = Command::cargo_bin("chartdoc").unwrap();
    cmd.current_dir(temp_dir.path())
        .args(["gen", "app", "--no-dependency-update"])
        .assert()
        .success()
        .stdout(predicate::str::contains("`replicas`"));
}

#[test]
fn test_gen_missing_chart() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("chartdoc").unwrap();
    cmd.current_dir(temp_dir.path())
        .args(["gen", "nowhere"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Document not found"));
}

#[test]
fn test_missing_explicit_config() {
    let temp_dir = TempDir::new().unwrap();
    write_chart(&temp_dir.path().join("web"), "name: web\n", "a: 1\n");

    let mut cmd = Command::cargo_bin("chartdoc").unwrap();
    cmd.current_dir(temp_dir.path())
        .args(["gen", "web", "--config", "missing.yaml"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_config_file_sets_format() {
    let temp_dir = TempDir::new().unwrap();
    write_chart(&temp_dir.path().join("web"), "name: web\n", "a: 1\n");
    fs::write(temp_dir.path().join("chartdoc.yaml"), "outputFormat: rst\ncredits: false\n").unwrap();

    let mut cmd = Command::cargo_bin("chartdoc").unwrap();
    cmd.current_dir(temp_dir.path())
        .args(["gen", "web"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("web\n===\n"));

    let mut cmd = Command::cargo_bin("chartdoc").unwrap();
    cmd.current_dir(temp_dir.path())
        .args(["gen", "web", "-o", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# web\n"));
}

#[test]
fn test_hook_reports_changes_with_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    write_chart(&temp_dir.path().join("charts/web"), "name: web\n", "a: 1\n");

    let mut cmd = Command::cargo_bin("chartdoc").unwrap();
    cmd.current_dir(temp_dir.path())
        .args(["hook", "--no-deps"])
        .assert()
        .failure()
        .code(1);

    let readme = fs::read_to_string(temp_dir.path().join("charts/web/README.md")).unwrap();
    assert!(readme.contains("| `a` |  | `1` |"));

    let mut cmd = Command::cargo_bin("chartdoc").unwrap();
    cmd.current_dir(temp_dir.path())
        .args(["hook", "--no-deps"])
        .assert()
        .success();
}
