//! Chart loading and dependency merge tests against the in-memory system

use chartdoc::config::MissingArchivePolicy;
use chartdoc::error::ChartDocError;
use chartdoc::operations::{LoadOptions, load_chart, load_with_dependencies};
use chartdoc::system::{CommandOutput, MockSystem, System};
use chartdoc::values::Parameter;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::Path;

const WEB_VALUES: &str = r#"# Default values for web.
replicaCount: 1

image:
  repository: nginx  # container image repository
  tag: stable
  pullPolicy: IfNotPresent

nameOverride: ""
fullnameOverride: ""

service:
  type: ClusterIP  # how the service is exposed
  port: 80

ingress:
  enabled: false
  annotations: {}
  path: /
  hosts:
    - chart-example.local
  tls: []

resources: {}
nodeSelector: {}
tolerations: []
affinity: {}
"#;

fn tgz(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, *contents).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

fn paths(parameters: &[Parameter]) -> Vec<&str> {
    parameters.iter().map(|p| p.path.as_str()).collect()
}

fn chart_with_dependency() -> MockSystem {
    let archive = tgz(&[
        (
            "dependencyname/Chart.yaml",
            b"apiVersion: v2\nname: dependencyname\nversion: 1.0.0\n",
        ),
        (
            "dependencyname/values.yaml",
            b"image:\n  repository: nginx  # dependency image\n  tag: latest\n",
        ),
    ]);

    MockSystem::new()
        .with_file(
            "/chart/Chart.yaml",
            b"apiVersion: v2\nname: app\nversion: 0.1.0\ndependencies:\n  - name: dependencyname\n    version: 1.0.0\n    repository: https://charts.example.com\n",
        )
        .unwrap()
        .with_file(
            "/chart/values.yaml",
            b"image:\n  repository: myapp  # application image\ndependencyname:\n  image:\n    tag: pinned\n",
        )
        .unwrap()
        .with_file("/chart/charts/dependencyname-1.0.0.tgz", &archive)
        .unwrap()
        .with_command("helm", CommandOutput::success())
        .unwrap()
}

#[test]
fn test_seventeen_leaves_without_dependencies() {
    let system = MockSystem::new()
        .with_file("/charts/web/Chart.yaml", b"name: web\nversion: 0.1.0\n")
        .unwrap()
        .with_file("/charts/web/values.yaml", WEB_VALUES.as_bytes())
        .unwrap();

    let options = LoadOptions {
        include_dependencies: false,
        ..LoadOptions::default()
    };
    let loaded = load_with_dependencies(&system, Path::new("/charts/web"), &options).unwrap();

    assert_eq!(loaded.manifest.name, "web");
    assert_eq!(loaded.parameters.len(), 17);
    assert_eq!(
        paths(&loaded.parameters),
        vec![
            "replicaCount",
            "image.repository",
            "image.tag",
            "image.pullPolicy",
            "nameOverride",
            "fullnameOverride",
            "service.type",
            "service.port",
            "ingress.enabled",
            "ingress.annotations",
            "ingress.path",
            "ingress.hosts",
            "ingress.tls",
            "resources",
            "nodeSelector",
            "tolerations",
            "affinity",
        ]
    );
    assert!(loaded.parameters.contains(&Parameter::new("replicaCount", "", "1")));
    assert!(loaded.parameters.contains(&Parameter::new(
        "image.repository",
        "container image repository",
        r#""nginx""#
    )));
    assert!(loaded.parameters.contains(&Parameter::new("ingress.enabled", "", "false")));
    assert!(loaded.parameters.contains(&Parameter::new(
        "ingress.hosts",
        "",
        r#"["chart-example.local"]"#
    )));
    assert!(loaded.parameters.contains(&Parameter::new("resources", "", "{}")));
}

#[test]
fn test_dependency_values_merged_under_namespace() {
    let system = chart_with_dependency();

    let loaded =
        load_with_dependencies(&system, Path::new("/chart"), &LoadOptions::default()).unwrap();

    assert_eq!(loaded.manifest.name, "app");
    assert_eq!(
        loaded.parameters,
        vec![
            Parameter::new("image.repository", "application image", r#""myapp""#),
            Parameter::new("dependencyname.image.tag", "", r#""pinned""#),
            Parameter::new(
                "dependencyname.image.repository",
                "dependency image",
                r#""nginx""#
            ),
        ]
    );
    assert_eq!(
        system.executed_commands().unwrap(),
        vec![vec!["helm", "dependency", "update", "/chart"]]
    );
}

#[test]
fn test_scratch_directory_removed_after_merge() {
    let system = chart_with_dependency();

    load_with_dependencies(&system, Path::new("/chart"), &LoadOptions::default()).unwrap();

    assert!(!system.exists(Path::new("/tmp/mock_1")));
    let leftovers = system.walk_dir(Path::new("/tmp"), false, true).unwrap();
    assert!(leftovers.is_empty(), "{leftovers:?}");
}

#[test]
fn test_scratch_directory_removed_after_failure() {
    let archive = tgz(&[("README.md", b"not a chart\n")]);
    let system = MockSystem::new()
        .with_file(
            "/chart/Chart.yaml",
            b"name: app\ndependencies:\n  - name: broken\n    version: 1.0.0\n",
        )
        .unwrap()
        .with_file("/chart/values.yaml", b"a: 1\n")
        .unwrap()
        .with_file("/chart/charts/broken-1.0.0.tgz", &archive)
        .unwrap();

    let options = LoadOptions {
        update_dependencies: false,
        ..LoadOptions::default()
    };
    let err = load_with_dependencies(&system, Path::new("/chart"), &options).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ChartDocError>(),
        Some(ChartDocError::ArchiveExtraction { .. })
    ));
    assert!(!system.exists(Path::new("/tmp/mock_1")));
}

#[test]
fn test_skip_refresh_and_no_update() {
    let system = chart_with_dependency();
    let options = LoadOptions {
        skip_dependency_repo_refresh: true,
        ..LoadOptions::default()
    };
    load_with_dependencies(&system, Path::new("/chart"), &options).unwrap();
    assert_eq!(
        system.executed_commands().unwrap(),
        vec![vec!["helm", "dependency", "update", "/chart", "--skip-refresh"]]
    );

    let system = chart_with_dependency();
    let options = LoadOptions {
        update_dependencies: false,
        ..LoadOptions::default()
    };
    let loaded = load_with_dependencies(&system, Path::new("/chart"), &options).unwrap();
    assert_eq!(loaded.parameters.len(), 3);
    assert!(system.executed_commands().unwrap().is_empty());
}

#[test]
fn test_missing_helm_is_tool_missing() {
    let system = MockSystem::new()
        .with_file(
            "/chart/Chart.yaml",
            b"name: app\ndependencies:\n  - name: redis\n    version: 17.0.0\n",
        )
        .unwrap()
        .with_file("/chart/values.yaml", b"a: 1\n")
        .unwrap();

    let err =
        load_with_dependencies(&system, Path::new("/chart"), &LoadOptions::default()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ChartDocError>(),
        Some(ChartDocError::DependencyToolMissing { .. })
    ));
    assert!(err.to_string().contains("--no-deps"));
}

#[test]
fn test_missing_archive_policy() {
    let system = MockSystem::new()
        .with_file(
            "/chart/Chart.yaml",
            b"name: app\ndependencies:\n  - name: redis\n    version: 17.0.0\n",
        )
        .unwrap()
        .with_file("/chart/values.yaml", b"a: 1\n")
        .unwrap()
        .with_command("helm", CommandOutput::success())
        .unwrap();

    let skipped =
        load_with_dependencies(&system, Path::new("/chart"), &LoadOptions::default()).unwrap();
    assert_eq!(skipped.parameters, vec![Parameter::new("a", "", "1")]);

    let strict = LoadOptions {
        missing_archive: MissingArchivePolicy::Fail,
        ..LoadOptions::default()
    };
    let err = load_with_dependencies(&system, Path::new("/chart"), &strict).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ChartDocError>(),
        Some(ChartDocError::DependencyArchiveMissing { .. })
    ));
    assert!(err.to_string().contains("redis"));
}

#[test]
fn test_nested_dependencies_use_bundled_archives() {
    let inner = tgz(&[
        ("b/Chart.yaml", b"name: b\nversion: 2.0.0\n"),
        ("b/values.yaml", b"y: 2  # from b\n"),
    ]);
    let outer = tgz(&[
        (
            "a/Chart.yaml",
            b"name: a\nversion: 1.0.0\ndependencies:\n  - name: b\n    version: 2.0.0\n",
        ),
        ("a/values.yaml", b"x: 1\n"),
        ("a/charts/b-2.0.0.tgz", &inner),
    ]);

    let system = MockSystem::new()
        .with_file(
            "/chart/Chart.yaml",
            b"name: root\ndependencies:\n  - name: a\n    version: 1.0.0\n",
        )
        .unwrap()
        .with_file("/chart/values.yaml", b"top: true\n")
        .unwrap()
        .with_file("/chart/charts/a-1.0.0.tgz", &outer)
        .unwrap()
        .with_command("helm", CommandOutput::success())
        .unwrap();

    let loaded =
        load_with_dependencies(&system, Path::new("/chart"), &LoadOptions::default()).unwrap();

    assert_eq!(
        loaded.parameters,
        vec![
            Parameter::new("top", "", "true"),
            Parameter::new("a.x", "", "1"),
            Parameter::new("a.b.y", "from b", "2"),
        ]
    );
    assert_eq!(system.executed_commands().unwrap().len(), 1);
}

#[test]
fn test_alias_and_unpacked_dependency() {
    let system = MockSystem::new()
        .with_file(
            "/chart/Chart.yaml",
            b"name: app\ndependencies:\n  - name: redis\n    version: 17.0.0\n    alias: cache\n",
        )
        .unwrap()
        .with_file("/chart/values.yaml", b"a: 1\n")
        .unwrap()
        .with_file("/chart/charts/redis/Chart.yaml", b"name: redis\n")
        .unwrap()
        .with_file("/chart/charts/redis/values.yaml", b"port: 6379\n")
        .unwrap();

    let options = LoadOptions {
        update_dependencies: false,
        ..LoadOptions::default()
    };
    let loaded = load_with_dependencies(&system, Path::new("/chart"), &options).unwrap();

    assert_eq!(paths(&loaded.parameters), vec!["a", "cache.port"]);
}

#[test]
fn test_missing_values_document() {
    let system = MockSystem::new()
        .with_file("/chart/Chart.yaml", b"name: app\n")
        .unwrap();

    let err = load_chart(&system, Path::new("/chart"), &[]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ChartDocError>(),
        Some(ChartDocError::DocumentNotFound { .. })
    ));
}

#[test]
fn test_malformed_values_document() {
    let system = MockSystem::new()
        .with_file("/chart/Chart.yaml", b"name: app\n")
        .unwrap()
        .with_file("/chart/values.yaml", b"a: [1, 2\n")
        .unwrap();

    let err = load_chart(&system, Path::new("/chart"), &[]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ChartDocError>(),
        Some(ChartDocError::DocumentParse { .. })
    ));
    assert!(format!("{err:#}").contains("/chart/values.yaml"));
}
