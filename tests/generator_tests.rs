#![allow(clippy::unwrap_used, clippy::expect_used)]

use grip::cli::{run_cli, Cli};
use grip::generator::{assemble, render_schema, ProjectConfig};
use grip::{build_ir, load_config, GripError};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn sum_project(home: &Path) -> ProjectConfig {
    ProjectConfig {
        project_name: "sum".into(),
        home_dir: home.to_path_buf(),
        schema_file: home.join("sum.graphql"),
        handler_module: "handlers".into(),
        resolver_module: "resolvers".into(),
        config_path: fixture("sum.yaml"),
    }
}

#[test]
fn test_sum_end_to_end_schema() {
    let ir = build_ir(&load_config(fixture("sum.yaml")).unwrap()).unwrap();
    let schema = render_schema(&ir).unwrap();
    assert_eq!(schema, "type Query {\n    sum(a: Int!, b: Int!): Int!\n}\n");
    assert!(!schema.contains("type Mutation"));
}

#[test]
fn test_sum_project_files() {
    let dir = tempfile::tempdir().unwrap();
    let ir = build_ir(&load_config(fixture("sum.yaml")).unwrap()).unwrap();
    let project = sum_project(dir.path());
    assemble(&ir, &project, false).unwrap();

    let handlers = fs::read_to_string(dir.path().join("src/handlers.rs")).unwrap();
    assert!(handlers.contains("pub fn sum_func(input: &InputData, services: &ServiceRegistry, extra: &ExtraArgs) -> HandlerResult"));
    assert!(handlers.contains(".with(\"sum_func\", sum_func)"));

    let resolvers = fs::read_to_string(dir.path().join("src/resolvers.rs")).unwrap();
    assert!(resolvers.contains("forward(ctx, OperationKind::Query, \"sum\", input)"));

    let main = fs::read_to_string(dir.path().join("src/main.rs")).unwrap();
    assert!(main.contains("include_str!(\"../sum.graphql\")"));
    assert!(main.contains("GripService::start("));

    let manifest = fs::read_to_string(dir.path().join("Cargo.toml")).unwrap();
    assert!(manifest.contains("name = \"sum\""));
}

#[test]
fn test_overwrite_guard() {
    let dir = tempfile::tempdir().unwrap();
    let ir = build_ir(&load_config(fixture("sum.yaml")).unwrap()).unwrap();
    let project = sum_project(dir.path());
    assemble(&ir, &project, false).unwrap();

    let handler_path = project.handler_path();
    let edited = "// my implementation\n";
    fs::write(&handler_path, edited).unwrap();
    let schema_bytes = b"# hand-edited\ntype Query {\n    sum(a: Int!, b: Int!): Int!\n}\n";
    fs::write(&project.schema_file, schema_bytes).unwrap();

    match assemble(&ir, &project, false) {
        Err(GripError::ArtifactExists { path }) => assert_eq!(path, project.schema_file),
        other => panic!("expected ArtifactExists, got {other:?}"),
    }
    assert_eq!(fs::read(&project.schema_file).unwrap(), schema_bytes);
    assert_eq!(fs::read_to_string(&handler_path).unwrap(), edited);

    assemble(&ir, &project, true).unwrap();
    let replaced = fs::read_to_string(&handler_path).unwrap();
    assert!(replaced.contains("placeholder data"));
    let regenerated = fs::read(&project.schema_file).unwrap();
    assert_ne!(regenerated, schema_bytes);
    assert_eq!(regenerated, render_schema(&ir).unwrap().into_bytes());
}

#[test]
fn test_duplicate_definition_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().join("home");
    let config = dir.path().join("grip.yaml");
    fs::write(
        &config,
        format!(
            "globals:\n  project_home: {}\n  handler_module: handlers\n  resolver_module: resolvers\nquery_defs:\n  sum:\n    output: Int\n  sum:\n    output: Int\n",
            home.display()
        ),
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "grip-gen",
        "build-schema",
        "--config",
        config.to_str().unwrap(),
        "--project-name",
        "dup",
    ])
    .unwrap();
    let err = run_cli(&cli).unwrap_err();
    assert!(err.to_string().contains("duplicate definition of query 'sum'"));
    assert!(!home.exists());
}

#[test]
fn test_project_home_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("GRIP_SHOP_HOME", dir.path());
    let config = load_config(fixture("shop.yaml")).unwrap();
    let project = ProjectConfig::from_config(&config, &fixture("shop.yaml"), "shop").unwrap();
    assert_eq!(project.home_dir, dir.path());
    assert_eq!(project.schema_file, dir.path().join("shop.graphql"));

    let ir = build_ir(&config).unwrap();
    let written = assemble(&ir, &project, false).unwrap();
    assert_eq!(written.len(), 5);
    let schema = fs::read_to_string(&project.schema_file).unwrap();
    assert!(schema.starts_with("type Query {\n    widget(id: ID!): Widget\n"));
    assert!(schema.contains("type Mutation {\n    createWidget(name: String!, parts: [String]): Widget\n}"));
}
