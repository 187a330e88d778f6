#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::ir::{Arg, Ir, OperationKind, OperationSpec, TypeSpec};
use std::fs;
use std::path::PathBuf;

fn op(kind: OperationKind, name: &str, args: &[(&str, &str)], ret: &str) -> OperationSpec {
    OperationSpec {
        kind,
        name: name.to_string(),
        return_type: ret.to_string(),
        args: args.iter().map(|(n, t)| Arg::new(*n, *t)).collect(),
    }
}

fn shop_ir() -> Ir {
    Ir {
        queries: vec![
            op(OperationKind::Query, "widget", &[("id", "ID!")], "Widget"),
            op(OperationKind::Query, "widgets", &[], "[Widget]"),
        ],
        mutations: vec![op(
            OperationKind::Mutation,
            "widget",
            &[("name", "String!")],
            "Widget",
        )],
        types: vec![TypeSpec {
            name: "Widget".into(),
            fields: vec![Arg::new("id", "ID!"), Arg::new("parts", "[Part]")],
        }],
    }
}

fn project(home: PathBuf) -> ProjectConfig {
    ProjectConfig {
        project_name: "shop".into(),
        schema_file: home.join("shop.graphql"),
        home_dir: home.clone(),
        handler_module: "handlers".into(),
        resolver_module: "resolvers".into(),
        config_path: home.join("grip.yaml"),
    }
}

#[test]
fn test_schema_block_layout() {
    let schema = render_schema(&shop_ir()).unwrap();
    assert_eq!(
        schema,
        "type Query {\n    widget(id: ID!): Widget\n    widgets: [Widget]\n}\n\n\
         type Mutation {\n    widget(name: String!): Widget\n}\n\n\
         type Widget {\n    id: ID!\n    parts: [Part]\n}\n"
    );
}

#[test]
fn test_empty_mutation_block_omitted() {
    let mut ir = shop_ir();
    ir.mutations.clear();
    ir.types.clear();
    let schema = render_schema(&ir).unwrap();
    assert!(!schema.contains("Mutation"));
    assert!(schema.ends_with("}\n"));
    assert!(render_operation_block(OperationKind::Mutation, &[]).unwrap().is_none());
}

#[test]
fn test_handler_module_dedups_shared_symbol() {
    let source = render_handler_module(&shop_ir(), "shop", "handlers").unwrap();
    assert_eq!(source.matches("pub fn widget_func(").count(), 1);
    assert!(source.contains("pub fn widgets_func("));
    assert!(source.contains("/// Serves query `widget` and mutation `widget`"));
    assert!(source.contains("HandlerModule::new(\"handlers\")"));
    assert!(source.contains(".with(\"widgets_func\", widgets_func)"));
    assert!(source.contains("placeholder data"));
}

#[test]
fn test_resolver_module_binds_every_operation() {
    let source = render_resolver_module(&shop_ir(), "shop").unwrap();
    assert!(source.contains("pub fn resolve_query_widget("));
    assert!(source.contains("pub fn resolve_mutation_widget("));
    assert!(source.contains("forward(ctx, OperationKind::Mutation, \"widget\", input)"));
    assert!(source.contains(".mutation(\"widget\", resolve_mutation_widget)"));
    assert!(source.contains("/// `widgets: [Widget]`"));
}

#[test]
fn test_bootstrap_includes_relative_schema() {
    let project = project(PathBuf::from("/srv/shop"));
    assert_eq!(project.schema_include(), "../shop.graphql");
    let main = render_bootstrap(&project).unwrap();
    assert!(main.contains("mod handlers;"));
    assert!(main.contains("mod resolvers;"));
    assert!(main.contains("include_str!(\"../shop.graphql\")"));
    assert!(main.contains("const DEFAULT_CONFIG: &str = \"/srv/shop/grip.yaml\";"));

    let external = project.with_schema_file("/data/catalog.graphql");
    assert_eq!(external.project_name, "catalog");
    assert_eq!(external.schema_include(), "/data/catalog.graphql");
}

#[test]
fn test_cargo_manifest_uses_slug() {
    let manifest = render_cargo_toml("My Shop!").unwrap();
    assert!(manifest.contains("name = \"my-shop\""));
    assert!(manifest.contains("tiny_http"));
    assert!(manifest.contains(&format!("grip = {{ path = {GRIP_SOURCE_DIR:?} }}")));
    assert!(!manifest.contains("grip = \""));
    assert_eq!(slugify("___"), "grip-project");
}

#[test]
fn test_assemble_writes_all_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let project = project(dir.path().to_path_buf());
    let written = assemble(&shop_ir(), &project, false).unwrap();
    assert_eq!(written.len(), 5);
    for path in &written {
        assert!(path.exists(), "{path:?} missing");
    }
    assert!(fs::read_to_string(project.handler_path())
        .unwrap()
        .contains("widget_func"));
}

#[test]
fn test_guard_checks_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let project = project(dir.path().to_path_buf());
    fs::create_dir_all(project.src_dir()).unwrap();
    fs::write(project.main_path(), "fn main() {}\n").unwrap();

    let err = assemble(&shop_ir(), &project, false).unwrap_err();
    assert!(matches!(err, crate::GripError::ArtifactExists { ref path } if *path == project.main_path()));
    assert!(!project.schema_file.exists());
    assert!(!project.handler_path().exists());
}

#[test]
fn test_load_schema_requires_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let project = project(dir.path().to_path_buf());
    let err = load_schema(&shop_ir(), &project, false).unwrap_err();
    assert!(matches!(err, crate::GripError::Io { .. }));
    assert!(err.to_string().contains("shop.graphql"));
}

#[test]
fn test_load_schema_keeps_schema_and_handlers() {
    let dir = tempfile::tempdir().unwrap();
    let project = project(dir.path().to_path_buf());
    fs::write(&project.schema_file, "type Query {\n    custom: Int\n}\n").unwrap();
    fs::create_dir_all(project.src_dir()).unwrap();
    fs::write(project.handler_path(), "// hand written\n").unwrap();

    let written = load_schema(&shop_ir(), &project, false).unwrap();
    assert!(written.contains(&project.main_path()));
    assert!(written.contains(&project.resolver_path()));
    assert!(written.contains(&project.manifest_path()));
    assert!(!written.contains(&project.handler_path()));
    assert_eq!(
        fs::read_to_string(&project.schema_file).unwrap(),
        "type Query {\n    custom: Int\n}\n"
    );
    assert_eq!(fs::read_to_string(project.handler_path()).unwrap(), "// hand written\n");

    assert!(load_schema(&shop_ir(), &project, false).is_err());
    assert!(load_schema(&shop_ir(), &project, true).is_ok());
}
