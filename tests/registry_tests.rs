#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use grip::{
    build_ir, load_config, ExtraArgs, GripError, HandlerError, HandlerModule, HandlerResult,
    InputData, OperationKind, OperationRegistry, ServiceRegistry,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn sum_func(input: &InputData, _: &ServiceRegistry, _: &ExtraArgs) -> HandlerResult {
    let arg = |name: &str| {
        input
            .get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| HandlerError::missing_argument(name))
    };
    Ok(json!(arg("a")? + arg("b")?))
}

fn widgets_func(_: &InputData, _: &ServiceRegistry, _: &ExtraArgs) -> HandlerResult {
    Ok(json!([]))
}

#[test]
fn test_missing_handler_fails_startup() {
    let ir = build_ir(&load_config(fixture("shop.yaml")).unwrap()).unwrap();
    let module = HandlerModule::new("handlers").with("widgets_func", widgets_func);
    match OperationRegistry::from_ir(&ir, &module) {
        Err(GripError::NoSuchHandler {
            expected_symbol,
            module_name,
        }) => {
            assert_eq!(expected_symbol, "widget_func");
            assert_eq!(module_name, "handlers");
        }
        other => panic!("expected NoSuchHandler, got {other:?}"),
    }
}

#[test]
fn test_sum_registry_ready() {
    let ir = build_ir(&load_config(fixture("sum.yaml")).unwrap()).unwrap();
    let module = HandlerModule::new("handlers").with("sum_func", sum_func);
    let registry = OperationRegistry::from_ir(&ir, &module).unwrap();

    let handler = registry.lookup_query_handler("sum").unwrap();
    let mut input = InputData::new();
    input.insert("a".into(), json!(2));
    input.insert("b".into(), json!(40));
    assert_eq!(
        handler(&input, &ServiceRegistry::new(), &ExtraArgs::new()).unwrap(),
        json!(42)
    );
}

#[test]
fn test_lookup_of_unregistered_mutation() {
    let ir = build_ir(&load_config(fixture("sum.yaml")).unwrap()).unwrap();
    let module = HandlerModule::new("handlers").with("sum_func", sum_func);
    let registry = OperationRegistry::from_ir(&ir, &module).unwrap();

    let err = registry.lookup_mutation_handler("nonexistent").err().unwrap();
    match &err {
        GripError::UnregisteredMutationHandler { name } => assert_eq!(name, "nonexistent"),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.is_per_request());
    assert!(registry.lookup_query_handler("nonexistent").is_err());
}

#[test]
fn test_mutations_are_bound_too() {
    let ir = build_ir(&load_config(fixture("shop.yaml")).unwrap()).unwrap();
    let module = HandlerModule::new("handlers")
        .with("widget_func", widgets_func)
        .with("widgets_func", widgets_func);
    match OperationRegistry::from_ir(&ir, &module) {
        Err(GripError::NoSuchHandler { expected_symbol, .. }) => {
            assert_eq!(expected_symbol, "createWidget_func");
        }
        other => panic!("expected NoSuchHandler, got {other:?}"),
    }

    let module = module.with("createWidget_func", widgets_func);
    let registry = OperationRegistry::from_ir(&ir, &module).unwrap();
    assert_eq!(registry.names(OperationKind::Mutation), vec!["createWidget"]);
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_concurrent_lookups() {
    let ir = build_ir(&load_config(fixture("sum.yaml")).unwrap()).unwrap();
    let module = HandlerModule::new("handlers").with("sum_func", sum_func);
    let registry = Arc::new(OperationRegistry::from_ir(&ir, &module).unwrap());

    let workers: Vec<_> = (0..8_i64)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let mut input = InputData::new();
                input.insert("a".into(), json!(i));
                input.insert("b".into(), json!(i));
                let handler = registry.lookup_query_handler("sum").unwrap();
                handler(&input, &ServiceRegistry::new(), &ExtraArgs::new()).unwrap()
            })
        })
        .collect();

    for (i, worker) in workers.into_iter().enumerate() {
        assert_eq!(worker.join().unwrap(), json!(2 * i as i64));
    }
}
