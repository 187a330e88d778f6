use super::types::{is_graphql_name, Arg, Ir, OperationKind, OperationSpec, TypeSpec};
use crate::config::{ConfigModel, Declarations, FieldDecl, OperationDecl, TypeDecl};
use crate::error::{DefinitionKind, GripError};
use std::collections::HashSet;
use tracing::{debug, info};

/// Build the IR from a parsed configuration document
///
/// Deterministic: the same document always yields the same IR, in declaration
/// order. Structural problems and duplicate names are reported here, before
/// any artifact is rendered or any registry is built.
///
/// # Errors
///
/// - [`GripError::ConfigStructure`] when `globals` or `query_defs` is missing,
///   an operation has no `output`, an operation, parameter, type or field
///   name is empty or not a GraphQL name, or a type has no usable fields
/// - [`GripError::DuplicateDefinition`] for a repeated operation name within a
///   kind, type name, argument name or field name
pub fn build_ir(config: &ConfigModel) -> Result<Ir, GripError> {
    config.globals()?;
    let query_defs = config
        .query_defs
        .as_ref()
        .ok_or_else(|| GripError::structure("query_defs", "required section is missing"))?;

    let queries = build_operations(OperationKind::Query, query_defs)?;
    let mutations = match &config.mutation_defs {
        Some(defs) => build_operations(OperationKind::Mutation, defs)?,
        None => Vec::new(),
    };
    let types = match &config.type_defs {
        Some(defs) => build_types(defs)?,
        None => Vec::new(),
    };

    info!(
        queries = queries.len(),
        mutations = mutations.len(),
        types = types.len(),
        "IR built"
    );

    Ok(Ir {
        queries,
        mutations,
        types,
    })
}

fn build_operations(
    kind: OperationKind,
    defs: &Declarations<OperationDecl>,
) -> Result<Vec<OperationSpec>, GripError> {
    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(defs.len());

    for (name, decl) in defs.iter() {
        check_name(kind.section(), name, "operation")?;
        if !seen.insert(name) {
            return Err(GripError::DuplicateDefinition {
                name: name.to_string(),
                kind: match kind {
                    OperationKind::Query => DefinitionKind::Query,
                    OperationKind::Mutation => DefinitionKind::Mutation,
                },
            });
        }

        let section = format!("{}.{name}", kind.section());
        let args = input_params_to_args(name, &section, decl.inputs.as_deref().unwrap_or(&[]))?;
        let return_type = decl
            .output
            .as_deref()
            .filter(|o| !o.trim().is_empty())
            .ok_or_else(|| GripError::structure(format!("{section}.output"), "output type is required"))?;

        debug!(
            kind = %kind,
            operation = %name,
            args = args.len(),
            return_type = %return_type,
            "operation declared"
        );

        specs.push(OperationSpec {
            kind,
            name: name.to_string(),
            return_type: return_type.to_string(),
            args,
        });
    }

    Ok(specs)
}

/// Flatten the `inputs` sequence of single-key mappings into ordered args
fn input_params_to_args(
    operation: &str,
    section: &str,
    inputs: &[Declarations<String>],
) -> Result<Vec<Arg>, GripError> {
    let mut seen = HashSet::new();
    let mut args = Vec::new();
    for param in inputs {
        for (name, datatype) in param.iter() {
            check_name(&format!("{section}.inputs"), name, "parameter")?;
            if !seen.insert(name) {
                return Err(GripError::DuplicateDefinition {
                    name: name.to_string(),
                    kind: DefinitionKind::Argument {
                        operation: operation.to_string(),
                    },
                });
            }
            args.push(Arg::new(name, datatype.as_str()));
        }
    }
    Ok(args)
}

fn build_types(defs: &Declarations<TypeDecl>) -> Result<Vec<TypeSpec>, GripError> {
    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(defs.len());

    for (name, decl) in defs.iter() {
        check_name("type_defs", name, "type")?;
        if !seen.insert(name) {
            return Err(GripError::DuplicateDefinition {
                name: name.to_string(),
                kind: DefinitionKind::Type,
            });
        }
        let section = format!("type_defs.{name}");
        let fields = match decl {
            Some(fields) if !fields.is_empty() => build_fields(name, &section, fields)?,
            _ => {
                return Err(GripError::structure(
                    section,
                    "object type must declare at least one field",
                ))
            }
        };
        debug!(type_name = %name, fields = fields.len(), "type declared");
        specs.push(TypeSpec {
            name: name.to_string(),
            fields,
        });
    }

    Ok(specs)
}

fn build_fields(
    type_name: &str,
    section: &str,
    fields: &Declarations<FieldDecl>,
) -> Result<Vec<Arg>, GripError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(fields.len());
    for (name, decl) in fields.iter() {
        check_name(section, name, "field")?;
        if !seen.insert(name) {
            return Err(GripError::DuplicateDefinition {
                name: name.to_string(),
                kind: DefinitionKind::Field {
                    type_name: type_name.to_string(),
                },
            });
        }
        out.push(Arg::new(name, normalize_field_type(section, name, decl)?));
    }
    Ok(out)
}

/// Reject empty names and names the schema or generated code cannot carry
fn check_name(section: &str, name: &str, what: &str) -> Result<(), GripError> {
    if name.is_empty() {
        return Err(GripError::structure(
            section,
            format!("{what} name must not be empty"),
        ));
    }
    if !is_graphql_name(name) {
        return Err(GripError::structure(
            format!("{section}.{name}"),
            format!("{what} name '{name}' is not a valid GraphQL name"),
        ));
    }
    Ok(())
}

/// Field type reference with list declarations rewritten to bracket form
///
/// Only the first element of a list declaration is consulted: `[Foo]` and
/// `[Foo, Bar]` both mean "list of Foo".
pub fn normalize_field_type(section: &str, field: &str, decl: &FieldDecl) -> Result<String, GripError> {
    match decl {
        FieldDecl::Named(datatype) => Ok(datatype.clone()),
        FieldDecl::List(elements) => match elements.first() {
            Some(element) => Ok(format!("[{element}]")),
            None => Err(GripError::structure(
                format!("{section}.{field}"),
                "list declaration must name an element type",
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Globals;

    fn globals() -> Option<Globals> {
        Some(Globals {
            project_home: Some("/tmp/project".into()),
            handler_module: Some("handlers".into()),
            resolver_module: Some("resolvers".into()),
            debug_mode: false,
        })
    }

    #[test]
    fn test_missing_globals_is_structure_error() {
        let config = ConfigModel {
            query_defs: Some(Declarations::new()),
            ..Default::default()
        };
        match build_ir(&config) {
            Err(GripError::ConfigStructure { section, .. }) => assert_eq!(section, "globals"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_missing_query_defs_is_structure_error() {
        let config = ConfigModel {
            globals: globals(),
            ..Default::default()
        };
        match build_ir(&config) {
            Err(GripError::ConfigStructure { section, .. }) => assert_eq!(section, "query_defs"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_multi_key_input_mapping_keeps_order() {
        let mut decl = OperationDecl::returning("Int");
        decl.inputs = Some(vec![Declarations::new()
            .with("x", "Int".to_string())
            .with("y", "Float".to_string())]);
        let config = ConfigModel {
            globals: globals(),
            query_defs: Some(Declarations::new().with("point", decl)),
            ..Default::default()
        };
        let ir = build_ir(&config).unwrap();
        assert_eq!(ir.queries[0].arg_string(), "x: Int, y: Float");
    }

    #[test]
    fn test_missing_output() {
        let config = ConfigModel {
            globals: globals(),
            query_defs: Some(Declarations::new().with("broken", OperationDecl::default())),
            ..Default::default()
        };
        let err = build_ir(&config).unwrap_err();
        assert!(err.to_string().contains("query_defs.broken.output"));
    }

    #[test]
    fn test_duplicate_argument_rejected() {
        let decl = OperationDecl::returning("Int").input("a", "Int").input("a", "Int");
        let config = ConfigModel {
            globals: globals(),
            query_defs: Some(Declarations::new().with("sum", decl)),
            ..Default::default()
        };
        assert!(matches!(
            build_ir(&config),
            Err(GripError::DuplicateDefinition {
                kind: DefinitionKind::Argument { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_first_list_element_wins() {
        let decl = FieldDecl::List(vec!["Foo".into(), "Bar".into()]);
        assert_eq!(normalize_field_type("type_defs.T", "f", &decl).unwrap(), "[Foo]");
        let empty = FieldDecl::List(vec![]);
        assert!(normalize_field_type("type_defs.T", "f", &empty).is_err());
    }

    #[test]
    fn test_empty_field_and_type_names_rejected() {
        let widget = Declarations::new().with("", FieldDecl::Named("String".into()));
        let config = ConfigModel {
            globals: globals(),
            query_defs: Some(Declarations::new()),
            type_defs: Some(Declarations::new().with("Widget", Some(widget))),
            ..Default::default()
        };
        match build_ir(&config) {
            Err(GripError::ConfigStructure { section, detail }) => {
                assert_eq!(section, "type_defs.Widget");
                assert_eq!(detail, "field name must not be empty");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let id = Declarations::new().with("id", FieldDecl::Named("ID".into()));
        let config = ConfigModel {
            globals: globals(),
            query_defs: Some(Declarations::new()),
            type_defs: Some(Declarations::new().with("", Some(id))),
            ..Default::default()
        };
        assert!(matches!(
            build_ir(&config),
            Err(GripError::ConfigStructure { ref section, .. }) if section == "type_defs"
        ));
    }

    #[test]
    fn test_non_graphql_names_rejected() {
        let config = ConfigModel {
            globals: globals(),
            query_defs: Some(Declarations::new().with("get-user", OperationDecl::returning("ID"))),
            ..Default::default()
        };
        match build_ir(&config) {
            Err(GripError::ConfigStructure { section, detail }) => {
                assert_eq!(section, "query_defs.get-user");
                assert!(detail.contains("not a valid GraphQL name"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let decl = OperationDecl::returning("Int").input("1st", "Int");
        let config = ConfigModel {
            globals: globals(),
            query_defs: Some(Declarations::new().with("sum", decl)),
            ..Default::default()
        };
        let err = build_ir(&config).unwrap_err();
        assert!(err.to_string().contains("query_defs.sum.inputs.1st"));

        let fields = Declarations::new().with("part no", FieldDecl::Named("String".into()));
        let config = ConfigModel {
            globals: globals(),
            query_defs: Some(Declarations::new()),
            type_defs: Some(Declarations::new().with("Part", Some(fields))),
            ..Default::default()
        };
        assert!(build_ir(&config).is_err());
    }

    #[test]
    fn test_type_without_fields_rejected() {
        let config = ConfigModel {
            globals: globals(),
            query_defs: Some(Declarations::new()),
            type_defs: Some(Declarations::new().with("Empty", None)),
            ..Default::default()
        };
        let err = build_ir(&config).unwrap_err();
        assert!(err.to_string().contains("type_defs.Empty"));
    }
}
