use askama::Template;

use super::project::ProjectConfig;
use crate::ir::{Ir, OperationKind, OperationSpec, TypeSpec};

/// One `type Name { ... }` block
#[derive(Template)]
#[template(path = "type_block.graphql.txt", escape = "none")]
pub struct TypeBlockTemplate<'a> {
    /// Type name (`Query`, `Mutation` or an object type)
    pub name: &'a str,
    /// Field definitions, one per line
    pub lines: Vec<String>,
}

/// Placeholder handler function in the generated handler module
#[derive(Debug, Clone)]
pub struct HandlerStub {
    /// `<operation>_func`
    pub symbol: String,
    /// Human-readable list of the operations it serves
    pub serves: String,
}

#[derive(Template)]
#[template(path = "handlers.rs.txt", escape = "none")]
pub struct HandlersTemplateData {
    pub project: String,
    pub module_name: String,
    pub handlers: Vec<HandlerStub>,
}

/// Resolver binding in the generated resolver module
#[derive(Debug, Clone)]
pub struct ResolverEntry {
    /// Rust function name (`resolve_query_sum`)
    pub function: String,
    /// Field name as declared
    pub name: String,
    /// `query` or `mutation`, the `Bindings` builder method
    pub kind: &'static str,
    /// `Query` or `Mutation`, the `OperationKind` variant
    pub variant: &'static str,
    /// Schema signature shown in the doc comment
    pub signature: String,
}

#[derive(Template)]
#[template(path = "resolvers.rs.txt", escape = "none")]
pub struct ResolversTemplateData {
    pub project: String,
    pub resolvers: Vec<ResolverEntry>,
}

/// Bootstrap `main.rs` of a generated project
#[derive(Template)]
#[template(path = "main.rs.txt", escape = "none")]
pub struct MainRsTemplateData {
    pub project: String,
    pub handler_module: String,
    pub resolver_module: String,
    /// Rust string literal passed to `include_str!`
    pub schema_include: String,
    /// Rust string literal of the default configuration path
    pub config_path: String,
}

#[derive(Template)]
#[template(path = "Cargo.toml.txt", escape = "none")]
pub struct CargoTomlTemplateData {
    /// Package name (slug)
    pub name: String,
    /// TOML string literal locating the grip library source
    pub grip_path: String,
}

/// Directory of the grip library the generated project links against
pub const GRIP_SOURCE_DIR: &str = env!("CARGO_MANIFEST_DIR");

/// Normalise rendered text to end with exactly one newline
fn finish(mut text: String) -> String {
    let trimmed = text.trim_end().len();
    text.truncate(trimmed);
    text.push('\n');
    text
}

/// Root operation block, or `None` when no operation of that kind exists
pub fn render_operation_block(
    kind: OperationKind,
    ops: &[OperationSpec],
) -> Result<Option<String>, askama::Error> {
    if ops.is_empty() {
        return Ok(None);
    }
    let rendered = TypeBlockTemplate {
        name: kind.root_type(),
        lines: ops.iter().map(OperationSpec::signature).collect(),
    }
    .render()?;
    Ok(Some(finish(rendered)))
}

/// `type Name { field: datatype ... }`
pub fn render_object_type_block(ty: &TypeSpec) -> Result<String, askama::Error> {
    let rendered = TypeBlockTemplate {
        name: &ty.name,
        lines: ty.fields.iter().map(ToString::to_string).collect(),
    }
    .render()?;
    Ok(finish(rendered))
}

/// Full schema text: Query, Mutation, then object types
///
/// Blocks are separated by one blank line and the text ends with a single
/// newline. Identical IR always renders identical bytes.
pub fn render_schema(ir: &Ir) -> Result<String, askama::Error> {
    let mut blocks = Vec::new();
    for kind in [OperationKind::Query, OperationKind::Mutation] {
        if let Some(block) = render_operation_block(kind, ir.operations_of(kind))? {
            blocks.push(block);
        }
    }
    for ty in &ir.types {
        blocks.push(render_object_type_block(ty)?);
    }
    let body = blocks
        .iter()
        .map(|b| b.trim_end())
        .collect::<Vec<_>>()
        .join("\n\n");
    Ok(finish(body))
}

/// Handler stubs, one per distinct `<operation>_func` symbol
pub fn handler_stubs(ir: &Ir) -> Vec<HandlerStub> {
    ir.handler_symbols()
        .into_iter()
        .map(|symbol| {
            let serves = ir
                .operations()
                .filter(|op| op.handler_symbol() == symbol)
                .map(|op| format!("{} `{}`", op.kind, op.name))
                .collect::<Vec<_>>()
                .join(" and ");
            HandlerStub { symbol, serves }
        })
        .collect()
}

/// Handler module source with placeholder implementations
pub fn render_handler_module(
    ir: &Ir,
    project: &str,
    module_name: &str,
) -> Result<String, askama::Error> {
    let rendered = HandlersTemplateData {
        project: project.to_string(),
        module_name: module_name.to_string(),
        handlers: handler_stubs(ir),
    }
    .render()?;
    Ok(finish(rendered))
}

/// Name of the generated binding for an operation
pub fn resolver_function(op: &OperationSpec) -> String {
    format!("resolve_{}_{}", op.kind, op.name)
}

/// Resolver module source, one forwarding binding per operation
pub fn render_resolver_module(ir: &Ir, project: &str) -> Result<String, askama::Error> {
    let resolvers = ir
        .operations()
        .map(|op| ResolverEntry {
            function: resolver_function(op),
            name: op.name.clone(),
            kind: op.kind.as_str(),
            variant: op.kind.root_type(),
            signature: op.signature(),
        })
        .collect();
    let rendered = ResolversTemplateData {
        project: project.to_string(),
        resolvers,
    }
    .render()?;
    Ok(finish(rendered))
}

/// Bootstrap `main.rs` for a generated project
pub fn render_bootstrap(project: &ProjectConfig) -> Result<String, askama::Error> {
    let rendered = MainRsTemplateData {
        project: project.project_name.clone(),
        handler_module: project.handler_module.clone(),
        resolver_module: project.resolver_module.clone(),
        schema_include: format!("{:?}", project.schema_include()),
        config_path: format!("{:?}", project.config_path.display().to_string()),
    }
    .render()?;
    Ok(finish(rendered))
}

/// Manifest of a generated project
///
/// `grip` is a path dependency on [`GRIP_SOURCE_DIR`], the library this
/// generator was built from.
pub fn render_cargo_toml(project_name: &str) -> Result<String, askama::Error> {
    let rendered = CargoTomlTemplateData {
        name: slugify(project_name),
        grip_path: format!("{GRIP_SOURCE_DIR:?}"),
    }
    .render()?;
    Ok(finish(rendered))
}

/// Cargo package name derived from a project name
///
/// Lowercase ASCII alphanumerics; every other run of characters becomes a
/// single `-`. Falls back to `grip-project` when nothing usable remains.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-').to_string();
    if slug.is_empty() {
        "grip-project".to_string()
    } else {
        slug
    }
}
