//! # Configuration Linter
//!
//! Checks a configuration document for problems that `build_ir` lets through
//! but that would produce an invalid schema or generated code that does not
//! compile.
//!
//! ## Checks Performed
//!
//! 1. **Names** - operations, arguments, types and fields must be GraphQL names
//! 2. **Module names** - `handler_module` / `resolver_module` must be Rust identifiers
//! 3. **Type references** - balanced brackets, at most one `!` per level, not empty
//! 4. **Undeclared types** - named types must be builtin scalars or declared in `type_defs`
//! 5. **List declarations** - only the first element of a list field is used
//! 6. **Empty Query** - a schema without query fields is rejected by GraphQL servers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use grip::linter::{lint_config, print_lint_issues, has_errors};
//!
//! let issues = lint_config(&load_config("grip.yaml")?);
//! print_lint_issues(&issues);
//! if has_errors(&issues) {
//!     std::process::exit(1);
//! }
//! ```

use crate::config::{ConfigModel, FieldDecl};
use crate::ir::is_graphql_name;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;


#[allow(clippy::expect_used)]
static RUST_IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[_a-zA-Z][_0-9a-zA-Z]*$").expect("valid identifier pattern"));

/// Scalars every GraphQL schema provides
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Severity level for lint issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    /// Generation or serving will fail
    Error,
    /// Probably not what was meant
    Warning,
    /// Worth knowing
    Info,
}

impl fmt::Display for LintSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintSeverity::Error => write!(f, "error"),
            LintSeverity::Warning => write!(f, "warning"),
            LintSeverity::Info => write!(f, "info"),
        }
    }
}

/// A lint issue found in a configuration document
#[derive(Debug, Clone)]
pub struct LintIssue {
    /// Dotted location, e.g. `query_defs.sum.inputs.a`
    pub location: String,
    pub severity: LintSeverity,
    /// Machine-readable kind, e.g. `invalid_name`
    pub kind: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl LintIssue {
    pub fn new(
        location: impl Into<String>,
        severity: LintSeverity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        LintIssue {
            location: location.into(),
            severity,
            kind: kind.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Lint a parsed configuration document
pub fn lint_config(config: &ConfigModel) -> Vec<LintIssue> {
    let mut issues = Vec::new();

    lint_globals(config, &mut issues);

    let declared: HashSet<&str> = config
        .type_defs
        .as_ref()
        .map(|defs| defs.iter().map(|(name, _)| name).collect())
        .unwrap_or_default();

    match &config.query_defs {
        None => issues.push(LintIssue::new(
            "query_defs",
            LintSeverity::Error,
            "missing_section",
            "query_defs section is required",
        )),
        Some(defs) if defs.is_empty() => issues.push(
            LintIssue::new(
                "query_defs",
                LintSeverity::Warning,
                "empty_query",
                "no query fields declared; the schema will have no Query type",
            )
            .with_suggestion("declare at least one query"),
        ),
        Some(_) => {}
    }

    let mut query_names = HashSet::new();
    for (section, defs) in [
        ("query_defs", &config.query_defs),
        ("mutation_defs", &config.mutation_defs),
    ] {
        let Some(defs) = defs else { continue };
        for (name, decl) in defs.iter() {
            let location = format!("{section}.{name}");
            check_name(&mut issues, &location, name, "operation");
            if section == "query_defs" {
                query_names.insert(name);
            } else if query_names.contains(name) {
                issues.push(LintIssue::new(
                    &location,
                    LintSeverity::Info,
                    "shared_handler",
                    format!("query and mutation '{name}' are both served by {name}_func"),
                ));
            }

            for param in decl.inputs.iter().flatten() {
                for (arg, datatype) in param.iter() {
                    let arg_location = format!("{location}.inputs.{arg}");
                    check_name(&mut issues, &arg_location, arg, "argument");
                    check_type_ref(&mut issues, &arg_location, datatype, &declared);
                }
            }

            match decl.output.as_deref() {
                Some(output) => {
                    check_type_ref(&mut issues, &format!("{location}.output"), output, &declared);
                }
                None => issues.push(LintIssue::new(
                    format!("{location}.output"),
                    LintSeverity::Error,
                    "missing_output",
                    format!("operation '{name}' declares no output type"),
                )),
            }
        }
    }

    if let Some(types) = &config.type_defs {
        for (type_name, decl) in types.iter() {
            let location = format!("type_defs.{type_name}");
            check_name(&mut issues, &location, type_name, "type");
            if BUILTIN_SCALARS.contains(&type_name) {
                issues.push(LintIssue::new(
                    &location,
                    LintSeverity::Error,
                    "shadowed_scalar",
                    format!("'{type_name}' is a builtin scalar and cannot be redeclared"),
                ));
            }
            for (field, field_decl) in decl.iter().flat_map(|fields| fields.iter()) {
                let field_location = format!("{location}.{field}");
                check_name(&mut issues, &field_location, field, "field");
                match field_decl {
                    FieldDecl::Named(datatype) => {
                        check_type_ref(&mut issues, &field_location, datatype, &declared);
                    }
                    FieldDecl::List(elements) => {
                        if elements.len() > 1 {
                            issues.push(
                                LintIssue::new(
                                    &field_location,
                                    LintSeverity::Warning,
                                    "ignored_list_elements",
                                    format!(
                                        "only the first list element is used; {} ignored",
                                        elements[1..].join(", ")
                                    ),
                                )
                                .with_suggestion(format!("declare the field as [{}]", elements[0])),
                            );
                        }
                        if let Some(element) = elements.first() {
                            check_type_ref(&mut issues, &field_location, element, &declared);
                        }
                    }
                }
            }
        }
    }

    issues
}

fn lint_globals(config: &ConfigModel, issues: &mut Vec<LintIssue>) {
    let Some(globals) = &config.globals else {
        issues.push(LintIssue::new(
            "globals",
            LintSeverity::Error,
            "missing_section",
            "globals section is required",
        ));
        return;
    };

    for (key, value) in [
        ("project_home", &globals.project_home),
        ("handler_module", &globals.handler_module),
        ("resolver_module", &globals.resolver_module),
    ] {
        let location = format!("globals.{key}");
        match value.as_deref().map(str::trim) {
            None | Some("") => issues.push(LintIssue::new(
                location,
                LintSeverity::Error,
                "missing_global",
                format!("{key} is required"),
            )),
            Some(v) if key != "project_home" && !RUST_IDENT.is_match(v) => issues.push(
                LintIssue::new(
                    location,
                    LintSeverity::Error,
                    "invalid_module_name",
                    format!("'{v}' is not a valid module name"),
                )
                .with_suggestion("use letters, digits and underscores only"),
            ),
            Some(_) => {}
        }
    }

    if let (Some(h), Some(r)) = (&globals.handler_module, &globals.resolver_module) {
        if h == r {
            issues.push(LintIssue::new(
                "globals.resolver_module",
                LintSeverity::Error,
                "module_collision",
                format!("handler and resolver modules are both named '{h}'"),
            ));
        }
    }
}

fn check_name(issues: &mut Vec<LintIssue>, location: &str, name: &str, what: &str) {
    if !is_graphql_name(name) {
        issues.push(
            LintIssue::new(
                location,
                LintSeverity::Error,
                "invalid_name",
                format!("{what} name '{name}' is not a valid GraphQL name"),
            )
            .with_suggestion("names match [_A-Za-z][_0-9A-Za-z]*"),
        );
    } else if name.starts_with("__") {
        issues.push(LintIssue::new(
            location,
            LintSeverity::Error,
            "reserved_name",
            format!("{what} name '{name}' uses the reserved '__' prefix"),
        ));
    }
}

fn check_type_ref(
    issues: &mut Vec<LintIssue>,
    location: &str,
    datatype: &str,
    declared: &HashSet<&str>,
) {
    match parse_type_ref(datatype) {
        Ok(named) => {
            if !BUILTIN_SCALARS.contains(&named) && !declared.contains(named) {
                issues.push(
                    LintIssue::new(
                        location,
                        LintSeverity::Error,
                        "undeclared_type",
                        format!("type '{named}' is neither a builtin scalar nor declared"),
                    )
                    .with_suggestion(format!("add {named} under type_defs")),
                );
            }
        }
        Err(problem) => issues.push(LintIssue::new(
            location,
            LintSeverity::Error,
            "malformed_type",
            format!("type reference '{datatype}' is malformed: {problem}"),
        )),
    }
}

/// Innermost named type of a reference such as `[Widget!]!`
pub fn parse_type_ref(datatype: &str) -> Result<&str, String> {
    let trimmed = datatype.trim();
    let inner = trimmed.strip_suffix('!').unwrap_or(trimmed).trim_end();
    if inner.ends_with('!') {
        return Err("repeated '!'".to_string());
    }
    if inner.is_empty() {
        return Err("empty type".to_string());
    }
    if let Some(rest) = inner.strip_prefix('[') {
        let Some(element) = rest.strip_suffix(']') else {
            return Err("unbalanced brackets".to_string());
        };
        return parse_type_ref(element);
    }
    if inner.contains(['[', ']']) {
        return Err("unbalanced brackets".to_string());
    }
    if !is_graphql_name(inner) {
        return Err(format!("'{inner}' is not a valid type name"));
    }
    Ok(inner)
}

/// Whether any issue is an error
#[must_use]
pub fn has_errors(issues: &[LintIssue]) -> bool {
    issues.iter().any(|i| i.severity == LintSeverity::Error)
}

/// Print lint issues grouped by severity
pub fn print_lint_issues(issues: &[LintIssue]) {
    if issues.is_empty() {
        println!("✅ No lint issues found!");
        return;
    }

    let count = |s: LintSeverity| issues.iter().filter(|i| i.severity == s).count();
    println!("\n📋 Lint Results:");
    println!(
        "   {} error(s), {} warning(s), {} info(s)\n",
        count(LintSeverity::Error),
        count(LintSeverity::Warning),
        count(LintSeverity::Info)
    );

    for (severity, heading) in [
        (LintSeverity::Error, "❌ Errors (must fix):"),
        (LintSeverity::Warning, "⚠️  Warnings (should fix):"),
        (LintSeverity::Info, "ℹ️  Info:"),
    ] {
        let group: Vec<_> = issues.iter().filter(|i| i.severity == severity).collect();
        if group.is_empty() {
            continue;
        }
        println!("{heading}");
        for issue in group {
            println!("   [{}] {}", issue.kind, issue.location);
            println!("      {}", issue.message);
            if let Some(suggestion) = &issue.suggestion {
                println!("      💡 Suggestion: {suggestion}");
            }
        }
        println!();
    }
}
