use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

#[allow(clippy::expect_used)]
static GRAPHQL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[_A-Za-z][_0-9A-Za-z]*$").expect("valid GraphQL name pattern"));

/// Whether `name` is a GraphQL name (`[_A-Za-z][_0-9A-Za-z]*`)
///
/// Every GraphQL name is also a valid fragment of a Rust identifier, which the
/// generated handler and resolver functions rely on.
#[must_use]
pub fn is_graphql_name(name: &str) -> bool {
    GRAPHQL_NAME.is_match(name)
}

/// Suffix appended to an operation name to form its handler symbol
pub const HANDLER_SUFFIX: &str = "func";

/// Handler symbol expected for an operation (`<operation>_func`)
#[must_use]
pub fn handler_symbol(operation: &str) -> String {
    format!("{operation}_{HANDLER_SUFFIX}")
}

/// Root operation type an operation is declared under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    /// Lowercase label (`query`, `mutation`)
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        }
    }

    /// Name of the schema root type (`Query`, `Mutation`)
    #[must_use]
    pub fn root_type(&self) -> &'static str {
        match self {
            OperationKind::Query => "Query",
            OperationKind::Mutation => "Mutation",
        }
    }

    /// Configuration section the kind is declared in
    #[must_use]
    pub fn section(&self) -> &'static str {
        match self {
            OperationKind::Query => "query_defs",
            OperationKind::Mutation => "mutation_defs",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name/type pair used for operation arguments and object type fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arg {
    pub name: String,
    /// Schema type reference, e.g. `Int!` or `[Widget]`
    pub datatype: String,
}

impl Arg {
    pub fn new(name: impl Into<String>, datatype: impl Into<String>) -> Self {
        Arg {
            name: name.into(),
            datatype: datatype.into(),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.datatype)
    }
}

/// A declared query or mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationSpec {
    pub kind: OperationKind,
    pub name: String,
    pub return_type: String,
    /// Arguments in declaration order
    pub args: Vec<Arg>,
}

impl OperationSpec {
    #[must_use]
    pub fn has_args(&self) -> bool {
        !self.args.is_empty()
    }

    /// Arguments joined as `a: Int!, b: Int!`
    #[must_use]
    pub fn arg_string(&self) -> String {
        self.args
            .iter()
            .map(Arg::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Schema field definition, `name(args): Type` or `name: Type`
    #[must_use]
    pub fn signature(&self) -> String {
        if self.has_args() {
            format!("{}({}): {}", self.name, self.arg_string(), self.return_type)
        } else {
            format!("{}: {}", self.name, self.return_type)
        }
    }

    #[must_use]
    pub fn handler_symbol(&self) -> String {
        handler_symbol(&self.name)
    }
}

/// A declared object type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSpec {
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<Arg>,
}

/// Everything declared by one configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ir {
    pub queries: Vec<OperationSpec>,
    pub mutations: Vec<OperationSpec>,
    pub types: Vec<TypeSpec>,
}

impl Ir {
    /// Operations of one kind, in declaration order
    #[must_use]
    pub fn operations_of(&self, kind: OperationKind) -> &[OperationSpec] {
        match kind {
            OperationKind::Query => &self.queries,
            OperationKind::Mutation => &self.mutations,
        }
    }

    /// All queries followed by all mutations
    pub fn operations(&self) -> impl Iterator<Item = &OperationSpec> {
        self.queries.iter().chain(self.mutations.iter())
    }

    #[must_use]
    pub fn find_operation(&self, kind: OperationKind, name: &str) -> Option<&OperationSpec> {
        self.operations_of(kind).iter().find(|op| op.name == name)
    }

    /// Object type names in declaration order
    #[must_use]
    pub fn type_names(&self) -> Vec<String> {
        self.types.iter().map(|t| t.name.clone()).collect()
    }

    /// Distinct handler symbols in first-use order
    ///
    /// A query and a mutation sharing a name share one handler symbol.
    #[must_use]
    pub fn handler_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for op in self.operations() {
            let symbol = op.handler_symbol();
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        symbols
    }
}
