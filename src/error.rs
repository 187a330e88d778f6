//! # Error Types
//!
//! Every failure the compiler and the forwarder can report. Generation-time and
//! startup-time variants are fatal for the run that produced them; the two
//! `Unregistered*` variants and [`HandlerError`] are per-request and end up as
//! structured error entries in an operation response.

use std::fmt;
use std::path::PathBuf;

/// Which namespace a duplicated name was declared in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionKind {
    /// Entry under `query_defs`
    Query,
    /// Entry under `mutation_defs`
    Mutation,
    /// Entry under `type_defs`
    Type,
    /// Input parameter of the named operation
    Argument {
        /// Operation that declares the parameter
        operation: String,
    },
    /// Field of the named object type
    Field {
        /// Object type that declares the field
        type_name: String,
    },
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionKind::Query => write!(f, "query"),
            DefinitionKind::Mutation => write!(f, "mutation"),
            DefinitionKind::Type => write!(f, "type"),
            DefinitionKind::Argument { operation } => {
                write!(f, "argument of operation '{operation}'")
            }
            DefinitionKind::Field { type_name } => write!(f, "field of type '{type_name}'"),
        }
    }
}

/// Errors raised while loading configuration, building the IR, writing
/// artifacts, constructing the operation registry or looking up handlers.
#[derive(Debug)]
pub enum GripError {
    /// A required section or key is missing or structurally invalid
    ConfigStructure {
        /// Dotted path of the offending section (e.g. `query_defs.sum.output`)
        section: String,
        /// What is wrong with it
        detail: String,
    },
    /// The configuration document could not be parsed at all
    ConfigParse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser message
        detail: String,
    },
    /// The same name was declared twice in one namespace
    DuplicateDefinition {
        /// The duplicated name
        name: String,
        /// Namespace of the duplicate
        kind: DefinitionKind,
    },
    /// A generated artifact already exists and overwriting was not requested
    ArtifactExists {
        /// Existing file that was left untouched
        path: PathBuf,
    },
    /// The handler module does not expose the symbol a declared operation needs
    NoSuchHandler {
        /// Symbol derived from the operation name (`<operation>_func`)
        expected_symbol: String,
        /// Name of the handler module that was searched
        module_name: String,
    },
    /// Query lookup for a name that was never registered
    UnregisteredQueryHandler {
        /// Query field name
        name: String,
    },
    /// Mutation lookup for a name that was never registered
    UnregisteredMutationHandler {
        /// Mutation field name
        name: String,
    },
    /// File system failure on a specific path
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// Template rendering failed
    Render(askama::Error),
}

impl GripError {
    /// Shorthand for [`GripError::ConfigStructure`]
    pub fn structure(section: impl Into<String>, detail: impl Into<String>) -> Self {
        GripError::ConfigStructure {
            section: section.into(),
            detail: detail.into(),
        }
    }

    /// Shorthand for [`GripError::Io`]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GripError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error may only occur while serving a request
    ///
    /// Lookup mismatches are reported per operation; everything else aborts
    /// generation or startup.
    #[must_use]
    pub fn is_per_request(&self) -> bool {
        matches!(
            self,
            GripError::UnregisteredQueryHandler { .. } | GripError::UnregisteredMutationHandler { .. }
        )
    }
}

impl fmt::Display for GripError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GripError::ConfigStructure { section, detail } => {
                write!(f, "invalid configuration: section '{section}': {detail}")
            }
            GripError::ConfigParse { path, detail } => {
                write!(f, "failed to parse configuration file {}: {detail}", path.display())
            }
            GripError::DuplicateDefinition { name, kind } => {
                write!(f, "duplicate definition of {kind} '{name}'")
            }
            GripError::ArtifactExists { path } => write!(
                f,
                "artifact {} already exists. Use --force to overwrite it.",
                path.display()
            ),
            GripError::NoSuchHandler {
                expected_symbol,
                module_name,
            } => write!(
                f,
                "No handler {expected_symbol}() exists in module {module_name}"
            ),
            GripError::UnregisteredQueryHandler { name } => write!(
                f,
                "No handler has been registered for the query field {name}"
            ),
            GripError::UnregisteredMutationHandler { name } => write!(
                f,
                "No handler has been registered for the mutation field {name}"
            ),
            GripError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            GripError::Render(e) => write!(f, "failed to render artifact: {e}"),
        }
    }
}

impl std::error::Error for GripError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GripError::Io { source, .. } => Some(source),
            GripError::Render(e) => Some(e),
            _ => None,
        }
    }
}

impl From<askama::Error> for GripError {
    fn from(e: askama::Error) -> Self {
        GripError::Render(e)
    }
}

/// Failure raised by a handler implementation while serving one operation
///
/// Never fatal: the executor turns it into an error entry of the response and
/// keeps resolving the remaining fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerError {
    /// Message reported to the client
    pub message: String,
}

impl HandlerError {
    /// Create a handler error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        HandlerError {
            message: message.into(),
        }
    }

    /// Error for a required input argument that was not supplied
    pub fn missing_argument(name: &str) -> Self {
        HandlerError::new(format!("missing required argument '{name}'"))
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HandlerError {}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        HandlerError::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        HandlerError::new(message)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        HandlerError::new(format!("invalid input: {e}"))
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(e: anyhow::Error) -> Self {
        HandlerError::new(format!("{e:#}"))
    }
}
