//! # Configuration Model
//!
//! Typed view of the project configuration document:
//!
//! ```yaml
//! globals:
//!   project_home: $GRIP_HOME
//!   handler_module: handlers
//!   resolver_module: resolvers
//!   debug_mode: true
//!
//! query_defs:
//!   sum:
//!     inputs:
//!       - a: Int!
//!       - b: Int!
//!     output: Int!
//!
//! mutation_defs:
//!   add_widget:
//!     inputs:
//!       - name: String!
//!     output: Widget
//!
//! type_defs:
//!   Widget:
//!     id: ID!
//!     tags: [String]
//! ```
//!
//! Declaration sections are kept as ordered `(name, declaration)` lists rather
//! than maps so that declaration order survives into the generated schema and
//! duplicate keys reach [`crate::ir::build_ir`], which rejects them.

use crate::error::GripError;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Ordered, duplicate-preserving list of named declarations
#[derive(Debug, Clone, PartialEq)]
pub struct Declarations<T> {
    entries: Vec<(String, T)>,
}

impl<T> Declarations<T> {
    /// Empty declaration list
    #[must_use]
    pub fn new() -> Self {
        Declarations {
            entries: Vec::new(),
        }
    }

    /// Append a declaration, keeping any earlier entry with the same name
    pub fn push(&mut self, name: impl Into<String>, value: T) {
        self.entries.push((name.into(), value));
    }

    /// Builder-style [`Declarations::push`]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: T) -> Self {
        self.push(name, value);
        self
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Declarations<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for Declarations<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        Declarations {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

struct DeclarationsVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for DeclarationsVisitor<T> {
    type Value = Declarations<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping of names to declarations")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((name, value)) = map.next_entry::<String, T>()? {
            entries.push((name, value));
        }
        Ok(Declarations { entries })
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Declarations<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DeclarationsVisitor(PhantomData))
    }
}

/// The `globals` section
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Globals {
    /// Project home directory; may reference an environment variable (`$VAR`)
    pub project_home: Option<String>,
    /// Name of the module holding handler implementations
    pub handler_module: Option<String>,
    /// Name of the generated resolver/binding module
    pub resolver_module: Option<String>,
    /// Raise the default log level to `debug` in the served process
    #[serde(default)]
    pub debug_mode: bool,
}

impl Globals {
    fn require<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, GripError> {
        match value.as_deref() {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(GripError::structure(
                format!("globals.{key}"),
                "required setting is missing or empty",
            )),
        }
    }

    /// `project_home` with environment references expanded
    pub fn project_home(&self) -> Result<String, GripError> {
        let raw = Self::require(&self.project_home, "project_home")?;
        resolve_config_var(raw)
    }

    pub fn handler_module(&self) -> Result<&str, GripError> {
        Self::require(&self.handler_module, "handler_module")
    }

    pub fn resolver_module(&self) -> Result<&str, GripError> {
        Self::require(&self.resolver_module, "resolver_module")
    }
}

/// One entry under `query_defs` or `mutation_defs`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct OperationDecl {
    /// Input parameters as a sequence of single-key mappings (`- a: Int!`)
    pub inputs: Option<Vec<Declarations<String>>>,
    /// Return type reference, passed through verbatim
    pub output: Option<String>,
}

impl OperationDecl {
    /// Declaration with no inputs and the given output type
    pub fn returning(output: impl Into<String>) -> Self {
        OperationDecl {
            inputs: None,
            output: Some(output.into()),
        }
    }

    /// Append one single-key input parameter
    #[must_use]
    pub fn input(mut self, name: impl Into<String>, datatype: impl Into<String>) -> Self {
        self.inputs
            .get_or_insert_with(Vec::new)
            .push(Declarations::new().with(name, datatype.into()));
        self
    }
}

/// Value of a field under `type_defs`: a type reference or a list declaration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldDecl {
    /// `name: String`
    Named(String),
    /// `tags: [String]` meaning "list of String"
    List(Vec<String>),
}

/// Field declarations of one object type; `None` when the YAML value is empty
pub type TypeDecl = Option<Declarations<FieldDecl>>;

/// The whole configuration document
///
/// Every section is optional at the parsing level so that a missing section
/// is reported by name instead of as a generic parse failure.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ConfigModel {
    pub globals: Option<Globals>,
    pub query_defs: Option<Declarations<OperationDecl>>,
    pub mutation_defs: Option<Declarations<OperationDecl>>,
    pub type_defs: Option<Declarations<TypeDecl>>,
}

impl ConfigModel {
    /// The `globals` section, or a [`GripError::ConfigStructure`] naming it
    pub fn globals(&self) -> Result<&Globals, GripError> {
        self.globals
            .as_ref()
            .ok_or_else(|| GripError::structure("globals", "required section is missing"))
    }

    /// `globals.debug_mode`, false when the section is absent
    #[must_use]
    pub fn debug_mode(&self) -> bool {
        self.globals.as_ref().map(|g| g.debug_mode).unwrap_or(false)
    }

    /// Parse a YAML document
    pub fn from_yaml_str(source: &str, origin: &Path) -> Result<Self, GripError> {
        serde_yaml::from_str(source).map_err(|e| GripError::ConfigParse {
            path: origin.to_path_buf(),
            detail: e.to_string(),
        })
    }

    /// Parse a JSON document
    pub fn from_json_str(source: &str, origin: &Path) -> Result<Self, GripError> {
        serde_json::from_str(source).map_err(|e| GripError::ConfigParse {
            path: origin.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

/// Read a configuration file
///
/// `.yaml` / `.yml` files are parsed as YAML, anything else as JSON.
pub fn load_config(path: impl AsRef<Path>) -> Result<ConfigModel, GripError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| GripError::io(path, e))?;
    let is_yaml = path
        .extension()
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false);
    let config = if is_yaml {
        ConfigModel::from_yaml_str(&content, path)?
    } else {
        ConfigModel::from_json_str(&content, path)?
    };
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Expand an environment reference in a configuration value
///
/// `$NAME` and `${NAME}` are replaced by the variable's value; any other
/// string is returned unchanged. An unset variable is a configuration error.
pub fn resolve_config_var(value: &str) -> Result<String, GripError> {
    let Some(reference) = value.strip_prefix('$') else {
        return Ok(value.to_string());
    };
    let name = reference
        .strip_prefix('{')
        .and_then(|r| r.strip_suffix('}'))
        .unwrap_or(reference);
    std::env::var(name).map_err(|_| {
        GripError::structure(
            value.to_string(),
            format!("environment variable '{name}' is not set"),
        )
    })
}

/// Resolve a project home directory against the current directory
pub fn absolute_home(home: &str) -> Result<PathBuf, GripError> {
    let path = PathBuf::from(home);
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(|e| GripError::io(".", e))?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
globals:
  project_home: /tmp/widgets
  handler_module: handlers
  resolver_module: resolvers

query_defs:
  sum:
    inputs:
      - a: Int!
      - b: Int!
    output: Int!
  ping:
    output: String

type_defs:
  Widget:
    id: ID!
    tags: [String]
"#;

    #[test]
    fn test_parse_preserves_declaration_order() {
        let config = ConfigModel::from_yaml_str(SAMPLE, Path::new("sample.yaml")).unwrap();
        let names: Vec<&str> = config
            .query_defs
            .as_ref()
            .unwrap()
            .iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["sum", "ping"]);
        assert!(config.mutation_defs.is_none());
        assert!(!config.debug_mode());
    }

    #[test]
    fn test_list_field_parses_as_list() {
        let config = ConfigModel::from_yaml_str(SAMPLE, Path::new("sample.yaml")).unwrap();
        let types = config.type_defs.unwrap();
        let (_, fields) = types.iter().next().unwrap();
        let fields: Vec<_> = fields.as_ref().unwrap().iter().collect();
        assert_eq!(fields[0], ("id", &FieldDecl::Named("ID!".to_string())));
        assert_eq!(
            fields[1],
            ("tags", &FieldDecl::List(vec!["String".to_string()]))
        );
    }

    #[test]
    fn test_duplicate_keys_are_kept() {
        let doc = "query_defs:\n  a:\n    output: Int\n  a:\n    output: String\n";
        let config = ConfigModel::from_yaml_str(doc, Path::new("dup.yaml")).unwrap();
        assert_eq!(config.query_defs.unwrap().len(), 2);
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = ConfigModel::from_yaml_str("globals: [", Path::new("broken.yaml")).unwrap_err();
        assert!(matches!(err, GripError::ConfigParse { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }

    #[test]
    fn test_json_config() {
        let doc = r#"{"globals": {"project_home": "p", "handler_module": "h", "resolver_module": "r"},
                      "query_defs": {"ping": {"output": "String"}}}"#;
        let config = ConfigModel::from_json_str(doc, Path::new("c.json")).unwrap();
        assert_eq!(config.globals().unwrap().handler_module().unwrap(), "h");
    }

    #[test]
    fn test_resolve_config_var() {
        std::env::set_var("GRIP_CONFIG_TEST_HOME", "/srv/grip");
        assert_eq!(resolve_config_var("$GRIP_CONFIG_TEST_HOME").unwrap(), "/srv/grip");
        assert_eq!(resolve_config_var("${GRIP_CONFIG_TEST_HOME}").unwrap(), "/srv/grip");
        assert_eq!(resolve_config_var("plain/path").unwrap(), "plain/path");
        let err = resolve_config_var("$GRIP_CONFIG_TEST_UNSET_VARIABLE").unwrap_err();
        assert!(matches!(err, GripError::ConfigStructure { .. }));
    }

    #[test]
    fn test_missing_global_setting() {
        let globals = Globals {
            project_home: Some("p".into()),
            handler_module: None,
            resolver_module: Some(" ".into()),
            debug_mode: false,
        };
        let err = globals.handler_module().unwrap_err();
        assert!(err.to_string().contains("globals.handler_module"));
        assert!(globals.resolver_module().is_err());
    }
}
