use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::templates::{
    render_bootstrap, render_cargo_toml, render_handler_module, render_resolver_module,
    render_schema,
};
use crate::config::{absolute_home, ConfigModel};
use crate::error::GripError;
use crate::ir::Ir;

/// Where and under which names a project's artifacts are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub project_name: String,
    /// Absolute project home directory
    pub home_dir: PathBuf,
    /// Schema file the bootstrap includes
    pub schema_file: PathBuf,
    pub handler_module: String,
    pub resolver_module: String,
    /// Configuration file the generated service loads by default
    pub config_path: PathBuf,
}

impl ProjectConfig {
    /// Derive project paths from the configuration's globals
    ///
    /// # Errors
    ///
    /// [`GripError::ConfigStructure`] when a required global is missing or
    /// `project_home` references an unset environment variable.
    pub fn from_config(
        config: &ConfigModel,
        config_path: &Path,
        project_name: &str,
    ) -> Result<Self, GripError> {
        let globals = config.globals()?;
        let home_dir = absolute_home(&globals.project_home()?)?;
        let config_path = if config_path.is_absolute() {
            config_path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| GripError::io(".", e))?
                .join(config_path)
        };
        Ok(ProjectConfig {
            project_name: project_name.to_string(),
            schema_file: home_dir.join(format!("{project_name}.graphql")),
            home_dir,
            handler_module: globals.handler_module()?.to_string(),
            resolver_module: globals.resolver_module()?.to_string(),
            config_path,
        })
    }

    /// Use an existing schema file; the project is named after its stem
    #[must_use]
    pub fn with_schema_file(mut self, schema_file: impl Into<PathBuf>) -> Self {
        let schema_file = schema_file.into();
        if let Some(stem) = schema_file.file_stem().and_then(|s| s.to_str()) {
            self.project_name = stem.to_string();
        }
        self.schema_file = schema_file;
        self
    }

    #[must_use]
    pub fn src_dir(&self) -> PathBuf {
        self.home_dir.join("src")
    }

    #[must_use]
    pub fn handler_path(&self) -> PathBuf {
        self.src_dir().join(format!("{}.rs", self.handler_module))
    }

    #[must_use]
    pub fn resolver_path(&self) -> PathBuf {
        self.src_dir().join(format!("{}.rs", self.resolver_module))
    }

    #[must_use]
    pub fn main_path(&self) -> PathBuf {
        self.src_dir().join("main.rs")
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.home_dir.join("Cargo.toml")
    }

    /// Path `include_str!` uses from `src/main.rs`
    ///
    /// Relative when the schema lives in the project home, absolute otherwise.
    #[must_use]
    pub fn schema_include(&self) -> String {
        match self.schema_file.strip_prefix(&self.home_dir) {
            Ok(rel) if rel.components().count() == 1 => format!("../{}", rel.display()),
            _ => self.schema_file.display().to_string(),
        }
    }
}

/// A rendered file waiting to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

impl Artifact {
    fn new(path: PathBuf, contents: String) -> Self {
        Artifact { path, contents }
    }
}

/// Render and write every artifact of a project
///
/// Writes `<home>/<project>.graphql`, the handler and resolver modules,
/// `src/main.rs` and `Cargo.toml`. Everything is rendered and every target is
/// checked before the first write, so a failure leaves the file system as it
/// was.
///
/// # Errors
///
/// - [`GripError::Render`] if a template fails
/// - [`GripError::ArtifactExists`] for the first existing target when `force`
///   is false
/// - [`GripError::Io`] on write failure
pub fn assemble(ir: &Ir, project: &ProjectConfig, force: bool) -> Result<Vec<PathBuf>, GripError> {
    let name = &project.project_name;
    let artifacts = vec![
        Artifact::new(project.schema_file.clone(), render_schema(ir)?),
        Artifact::new(
            project.handler_path(),
            render_handler_module(ir, name, &project.handler_module)?,
        ),
        Artifact::new(project.resolver_path(), render_resolver_module(ir, name)?),
        Artifact::new(project.main_path(), render_bootstrap(project)?),
        Artifact::new(project.manifest_path(), render_cargo_toml(name)?),
    ];
    write_all(&artifacts, &[], force)
}

/// Regenerate bootstrap sources against an existing schema file
///
/// The schema file is read, never rewritten. `src/main.rs` and the resolver
/// module fall under the overwrite guard; the handler module and manifest
/// are only created when missing.
///
/// # Errors
///
/// [`GripError::Io`] naming the schema file when it cannot be read, plus
/// everything [`assemble`] can return.
pub fn load_schema(ir: &Ir, project: &ProjectConfig, force: bool) -> Result<Vec<PathBuf>, GripError> {
    let schema = fs::read_to_string(&project.schema_file)
        .map_err(|e| GripError::io(&project.schema_file, e))?;
    debug!(
        schema = %project.schema_file.display(),
        bytes = schema.len(),
        "existing schema loaded"
    );

    let name = &project.project_name;
    let guarded = vec![
        Artifact::new(project.resolver_path(), render_resolver_module(ir, name)?),
        Artifact::new(project.main_path(), render_bootstrap(project)?),
    ];
    let mut optional = Vec::new();
    if !project.handler_path().exists() {
        optional.push(Artifact::new(
            project.handler_path(),
            render_handler_module(ir, name, &project.handler_module)?,
        ));
    }
    if !project.manifest_path().exists() {
        optional.push(Artifact::new(project.manifest_path(), render_cargo_toml(name)?));
    }
    write_all(&guarded, &optional, force)
}

fn write_all(
    guarded: &[Artifact],
    optional: &[Artifact],
    force: bool,
) -> Result<Vec<PathBuf>, GripError> {
    if !force {
        if let Some(existing) = guarded.iter().find(|a| a.path.exists()) {
            return Err(GripError::ArtifactExists {
                path: existing.path.clone(),
            });
        }
    }

    let mut written = Vec::with_capacity(guarded.len() + optional.len());
    for artifact in guarded.iter().chain(optional) {
        write_atomic(&artifact.path, &artifact.contents)?;
        info!(path = %artifact.path.display(), bytes = artifact.contents.len(), "artifact written");
        written.push(artifact.path.clone());
    }
    Ok(written)
}

/// Write through a temporary file in the target directory, then rename
fn write_atomic(path: &Path, contents: &str) -> Result<(), GripError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| GripError::io(parent, e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| GripError::io(parent, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| GripError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| GripError::io(path, e.error))?;
    Ok(())
}
