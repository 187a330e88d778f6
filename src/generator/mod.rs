//! # Generator Module
//!
//! Turns the IR of a configuration document into the files of a runnable
//! GraphQL project.
//!
//! ## Architecture
//!
//! ```text
//! ConfigModel → build_ir → Ir → render_* (askama) → assemble → files
//! ```
//!
//! Rendering ([`render_schema`], [`render_handler_module`],
//! [`render_resolver_module`], [`render_bootstrap`], [`render_cargo_toml`]) is
//! pure: no file system access, identical input gives identical bytes.
//! [`assemble`] and [`load_schema`] own every write and enforce the overwrite
//! guard.
//!
//! ## Generated Structure
//!
//! ```text
//! <project_home>/
//! ├── Cargo.toml
//! ├── <project>.graphql       # schema text
//! └── src/
//!     ├── main.rs             # bootstrap: logging, registry, HTTP loop
//!     ├── <handler_module>.rs # placeholder <operation>_func handlers
//!     └── <resolver_module>.rs # resolve_<kind>_<operation> bindings
//! ```
//!
//! ## Usage
//!
//! ```bash
//! grip-gen build-schema --config grip.yaml --project-name shop
//! grip-gen load-schema --config grip.yaml --schema ./shop.graphql --force
//! ```
//!
//! ```rust,ignore
//! let config = load_config("grip.yaml")?;
//! let ir = build_ir(&config)?;
//! let project = ProjectConfig::from_config(&config, Path::new("grip.yaml"), "shop")?;
//! let written = assemble(&ir, &project, false)?;
//! ```
//!
//! ## Templates
//!
//! Templates live in `templates/` at the crate root:
//!
//! - `type_block.graphql.txt` - one schema type block
//! - `handlers.rs.txt` - handler module
//! - `resolvers.rs.txt` - resolver module
//! - `main.rs.txt` - bootstrap
//! - `Cargo.toml.txt` - manifest

mod project;
mod templates;
#[cfg(test)]
mod tests;

pub use project::*;
pub use templates::*;
