//! # Intermediate Representation
//!
//! The normalized, order-preserving form of a project configuration. The same
//! [`Ir`] drives artifact rendering at generation time and registry
//! construction at startup, so "what must exist" has exactly one definition.
//!
//! ```rust,ignore
//! use grip::{build_ir, load_config};
//!
//! let config = load_config("project.yaml")?;
//! let ir = build_ir(&config)?;
//! for op in ir.operations() {
//!     println!("{} {} -> {}", op.kind, op.name, op.handler_symbol());
//! }
//! ```

mod build;
mod types;

pub use build::*;
pub use types::*;
