//! # grip
//!
//! **grip** compiles a declarative description of a GraphQL API (queries,
//! mutations and object types in YAML or JSON) into a runnable project, and
//! provides the runtime that binds every declared operation to a handler.
//!
//! ## Overview
//!
//! A configuration document is turned into an intermediate representation
//! ([`Ir`]), from which the schema text, placeholder handlers, resolver
//! bindings, a bootstrap `main.rs` and a manifest are rendered. At runtime the
//! generated service builds an [`OperationRegistry`] from the same IR and the
//! handler module's capability table. Startup fails immediately if any
//! declared operation has no `<operation>_func` handler.
//!
//! ## Architecture
//!
//! - **[`config`]** - configuration document model and loading
//! - **[`ir`]** - IR construction: ordering, list normalisation, duplicate checks
//! - **[`generator`]** - askama rendering and project assembly
//! - **[`registry`]** - handler module, registry builder, Ready registry, atomic swap
//! - **[`context`]** - per-request context and service registry
//! - **[`resolver`]** - forwarding bindings and operation execution
//! - **[`service`]** - transport-agnostic GraphQL endpoints
//! - **[`linter`]** - configuration checks
//! - **[`hot_reload`]** - registry rebuild on configuration change
//! - **[`logging`]** - tracing subscriber setup
//! - **[`cli`]** - the `grip-gen` command line
//!
//! ### Generation Flow
//!
//! ```text
//! grip.yaml → load_config → build_ir → render_* → assemble → project files
//! ```
//!
//! ### Request Flow
//!
//! ```text
//! POST /graphql → GripService::handle → execute → resolve_<kind>_<op>
//!               → forward → registry lookup → <op>_func(input, services, extra)
//! ```
//!
//! ## Quick Start
//!
//! ```yaml
//! globals:
//!   project_home: $SHOP_HOME
//!   handler_module: handlers
//!   resolver_module: resolvers
//! query_defs:
//!   sum:
//!     inputs:
//!       - a: Int!
//!       - b: Int!
//!     output: Int!
//! ```
//!
//! ```bash
//! grip-gen build-schema --config grip.yaml --project-name shop
//! ```
//!
//! produces `shop.graphql`:
//!
//! ```graphql
//! type Query {
//!     sum(a: Int!, b: Int!): Int!
//! }
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod generator;
pub mod hot_reload;
pub mod ids;
pub mod ir;
pub mod linter;
pub mod logging;
pub mod registry;
pub mod resolver;
pub mod service;

pub use config::{load_config, ConfigModel};
pub use context::{RequestContext, ServiceError, ServiceRegistry, TransportRequest};
pub use error::{DefinitionKind, GripError, HandlerError};
pub use ids::RequestId;
pub use ir::{build_ir, Arg, Ir, OperationKind, OperationSpec, TypeSpec};
pub use registry::{
    ExtraArgs, Handler, HandlerModule, HandlerResult, InputData, OperationRegistry,
    RegistryBuilder, SharedRegistry,
};
pub use resolver::{
    execute, forward, Bindings, ErrorEntry, FieldRequest, OperationRequest, OperationResponse,
    ResolveError, ResolverFn,
};
pub use service::{GripService, ServiceResponse};
