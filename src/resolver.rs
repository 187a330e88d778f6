//! # Resolver Bindings and Executor
//!
//! Generated resolver modules contain one binding per declared operation. Each
//! binding is a thin function that calls [`forward`]: look the handler up in
//! the request's registry by kind and name, call it with the client's
//! arguments and the service registry, and return its result unchanged.
//!
//! [`execute`] drives a whole operation request: every requested field is
//! resolved independently, failures become error entries with the field's
//! response path, and the remaining fields still resolve (partial success).
//! A panicking handler is caught and reported the same way.
//!
//! ```rust,ignore
//! let request: OperationRequest = serde_json::from_str(body)?;
//! let response = execute(&resolvers::bindings(), &ctx, &request);
//! let status = response.status_code();
//! ```

use crate::context::RequestContext;
use crate::error::{GripError, HandlerError};
use crate::ir::OperationKind;
use crate::registry::{ExtraArgs, InputData};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, warn};

/// Why a binding produced no value
#[derive(Debug)]
pub enum ResolveError {
    /// The registry has no handler for the field
    Unregistered(GripError),
    /// The handler ran and reported a failure
    Handler(HandlerError),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Unregistered(e) => write!(f, "{e}"),
            ResolveError::Handler(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Unregistered(e) => Some(e),
            ResolveError::Handler(e) => Some(e),
        }
    }
}

impl From<GripError> for ResolveError {
    fn from(e: GripError) -> Self {
        ResolveError::Unregistered(e)
    }
}

impl From<HandlerError> for ResolveError {
    fn from(e: HandlerError) -> Self {
        ResolveError::Handler(e)
    }
}

/// Signature of a generated resolver binding
pub type ResolverFn = fn(&RequestContext, &InputData) -> Result<Value, ResolveError>;

/// Forward one field to its registered handler
///
/// # Errors
///
/// [`ResolveError::Unregistered`] when the registry has no handler for
/// `name`, [`ResolveError::Handler`] when the handler fails.
pub fn forward(
    ctx: &RequestContext,
    kind: OperationKind,
    name: &str,
    kwargs: &InputData,
) -> Result<Value, ResolveError> {
    let handler = ctx.registry.lookup(kind, name)?;
    let value = handler(kwargs, &ctx.services, &ExtraArgs::new())?;
    Ok(value)
}

/// Table of resolver bindings keyed by `(kind, field)`
#[derive(Clone, Default)]
pub struct Bindings {
    entries: HashMap<(OperationKind, String), ResolverFn>,
    order: Vec<(OperationKind, String)>,
}

impl Bindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a binding
    pub fn insert(&mut self, kind: OperationKind, field: impl Into<String>, resolver: ResolverFn) {
        let key = (kind, field.into());
        if self.entries.insert(key.clone(), resolver).is_none() {
            self.order.push(key);
        }
    }

    /// Builder-style query binding
    #[must_use]
    pub fn query(mut self, field: impl Into<String>, resolver: ResolverFn) -> Self {
        self.insert(OperationKind::Query, field, resolver);
        self
    }

    /// Builder-style mutation binding
    #[must_use]
    pub fn mutation(mut self, field: impl Into<String>, resolver: ResolverFn) -> Self {
        self.insert(OperationKind::Mutation, field, resolver);
        self
    }

    #[must_use]
    pub fn get(&self, kind: OperationKind, field: &str) -> Option<ResolverFn> {
        self.entries.get(&(kind, field.to_string())).copied()
    }

    #[must_use]
    pub fn contains(&self, kind: OperationKind, field: &str) -> bool {
        self.get(kind, field).is_some()
    }

    /// Bound `(kind, field)` keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = (OperationKind, &str)> {
        self.order.iter().map(|(kind, field)| (*kind, field.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.keys().map(|(kind, field)| format!("{kind}.{field}")))
            .finish()
    }
}

/// One requested field of an operation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldRequest {
    pub name: String,
    /// Response key to use instead of the field name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub args: InputData,
}

impl FieldRequest {
    pub fn new(name: impl Into<String>) -> Self {
        FieldRequest {
            name: name.into(),
            alias: None,
            args: InputData::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Key under which the field's value appears in the result
    #[must_use]
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

fn default_operation() -> OperationKind {
    OperationKind::Query
}

/// Body of a `POST /graphql` request
///
/// ```json
/// {"operation": "query", "fields": [{"name": "sum", "args": {"a": 1, "b": 2}}]}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OperationRequest {
    #[serde(default = "default_operation")]
    pub operation: OperationKind,
    pub fields: Vec<FieldRequest>,
}

impl OperationRequest {
    #[must_use]
    pub fn query(fields: Vec<FieldRequest>) -> Self {
        OperationRequest {
            operation: OperationKind::Query,
            fields,
        }
    }

    #[must_use]
    pub fn mutation(fields: Vec<FieldRequest>) -> Self {
        OperationRequest {
            operation: OperationKind::Mutation,
            fields,
        }
    }
}

/// Structured error entry of an operation response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorEntry {
    pub message: String,
    /// Response path of the failed field
    pub path: Vec<String>,
}

impl ErrorEntry {
    pub fn new(message: impl Into<String>, path: Vec<String>) -> Self {
        ErrorEntry {
            message: message.into(),
            path,
        }
    }
}

/// `{result, errors?}` envelope returned to the client
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct OperationResponse {
    pub result: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorEntry>>,
}

impl OperationResponse {
    /// Response carrying a single error and no data
    #[must_use]
    pub fn failure(entry: ErrorEntry) -> Self {
        OperationResponse {
            result: Map::new(),
            errors: Some(vec![entry]),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.as_ref().is_none_or(Vec::is_empty)
    }

    /// 200 when every field resolved, 400 otherwise
    #[must_use]
    pub fn status_code(&self) -> u16 {
        if self.is_ok() {
            200
        } else {
            400
        }
    }

    fn push_error(&mut self, entry: ErrorEntry) {
        self.errors.get_or_insert_with(Vec::new).push(entry);
    }
}

/// Resolve every field of `request` against `bindings`
///
/// Fields are independent: a failed field contributes `null` under its
/// response key plus an error entry, and resolution continues.
#[must_use]
pub fn execute(
    bindings: &Bindings,
    ctx: &RequestContext,
    request: &OperationRequest,
) -> OperationResponse {
    let kind = request.operation;
    let mut response = OperationResponse::default();

    if request.fields.is_empty() {
        response.push_error(ErrorEntry::new(
            format!("{kind} requests must select at least one field"),
            Vec::new(),
        ));
        return response;
    }

    for field in &request.fields {
        let key = field.response_key().to_string();
        let started = Instant::now();
        match resolve_field(bindings, ctx, kind, field) {
            Ok(value) => {
                debug!(
                    request_id = %ctx.request.request_id,
                    kind = %kind,
                    field = %field.name,
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "field resolved"
                );
                response.result.insert(key, value);
            }
            Err(message) => {
                warn!(
                    request_id = %ctx.request.request_id,
                    kind = %kind,
                    field = %field.name,
                    error = %message,
                    "field failed"
                );
                response.result.insert(key.clone(), Value::Null);
                response.push_error(ErrorEntry::new(message, vec![key]));
            }
        }
    }

    response
}

fn resolve_field(
    bindings: &Bindings,
    ctx: &RequestContext,
    kind: OperationKind,
    field: &FieldRequest,
) -> Result<Value, String> {
    let Some(resolver) = bindings.get(kind, &field.name) else {
        return Err(format!(
            "Cannot query field \"{}\" on type \"{}\"",
            field.name,
            kind.root_type()
        ));
    };

    match catch_unwind(AssertUnwindSafe(|| resolver(ctx, &field.args))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(panic) => {
            let panic_message = panic_message(panic.as_ref());
            error!(
                request_id = %ctx.request.request_id,
                kind = %kind,
                field = %field.name,
                panic_message = %panic_message,
                "handler panicked"
            );
            Err(format!("handler panicked: {panic_message}"))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
