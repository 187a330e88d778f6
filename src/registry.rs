//! # Operation Registry
//!
//! The forwarder: a table binding every declared query and mutation to the
//! handler that implements it.
//!
//! ## Lifecycle
//!
//! ```text
//! Empty ──RegistryBuilder::new()──▶ Building ──finish()──▶ Ready (OperationRegistry)
//! ```
//!
//! Registration is only possible on a [`RegistryBuilder`]; lookups are only
//! possible on a finished [`OperationRegistry`], which has no mutating methods.
//! A Ready registry is shared read-only across request threads without locks.
//! Reconfiguration builds a new registry and swaps the whole value through
//! [`SharedRegistry`].
//!
//! ## Startup
//!
//! [`OperationRegistry::from_ir`] resolves `<operation>_func` for every
//! declared operation against a [`HandlerModule`] and fails the whole startup
//! with [`GripError::NoSuchHandler`] on the first gap, so a schema/handler
//! mismatch surfaces once at boot instead of on every request.
//!
//! ```rust,ignore
//! let module = HandlerModule::new("handlers").with("sum_func", sum_func);
//! let registry = OperationRegistry::from_ir(&ir, &module)?;
//! let handler = registry.lookup_query_handler("sum")?;
//! ```

use crate::context::ServiceRegistry;
use crate::error::{GripError, HandlerError};
use crate::ir::{Ir, OperationKind};
use arc_swap::ArcSwap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Operation arguments as received from the client
pub type InputData = serde_json::Map<String, Value>;

/// Additional keyword arguments passed through by the binding layer
pub type ExtraArgs = serde_json::Map<String, Value>;

/// What a handler returns
pub type HandlerResult = Result<Value, HandlerError>;

/// A handler implementation: `(input_data, service_registry, extra_args)`
pub type Handler = Arc<dyn Fn(&InputData, &ServiceRegistry, &ExtraArgs) -> HandlerResult + Send + Sync>;

/// Named capability table mapping handler symbols to functions
///
/// Generated handler modules expose one of these as a table literal; host
/// code that loads handlers dynamically can call [`HandlerModule::register`]
/// per symbol instead.
#[derive(Clone)]
pub struct HandlerModule {
    name: String,
    symbols: HashMap<String, Handler>,
}

impl HandlerModule {
    /// Empty module with the given name (used in error messages)
    pub fn new(name: impl Into<String>) -> Self {
        HandlerModule {
            name: name.into(),
            symbols: HashMap::new(),
        }
    }

    /// Add a symbol, replacing any previous function under that name
    pub fn register<F>(&mut self, symbol: impl Into<String>, handler: F)
    where
        F: Fn(&InputData, &ServiceRegistry, &ExtraArgs) -> HandlerResult + Send + Sync + 'static,
    {
        self.symbols.insert(symbol.into(), Arc::new(handler));
    }

    /// Builder-style [`HandlerModule::register`]
    #[must_use]
    pub fn with<F>(mut self, symbol: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&InputData, &ServiceRegistry, &ExtraArgs) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(symbol, handler);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Function exported under `symbol`, if any
    #[must_use]
    pub fn resolve(&self, symbol: &str) -> Option<Handler> {
        self.symbols.get(symbol).map(Arc::clone)
    }

    /// Exported symbols, sorted
    #[must_use]
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.symbols.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }
}

impl fmt::Debug for HandlerModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerModule")
            .field("name", &self.name)
            .field("symbols", &self.symbols())
            .finish()
    }
}

/// A registry in the Building state
#[derive(Default)]
pub struct RegistryBuilder {
    query_handlers: HashMap<String, Handler>,
    mutation_handlers: HashMap<String, Handler>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a query field to a handler, replacing any earlier binding
    pub fn register_query_handler(&mut self, name: impl Into<String>, handler: Handler) {
        let name = name.into();
        if self.query_handlers.insert(name.clone(), handler).is_some() {
            warn!(query = %name, "replaced existing query handler");
        }
    }

    /// Bind a mutation field to a handler, replacing any earlier binding
    pub fn register_mutation_handler(&mut self, name: impl Into<String>, handler: Handler) {
        let name = name.into();
        if self.mutation_handlers.insert(name.clone(), handler).is_some() {
            warn!(mutation = %name, "replaced existing mutation handler");
        }
    }

    /// Bind a field of either kind
    pub fn register(&mut self, kind: OperationKind, name: impl Into<String>, handler: Handler) {
        match kind {
            OperationKind::Query => self.register_query_handler(name, handler),
            OperationKind::Mutation => self.register_mutation_handler(name, handler),
        }
    }

    /// Transition to Ready; no further registration is possible
    #[must_use]
    pub fn finish(self) -> OperationRegistry {
        OperationRegistry {
            query_handlers: self.query_handlers,
            mutation_handlers: self.mutation_handlers,
        }
    }
}

/// A registry in the Ready state: read-only name → handler tables
pub struct OperationRegistry {
    query_handlers: HashMap<String, Handler>,
    mutation_handlers: HashMap<String, Handler>,
}

impl OperationRegistry {
    /// Start building a registry by hand
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Bind every operation declared in `ir` to its handler in `module`
    ///
    /// # Errors
    ///
    /// [`GripError::NoSuchHandler`] naming the first `<operation>_func` symbol
    /// the module does not export. No partially built registry is returned.
    pub fn from_ir(ir: &Ir, module: &HandlerModule) -> Result<Self, GripError> {
        let mut builder = RegistryBuilder::new();
        for op in ir.operations() {
            let symbol = op.handler_symbol();
            let Some(handler) = module.resolve(&symbol) else {
                error!(
                    kind = %op.kind,
                    operation = %op.name,
                    expected_symbol = %symbol,
                    module = %module.name(),
                    available = ?module.symbols(),
                    "handler missing for declared operation"
                );
                return Err(GripError::NoSuchHandler {
                    expected_symbol: symbol,
                    module_name: module.name().to_string(),
                });
            };
            debug!(kind = %op.kind, operation = %op.name, symbol = %symbol, "handler bound");
            builder.register(op.kind, op.name.clone(), handler);
        }
        let registry = builder.finish();
        info!(
            queries = registry.query_handlers.len(),
            mutations = registry.mutation_handlers.len(),
            module = %module.name(),
            "operation registry ready"
        );
        Ok(registry)
    }

    /// Handler bound to a query field
    ///
    /// # Errors
    ///
    /// [`GripError::UnregisteredQueryHandler`] when the name was never bound.
    pub fn lookup_query_handler(&self, name: &str) -> Result<&Handler, GripError> {
        self.query_handlers
            .get(name)
            .ok_or_else(|| GripError::UnregisteredQueryHandler {
                name: name.to_string(),
            })
    }

    /// Handler bound to a mutation field
    ///
    /// # Errors
    ///
    /// [`GripError::UnregisteredMutationHandler`] when the name was never bound.
    pub fn lookup_mutation_handler(&self, name: &str) -> Result<&Handler, GripError> {
        self.mutation_handlers
            .get(name)
            .ok_or_else(|| GripError::UnregisteredMutationHandler {
                name: name.to_string(),
            })
    }

    /// Kind-dispatched lookup
    pub fn lookup(&self, kind: OperationKind, name: &str) -> Result<&Handler, GripError> {
        match kind {
            OperationKind::Query => self.lookup_query_handler(name),
            OperationKind::Mutation => self.lookup_mutation_handler(name),
        }
    }

    /// Bound names of one kind, sorted
    #[must_use]
    pub fn names(&self, kind: OperationKind) -> Vec<&str> {
        let table = match kind {
            OperationKind::Query => &self.query_handlers,
            OperationKind::Mutation => &self.mutation_handlers,
        };
        let mut names: Vec<&str> = table.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Total number of bound operations
    #[must_use]
    pub fn len(&self) -> usize {
        self.query_handlers.len() + self.mutation_handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("queries", &self.names(OperationKind::Query))
            .field("mutations", &self.names(OperationKind::Mutation))
            .finish()
    }
}

/// Shared handle to the current registry
///
/// Readers take a snapshot with [`SharedRegistry::load`] and keep using it
/// for the rest of their request even if a replacement lands meanwhile.
#[derive(Clone)]
pub struct SharedRegistry {
    inner: Arc<ArcSwap<OperationRegistry>>,
}

impl SharedRegistry {
    #[must_use]
    pub fn new(registry: OperationRegistry) -> Self {
        SharedRegistry {
            inner: Arc::new(ArcSwap::from_pointee(registry)),
        }
    }

    /// Snapshot of the current registry
    #[must_use]
    pub fn load(&self) -> Arc<OperationRegistry> {
        self.inner.load_full()
    }

    /// Atomically install a new registry, returning the one it replaced
    pub fn replace(&self, registry: OperationRegistry) -> Arc<OperationRegistry> {
        let previous = self.inner.swap(Arc::new(registry));
        info!(
            previous_operations = previous.len(),
            operations = self.inner.load().len(),
            "operation registry replaced"
        );
        previous
    }
}

impl fmt::Debug for SharedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedRegistry").field(&*self.inner.load()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(input: &InputData, _: &ServiceRegistry, _: &ExtraArgs) -> HandlerResult {
        Ok(Value::Object(input.clone()))
    }

    #[test]
    fn test_builder_overwrites_and_finishes() {
        let mut builder = OperationRegistry::builder();
        builder.register_query_handler("a", Arc::new(echo));
        builder.register_query_handler(
            "a",
            Arc::new(|_: &InputData, _: &ServiceRegistry, _: &ExtraArgs| -> HandlerResult {
                Ok(json!(2))
            }),
        );
        let registry = builder.finish();
        let handler = registry.lookup_query_handler("a").unwrap();
        let out = handler(&InputData::new(), &ServiceRegistry::new(), &ExtraArgs::new()).unwrap();
        assert_eq!(out, json!(2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_kinds_are_separate_namespaces() {
        let mut builder = RegistryBuilder::new();
        builder.register(OperationKind::Query, "widget", Arc::new(echo));
        let registry = builder.finish();
        assert!(registry.lookup(OperationKind::Query, "widget").is_ok());
        assert!(matches!(
            registry.lookup(OperationKind::Mutation, "widget"),
            Err(GripError::UnregisteredMutationHandler { .. })
        ));
    }

    #[test]
    fn test_module_symbols_sorted() {
        let module = HandlerModule::new("handlers")
            .with("b_func", echo)
            .with("a_func", echo);
        assert_eq!(module.symbols(), vec!["a_func", "b_func"]);
        assert!(module.resolve("c_func").is_none());
    }

    #[test]
    fn test_shared_registry_replace() {
        let shared = SharedRegistry::new(RegistryBuilder::new().finish());
        let before = shared.load();
        let mut builder = RegistryBuilder::new();
        builder.register_mutation_handler("m", Arc::new(echo));
        let previous = shared.replace(builder.finish());
        assert!(Arc::ptr_eq(&before, &previous));
        assert!(before.is_empty());
        assert_eq!(shared.load().names(OperationKind::Mutation), vec!["m"]);
    }
}
