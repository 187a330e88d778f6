//! # Request Context
//!
//! Per-invocation carrier handed to every resolver binding: the transport
//! request metadata, the registry snapshot the request is served against, and
//! the service locator handlers use to reach databases, object stores and the
//! like. The context holds no logic of its own.

use crate::ids::RequestId;
use crate::registry::OperationRegistry;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Failure to obtain a service object from a [`ServiceRegistry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// No service registered under the name
    NotFound { name: String },
    /// A service exists but is not of the requested type
    TypeMismatch { name: String, expected: &'static str },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotFound { name } => {
                write!(f, "no service object registered under '{name}'")
            }
            ServiceError::TypeMismatch { name, expected } => {
                write!(f, "service object '{name}' is not a {expected}")
            }
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ServiceError> for crate::error::HandlerError {
    fn from(e: ServiceError) -> Self {
        crate::error::HandlerError::new(e.to_string())
    }
}

/// Named service objects shared by all handlers
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl ServiceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a service object
    pub fn register<T: Any + Send + Sync>(&mut self, name: impl Into<String>, service: T) {
        self.services.insert(name.into(), Arc::new(service));
    }

    /// Builder-style [`ServiceRegistry::register`]
    #[must_use]
    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, service: T) -> Self {
        self.register(name, service);
        self
    }

    /// Typed lookup of a service object
    pub fn lookup<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, ServiceError> {
        let service = self
            .services
            .get(name)
            .ok_or_else(|| ServiceError::NotFound {
                name: name.to_string(),
            })?;
        Arc::clone(service)
            .downcast::<T>()
            .map_err(|_| ServiceError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.names())
            .finish()
    }
}

/// Transport-level facts about the request being served
#[derive(Debug, Clone, Default)]
pub struct TransportRequest {
    pub request_id: RequestId,
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl TransportRequest {
    /// Header value by name (case-insensitive)
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Everything a resolver binding receives besides its arguments
#[derive(Clone)]
pub struct RequestContext {
    pub request: TransportRequest,
    pub registry: Arc<OperationRegistry>,
    pub services: Arc<ServiceRegistry>,
}

impl RequestContext {
    #[must_use]
    pub fn new(
        request: TransportRequest,
        registry: Arc<OperationRegistry>,
        services: Arc<ServiceRegistry>,
    ) -> Self {
        RequestContext {
            request,
            registry,
            services,
        }
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request.request_id.to_string())
            .field("path", &self.request.path)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
