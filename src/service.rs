//! # GripService
//!
//! Transport-agnostic endpoint logic for a generated project. The bootstrap
//! owns the socket; it hands every request to [`GripService::handle`] and
//! writes back the [`ServiceResponse`].
//!
//! | Method | Path              | Response                                  |
//! |--------|-------------------|-------------------------------------------|
//! | GET    | `/graphql`        | playground page                           |
//! | POST   | `/graphql`        | `{result, errors?}`, 200 or 400           |
//! | GET    | `/health`         | `{"status":"ok"}`                         |
//! | GET    | `/schema.graphql` | schema text                               |
//! | *      | anything else     | 404 JSON                                  |
//!
//! Construction is fail-fast: [`GripService::start`] builds the operation
//! registry from the IR and refuses to return a servable value when any
//! declared operation has no handler.

use crate::context::{RequestContext, ServiceRegistry, TransportRequest};
use crate::error::GripError;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::ir::Ir;
use crate::registry::{HandlerModule, OperationRegistry, SharedRegistry};
use crate::resolver::{execute, Bindings, ErrorEntry, OperationRequest, OperationResponse};
use askama::Template;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

const GRAPHQL_PATH: &str = "/graphql";
const HEALTH_PATH: &str = "/health";
const SCHEMA_PATH: &str = "/schema.graphql";

#[derive(Template)]
#[template(path = "playground.html")]
struct PlaygroundTemplate<'a> {
    title: &'a str,
    endpoint: &'a str,
    schema_url: &'a str,
    example_request: &'a str,
}

/// Status, content type and body produced for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl ServiceResponse {
    fn json(status: u16, value: &serde_json::Value) -> Self {
        ServiceResponse {
            status,
            content_type: "application/json",
            body: value.to_string().into_bytes(),
        }
    }

    fn text(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        ServiceResponse {
            status,
            content_type,
            body: body.into(),
        }
    }

    /// Body as UTF-8 text (lossy)
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A servable project: schema, bindings, registry and services
pub struct GripService {
    schema: String,
    playground: String,
    bindings: Bindings,
    registry: SharedRegistry,
    services: Arc<ServiceRegistry>,
}

impl GripService {
    /// Build the registry from `ir` and prepare the endpoints
    ///
    /// # Errors
    ///
    /// [`GripError::NoSuchHandler`] when `handlers` lacks the symbol of a
    /// declared operation; [`GripError::Render`] if the playground page fails
    /// to render.
    pub fn start(
        ir: &Ir,
        schema: impl Into<String>,
        handlers: &HandlerModule,
        bindings: Bindings,
        services: ServiceRegistry,
    ) -> Result<Self, GripError> {
        let registry = OperationRegistry::from_ir(ir, handlers)?;

        for op in ir.operations() {
            if !bindings.contains(op.kind, &op.name) {
                warn!(
                    kind = %op.kind,
                    operation = %op.name,
                    "declared operation has no resolver binding"
                );
            }
        }

        let example = example_request(ir);
        let playground = PlaygroundTemplate {
            title: "grip",
            endpoint: GRAPHQL_PATH,
            schema_url: SCHEMA_PATH,
            example_request: &example,
        }
        .render()?;

        info!(
            operations = registry.len(),
            bindings = bindings.len(),
            services = ?services.names(),
            "service ready"
        );

        Ok(GripService {
            schema: schema.into(),
            playground,
            bindings,
            registry: SharedRegistry::new(registry),
            services: Arc::new(services),
        })
    }

    /// Handle to the registry, for hot reload
    #[must_use]
    pub fn shared_registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Serve one request
    ///
    /// `target` may carry a query string; it is ignored for routing.
    pub fn handle(
        &self,
        method: &str,
        target: &str,
        headers: Vec<(String, String)>,
        body: &[u8],
    ) -> ServiceResponse {
        let path = target.split('?').next().unwrap_or(target);
        let method = method.to_ascii_uppercase();

        let response = match (method.as_str(), path) {
            ("GET", GRAPHQL_PATH) => {
                ServiceResponse::text(200, "text/html; charset=utf-8", self.playground.clone())
            }
            ("POST", GRAPHQL_PATH) => self.graphql(&method, path, headers, body),
            ("GET", HEALTH_PATH) => ServiceResponse::json(200, &json!({ "status": "ok" })),
            ("GET", SCHEMA_PATH) => {
                ServiceResponse::text(200, "text/plain; charset=utf-8", self.schema.clone())
            }
            _ => ServiceResponse::json(
                404,
                &json!({ "error": "Not Found", "method": method, "path": path }),
            ),
        };

        info!(
            method = %method,
            path = %path,
            status = response.status,
            "request served"
        );
        response
    }

    fn graphql(
        &self,
        method: &str,
        path: &str,
        headers: Vec<(String, String)>,
        body: &[u8],
    ) -> ServiceResponse {
        let request_id = RequestId::from_header_or_new(
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(REQUEST_ID_HEADER))
                .map(|(_, v)| v.as_str()),
        );

        let operation: OperationRequest = match serde_json::from_slice(body) {
            Ok(op) => op,
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "malformed operation request");
                let response = OperationResponse::failure(ErrorEntry::new(
                    format!("malformed operation request: {e}"),
                    Vec::new(),
                ));
                return Self::operation_response(&response);
            }
        };

        let ctx = RequestContext::new(
            TransportRequest {
                request_id,
                method: method.to_string(),
                path: path.to_string(),
                headers,
            },
            self.registry.load(),
            Arc::clone(&self.services),
        );

        let response = execute(&self.bindings, &ctx, &operation);
        Self::operation_response(&response)
    }

    fn operation_response(response: &OperationResponse) -> ServiceResponse {
        match serde_json::to_value(response) {
            Ok(value) => ServiceResponse::json(response.status_code(), &value),
            Err(e) => ServiceResponse::json(500, &json!({ "error": e.to_string() })),
        }
    }
}

/// Sample request body for the playground, using the first declared query
fn example_request(ir: &Ir) -> String {
    let Some(op) = ir.operations().next() else {
        return r#"{"operation": "query", "fields": []}"#.to_string();
    };
    let args: serde_json::Map<String, serde_json::Value> = op
        .args
        .iter()
        .map(|a| (a.name.clone(), serde_json::Value::Null))
        .collect();
    let request = json!({
        "operation": op.kind,
        "fields": [{ "name": op.name, "args": args }],
    });
    serde_json::to_string_pretty(&request).unwrap_or_default()
}
