use super::core::{CompiledRoute, Router, UriTemplate};
use crate::context::Handler;
use crate::inject::BoundMethod;
use crate::websocket::{WebSocketChannel, WebSocketRegistry};
use http::Method;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Registration-phase owner of all router groups, the optional error route
/// and the WebSocket channel registry.
///
/// Built once at application startup and compiled into a read-only
/// [`Router`] before traffic is served. Everything registered afterwards is
/// simply not part of the compiled table — such requests fall through to the
/// default 404 path.
#[derive(Default)]
pub struct RouteRegistry {
    groups: Vec<RouterGroup>,
    error_route: Option<(String, BoundMethod)>,
    websockets: Arc<WebSocketRegistry>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate and register a new router group.
    pub fn group(&mut self) -> &mut RouterGroup {
        let idx = self.groups.len();
        self.groups.push(RouterGroup::default());
        &mut self.groups[idx]
    }

    /// Designate the error/fallback route. The entry is compiled like any
    /// other route and additionally exposed through
    /// [`Router::error_route`]; it is never invoked automatically.
    pub fn error_route(&mut self, uri_template: &str, handler: BoundMethod) {
        self.error_route = Some((uri_template.to_string(), handler));
    }

    /// Register a WebSocket channel under an exact URI (no templating).
    /// Last write for a given URI wins.
    pub fn websocket(&mut self, uri: &str, channel: Arc<dyn WebSocketChannel>) {
        self.websockets.register(uri, channel);
    }

    /// The WebSocket URI→channel registry, shared with the transport layer.
    pub fn websocket_registry(&self) -> Arc<WebSocketRegistry> {
        Arc::clone(&self.websockets)
    }

    /// One-shot mapping step: flatten every group's routes into compiled
    /// entries. Non-consuming and pure over the registration state, so
    /// calling it twice yields a functionally identical router.
    ///
    /// Routes without a bound handler or without declared methods are
    /// compiled anyway but reported here — the former fail at invocation,
    /// the latter never match.
    pub fn compile(&self) -> Router {
        let mut routes = Vec::new();
        let mut index = 0;

        for group in &self.groups {
            for route in &group.routes {
                if route.handler.is_none() {
                    error!(
                        patterns = ?route.templates,
                        "Route has no bound handler; requests matching it will fail at invocation"
                    );
                }
                if route.methods.is_empty() {
                    warn!(
                        patterns = ?route.templates,
                        "Route declares no HTTP methods and will never match"
                    );
                }
                routes.push(Arc::new(CompiledRoute {
                    index,
                    templates: route
                        .templates
                        .iter()
                        .map(|t| UriTemplate::compile(t))
                        .collect(),
                    methods: route.methods.clone(),
                    target: route.handler.clone(),
                    middlewares: group.middlewares.clone(),
                }));
                index += 1;
            }
        }

        let error_route = self.error_route.as_ref().map(|(template, handler)| {
            let entry = Arc::new(CompiledRoute {
                index,
                templates: vec![UriTemplate::compile(template)],
                methods: vec![Method::GET],
                target: Some(handler.clone()),
                middlewares: Vec::new(),
            });
            routes.push(Arc::clone(&entry));
            entry
        });

        let routes_summary: Vec<String> = routes
            .iter()
            .take(10)
            .map(|r| format!("{:?} {}", r.methods, r.patterns().join(", ")))
            .collect();
        info!(
            routes_count = routes.len(),
            routes_summary = ?routes_summary,
            "Routing table compiled"
        );

        Router::new(routes, error_route)
    }
}

/// A named bundle of middlewares shared by all routes registered under it.
///
/// Middlewares execute in the order they were added, first added outermost,
/// before the route's terminal handler.
#[derive(Default)]
pub struct RouterGroup {
    middlewares: Vec<Arc<dyn Handler>>,
    routes: Vec<Route>,
}

impl RouterGroup {
    /// Append one middleware to the group.
    pub fn middleware(&mut self, mw: Arc<dyn Handler>) -> &mut Self {
        self.middlewares.push(mw);
        self
    }

    /// Append several middlewares, preserving order.
    pub fn middlewares(&mut self, mws: Vec<Arc<dyn Handler>>) -> &mut Self {
        self.middlewares.extend(mws);
        self
    }

    /// Register a raw route for fine-grained building.
    pub fn route(&mut self) -> &mut Route {
        let idx = self.routes.len();
        self.routes.push(Route::default());
        &mut self.routes[idx]
    }

    /// HTTP GET routing.
    pub fn get(&mut self, uri_template: &str, handler: BoundMethod) -> &mut Self {
        self.route().uri(uri_template).get().handler(handler);
        self
    }

    /// HTTP GET routing for several templates bound to one handler.
    pub fn get_uris(&mut self, uri_templates: &[&str], handler: BoundMethod) -> &mut Self {
        self.route().uris(uri_templates).get().handler(handler);
        self
    }

    /// HTTP POST routing.
    pub fn post(&mut self, uri_template: &str, handler: BoundMethod) -> &mut Self {
        self.route().uri(uri_template).post().handler(handler);
        self
    }

    /// HTTP POST routing for several templates bound to one handler.
    pub fn post_uris(&mut self, uri_templates: &[&str], handler: BoundMethod) -> &mut Self {
        self.route().uris(uri_templates).post().handler(handler);
        self
    }

    /// HTTP PUT routing.
    pub fn put(&mut self, uri_template: &str, handler: BoundMethod) -> &mut Self {
        self.route().uri(uri_template).put().handler(handler);
        self
    }

    /// HTTP PUT routing for several templates bound to one handler.
    pub fn put_uris(&mut self, uri_templates: &[&str], handler: BoundMethod) -> &mut Self {
        self.route().uris(uri_templates).put().handler(handler);
        self
    }

    /// HTTP DELETE routing.
    pub fn delete(&mut self, uri_template: &str, handler: BoundMethod) -> &mut Self {
        self.route().uri(uri_template).delete().handler(handler);
        self
    }

    /// HTTP DELETE routing for several templates bound to one handler.
    pub fn delete_uris(&mut self, uri_templates: &[&str], handler: BoundMethod) -> &mut Self {
        self.route().uris(uri_templates).delete().handler(handler);
        self
    }
}

/// One routable operation under construction: URI templates, accepted
/// methods and the bound handler.
///
/// All builder methods are idempotent under repeated identical registration;
/// adding the same verb or URI twice is a no-op, not an error.
#[derive(Default)]
pub struct Route {
    templates: Vec<String>,
    methods: Vec<Method>,
    handler: Option<BoundMethod>,
}

impl Route {
    pub fn uri(&mut self, uri_template: &str) -> &mut Self {
        if !self.templates.iter().any(|t| t == uri_template) {
            self.templates.push(uri_template.to_string());
        }
        self
    }

    pub fn uris(&mut self, uri_templates: &[&str]) -> &mut Self {
        for template in uri_templates {
            self.uri(template);
        }
        self
    }

    fn method(&mut self, method: Method) -> &mut Self {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
        self
    }

    pub fn get(&mut self) -> &mut Self {
        self.method(Method::GET)
    }

    pub fn post(&mut self) -> &mut Self {
        self.method(Method::POST)
    }

    pub fn put(&mut self) -> &mut Self {
        self.method(Method::PUT)
    }

    pub fn delete(&mut self) -> &mut Self {
        self.method(Method::DELETE)
    }

    pub fn head(&mut self) -> &mut Self {
        self.method(Method::HEAD)
    }

    pub fn options(&mut self) -> &mut Self {
        self.method(Method::OPTIONS)
    }

    pub fn trace(&mut self) -> &mut Self {
        self.method(Method::TRACE)
    }

    /// Bind the handler. The declaring type and method name were captured
    /// when the [`BoundMethod`] was built; binding here is final.
    pub fn handler(&mut self, handler: BoundMethod) -> &mut Self {
        self.handler = Some(handler);
        self
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }
}
