use crate::context::Handler;
use crate::inject::BoundMethod;
use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum number of path parameters before the match result spills to the
/// heap. Most routes carry well under eight.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the match hot path.
///
/// Parameter names come from the compiled route table and are shared as
/// `Arc<str>`; values are per-request data extracted from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Attribute-bag key under which the route-matching step stores the
/// [`RouteMatch`] for downstream pipeline steps.
pub const MATCH_ATTR: &str = "match_result";

/// One URI template compiled to a regex plus its ordered parameter names.
#[derive(Debug, Clone)]
pub(crate) struct UriTemplate {
    pub pattern: String,
    regex: Regex,
    params: Vec<Arc<str>>,
}

impl UriTemplate {
    pub(crate) fn compile(pattern: &str) -> Self {
        let (regex, params) = path_to_regex(pattern);
        Self {
            pattern: pattern.to_string(),
            regex,
            params,
        }
    }

    /// Match a concrete request path, extracting parameter values.
    fn match_path(&self, path: &str) -> Option<ParamVec> {
        let caps = self.regex.captures(path)?;
        let mut params = ParamVec::new();
        for (i, name) in self.params.iter().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                params.push((Arc::clone(name), m.as_str().to_string()));
            }
        }
        Some(params)
    }
}

/// Flattened, match-ready form of one registered route.
///
/// Produced once by [`RouteRegistry::compile`](crate::router::RouteRegistry::compile)
/// and never mutated afterwards; shared across requests via `Arc`.
pub struct CompiledRoute {
    /// Registration order; the tie-break when several entries match a path.
    pub index: usize,
    pub(crate) templates: Vec<UriTemplate>,
    pub methods: Vec<Method>,
    /// Bound invocation target. `None` when registration never attached a
    /// handler — such routes match but fail at invocation time.
    pub target: Option<BoundMethod>,
    /// Owning group's middlewares, in declared execution order.
    pub middlewares: Vec<Arc<dyn Handler>>,
}

impl CompiledRoute {
    pub fn patterns(&self) -> Vec<&str> {
        self.templates.iter().map(|t| t.pattern.as_str()).collect()
    }
}

impl std::fmt::Debug for CompiledRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRoute")
            .field("index", &self.index)
            .field("patterns", &self.patterns())
            .field("methods", &self.methods)
            .field("target", &self.target)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

/// Result of successfully matching a request to a compiled route entry.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<CompiledRoute>,
    /// Path parameters extracted from the URL (e.g. `{id}` → `("id", "42")`).
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name. Last write wins when the same name
    /// appears at several path depths.
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Read-only compiled route table. The serving-phase product of a
/// [`RouteRegistry`](crate::router::RouteRegistry).
pub struct Router {
    routes: Vec<Arc<CompiledRoute>>,
    error_route: Option<Arc<CompiledRoute>>,
}

impl Router {
    pub(crate) fn new(
        routes: Vec<Arc<CompiledRoute>>,
        error_route: Option<Arc<CompiledRoute>>,
    ) -> Self {
        Self {
            routes,
            error_route,
        }
    }

    /// Match an HTTP request against the compiled entries.
    ///
    /// Entries are scanned in registration order, so the earliest-registered
    /// route wins on ambiguous registrations. Entries with an empty method
    /// set are skipped defensively — a mapped route must have declared
    /// methods.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        debug!(method = %method, path = %path, "Route match attempt");
        for entry in &self.routes {
            if entry.methods.is_empty() || !entry.methods.contains(method) {
                continue;
            }
            for template in &entry.templates {
                if let Some(path_params) = template.match_path(path) {
                    debug!(
                        method = %method,
                        path = %path,
                        route_pattern = %template.pattern,
                        path_params = ?path_params,
                        "Route matched"
                    );
                    return Some(RouteMatch {
                        route: Arc::clone(entry),
                        path_params,
                    });
                }
            }
        }
        warn!(method = %method, path = %path, "No route matched");
        None
    }

    /// The designated error/fallback entry, if one was registered.
    ///
    /// Discoverable only: the default 404 renderer never invokes it
    /// automatically. Wiring it into rendering is the embedding
    /// application's choice.
    pub fn error_route(&self) -> Option<&Arc<CompiledRoute>> {
        self.error_route.as_ref()
    }

    pub fn routes(&self) -> &[Arc<CompiledRoute>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Convert a URI template to a regex and extract parameter names.
///
/// `/article/{id}` becomes `^/article/([^/]+)$` with parameter list
/// `["id"]`. Literal segments are regex-escaped; a trailing slash in the
/// template is preserved, so `/a/` only matches `/a/`.
pub(crate) fn path_to_regex(path: &str) -> (Regex, Vec<Arc<str>>) {
    if path == "/" {
        return (
            Regex::new(r"^/$").expect("failed to compile path regex"),
            Vec::new(),
        );
    }

    let mut pattern = String::with_capacity(path.len() + 8);
    pattern.push('^');
    let mut param_names: Vec<Arc<str>> = Vec::new();

    for segment in path.split('/') {
        if segment.starts_with('{') && segment.ends_with('}') && segment.len() > 2 {
            pattern.push_str("/([^/]+)");
            param_names.push(Arc::from(
                segment.trim_start_matches('{').trim_end_matches('}'),
            ));
        } else if !segment.is_empty() {
            pattern.push('/');
            pattern.push_str(&regex::escape(segment));
        }
    }
    if path.ends_with('/') {
        pattern.push('/');
    }

    pattern.push('$');
    let regex = Regex::new(&pattern).expect("failed to compile path regex");
    (regex, param_names)
}
