use crate::context::{Handler, RequestContext};
use crate::http::{Request, Response};
use crate::inject::InstanceResolver;
use crate::renderer::{NotFoundRenderer, Renderer, ServerErrorRenderer};
use crate::router::{Router, MATCH_ATTR};
use crate::static_files::StaticSource;
use anyhow::{anyhow, Result};
use http::Method;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Request dispatcher: owns the compiled route table, the DI resolver and
/// the built-in pipeline, and drives one handler chain per request.
pub struct Dispatcher {
    router: Arc<Router>,
    built_ins: Vec<Arc<dyn Handler>>,
    start_hook: Option<Arc<dyn Handler>>,
    end_hook: Option<Arc<dyn Handler>>,
}

impl Dispatcher {
    /// Build a dispatcher over a compiled router.
    ///
    /// Each route's declaring type is resolved through `resolver` exactly
    /// once, here; failures are logged and leave the route non-invocable
    /// rather than blocking startup.
    pub fn new(router: Router, resolver: Arc<dyn InstanceResolver>) -> Self {
        let router = Arc::new(router);
        verify_targets(&router, resolver.as_ref());
        let invoke: Arc<dyn Handler> = Arc::new(InvokeHandler { resolver });
        let built_ins: Vec<Arc<dyn Handler>> = vec![Arc::new(RouteDispatchHandler {
            router: Arc::clone(&router),
            invoke,
        })];
        Self {
            router,
            built_ins,
            start_hook: None,
            end_hook: None,
        }
    }

    /// Serve static files from `source` before route matching. A file hit
    /// fully writes the response and short-circuits the chain.
    pub fn with_static(mut self, source: Arc<dyn StaticSource>) -> Self {
        self.built_ins.insert(0, Arc::new(StaticHandler { source }));
        self
    }

    /// Hook run once before the pipeline. Errors and panics are logged,
    /// never propagated.
    pub fn on_request_start(mut self, hook: Arc<dyn Handler>) -> Self {
        self.start_hook = Some(hook);
        self
    }

    /// Hook run once after rendering, even when the pipeline halted or
    /// failed. Errors and panics are logged, never propagated.
    pub fn on_request_end(mut self, hook: Arc<dyn Handler>) -> Self {
        self.end_hook = Some(hook);
        self
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Dispatch one request. Writes to the response unless a
    /// short-circuiting step already committed it; returns the completed
    /// context for post-dispatch inspection.
    pub fn dispatch(&self, request: Request, response: Response) -> RequestContext {
        let mut ctx = RequestContext::new(request, response);
        debug!(
            request_id = %ctx.request_id(),
            method = %ctx.request.method(),
            path = %ctx.request.path(),
            "Dispatch begin"
        );

        if let Some(hook) = &self.start_hook {
            run_hook(hook, &mut ctx, "start");
        }

        ctx.set_pipeline(self.built_ins.clone());
        let outcome = catch_unwind(AssertUnwindSafe(|| ctx.run()));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(
                    request_id = %ctx.request_id(),
                    method = %ctx.request.method(),
                    path = %ctx.request.path(),
                    error = %err,
                    "Handler execution failed"
                );
                ServerErrorRenderer.render(&mut ctx);
            }
            Err(panic) => {
                error!(
                    request_id = %ctx.request_id(),
                    method = %ctx.request.method(),
                    path = %ctx.request.path(),
                    panic_message = %format_panic(&panic),
                    "Handler panicked"
                );
                ServerErrorRenderer.render(&mut ctx);
            }
        }

        self.render_response(&mut ctx);

        if let Some(hook) = &self.end_hook {
            run_hook(hook, &mut ctx, "end");
        }

        info!(
            request_id = %ctx.request_id(),
            status = ctx.response.status(),
            pipeline_state = ?ctx.state(),
            "Dispatch complete"
        );
        ctx
    }

    /// Render the response unless a step already committed it: a renderer
    /// chosen by a handler wins, plain handler output is flushed with an
    /// implicit 200, and an untouched response falls back to the default
    /// 404 renderer.
    fn render_response(&self, ctx: &mut RequestContext) {
        if ctx.response.is_committed() {
            return;
        }
        if let Some(renderer) = ctx.take_renderer() {
            renderer.render(ctx);
            ctx.response.commit();
            return;
        }
        if ctx.response.has_output() {
            ctx.response.commit();
            return;
        }
        NotFoundRenderer.render(ctx);
    }
}

fn run_hook(hook: &Arc<dyn Handler>, ctx: &mut RequestContext, phase: &str) {
    let outcome = catch_unwind(AssertUnwindSafe(|| hook.handle(ctx)));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            error!(phase = phase, error = %err, "Request hook failed");
        }
        Err(panic) => {
            error!(phase = phase, panic_message = %format_panic(&panic), "Request hook panicked");
        }
    }
}

fn format_panic(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Built-in route-matching step.
///
/// On a match: stores the [`RouteMatch`](crate::router::RouteMatch) in the
/// attribute bag, splices the route's middlewares followed by the terminal
/// invocation step into the remaining pipeline, and continues. On no match:
/// returns without continuing, so the untouched response falls through to
/// the default 404 renderer.
struct RouteDispatchHandler {
    router: Arc<Router>,
    invoke: Arc<dyn Handler>,
}

impl Handler for RouteDispatchHandler {
    fn handle(&self, ctx: &mut RequestContext) -> Result<()> {
        let Some(route_match) = self
            .router
            .route(ctx.request.method(), ctx.request.path())
        else {
            return Ok(());
        };

        let mut steps = route_match.route.middlewares.clone();
        steps.push(Arc::clone(&self.invoke));
        ctx.set_attr(MATCH_ATTR, route_match);
        ctx.insert_next(steps);
        ctx.next()
    }
}

/// Terminal pipeline step: resolve the matched route's declaring type to a
/// live instance and invoke the bound method with the context.
struct InvokeHandler {
    resolver: Arc<dyn InstanceResolver>,
}

impl Handler for InvokeHandler {
    fn handle(&self, ctx: &mut RequestContext) -> Result<()> {
        let route = ctx
            .attr::<crate::router::RouteMatch>(MATCH_ATTR)
            .map(|m| Arc::clone(&m.route))
            .ok_or_else(|| anyhow!("handler invocation without a match result"))?;

        let target = route.target.as_ref().ok_or_else(|| {
            anyhow!(
                "route {:?} has no bound handler",
                route.patterns()
            )
        })?;

        let instance = self.resolver.resolve(target.type_id()).ok_or_else(|| {
            anyhow!(
                "no instance resolvable for {} (invoking {})",
                target.type_name(),
                target.method_name()
            )
        })?;

        debug!(
            request_id = %ctx.request_id(),
            handler = ?target,
            "Invoking handler"
        );
        target.invoke(instance.as_ref(), ctx)?;
        ctx.next()
    }
}

/// Built-in static-file step delegating to a
/// [`StaticSource`](crate::static_files::StaticSource) collaborator. Serves
/// `GET` requests whose path maps to an asset and short-circuits the chain;
/// everything else continues to route matching.
struct StaticHandler {
    source: Arc<dyn StaticSource>,
}

impl Handler for StaticHandler {
    fn handle(&self, ctx: &mut RequestContext) -> Result<()> {
        if *ctx.request.method() == Method::GET {
            let path = ctx.request.path().trim_start_matches('/');
            let path = if path.is_empty() { "index.html" } else { path };
            if let Some((bytes, content_type)) = self.source.load(path) {
                debug!(path = path, content_type = content_type, "Static file served");
                ctx.response.set_status(200);
                ctx.response.set_header("Content-Type", content_type);
                ctx.response.write(bytes);
                ctx.response.commit();
                return Ok(());
            }
        }
        ctx.next()
    }
}

fn verify_targets(router: &Router, resolver: &dyn InstanceResolver) {
    for route in router.routes() {
        if let Some(target) = &route.target {
            if resolver.resolve(target.type_id()).is_none() {
                error!(
                    handler_type = target.type_name(),
                    handler_method = target.method_name(),
                    patterns = ?route.patterns(),
                    "No instance resolvable for handler type; route will fail at invocation"
                );
            }
        }
    }
}
