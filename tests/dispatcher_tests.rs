//! Tests for the request dispatcher
//!
//! # Test Coverage
//!
//! Validates the dispatcher's core responsibilities:
//! - Routing a request to the bound handler method and flushing its output
//! - The 404 fallback for unmatched requests
//! - Path-parameter access from handler code
//! - Error and panic containment at the dispatch boundary
//! - Request hooks (run exactly once, failures swallowed)
//! - Static-file short-circuit ahead of route matching
//! - Error-route passivity (discoverable, never auto-invoked)

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use http::Method;
use switchboard::dispatcher::Dispatcher;
use switchboard::http::{Request, Response};
use switchboard::inject::{BoundMethod, SingletonResolver};
use switchboard::renderer::Renderer;
use switchboard::router::RouteRegistry;
use switchboard::static_files::StaticFiles;
use switchboard::{handler_fn, PipelineState, RequestContext};

use tracing_util::TestTracing;

#[derive(Default)]
struct Greetings {
    invoked: AtomicUsize,
}

impl Greetings {
    fn hello(&self, ctx: &mut RequestContext) -> anyhow::Result<()> {
        self.invoked.fetch_add(1, Ordering::SeqCst);
        let name = ctx.path_param("name").unwrap_or("stranger").to_string();
        ctx.response.send_text(&format!("hi {name}"));
        Ok(())
    }

    fn show_id(&self, ctx: &mut RequestContext) -> anyhow::Result<()> {
        self.invoked.fetch_add(1, Ordering::SeqCst);
        let id = ctx.path_param("id").unwrap_or("").to_string();
        ctx.response.send_text(&id);
        Ok(())
    }

    fn fail(&self, _ctx: &mut RequestContext) -> anyhow::Result<()> {
        self.invoked.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("database unavailable")
    }

    fn blow_up(&self, _ctx: &mut RequestContext) -> anyhow::Result<()> {
        panic!("boom! - watch to see if I recover");
    }
}

fn bind(method_name: &'static str) -> BoundMethod {
    match method_name {
        "hello" => BoundMethod::bind::<Greetings, _>("hello", Greetings::hello),
        "show_id" => BoundMethod::bind::<Greetings, _>("show_id", Greetings::show_id),
        "fail" => BoundMethod::bind::<Greetings, _>("fail", Greetings::fail),
        "blow_up" => BoundMethod::bind::<Greetings, _>("blow_up", Greetings::blow_up),
        other => unreachable!("unknown test handler {other}"),
    }
}

fn build(configure: impl FnOnce(&mut RouteRegistry)) -> Dispatcher {
    let mut registry = RouteRegistry::new();
    configure(&mut registry);
    let mut resolver = SingletonResolver::new();
    resolver.register(Greetings::default());
    Dispatcher::new(registry.compile(), Arc::new(resolver))
}

fn dispatch(dispatcher: &Dispatcher, method: Method, target: &str) -> RequestContext {
    dispatcher.dispatch(Request::new(method, target), Response::new())
}

#[test]
fn test_dispatch_matched_route_flushes_handler_output() {
    let _tracing = TestTracing::init();
    let dispatcher = build(|registry| {
        registry.group().get("/hello/{name}", bind("hello"));
    });

    let ctx = dispatch(&dispatcher, Method::GET, "/hello/world");
    assert_eq!(ctx.response.status(), 200);
    assert_eq!(ctx.response.body_str(), "hi world");
    assert!(ctx.response.is_committed());
    assert_eq!(ctx.state(), PipelineState::Completed);
}

#[test]
fn test_unmatched_request_renders_404() {
    let _tracing = TestTracing::init();
    let dispatcher = build(|registry| {
        registry.group().get("/hello/{name}", bind("hello"));
    });

    let ctx = dispatch(&dispatcher, Method::GET, "/nope");
    assert_eq!(ctx.response.status(), 404);
    let body: serde_json::Value = serde_json::from_slice(ctx.response.body()).unwrap();
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["path"], "/nope");
    assert!(ctx.response.is_committed());
}

#[test]
fn test_wrong_method_renders_404() {
    let _tracing = TestTracing::init();
    let dispatcher = build(|registry| {
        registry.group().get("/hello/{name}", bind("hello"));
    });

    let ctx = dispatch(&dispatcher, Method::POST, "/hello/world");
    assert_eq!(ctx.response.status(), 404);
}

#[test]
fn test_path_param_reaches_handler() {
    let _tracing = TestTracing::init();
    let dispatcher = build(|registry| {
        registry.group().get("/article/{id}", bind("show_id"));
    });

    let ctx = dispatch(&dispatcher, Method::GET, "/article/42");
    assert_eq!(ctx.response.body_str(), "42");
}

#[test]
fn test_handler_error_yields_500_and_end_hook_still_runs() {
    let _tracing = TestTracing::init();
    let end_ran = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&end_ran);
    let dispatcher = build(|registry| {
        registry.group().get("/broken", bind("fail"));
    })
    .on_request_end(handler_fn(move |_ctx| {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    }));

    let ctx = dispatch(&dispatcher, Method::GET, "/broken");
    assert_eq!(ctx.response.status(), 500);
    let body: serde_json::Value = serde_json::from_slice(ctx.response.body()).unwrap();
    assert_eq!(body["error"], "Internal Server Error");
    assert!(end_ran.load(Ordering::SeqCst));
}

#[test]
fn test_panicking_handler_yields_500() {
    let _tracing = TestTracing::init();
    let dispatcher = build(|registry| {
        registry.group().get("/panic", bind("blow_up"));
    });

    let ctx = dispatch(&dispatcher, Method::GET, "/panic");
    assert_eq!(ctx.response.status(), 500);
}

#[test]
fn test_failing_start_hook_does_not_break_dispatch() {
    let _tracing = TestTracing::init();
    let dispatcher = build(|registry| {
        registry.group().get("/hello/{name}", bind("hello"));
    })
    .on_request_start(handler_fn(|_ctx| anyhow::bail!("hook exploded")));

    let ctx = dispatch(&dispatcher, Method::GET, "/hello/world");
    assert_eq!(ctx.response.status(), 200);
    assert_eq!(ctx.response.body_str(), "hi world");
}

#[test]
fn test_hooks_run_once_per_dispatch() {
    let _tracing = TestTracing::init();
    let starts = Arc::new(AtomicUsize::new(0));
    let ends = Arc::new(AtomicUsize::new(0));
    let s = Arc::clone(&starts);
    let e = Arc::clone(&ends);
    let dispatcher = build(|registry| {
        registry.group().get("/hello/{name}", bind("hello"));
    })
    .on_request_start(handler_fn(move |_ctx| {
        s.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }))
    .on_request_end(handler_fn(move |_ctx| {
        e.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    dispatch(&dispatcher, Method::GET, "/hello/a");
    dispatch(&dispatcher, Method::GET, "/nope");
    assert_eq!(starts.load(Ordering::SeqCst), 2);
    assert_eq!(ends.load(Ordering::SeqCst), 2);
}

#[test]
fn test_static_file_short_circuits_routing() {
    let _tracing = TestTracing::init();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), "from disk").unwrap();

    let dispatcher = build(|registry| {
        registry.group().get("/hello.txt", bind("hello"));
    })
    .with_static(Arc::new(StaticFiles::new(dir.path())));

    let ctx = dispatch(&dispatcher, Method::GET, "/hello.txt");
    assert_eq!(ctx.response.status(), 200);
    assert_eq!(ctx.response.body_str(), "from disk");
    assert_eq!(ctx.response.header("Content-Type"), Some("text/plain"));

    // A miss falls through to normal routing.
    let ctx = dispatch(&dispatcher, Method::GET, "/other.txt");
    assert_eq!(ctx.response.status(), 404);
}

#[test]
fn test_error_route_is_never_auto_invoked() {
    let _tracing = TestTracing::init();
    let dispatcher = build(|registry| {
        registry.group().get("/home", bind("hello"));
        registry.error_route("/error", bind("hello"));
    });

    let ctx = dispatch(&dispatcher, Method::GET, "/nope");
    assert_eq!(ctx.response.status(), 404);
    // The error handler never ran: the 404 came from the default renderer.
    let body: serde_json::Value = serde_json::from_slice(ctx.response.body()).unwrap();
    assert_eq!(body["error"], "Not Found");

    // It is still reachable as an ordinary route.
    let ctx = dispatch(&dispatcher, Method::GET, "/error");
    assert_eq!(ctx.response.status(), 200);
}

#[test]
fn test_unbound_route_yields_500() {
    let _tracing = TestTracing::init();
    let dispatcher = build(|registry| {
        registry.group().route().uri("/unbound").get();
    });

    let ctx = dispatch(&dispatcher, Method::GET, "/unbound");
    assert_eq!(ctx.response.status(), 500);
}

#[test]
fn test_unresolvable_handler_type_yields_500() {
    let _tracing = TestTracing::init();
    struct Unregistered;
    impl Unregistered {
        fn noop(&self, _ctx: &mut RequestContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    let dispatcher = build(|registry| {
        registry.group().get(
            "/ghost",
            BoundMethod::bind::<Unregistered, _>("noop", Unregistered::noop),
        );
    });

    let ctx = dispatch(&dispatcher, Method::GET, "/ghost");
    assert_eq!(ctx.response.status(), 500);
}

#[test]
fn test_handler_chosen_renderer_wins() {
    let _tracing = TestTracing::init();
    struct TeapotRenderer;
    impl Renderer for TeapotRenderer {
        fn render(&self, ctx: &mut RequestContext) {
            ctx.response.set_status(418);
            ctx.response.send_text("short and stout");
        }
    }

    struct Teapots;
    impl Teapots {
        fn brew(&self, ctx: &mut RequestContext) -> anyhow::Result<()> {
            ctx.set_renderer(Box::new(TeapotRenderer));
            Ok(())
        }
    }

    let mut registry = RouteRegistry::new();
    registry
        .group()
        .get("/brew", BoundMethod::bind::<Teapots, _>("brew", Teapots::brew));
    let mut resolver = SingletonResolver::new();
    resolver.register(Teapots);
    let dispatcher = Dispatcher::new(registry.compile(), Arc::new(resolver));

    let ctx = dispatch(&dispatcher, Method::GET, "/brew");
    assert_eq!(ctx.response.status(), 418);
    assert_eq!(ctx.response.body_str(), "short and stout");
    assert!(ctx.response.is_committed());
}

#[test]
fn test_request_ids_are_unique_per_dispatch() {
    let _tracing = TestTracing::init();
    let dispatcher = build(|registry| {
        registry.group().get("/hello/{name}", bind("hello"));
    });

    let a = dispatch(&dispatcher, Method::GET, "/hello/a").request_id();
    let b = dispatch(&dispatcher, Method::GET, "/hello/b").request_id();
    assert_ne!(a, b);
}
