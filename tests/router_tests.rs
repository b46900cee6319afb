//! Tests for route registration and the compiled route table
//!
//! # Test Coverage
//!
//! - URI template compilation and parameter extraction
//! - Registration-order tie-break on overlapping templates
//! - Method filtering and defensive skip of method-less routes
//! - Idempotent builder registration (duplicate verb/URI is a no-op)
//! - `compile()` idempotence and error-route exposure

use http::Method;
use switchboard::inject::BoundMethod;
use switchboard::router::RouteRegistry;
use switchboard::RequestContext;

use tracing_util::TestTracing;

struct Pages;

impl Pages {
    fn show(&self, _ctx: &mut RequestContext) -> anyhow::Result<()> {
        Ok(())
    }
}

fn show() -> BoundMethod {
    BoundMethod::bind::<Pages, _>("show", Pages::show)
}

#[test]
fn test_match_extracts_path_params() {
    let _tracing = TestTracing::init();
    let mut registry = RouteRegistry::new();
    registry
        .group()
        .get("/users/{user_id}/posts/{post_id}", show());
    let router = registry.compile();

    let m = router
        .route(&Method::GET, "/users/abc-123/posts/post1")
        .expect("route");
    assert_eq!(m.get_path_param("user_id"), Some("abc-123"));
    assert_eq!(m.get_path_param("post_id"), Some("post1"));
    assert_eq!(m.get_path_param("missing"), None);
}

#[test]
fn test_literal_beats_nothing_first_registered_wins() {
    let _tracing = TestTracing::init();
    let mut registry = RouteRegistry::new();
    let group = registry.group();
    group.get("/articles/{id}", show());
    group.get("/articles/latest", show());
    let router = registry.compile();

    // Both templates match "/articles/latest"; the earlier registration wins.
    let m = router.route(&Method::GET, "/articles/latest").expect("route");
    assert_eq!(m.route.index, 0);
    assert_eq!(m.get_path_param("id"), Some("latest"));
}

#[test]
fn test_method_filtering() {
    let _tracing = TestTracing::init();
    let mut registry = RouteRegistry::new();
    let group = registry.group();
    group.get("/articles", show());
    group.post("/articles", show());
    let router = registry.compile();

    assert_eq!(router.route(&Method::GET, "/articles").expect("get").route.index, 0);
    assert_eq!(router.route(&Method::POST, "/articles").expect("post").route.index, 1);
    assert!(router.route(&Method::DELETE, "/articles").is_none());
}

#[test]
fn test_route_without_methods_never_matches() {
    let _tracing = TestTracing::init();
    let mut registry = RouteRegistry::new();
    registry.group().route().uri("/orphan").handler(show());
    let router = registry.compile();

    assert_eq!(router.len(), 1);
    assert!(router.route(&Method::GET, "/orphan").is_none());
}

#[test]
fn test_case_sensitive_no_slash_normalization() {
    let _tracing = TestTracing::init();
    let mut registry = RouteRegistry::new();
    registry.group().get("/About", show());
    registry.group().get("/a/", show());
    let router = registry.compile();

    assert!(router.route(&Method::GET, "/About").is_some());
    assert!(router.route(&Method::GET, "/about").is_none());
    assert!(router.route(&Method::GET, "/a/").is_some());
    assert!(router.route(&Method::GET, "/a").is_none());
}

#[test]
fn test_param_matches_one_nonempty_segment() {
    let _tracing = TestTracing::init();
    let mut registry = RouteRegistry::new();
    registry.group().get("/article/{id}", show());
    let router = registry.compile();

    assert!(router.route(&Method::GET, "/article/42").is_some());
    assert!(router.route(&Method::GET, "/article/").is_none());
    assert!(router.route(&Method::GET, "/article/42/edit").is_none());
}

#[test]
fn test_duplicate_registration_is_noop() {
    let _tracing = TestTracing::init();
    let mut registry = RouteRegistry::new();
    let route = registry.group().route();
    route.uri("/x").uri("/x").get().get().post().handler(show());
    assert_eq!(route.template_count(), 1);
    assert_eq!(route.method_count(), 2);
}

#[test]
fn test_multiple_uris_one_handler() {
    let _tracing = TestTracing::init();
    let mut registry = RouteRegistry::new();
    registry.group().get_uris(&["/", "/index"], show());
    let router = registry.compile();

    let root = router.route(&Method::GET, "/").expect("root");
    let index = router.route(&Method::GET, "/index").expect("index");
    assert_eq!(root.route.index, index.route.index);
}

#[test]
fn test_compile_is_idempotent() {
    let _tracing = TestTracing::init();
    let mut registry = RouteRegistry::new();
    let group = registry.group();
    group.get("/a/{x}", show());
    group.post("/b", show());

    let first = registry.compile();
    let second = registry.compile();
    assert_eq!(first.len(), second.len());
    for (method, path) in [(Method::GET, "/a/42"), (Method::POST, "/b"), (Method::GET, "/b")] {
        let a = first.route(&method, path).map(|m| m.route.index);
        let b = second.route(&method, path).map(|m| m.route.index);
        assert_eq!(a, b, "{method} {path}");
    }
}

#[test]
fn test_error_route_is_discoverable_and_routable() {
    let _tracing = TestTracing::init();
    let mut registry = RouteRegistry::new();
    registry.group().get("/home", show());
    registry.error_route("/error/{code}", show());
    let router = registry.compile();

    let error = router.error_route().expect("error route");
    assert_eq!(error.patterns(), vec!["/error/{code}"]);

    // The error route also sits in the table as an ordinary GET route.
    let m = router.route(&Method::GET, "/error/404").expect("route");
    assert_eq!(m.get_path_param("code"), Some("404"));
}

#[test]
fn test_handlerless_route_compiles_without_target() {
    let _tracing = TestTracing::init();
    let mut registry = RouteRegistry::new();
    registry.group().route().uri("/unbound").get();
    let router = registry.compile();

    let m = router.route(&Method::GET, "/unbound").expect("route");
    assert!(m.route.target.is_none());
}
