//! # Router Module
//!
//! Route registration and the compiled matching structure.
//!
//! ## Two-phase lifecycle
//!
//! Routing goes through two distinct phases, enforced at the type level:
//!
//! 1. **Registration**: application startup code builds a [`RouteRegistry`],
//!    creating [`RouterGroup`]s, attaching middlewares and registering
//!    [`Route`]s through the fluent verb methods. Everything is mutable, and
//!    duplicate verb/URI registration on a route is an idempotent no-op.
//!
//! 2. **Serving**: [`RouteRegistry::compile`] flattens every group's routes
//!    into immutable [`CompiledRoute`] entries — URI templates compiled to
//!    regexes, methods, the bound invocation target and the group's
//!    middleware list — producing a read-only [`Router`]. The compiled set is
//!    the only structure consulted per request; it is safe for
//!    unsynchronized concurrent reads.
//!
//! ## Matching
//!
//! Templates are literal path segments plus `{name}` parameters; a parameter
//! matches exactly one non-empty segment. Matching is case-sensitive and no
//! trailing-slash normalization is applied (`/a` and `/a/` are distinct
//! paths). When several entries match the same request, the earliest
//! registered wins — a documented tie-break, not an error.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut registry = RouteRegistry::new();
//! registry
//!     .group()
//!     .middleware(auth)
//!     .get("/article/{id}", BoundMethod::bind::<ArticleController, _>(
//!         "show", ArticleController::show,
//!     ));
//! let router = registry.compile();
//! if let Some(m) = router.route(&Method::GET, "/article/42") {
//!     assert_eq!(m.get_path_param("id"), Some("42"));
//! }
//! ```

mod builder;
mod core;

pub use builder::{Route, RouteRegistry, RouterGroup};
pub use core::{
    CompiledRoute, ParamVec, RouteMatch, Router, MATCH_ATTR, MAX_INLINE_PARAMS,
};
