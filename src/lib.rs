//! # Switchboard
//!
//! **Switchboard** is the request-dispatch core of an HTTP server framework:
//! a routing registry, a per-request handler pipeline, and the glue that
//! turns a matched route into an invocation on an application object.
//!
//! ## Overview
//!
//! The transport layer (socket accept loop, HTTP parsing, WebSocket framing)
//! lives outside this crate. Switchboard takes over once a request and an
//! empty response exist: it runs the request through a chain of pipeline
//! steps — static files, route matching, group middlewares, the bound
//! handler — and guarantees a response comes out the other end, falling back
//! to a 404 renderer when nothing claimed the request and a 500 when a
//! handler failed or panicked.
//!
//! ## Architecture
//!
//! - **[`router`]** - URI-template registration builders and the compiled,
//!   read-only route table
//! - **[`context`]** - Per-request state and the cooperative handler chain
//! - **[`dispatcher`]** - The dispatch entry point, built-in pipeline steps
//!   and the error boundary
//! - **[`inject`]** - The dependency-injection seam: bound handler methods
//!   and instance resolution
//! - **[`renderer`]** - Final render seam plus the 404/500 fallbacks
//! - **[`websocket`]** - WebSocket channel registry and session identity
//! - **[`static_files`]** - Static asset source for the optional
//!   static-file pipeline step
//! - **[`http`]** - In-crate request/response value types at the transport
//!   boundary
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use switchboard::dispatcher::Dispatcher;
//! use switchboard::http::{Request, Response};
//! use switchboard::inject::{BoundMethod, SingletonResolver};
//! use switchboard::router::RouteRegistry;
//! use switchboard::RequestContext;
//!
//! struct Articles;
//!
//! impl Articles {
//!     fn show(&self, ctx: &mut RequestContext) -> anyhow::Result<()> {
//!         let id = ctx.path_param("id").unwrap_or("?").to_string();
//!         ctx.response.send_text(&format!("article {id}"));
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = RouteRegistry::new();
//! registry
//!     .group()
//!     .get("/article/{id}", BoundMethod::bind::<Articles, _>("show", Articles::show));
//!
//! let mut resolver = SingletonResolver::new();
//! resolver.register(Articles);
//!
//! let dispatcher = Dispatcher::new(registry.compile(), Arc::new(resolver));
//! let ctx = dispatcher.dispatch(Request::new(http::Method::GET, "/article/42"), Response::new());
//! assert_eq!(ctx.response.status(), 200);
//! assert_eq!(ctx.response.body_str(), "article 42");
//! ```

pub mod context;
pub mod dispatcher;
pub mod http;
pub mod ids;
pub mod inject;
pub mod renderer;
pub mod router;
pub mod static_files;
pub mod websocket;

pub use context::{handler_fn, Handler, PipelineState, RequestContext};
pub use dispatcher::Dispatcher;
pub use ids::{RequestId, SessionId};
pub use inject::{BoundMethod, InstanceResolver, SingletonResolver};
pub use renderer::Renderer;
pub use router::{RouteRegistry, Router};
