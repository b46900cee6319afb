//! # Dispatcher Module
//!
//! The dispatch entry point consumed by the transport layer.
//!
//! For every inbound request/response pair, [`Dispatcher::dispatch`] creates
//! a [`RequestContext`](crate::context::RequestContext), runs the
//! start-of-request hook, executes the built-in pipeline (optional
//! static-file step, then the route-matching step, which splices the matched
//! route's middlewares and the terminal invocation step into the remaining
//! chain), renders the response if nothing committed it, and runs the
//! end-of-request hook unconditionally.
//!
//! Invocation-time failures — a handler returning an error or panicking —
//! are caught at this boundary, logged with full context and surfaced to the
//! client as a generic server error; they never crash the serving loop. Hook
//! failures are logged and never client-visible.

mod core;

pub use core::Dispatcher;
