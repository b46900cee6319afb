//! # Request Context & Pipeline Engine
//!
//! Per-request state and the cooperative handler chain that drives dispatch.
//!
//! ## Overview
//!
//! A [`RequestContext`] owns everything belonging to one in-flight request:
//! the parsed [`Request`](crate::http::Request), the
//! [`Response`](crate::http::Response) under construction, an attribute bag
//! for passing data between pipeline steps, and the pipeline itself — an
//! ordered list of steps plus a cursor marking the next one to run.
//!
//! ## The chain protocol
//!
//! Every pipeline step implements [`Handler`]. A step is invoked with the
//! context and decides whether the chain continues:
//!
//! - call [`RequestContext::next`] to run the next step synchronously in the
//!   same call stack, or
//! - return without calling it, which halts the chain for this request
//!   (short-circuit responses such as an auth rejection or a fully served
//!   static file).
//!
//! The cursor only moves forward. Steps may extend the *remaining* pipeline
//! mid-flight with [`RequestContext::insert_next`] — this is how the
//! route-matching step splices the matched route's middlewares and the
//! terminal invocation step in front of whatever else was queued.
//!
//! ## Ownership
//!
//! One request is handled on one logical execution unit; the context is
//! passed down the chain by `&mut` and never shared, so no locking is
//! involved anywhere in the engine.

use crate::http::{Request, Response};
use crate::ids::RequestId;
use crate::renderer::Renderer;
use crate::router::{RouteMatch, MATCH_ATTR};
use anyhow::Result;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A unit of per-request logic: a built-in step, a group middleware or the
/// terminal handler-invocation step.
///
/// Returning `Ok(())` without calling `ctx.next()` halts the chain; errors
/// propagate up the synchronous call stack to the dispatch boundary.
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut RequestContext) -> Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&mut RequestContext) -> Result<()> + Send + Sync,
{
    fn handle(&self, ctx: &mut RequestContext) -> Result<()> {
        self(ctx)
    }
}

/// Wrap a closure as a shareable pipeline step.
pub fn handler_fn<F>(f: F) -> Arc<dyn Handler>
where
    F: Fn(&mut RequestContext) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Pipeline execution state.
///
/// `Idle` until the dispatcher starts the chain, `Running` while the cursor
/// advances, then either `Completed` (cursor passed the last step) or
/// `Halted` (some step did not continue, or the chain errored).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Halted,
    Completed,
}

/// Mutable per-request state threaded through the handler pipeline.
pub struct RequestContext {
    pub request: Request,
    pub response: Response,
    request_id: RequestId,
    attributes: HashMap<String, Box<dyn Any + Send + Sync>>,
    pipeline: Vec<Arc<dyn Handler>>,
    cursor: usize,
    state: PipelineState,
    renderer: Option<Box<dyn Renderer>>,
}

impl RequestContext {
    pub fn new(request: Request, response: Response) -> Self {
        Self {
            request,
            response,
            request_id: RequestId::new(),
            attributes: HashMap::new(),
            pipeline: Vec::new(),
            cursor: 0,
            state: PipelineState::Idle,
            renderer: None,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Store an attribute under `key`, replacing any previous value.
    pub fn set_attr<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.attributes.insert(key.into(), Box::new(value));
    }

    /// Fetch an attribute, downcast to the requested type.
    pub fn attr<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.attributes.get(key).and_then(|v| v.downcast_ref())
    }

    pub fn remove_attr(&mut self, key: &str) {
        self.attributes.remove(key);
    }

    /// Path parameter extracted by the route-matching step, e.g. `id` for a
    /// request matched against `/article/{id}`.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.attr::<RouteMatch>(MATCH_ATTR).and_then(|m| {
            m.path_params
                .iter()
                .rfind(|(k, _)| k.as_ref() == name)
                .map(|(_, v)| v.as_str())
        })
    }

    /// Renderer chosen by a handler for the final render step. When none is
    /// set and the response carries no output, the dispatcher falls back to
    /// the default 404 renderer.
    pub fn set_renderer(&mut self, renderer: Box<dyn Renderer>) {
        self.renderer = Some(renderer);
    }

    pub(crate) fn take_renderer(&mut self) -> Option<Box<dyn Renderer>> {
        self.renderer.take()
    }

    /// Assign the pipeline and reset the cursor. Called once per request by
    /// the dispatcher before [`run`](Self::run).
    pub(crate) fn set_pipeline(&mut self, steps: Vec<Arc<dyn Handler>>) {
        self.pipeline = steps;
        self.cursor = 0;
        self.state = PipelineState::Idle;
    }

    /// Splice steps into the pipeline immediately after the step that is
    /// currently executing. Downstream steps see the extended list.
    pub fn insert_next(&mut self, steps: Vec<Arc<dyn Handler>>) {
        self.pipeline.splice(self.cursor..self.cursor, steps);
    }

    /// Continue the chain: advance the cursor and invoke the next step in the
    /// same call stack. Marks the pipeline `Completed` once the cursor passes
    /// the last step.
    pub fn next(&mut self) -> Result<()> {
        if self.cursor >= self.pipeline.len() {
            self.state = PipelineState::Completed;
            return Ok(());
        }
        let step = Arc::clone(&self.pipeline[self.cursor]);
        self.cursor += 1;
        step.handle(self)
    }

    /// Run the pipeline from the first step. Any step that returns without
    /// continuing leaves the chain `Halted`.
    pub(crate) fn run(&mut self) -> Result<()> {
        self.state = PipelineState::Running;
        let result = self.next();
        if self.state != PipelineState::Completed {
            self.state = PipelineState::Halted;
        }
        result
    }
}
