use crate::context::RequestContext;
use serde_json::json;

/// Final render step seam. Concrete renderers (JSON, templates, redirects)
/// live with the embedding application; the core ships only the fallbacks
/// used when dispatch produced nothing or failed.
pub trait Renderer: Send + Sync {
    fn render(&self, ctx: &mut RequestContext);
}

/// Default renderer for requests nothing claimed: `404` with a JSON body.
pub struct NotFoundRenderer;

impl Renderer for NotFoundRenderer {
    fn render(&self, ctx: &mut RequestContext) {
        let body = json!({
            "error": "Not Found",
            "method": ctx.request.method().as_str(),
            "path": ctx.request.path(),
        });
        ctx.response.set_status(404);
        ctx.response.send_json(&body);
        ctx.response.commit();
    }
}

/// Renderer for invocation-time failures: generic `500`, no error details
/// leak to the client.
pub struct ServerErrorRenderer;

impl Renderer for ServerErrorRenderer {
    fn render(&self, ctx: &mut RequestContext) {
        if ctx.response.is_committed() {
            return;
        }
        ctx.response.set_status(500);
        ctx.response.send_json(&json!({ "error": "Internal Server Error" }));
        ctx.response.commit();
    }
}
