use serde_json::Value;

/// Map a status code to its reason phrase.
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Outbound HTTP response under construction.
///
/// Pipeline steps and handlers write into the response; nothing reaches the
/// transport before the response is *committed*. A committed response is
/// final: the dispatcher's render step leaves it alone, and further writes
/// are ignored. Short-circuiting steps (auth rejections, redirects, static
/// files) commit explicitly; ordinary handler output is committed by the
/// dispatcher with an implicit `200`.
#[derive(Debug, Default, Clone)]
pub struct Response {
    status: Option<u16>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    committed: bool,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, status: u16) {
        if !self.committed {
            self.status = Some(status);
        }
    }

    /// Effective status code: explicit value, or `200` once anything was
    /// written, or `0` for an untouched response.
    pub fn status(&self) -> u16 {
        match self.status {
            Some(s) => s,
            None if !self.body.is_empty() => 200,
            None => 0,
        }
    }

    /// Add or replace a header (name comparison is case-insensitive).
    pub fn set_header(&mut self, name: &str, value: &str) {
        if self.committed {
            return;
        }
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Replace the body with raw bytes.
    pub fn write(&mut self, bytes: Vec<u8>) {
        if !self.committed {
            self.body = bytes;
        }
    }

    /// Write a plain-text body.
    pub fn send_text(&mut self, text: &str) {
        if self.header("Content-Type").is_none() {
            self.set_header("Content-Type", "text/plain");
        }
        self.write(text.as_bytes().to_vec());
    }

    /// Write a JSON body.
    pub fn send_json(&mut self, body: &Value) {
        self.set_header("Content-Type", "application/json");
        self.write(body.to_string().into_bytes());
    }

    /// Write a JSON error body with the given status and commit the response.
    pub fn send_error(&mut self, status: u16, message: &str) {
        self.set_status(status);
        self.send_json(&serde_json::json!({ "error": message }));
        self.commit();
    }

    /// Send a `302 Found` redirect and commit the response.
    pub fn send_redirect(&mut self, location: &str) {
        self.set_status(302);
        self.set_header("Location", location);
        self.commit();
    }

    pub fn commit(&mut self) {
        self.committed = true;
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Whether a handler produced any output (status or body) that the render
    /// step should flush as-is instead of falling back to the 404 renderer.
    pub fn has_output(&self) -> bool {
        self.status.is_some() || !self.body.is_empty()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}
