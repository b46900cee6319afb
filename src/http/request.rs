use http::Method;
use serde_json::Value;
use std::collections::HashMap;

/// Inbound HTTP request as handed over by the transport layer.
///
/// The transport (socket handling, HTTP parsing) is an external collaborator;
/// it constructs one `Request` per inbound message and passes it to
/// [`Dispatcher::dispatch`](crate::dispatcher::Dispatcher::dispatch). Header
/// keys are stored lowercase, query parameters are split off the request
/// target eagerly.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    headers: HashMap<String, String>,
    cookies: HashMap<String, String>,
    query_params: HashMap<String, String>,
    body: Option<Value>,
}

impl Request {
    /// Build a request from a method and a request target (path plus optional
    /// query string).
    pub fn new(method: Method, target: &str) -> Self {
        let path = target.split('?').next().unwrap_or("/").to_string();
        let query_params = parse_query_params(target);
        Self {
            method,
            path,
            headers: HashMap::new(),
            cookies: HashMap::new(),
            query_params,
            body: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Set a header. Keys are lowercased; setting `Cookie` re-derives the
    /// parsed cookie map.
    pub fn set_header(&mut self, name: &str, value: &str) {
        let key = name.to_ascii_lowercase();
        self.headers.insert(key.clone(), value.to_string());
        if key == "cookie" {
            self.cookies = parse_cookies(&self.headers);
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    pub fn set_body(&mut self, body: Value) {
        self.body = Some(body);
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// Parse the `Cookie` header (lowercase key) into name/value pairs.
pub fn parse_cookies(headers: &HashMap<String, String>) -> HashMap<String, String> {
    headers
        .get("cookie")
        .map(|c| {
            c.split(';')
                .filter_map(|pair| {
                    let mut parts = pair.trim().splitn(2, '=');
                    let name = parts.next()?.trim().to_string();
                    let value = parts.next().unwrap_or("").trim().to_string();
                    Some((name, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse query string parameters from a request target.
///
/// Everything after the first `?` is split on `&`/`=`. Values are not
/// URL-decoded here; that stays a transport concern.
pub fn parse_query_params(target: &str) -> HashMap<String, String> {
    match target.find('?') {
        Some(pos) => target[pos + 1..]
            .split('&')
            .filter(|s| !s.is_empty())
            .map(|pair| {
                let mut parts = pair.splitn(2, '=');
                let name = parts.next().unwrap_or("").to_string();
                let value = parts.next().unwrap_or("").to_string();
                (name, value)
            })
            .collect(),
        None => HashMap::new(),
    }
}
