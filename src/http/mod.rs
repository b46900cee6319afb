mod request;
mod response;

pub use request::{parse_cookies, parse_query_params, Request};
pub use response::{status_reason, Response};
