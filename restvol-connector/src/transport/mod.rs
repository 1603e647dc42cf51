//! One-request-at-a-time HTTP transport.
//!
//! Resolution and operation code build a [`RestRequest`] and hand it to a
//! [`Transport`]; the transport does no path logic of its own. Tests swap
//! in an in-memory service through the same trait.

mod http;

pub use http::HttpTransport;

use restvol_json::{JsonType, KeyPath, Lookup, ParseTree};
use std::fmt;
use tracing::debug;

use crate::error::{ConnectorError, ConnectorResult};

/// HTTP methods used by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully assembled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestRequest {
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl RestRequest {
    /// Creates a request that is not bound to any domain.
    ///
    /// `Expect` is sent empty because the service does not implement
    /// 100-continue.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: vec![("Expect".to_string(), String::new())],
            body: None,
        }
    }

    /// Addresses the request to `domain`. The service multiplexes domains by
    /// the `Host` header rather than by URL.
    #[must_use]
    pub fn for_domain(mut self, domain: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case("Host"));
        self.headers.insert(0, ("Host".to_string(), domain.to_string()));
        self
    }

    pub fn get(url: impl Into<String>, domain: &str) -> Self {
        Self::new(Method::Get, url).for_domain(domain)
    }

    pub fn put(url: impl Into<String>, domain: &str) -> Self {
        Self::new(Method::Put, url).for_domain(domain)
    }

    pub fn delete(url: impl Into<String>, domain: &str) -> Self {
        Self::new(Method::Delete, url).for_domain(domain)
    }

    /// Attaches a JSON body and its content type.
    #[must_use]
    pub fn with_json(mut self, body: &serde_json::Value) -> Self {
        self.headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        self.body = Some(body.to_string().into_bytes());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Domain path carried in the `Host` header.
    pub fn domain(&self) -> Option<&str> {
        self.header("Host")
    }
}

/// A successful response. Non-success statuses never reach callers as a
/// `RestResponse`; they are turned into [`ConnectorError::Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RestResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes exactly one request/response cycle.
///
/// Implementations must return `Ok` only for 2xx statuses and turn every
/// other outcome into [`ConnectorError::Transport`] (see [`check_status`]).
pub trait Transport: Send + Sync {
    fn execute(&self, request: &RestRequest) -> ConnectorResult<RestResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &RestRequest) -> ConnectorResult<RestResponse> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(&self, request: &RestRequest) -> ConnectorResult<RestResponse> {
        (**self).execute(request)
    }
}

/// Whether the protocol treats `status` as success.
pub fn is_success(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Fixed description of an HTTP status as reported by the service.
pub fn status_description(status: u16) -> &'static str {
    match status {
        200..=299 => "OK",
        400 => "Malformed/Bad request",
        401 => "Valid authentication needed",
        403 => "Unauthorized access",
        404 => "Resource not found",
        405 => "Method not allowed",
        409 => "Resource already exists",
        410 => "Resource has been deleted",
        413 => "Selection too large",
        500 => "An internal server error occurred",
        501 => "Functionality not implemented",
        503 => "Service unavailable",
        504 => "Gateway timeout",
        _ => "Unknown error occurred",
    }
}

/// Converts a raw status/body pair into a response or a transport error.
///
/// A JSON error body's `message` (or `error`) member becomes the error's
/// `server_message`. An unparseable body is logged and otherwise ignored.
pub fn check_status(status: u16, body: Vec<u8>) -> ConnectorResult<RestResponse> {
    if is_success(status) {
        return Ok(RestResponse { status, body });
    }

    Err(ConnectorError::Transport {
        status: Some(status),
        message: status_description(status).to_string(),
        server_message: server_error_message(&body),
    })
}

fn server_error_message(body: &[u8]) -> Option<String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    let tree = match ParseTree::parse(body) {
        Ok(tree) => tree,
        Err(e) => {
            debug!("Error response body is not JSON: {}", e);
            return None;
        }
    };
    let paths = [KeyPath::keys(&["message"]), KeyPath::keys(&["error"])];
    match tree.lookup_first(&paths, JsonType::String) {
        Ok(value) => value.as_str().map(str::to_string),
        Err(e) => {
            debug!("Error response body has no message: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_2xx_is_success() {
        for status in [200, 201, 202, 204, 299] {
            let response = check_status(status, Vec::new()).unwrap();
            assert_eq!(response.status, status);
        }
        assert!(!is_success(199));
        assert!(!is_success(300));
    }

    #[test]
    fn failure_carries_description_and_server_message() {
        let err = check_status(409, br#"{"message": "link exists"}"#.to_vec()).unwrap_err();
        match err {
            ConnectorError::Transport {
                status,
                message,
                server_message,
            } => {
                assert_eq!(status, Some(409));
                assert_eq!(message, "Resource already exists");
                assert_eq!(server_message.as_deref(), Some("link exists"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
