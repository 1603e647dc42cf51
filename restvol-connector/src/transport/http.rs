//! `reqwest` blocking transport.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use super::{check_status, RestRequest, RestResponse, Transport};
use crate::config::ConnectorConfig;
use crate::error::{ConnectorError, ConnectorResult};

/// Transport backed by a blocking `reqwest` client.
///
/// Every call owns its own response buffer, so one instance can be shared
/// between threads.
pub struct HttpTransport {
    client: Client,
    username: Option<String>,
    password: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ConnectorConfig) -> ConnectorResult<Self> {
        // The blocking client defaults to a 30s timeout; only the config imposes one.
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| ConnectorError::Config(format!("http client: {e}")))?;

        Ok(Self {
            client,
            username: config.username.clone().filter(|u| !u.is_empty()),
            password: config.password.clone().filter(|p| !p.is_empty()),
        })
    }

    fn headers(request: &RestRequest) -> ConnectorResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ConnectorError::InvalidArgument(format!("invalid header name {name:?}: {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                ConnectorError::InvalidArgument(format!("invalid value for header {name}: {e}"))
            })?;
            headers.append(name, value);
        }
        Ok(headers)
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &RestRequest) -> ConnectorResult<RestResponse> {
        debug!("{} {} (domain {:?})", request.method, request.url, request.domain());

        let method = match request.method {
            super::Method::Get => reqwest::Method::GET,
            super::Method::Put => reqwest::Method::PUT,
            super::Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .headers(Self::headers(request)?);
        if let Some(username) = &self.username {
            builder = builder.basic_auth(username, self.password.as_deref());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(|e| ConnectorError::Transport {
            status: e.status().map(|s| s.as_u16()),
            message: format!("{} {} failed: {e}", request.method, request.url),
            server_message: None,
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| ConnectorError::Transport {
            status: Some(status),
            message: format!("failed to read response body: {e}"),
            server_message: None,
        })?;

        debug!("{} {} -> {}", request.method, request.url, status);
        check_status(status, body.to_vec())
    }
}
