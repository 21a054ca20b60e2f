// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for the Bond local API.

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::{ParseError, ProtocolError, Result};
use crate::protocol::{ApiRequest, Method, RetryPolicy, Transport};

/// Header carrying the Bond token.
const TOKEN_HEADER: &str = "BOND-Token";

/// Header carrying the request identifier.
const REQUEST_ID_HEADER: &str = "BOND-UUID";

// ============================================================================
// HttpConfig
// ============================================================================

/// Connection settings for one Bond.
///
/// # Examples
///
/// ```
/// use bond_bridge::protocol::{HttpConfig, RetryPolicy};
/// use std::time::Duration;
///
/// let config = HttpConfig::new("192.168.1.50", "f074b61f628018fd")
///     .with_timeout(Duration::from_secs(5))
///     .with_retry_policy(RetryPolicy::disabled());
///
/// assert_eq!(config.base_url(), "http://192.168.1.50");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    token: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration for the Bond at `host`.
    #[must_use]
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            token: token.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry policy for transient failures.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Builds the base URL.
    #[must_use]
    pub fn base_url(&self) -> String {
        let base = if self.host.starts_with("http://") || self.host.starts_with("https://") {
            self.host.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", self.host)
        };

        if self.port == Self::DEFAULT_PORT {
            base
        } else {
            format!("{base}:{}", self.port)
        }
    }

    /// Creates an `HttpTransport` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn into_transport(self) -> std::result::Result<HttpTransport, ProtocolError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(HttpTransport {
            base_url: self.base_url(),
            token: self.token,
            retry: self.retry,
            client,
        })
    }
}

// ============================================================================
// HttpTransport
// ============================================================================

/// Executes requests over HTTP with token authentication and retries.
///
/// Transient failures (timeouts, refused connections) are retried with
/// exponential backoff. HTTP 401 and other non-success statuses fail
/// immediately.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    token: String,
    retry: RetryPolicy,
    client: Client,
}

impl HttpTransport {
    /// Returns the base URL of the Bond.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send_once(&self, request: &ApiRequest) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
        };

        tracing::debug!(
            request_id = %request.request_id,
            method = %request.method,
            url = %url,
            "Sending HTTP request"
        );

        let mut builder = self
            .client
            .request(method, &url)
            .header(TOKEN_HEADER, &self.token)
            .header(REQUEST_ID_HEADER, &request.request_id);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(ProtocolError::Http)?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ProtocolError::AuthenticationFailed.into());
        }

        if !status.is_success() {
            return Err(ProtocolError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            }
            .into());
        }

        let body = response.text().await.map_err(ProtocolError::Http)?;

        tracing::debug!(request_id = %request.request_id, body = %body, "Received HTTP response");

        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&body).map_err(ParseError::Json)?)
    }
}

impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<serde_json::Value> {
        let mut attempt = 0;
        loop {
            let err = match self.send_once(&request).await {
                Ok(value) => return Ok(value),
                Err(crate::Error::Protocol(err)) if err.is_transient() => err,
                Err(err) => return Err(err),
            };

            if !self.retry.should_retry(attempt) {
                if self.retry.max_retries == 0 {
                    return Err(err.into());
                }
                return Err(ProtocolError::RetriesExhausted {
                    attempts: attempt + 1,
                    message: err.to_string(),
                }
                .into());
            }

            let delay = self.retry.delay_for_attempt(attempt);
            tracing::debug!(
                request_id = %request.request_id,
                attempt = attempt + 1,
                delay = ?delay,
                error = %err,
                "Transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
