// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Communication with a Bond over its local HTTP API.
//!
//! The layers, bottom-up:
//!
//! - [`Transport`]: executes one [`ApiRequest`] and returns the JSON body.
//!   [`HttpTransport`] is the real implementation and owns authentication,
//!   timeouts and transient-failure retries ([`RetryPolicy`]).
//! - [`ActionQueue`]: optional FIFO spacing of write requests.
//! - [`BondApi`]: the typed remote command client. It tags every request
//!   with an id from a [`RequestIdGenerator`], builds paths with
//!   [`BondUri`], and exposes reads, actions and `toggle_state`.
//!
//! # Examples
//!
//! ```no_run
//! use bond_bridge::protocol::{BondApi, HttpConfig};
//! use bond_bridge::types::Action;
//!
//! # async fn example() -> bond_bridge::Result<()> {
//! let api = BondApi::http(HttpConfig::new("192.168.1.50", "token"))?;
//!
//! let version = api.get_version().await?;
//! println!("Bond {} runs {}", version.bondid, version.fw_ver);
//!
//! for id in api.get_device_ids().await? {
//!     let device = api.get_device(&id).await?;
//!     api.action(&device, Action::TurnOn, None).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod action_queue;
mod api;
mod http;
mod request_id;
mod retry;
mod uri;

use std::fmt;
use std::future::Future;

pub use action_queue::ActionQueue;
pub use api::BondApi;
pub use http::{HttpConfig, HttpTransport};
pub use request_id::{RequestIdGenerator, SequentialRequestIds};
pub use retry::RetryPolicy;
pub use uri::BondUri;

use crate::error::Result;

/// HTTP method of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read a resource.
    Get,
    /// Invoke an action.
    Put,
    /// Patch device state.
    Patch,
}

impl Method {
    /// Returns the method name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
        }
    }

    /// Returns whether the request changes device state.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Put | Self::Patch)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request against a Bond.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Resource path, e.g. `/v2/devices/42/state`.
    pub path: String,
    /// JSON body, if any.
    pub body: Option<serde_json::Value>,
    /// Identifier sent in the `BOND-UUID` header.
    pub request_id: String,
}

impl ApiRequest {
    /// Creates a request without a body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            request_id: request_id.into(),
        }
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Executes requests against one Bond.
///
/// Implementations handle authentication, timeouts and retries of transient
/// failures. A successful response with an empty body yields
/// `serde_json::Value::Null`.
pub trait Transport: Send + Sync + 'static {
    /// Executes the request and returns the parsed JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::AuthenticationFailed` on HTTP 401,
    /// `ProtocolError::Status` on any other non-success status,
    /// `ProtocolError::RetriesExhausted` when transient failures outlast the
    /// retry policy, and `ParseError` when the body is not JSON.
    fn execute(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<serde_json::Value>> + Send;
}
