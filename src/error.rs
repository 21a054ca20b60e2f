// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the Bond Bridge library.
//!
//! Failures are grouped by where they happen: value validation, transport
//! communication with a Bond, JSON parsing, and device-level operations
//! (capability mismatches, invalid toggles, configuration).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred while talking to a Bond.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response or packet.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred during a device operation.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// No configured Bond backs the given device.
    #[error("no bond found for device {0}")]
    BondNotFound(String),

    /// The platform has not finished initialising its bonds.
    #[error("bonds are not initialised yet")]
    NotInitialized,
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: i64,
        /// Maximum allowed value.
        max: i64,
        /// The actual value that was provided.
        actual: i64,
    },

    /// The characteristic value has the wrong kind for the operation.
    #[error("expected a {expected} value")]
    WrongKind {
        /// Name of the expected value kind.
        expected: &'static str,
    },
}

/// Errors related to communication with a Bond.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The Bond rejected the token.
    #[error("unauthorized, check the bond token")]
    AuthenticationFailed,

    /// The Bond answered with a non-success status.
    #[error("HTTP {status} - {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// Transient failures persisted past the retry budget.
    #[error("giving up after {attempts} attempts: {message}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Description of the last failure.
        message: String,
    },

    /// Socket error on the push channel.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl ProtocolError {
    /// Returns `true` if the failure is transient and worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::Io(_) => true,
            _ => false,
        }
    }
}

/// Errors related to parsing Bond responses and push packets.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// Errors related to device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Device does not support the requested capability.
    #[error("device does not support {capability}")]
    UnsupportedCapability {
        /// The capability that is not supported.
        capability: String,
    },

    /// A toggle was requested for a state key that cannot be toggled.
    #[error("{0} is not a togglable state property")]
    InvalidToggleProperty(String),

    /// The fetched state does not contain the requested field.
    #[error("state does not contain {0}")]
    MissingStateField(String),

    /// The device type is not handled by any accessory.
    #[error("unsupported device type: {0}")]
    UnsupportedDeviceType(String),

    /// Configuration is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
