// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push packet decoding and topic matching.

use serde::Deserialize;

use crate::error::{ParseError, Result};
use crate::state::BondState;

/// Topic segment that marks a state update.
const STATE_SEGMENT: &str = "state";

/// One datagram from a Bond's push channel.
///
/// ```text
/// {"B":"ZZBL12345","t":"devices/42/state","i":"00f3","s":200,"m":0,"f":255,"b":{"power":1,"speed":2}}
/// ```
///
/// Only the topic and body matter for state reconciliation; the remaining
/// fields are kept for logging.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PushPacket {
    /// Id of the Bond that sent the packet.
    #[serde(rename = "B", default)]
    pub bond_id: Option<String>,
    /// Resource topic, e.g. `devices/42/state`.
    #[serde(rename = "t")]
    pub topic: String,
    /// Request id when the packet answers a request.
    #[serde(rename = "i", default)]
    pub request_id: Option<String>,
    /// HTTP-like status code.
    #[serde(rename = "s", default)]
    pub status: Option<u16>,
    /// Method code.
    #[serde(rename = "m", default)]
    pub method: Option<u8>,
    /// Resource body.
    #[serde(rename = "b", default)]
    pub body: Option<serde_json::Value>,
}

impl PushPacket {
    /// Decodes a datagram.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if the datagram is not a packet.
    pub fn decode(datagram: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(datagram);
        Ok(serde_json::from_str(text.trim()).map_err(ParseError::Json)?)
    }

    /// Returns the device id if this is a device state update.
    ///
    /// The topic must have a segment equal to `state` and a device id
    /// segment before it, e.g. `devices/42/state`.
    #[must_use]
    pub fn state_device_id(&self) -> Option<&str> {
        let segments: Vec<&str> = self.topic.split('/').collect();
        let state_at = segments.iter().position(|s| *s == STATE_SEGMENT)?;
        state_at
            .checked_sub(1)
            .and_then(|i| segments.get(i))
            .copied()
            .filter(|id| !id.is_empty())
    }

    /// Returns the pushed state if this packet updates `device_id`.
    ///
    /// Packets for other devices, other topics, or with a body that is not
    /// a state object return `None`.
    #[must_use]
    pub fn state_for(&self, device_id: &str) -> Option<BondState> {
        if self.state_device_id()? != device_id {
            return None;
        }
        let body = self.body.clone()?;
        serde_json::from_value(body).ok()
    }
}
