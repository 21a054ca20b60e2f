// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device snapshots fetched from a Bond.
//!
//! A [`Device`] is an immutable description of one appliance: its type, the
//! [`Action`]s it accepts, its properties, and (for Bond Bridge sub-devices)
//! the concrete [`Command`]s it was taught. Capability inference over these
//! snapshots lives in [`capabilities`](crate::capabilities).
//!
//! # Examples
//!
//! ```
//! use bond_bridge::device::Device;
//! use bond_bridge::types::{Action, DeviceType};
//!
//! let device = Device::new("42", "Fan", DeviceType::CeilingFan)
//!     .with_location("Bedroom")
//!     .with_actions([Action::SetSpeed, Action::TurnOn, Action::TurnOff])
//!     .with_max_speed(3);
//!
//! assert_eq!(device.display_name(), "Bedroom Fan");
//! assert!(device.has_action(Action::SetSpeed));
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{Action, DeviceType};

/// Snapshot of a device as reported by its Bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Device id, unique within one Bond only.
    #[serde(default)]
    pub id: String,
    /// Device name.
    pub name: String,
    /// Device type code.
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    /// Optional subtype (e.g. `AWNING`, `ROLLER` for shades).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Room or location name.
    #[serde(default)]
    pub location: String,
    /// Actions the device declares; the authoritative capability list.
    #[serde(default)]
    pub actions: BTreeSet<Action>,
    /// Device properties.
    #[serde(default)]
    pub properties: Properties,
    /// Concrete commands, present only for Bond Bridge sub-devices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<Command>>,
    /// Cross-Bond unique id (`bondid` + device id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    /// Id of the Bond this device belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bond_id: Option<String>,
}

/// Device properties returned by `GET /v2/devices/{id}/properties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    /// Highest speed value for fans that accept `SetSpeed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<u32>,
    /// Properties this library does not interpret.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// A concrete, parameterised invocation taught to a Bond Bridge device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Command name (e.g. `Speed 2`).
    pub name: String,
    /// The action the command invokes.
    pub action: Action,
    /// Argument passed with the action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<i64>,
}

impl Command {
    /// Creates a command.
    #[must_use]
    pub fn new(name: impl Into<String>, action: Action, argument: Option<i64>) -> Self {
        Self {
            name: name.into(),
            action,
            argument,
        }
    }
}

impl Device {
    /// Creates a device snapshot with no actions or properties.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            device_type,
            subtype: None,
            location: String::new(),
            actions: BTreeSet::new(),
            properties: Properties::default(),
            commands: None,
            unique_id: None,
            bond_id: None,
        }
    }

    /// Sets the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Sets the subtype.
    #[must_use]
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    /// Adds declared actions.
    #[must_use]
    pub fn with_actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Sets the `max_speed` property.
    #[must_use]
    pub fn with_max_speed(mut self, max_speed: u32) -> Self {
        self.properties.max_speed = Some(max_speed);
        self
    }

    /// Sets the command list.
    #[must_use]
    pub fn with_commands(mut self, commands: Vec<Command>) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Records which Bond the device belongs to and derives its unique id.
    #[must_use]
    pub fn with_bond_id(mut self, bond_id: impl Into<String>) -> Self {
        let bond_id = bond_id.into();
        self.unique_id = Some(format!("{bond_id}{}", self.id));
        self.bond_id = Some(bond_id);
        self
    }

    /// Returns the name shown for the accessory: `"<location> <name>"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.location.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.location, self.name)
        }
    }

    /// Returns the cross-Bond unique id, falling back to the plain id.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        self.unique_id.as_deref().unwrap_or(&self.id)
    }

    /// Returns whether the device declares `action`.
    #[must_use]
    pub fn has_action(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }

    /// Returns whether the device declares every action in `actions`.
    #[must_use]
    pub fn has_all(&self, actions: &[Action]) -> bool {
        actions.iter().all(|a| self.actions.contains(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bond_device_json() {
        let json = r#"{
            "name": "Fan",
            "type": "CF",
            "location": "Bedroom",
            "template": "A1",
            "actions": ["TurnOn", "TurnOff", "SetSpeed", "Mystery"],
            "_": "7fc1e84b"
        }"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.device_type, DeviceType::CeilingFan);
        assert!(device.has_all(&[Action::TurnOn, Action::TurnOff]));
        assert!(device.has_action(Action::Unknown));
        assert!(device.commands.is_none());
        assert!(device.subtype.is_none());
    }

    #[test]
    fn parses_properties_with_extras() {
        let props: Properties =
            serde_json::from_str(r#"{"max_speed": 6, "trust_state": true, "_": "abc"}"#).unwrap();
        assert_eq!(props.max_speed, Some(6));
        assert_eq!(props.other.get("trust_state"), Some(&serde_json::json!(true)));
    }

    #[test]
    fn context_round_trip_keeps_identity() {
        let device = Device::new("1234", "Shade", DeviceType::Shades)
            .with_subtype("AWNING")
            .with_bond_id("ZZBL1");
        let json = serde_json::to_string(&device).unwrap();
        let restored: Device = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, device);
        assert_eq!(restored.unique_id(), "ZZBL11234");
    }

    #[test]
    fn display_name_without_location() {
        let device = Device::new("1", "Porch", DeviceType::Light);
        assert_eq!(device.display_name(), "Porch");
    }
}
