// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform event types.

use uuid::Uuid;

use crate::state::BondState;

/// Events emitted by the platform.
///
/// Registration events tell the embedding host which accessories to add to
/// or remove from its persistent cache. State events report authoritative
/// state pushed by a Bond.
///
/// # Examples
///
/// ```
/// use bond_bridge::event::PlatformEvent;
/// use uuid::Uuid;
///
/// let event = PlatformEvent::AccessoryRegistered {
///     uuid: Uuid::nil(),
///     display_name: "Bedroom Fan".to_string(),
/// };
/// assert_eq!(event.display_name(), Some("Bedroom Fan"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    /// A new accessory was created for a discovered device.
    AccessoryRegistered {
        /// Accessory UUID.
        uuid: Uuid,
        /// Accessory display name.
        display_name: String,
    },

    /// An accessory was removed (hidden device or explicit removal).
    AccessoryUnregistered {
        /// Accessory UUID.
        uuid: Uuid,
        /// Accessory display name.
        display_name: String,
    },

    /// A Bond pushed new state for a device.
    StateUpdated {
        /// Cross-Bond unique id of the device.
        unique_id: String,
        /// The pushed state.
        state: BondState,
    },
}

impl PlatformEvent {
    /// Returns the accessory display name for registration events.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Self::AccessoryRegistered { display_name, .. }
            | Self::AccessoryUnregistered { display_name, .. } => Some(display_name),
            Self::StateUpdated { .. } => None,
        }
    }

    /// Returns the accessory UUID for registration events.
    #[must_use]
    pub fn uuid(&self) -> Option<Uuid> {
        match self {
            Self::AccessoryRegistered { uuid, .. } | Self::AccessoryUnregistered { uuid, .. } => {
                Some(*uuid)
            }
            Self::StateUpdated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_events_have_no_accessory() {
        let event = PlatformEvent::StateUpdated {
            unique_id: "ZZBL142".to_string(),
            state: BondState::default(),
        };
        assert!(event.uuid().is_none());
        assert!(event.display_name().is_none());
    }

    #[test]
    fn unregistered_event_accessors() {
        let uuid = Uuid::new_v4();
        let event = PlatformEvent::AccessoryUnregistered {
            uuid,
            display_name: "Porch Light".to_string(),
        };
        assert_eq!(event.uuid(), Some(uuid));
        assert_eq!(event.display_name(), Some("Porch Light"));
    }
}
