// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting platform events.

use tokio::sync::broadcast;

use super::PlatformEvent;
use crate::host::PlatformAccessory;
use crate::state::BondState;

/// Number of events a slow subscriber may fall behind before losing some.
const CHANNEL_CAPACITY: usize = 256;

/// Broadcasts platform events to any number of subscribers.
///
/// A subscriber that falls more than 256 events behind loses the oldest
/// ones and sees `RecvError::Lagged`. Without subscribers, events are
/// discarded.
///
/// # Examples
///
/// ```
/// use bond_bridge::event::EventBus;
/// use bond_bridge::state::BondState;
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.state_updated("ZZBL142".to_string(), BondState::default());
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Creates an event bus without subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }

    /// Reports a newly created accessory the host should cache.
    pub fn accessory_registered(&self, accessory: &PlatformAccessory) {
        self.publish(PlatformEvent::AccessoryRegistered {
            uuid: accessory.uuid(),
            display_name: accessory.display_name().to_string(),
        });
    }

    /// Reports an accessory the host should drop from its cache.
    pub fn accessory_unregistered(&self, accessory: &PlatformAccessory) {
        self.publish(PlatformEvent::AccessoryUnregistered {
            uuid: accessory.uuid(),
            display_name: accessory.display_name().to_string(),
        });
    }

    /// Reports state a Bond pushed for the device with `unique_id`.
    pub fn state_updated(&self, unique_id: String, state: BondState) {
        self.publish(PlatformEvent::StateUpdated { unique_id, state });
    }

    fn publish(&self, event: PlatformEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;
    use crate::types::DeviceType;

    fn accessory() -> std::sync::Arc<PlatformAccessory> {
        let device = Device::new("42", "Fan", DeviceType::CeilingFan)
            .with_bond_id("ZZBL1")
            .with_location("Bedroom");
        PlatformAccessory::new(device)
    }

    #[tokio::test]
    async fn registration_reaches_every_subscriber() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        let accessory = accessory();

        bus.accessory_registered(&accessory);

        for rx in [&mut rx1, &mut rx2] {
            let event = rx.recv().await.unwrap();
            assert!(matches!(event, PlatformEvent::AccessoryRegistered { .. }));
            assert_eq!(event.uuid(), Some(accessory.uuid()));
            assert_eq!(event.display_name(), Some(accessory.display_name()));
        }
    }

    #[test]
    fn unregistration_carries_accessory_identity() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let accessory = accessory();

        bus.accessory_unregistered(&accessory);

        let event = rx.try_recv().unwrap();
        assert!(matches!(event, PlatformEvent::AccessoryUnregistered { .. }));
        assert_eq!(event.uuid(), Some(accessory.uuid()));
    }

    #[test]
    fn state_update_keeps_pushed_fields() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let state = BondState {
            power: Some(1),
            ..BondState::default()
        };

        bus.state_updated("ZZBL142".to_string(), state.clone());

        assert_eq!(
            rx.try_recv().unwrap(),
            PlatformEvent::StateUpdated {
                unique_id: "ZZBL142".to_string(),
                state,
            }
        );
    }

    #[test]
    fn events_without_subscribers_are_dropped() {
        let bus = EventBus::new();
        bus.accessory_registered(&accessory());

        let mut late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }
}
