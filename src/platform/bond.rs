// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One connected Bond and the accessories bound to its devices.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::accessory::BondAccessory;
use crate::device::Device;
use crate::error::Result;
use crate::event::EventBus;
use crate::platform::config::BondConfig;
use crate::protocol::{BondApi, Transport};
use crate::push::PushPacket;
use crate::types::Version;

/// A Bond whose version has been read.
pub struct Bond<T: Transport> {
    config: BondConfig,
    api: Arc<BondApi<T>>,
    version: Version,
    device_ids: RwLock<Vec<String>>,
    accessories: RwLock<Vec<Arc<dyn BondAccessory>>>,
    events: EventBus,
}

impl<T: Transport> Bond<T> {
    /// Reads the Bond's version and device ids.
    ///
    /// A failing device id read leaves the list empty; it can be retried
    /// with [`update_device_ids`](Self::update_device_ids).
    ///
    /// # Errors
    ///
    /// Returns error if the version cannot be read, e.g. the Bond is
    /// offline or the token is wrong.
    pub async fn connect(config: BondConfig, api: BondApi<T>, events: EventBus) -> Result<Self> {
        let version = api.get_version().await?;
        tracing::info!(
            bond = %version.bondid,
            host = %config.ip_address,
            firmware = %version.fw_ver,
            "Connected to Bond"
        );

        let bond = Self {
            config,
            api: Arc::new(api),
            version,
            device_ids: RwLock::new(Vec::new()),
            accessories: RwLock::new(Vec::new()),
            events,
        };
        if let Err(e) = bond.update_device_ids().await {
            tracing::error!(bond = %bond.version.bondid, error = %e, "Failed to get device ids");
        }
        Ok(bond)
    }

    /// Re-reads the device id list.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails; the previous list is kept.
    pub async fn update_device_ids(&self) -> Result<()> {
        let ids = self.api.get_device_ids().await?;
        tracing::debug!(bond = %self.version.bondid, count = ids.len(), "Device ids updated");
        *self.device_ids.write() = ids;
        Ok(())
    }

    /// Returns the Bond's configuration.
    #[must_use]
    pub fn config(&self) -> &BondConfig {
        &self.config
    }

    /// Returns the API client.
    #[must_use]
    pub fn api(&self) -> &Arc<BondApi<T>> {
        &self.api
    }

    /// Returns the Bond's version.
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Returns the Bond's id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.version.bondid
    }

    /// Returns the known device ids.
    #[must_use]
    pub fn device_ids(&self) -> Vec<String> {
        self.device_ids.read().clone()
    }

    /// Returns the cross-Bond unique id of `device_id`.
    #[must_use]
    pub fn unique_device_id(&self, device_id: &str) -> String {
        format!("{}{device_id}", self.version.bondid)
    }

    /// Returns whether `device` belongs to this Bond and still exists on it.
    #[must_use]
    pub fn has_device(&self, device: &Device) -> bool {
        device.bond_id.as_deref() == Some(self.id())
            && self.device_ids.read().iter().any(|id| *id == device.id)
    }

    /// Returns whether `device_id` is hidden by configuration.
    #[must_use]
    pub fn is_hidden(&self, device_id: &str) -> bool {
        self.config.is_hidden(device_id)
    }

    /// Adds a bound accessory so it receives pushed state.
    pub fn add_accessory(&self, accessory: Arc<dyn BondAccessory>) {
        self.accessories.write().push(accessory);
    }

    /// Removes the bound accessory with `uuid`. Returns whether one was
    /// removed.
    pub fn remove_accessory(&self, uuid: uuid::Uuid) -> bool {
        let mut accessories = self.accessories.write();
        let before = accessories.len();
        accessories.retain(|a| a.accessory().uuid() != uuid);
        accessories.len() != before
    }

    /// Returns the bound accessories.
    #[must_use]
    pub fn accessories(&self) -> Vec<Arc<dyn BondAccessory>> {
        self.accessories.read().clone()
    }

    /// Applies a pushed packet to the accessories of its device.
    ///
    /// Returns the number of accessories updated. Packets that are not
    /// state updates, or that target unknown devices, are ignored.
    pub fn received_packet(&self, packet: &PushPacket) -> usize {
        let Some(device_id) = packet.state_device_id() else {
            tracing::trace!(bond = %self.id(), topic = %packet.topic, "Ignoring non-state packet");
            return 0;
        };
        let Some(state) = packet.state_for(device_id) else {
            tracing::trace!(bond = %self.id(), topic = %packet.topic, "Ignoring packet without state");
            return 0;
        };

        let matching: Vec<_> = self
            .accessories
            .read()
            .iter()
            .filter(|a| a.device().id == device_id)
            .cloned()
            .collect();
        for accessory in &matching {
            tracing::debug!(
                device = %accessory.accessory().display_name(),
                state = ?state,
                "Applying pushed state"
            );
            accessory.update_state(&state);
        }

        if !matching.is_empty() {
            self.events.state_updated(self.unique_device_id(device_id), state);
        }
        matching.len()
    }
}

impl<T: Transport> std::fmt::Debug for Bond<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bond")
            .field("id", &self.version.bondid)
            .field("host", &self.config.ip_address)
            .field("devices", &self.device_ids.read().len())
            .field("accessories", &self.accessories.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value as Json, json};

    use super::*;
    use crate::error::ProtocolError;
    use crate::event::PlatformEvent;
    use crate::host::PlatformAccessory;
    use crate::protocol::ApiRequest;
    use crate::state::BondState;
    use crate::types::DeviceType;

    struct FakeBond {
        online: bool,
    }

    impl Transport for FakeBond {
        async fn execute(&self, request: ApiRequest) -> Result<Json> {
            if !self.online {
                return Err(ProtocolError::AuthenticationFailed.into());
            }
            Ok(match request.path.as_str() {
                "/v2/sys/version" => json!({"bondid": "ZZBL1", "fw_ver": "v2.10.8"}),
                "/v2/devices" => json!({"_": "7fc1e84b", "42": {"_": "1"}, "43": {"_": "2"}}),
                _ => Json::Null,
            })
        }
    }

    struct Recorded {
        accessory: Arc<PlatformAccessory>,
        device: Device,
        states: parking_lot::Mutex<Vec<BondState>>,
    }

    impl BondAccessory for Recorded {
        fn accessory(&self) -> &Arc<PlatformAccessory> {
            &self.accessory
        }

        fn device(&self) -> &Device {
            &self.device
        }

        fn update_state(&self, state: &BondState) {
            self.states.lock().push(state.clone());
        }
    }

    async fn bond() -> Bond<FakeBond> {
        Bond::connect(
            BondConfig::new("10.0.0.2", "abc").with_hidden_device("43"),
            BondApi::new(FakeBond { online: true }),
            EventBus::new(),
        )
        .await
        .unwrap()
    }

    fn recorded(id: &str) -> Arc<Recorded> {
        let device = Device::new(id, "Fan", DeviceType::CeilingFan).with_bond_id("ZZBL1");
        Arc::new(Recorded {
            accessory: PlatformAccessory::new(device.clone()),
            device,
            states: parking_lot::Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn connect_reads_version_and_ids() {
        let bond = bond().await;
        assert_eq!(bond.id(), "ZZBL1");
        assert_eq!(bond.device_ids(), vec!["42", "43"]);
        assert_eq!(bond.unique_device_id("42"), "ZZBL142");
        assert!(bond.is_hidden("43"));
    }

    #[tokio::test]
    async fn connect_fails_when_version_fails() {
        let result = Bond::connect(
            BondConfig::new("10.0.0.2", "wrong"),
            BondApi::new(FakeBond { online: false }),
            EventBus::new(),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn has_device_checks_bond_and_id() {
        let bond = bond().await;
        let device = Device::new("42", "Fan", DeviceType::CeilingFan);
        assert!(!bond.has_device(&device));
        assert!(bond.has_device(&device.clone().with_bond_id("ZZBL1")));
        assert!(!bond.has_device(&device.with_bond_id("OTHER")));
        let gone = Device::new("99", "Fan", DeviceType::CeilingFan).with_bond_id("ZZBL1");
        assert!(!bond.has_device(&gone));
    }

    #[tokio::test]
    async fn packet_reaches_only_matching_accessories() {
        let bond = bond().await;
        let mut events = bond.events.subscribe();
        let fan = recorded("42");
        let other = recorded("43");
        bond.add_accessory(fan.clone());
        bond.add_accessory(other.clone());

        let packet =
            PushPacket::decode(br#"{"t":"devices/42/state","b":{"power":1,"speed":2}}"#).unwrap();
        assert_eq!(bond.received_packet(&packet), 1);

        let states = fan.states.lock().clone();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].power, Some(1));
        assert_eq!(states[0].speed, Some(2));
        assert!(other.states.lock().is_empty());

        let event = events.try_recv().unwrap();
        assert!(matches!(
            event,
            PlatformEvent::StateUpdated { ref unique_id, .. } if unique_id == "ZZBL142"
        ));
    }

    #[tokio::test]
    async fn non_state_packets_are_ignored() {
        let bond = bond().await;
        let fan = recorded("42");
        bond.add_accessory(fan.clone());

        let packet = PushPacket::decode(br#"{"t":"devices/42/properties","b":{}}"#).unwrap();
        assert_eq!(bond.received_packet(&packet), 0);
        assert!(fan.states.lock().is_empty());
    }

    #[tokio::test]
    async fn remove_accessory_by_uuid() {
        let bond = bond().await;
        let fan = recorded("42");
        bond.add_accessory(fan.clone());

        assert!(bond.remove_accessory(fan.accessory.uuid()));
        assert!(!bond.remove_accessory(fan.accessory.uuid()));
        assert!(bond.accessories().is_empty());
    }
}
