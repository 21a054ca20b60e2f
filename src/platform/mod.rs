// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform orchestration across several Bonds.
//!
//! The [`Platform`] owns the configured [`Bond`]s and every host accessory.
//! Its lifecycle mirrors a dynamic accessory host:
//!
//! 1. Accessories persisted by the host are handed back with
//!    [`Platform::configure_accessory`], possibly before any Bond is ready.
//! 2. [`Platform::start`] connects to every Bond, then adds accessories for
//!    devices seen for the first time.
//! 3. [`Platform::listen`] subscribes to each Bond's push channel so state
//!    changes made by remotes reach the accessories.
//!
//! Registrations and removals are published on the [`EventBus`] as
//! [`PlatformEvent`]s.
//!
//! # Examples
//!
//! ```no_run
//! use bond_bridge::platform::{Platform, PlatformConfig};
//!
//! # async fn example() -> bond_bridge::Result<()> {
//! let config = PlatformConfig::from_json(r#"{
//!     "bonds": [{ "ip_address": "192.168.1.50", "token": "f0e1d2c3" }]
//! }"#)?;
//!
//! let platform = Platform::http(config);
//! let mut events = platform.subscribe();
//!
//! platform.start().await?;
//! platform.listen().await;
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod bond;
mod config;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

pub use bond::Bond;
pub use config::{BondConfig, DEFAULT_TIMEOUT_MS, PlatformConfig};

use crate::accessory::{self, AccessoryOptions};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::event::{EventBus, PlatformEvent};
use crate::host::PlatformAccessory;
use crate::protocol::{BondApi, HttpTransport, Transport};
use crate::push::{PacketHandler, PushConfig, PushListener, PushPacket};
use crate::types::DeviceType;

/// Interval at which restored accessories wait for the Bonds.
pub const CONFIGURE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Builds the API client of one Bond.
pub type Connector<T> = Box<dyn Fn(&BondConfig) -> Result<BondApi<T>> + Send + Sync>;

/// Orchestrates Bonds, devices and host accessories.
pub struct Platform<T: Transport> {
    config: PlatformConfig,
    options: AccessoryOptions,
    connector: Connector<T>,
    /// `None` until [`start`](Self::start) has connected the Bonds.
    bonds: RwLock<Option<Vec<Arc<Bond<T>>>>>,
    accessories: RwLock<Vec<Arc<PlatformAccessory>>>,
    listeners: Mutex<Vec<PushListener>>,
    events: EventBus,
}

impl Platform<HttpTransport> {
    /// Creates a platform talking HTTP to its Bonds.
    #[must_use]
    pub fn http(config: PlatformConfig) -> Arc<Self> {
        let timeout = config.timeout();
        Self::new(
            config,
            Box::new(move |bond: &BondConfig| {
                let api = BondApi::http(bond.http_config(timeout))?;
                Ok(match bond.action_spacing() {
                    Some(spacing) => api.with_action_spacing(spacing),
                    None => api,
                })
            }),
        )
    }
}

impl<T: Transport> Platform<T> {
    /// Creates a platform using `connector` to build each Bond's client.
    #[must_use]
    pub fn new(config: PlatformConfig, connector: Connector<T>) -> Arc<Self> {
        let options = config.accessory_options();
        Arc::new(Self {
            config,
            options,
            connector,
            bonds: RwLock::new(None),
            accessories: RwLock::new(Vec::new()),
            listeners: Mutex::new(Vec::new()),
            events: EventBus::new(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    /// Returns the event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribes to platform events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.events.subscribe()
    }

    /// Returns whether the Bonds have been connected.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.bonds.read().is_some()
    }

    /// Returns the connected Bonds.
    #[must_use]
    pub fn bonds(&self) -> Vec<Arc<Bond<T>>> {
        self.bonds.read().clone().unwrap_or_default()
    }

    /// Returns every known host accessory.
    #[must_use]
    pub fn accessories(&self) -> Vec<Arc<PlatformAccessory>> {
        self.accessories.read().clone()
    }

    /// Returns the accessory with `uuid`.
    #[must_use]
    pub fn accessory(&self, uuid: uuid::Uuid) -> Option<Arc<PlatformAccessory>> {
        self.accessories.read().iter().find(|a| a.uuid() == uuid).cloned()
    }

    /// Finds the Bond a device belongs to.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotInitialized` before [`start`](Self::start) and
    /// `Error::BondNotFound` if no Bond knows the device, e.g. it was
    /// removed from its Bond.
    pub fn bond_for_device(&self, device: &Device) -> Result<Arc<Bond<T>>> {
        let bonds = self.bonds.read();
        let bonds = bonds.as_ref().ok_or(Error::NotInitialized)?;
        bonds
            .iter()
            .find(|b| b.has_device(device))
            .cloned()
            .ok_or_else(|| Error::BondNotFound(device.id.clone()))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Connects to every configured Bond and adds accessories for new
    /// devices.
    ///
    /// Bonds that cannot be reached are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::InvalidConfiguration` if the configuration is
    /// invalid; nothing is connected then.
    pub async fn start(&self) -> Result<()> {
        self.config.validate()?;

        let mut bonds = Vec::new();
        for bond_config in &self.config.bonds {
            let api = match (self.connector)(bond_config) {
                Ok(api) => api,
                Err(e) => {
                    tracing::warn!(host = %bond_config.ip_address, error = %e, "Invalid Bond settings, skipping");
                    continue;
                }
            };
            match Bond::connect(bond_config.clone(), api, self.events.clone()).await {
                Ok(bond) => bonds.push(Arc::new(bond)),
                Err(e) => {
                    tracing::warn!(host = %bond_config.ip_address, error = %e, "Bond is unreachable, skipping");
                }
            }
        }

        if bonds.is_empty() {
            tracing::warn!("No valid Bonds available");
        }
        for bond in &bonds {
            self.backfill_unique_ids(bond);
        }
        *self.bonds.write() = Some(bonds.clone());
        tracing::info!(
            bonds = bonds.len(),
            cached = self.accessories.read().len(),
            "Bonds initialised"
        );

        for bond in &bonds {
            self.discover(bond).await;
        }
        Ok(())
    }

    /// Subscribes to the push channel of every connected Bond.
    ///
    /// Listeners run until the platform is dropped. Bonds whose listener
    /// cannot start are logged and skipped.
    pub async fn listen(&self) {
        for bond in self.bonds() {
            let config = PushConfig::new(&bond.config().ip_address);
            let target = Arc::clone(&bond);
            let handler: PacketHandler = Arc::new(move |packet: PushPacket| {
                target.received_packet(&packet);
            });
            match PushListener::start(config, handler).await {
                Ok(listener) => self.listeners.lock().push(listener),
                Err(e) => {
                    tracing::error!(bond = %bond.id(), error = %e, "Failed to start push listener");
                }
            }
        }
    }

    /// Restores an accessory persisted by the host.
    ///
    /// Binds it right away when the Bonds are connected; otherwise a task
    /// polls every [`CONFIGURE_POLL_INTERVAL`] and binds it once they are.
    pub async fn configure_accessory(self: &Arc<Self>, accessory: Arc<PlatformAccessory>) {
        self.accessories.write().push(Arc::clone(&accessory));

        if self.is_initialized() {
            self.bind_restored(accessory).await;
            return;
        }

        tracing::debug!(device = %accessory.display_name(), "Waiting for Bonds before configuring");
        let platform = Arc::clone(self);
        tokio::spawn(async move {
            let mut poll = tokio::time::interval(CONFIGURE_POLL_INTERVAL);
            loop {
                poll.tick().await;
                if platform.is_initialized() {
                    platform.bind_restored(accessory).await;
                    break;
                }
            }
        });
    }

    /// Removes an accessory from the platform and its Bond.
    pub fn remove_accessory(&self, accessory: &PlatformAccessory) {
        let uuid = accessory.uuid();
        self.accessories.write().retain(|a| a.uuid() != uuid);
        for bond in self.bonds() {
            bond.remove_accessory(uuid);
        }

        tracing::info!(device = %accessory.display_name(), "Removing accessory");
        self.events.accessory_unregistered(accessory);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Adds accessories for the Bond's devices that have none yet.
    async fn discover(&self, bond: &Arc<Bond<T>>) {
        let ids = bond.device_ids();
        tracing::info!(bond = %bond.id(), devices = ids.len(), "Getting devices");

        for id in ids {
            if bond.is_hidden(&id) {
                tracing::info!(bond = %bond.id(), device_id = %id, "Excluding hidden device");
                continue;
            }
            let unique_id = bond.unique_device_id(&id);
            let known = self
                .accessories
                .read()
                .iter()
                .any(|a| a.device().unique_id() == unique_id);
            if known {
                continue;
            }

            let device = match bond.api().get_device(&id).await {
                Ok(device) => device.with_bond_id(bond.id()),
                Err(e) => {
                    tracing::error!(bond = %bond.id(), device_id = %id, error = %e, "Error getting device");
                    continue;
                }
            };
            if device.device_type == DeviceType::Unsupported {
                tracing::info!(device = %device.name, "Device type is not supported, skipping");
                continue;
            }

            let accessory = PlatformAccessory::new(device);
            if let Err(e) = self.bind(bond, Arc::clone(&accessory)).await {
                tracing::error!(device = %accessory.display_name(), error = %e, "Failed to add accessory");
                continue;
            }

            self.accessories.write().push(Arc::clone(&accessory));
            tracing::info!(device = %accessory.display_name(), "Adding accessory");
            self.events.accessory_registered(&accessory);
        }
    }

    /// Binds a restored accessory, or drops it if its device is hidden.
    async fn bind_restored(&self, accessory: Arc<PlatformAccessory>) {
        let device = accessory.device();
        let bond = match self.bond_for_device(&device) {
            Ok(bond) => bond,
            Err(e) => {
                tracing::warn!(
                    device = %device.name,
                    error = %e,
                    "Device may have been removed from its Bond but is still cached"
                );
                return;
            }
        };

        if bond.is_hidden(&device.id) {
            self.remove_accessory(&accessory);
            return;
        }

        tracing::info!(device = %accessory.display_name(), actions = ?device.actions, "Configuring accessory");
        if let Err(e) = self.bind(&bond, Arc::clone(&accessory)).await {
            tracing::error!(device = %accessory.display_name(), error = %e, "Failed to configure accessory");
        }
    }

    /// Composes the accessory, reads the device state once and routes
    /// pushed state to it.
    async fn bind(&self, bond: &Arc<Bond<T>>, accessory: Arc<PlatformAccessory>) -> Result<()> {
        let device = accessory.device();
        accessory::set_information(&accessory, bond.version(), &device);

        let bound = accessory::create(Arc::clone(bond.api()), accessory, &self.options).await?;
        if let Err(e) = accessory::refresh(bond.api(), bound.as_ref()).await {
            tracing::warn!(device = %device.name, error = %e, "Failed to read initial state");
        }
        bond.add_accessory(bound);
        Ok(())
    }

    /// Gives cached devices persisted without a Bond id the id of `bond`.
    fn backfill_unique_ids(&self, bond: &Bond<T>) {
        let ids = bond.device_ids();
        for accessory in self.accessories.read().iter() {
            let device = accessory.device();
            if device.unique_id.is_none() && ids.contains(&device.id) {
                let device = device.with_bond_id(bond.id());
                tracing::debug!(device = %device.name, unique_id = %device.unique_id(), "Updating cached device");
                accessory.set_device(device);
            }
        }
    }
}

impl<T: Transport> std::fmt::Debug for Platform<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("bonds", &self.bonds.read())
            .field("accessories", &self.accessories.read().len())
            .finish_non_exhaustive()
    }
}
