// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessories: the unit the host registers and caches.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::device::Device;
use crate::error::{ParseError, Result};
use crate::host::{Service, ServiceKind};

/// Data persisted with an accessory across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessoryContext {
    /// The device snapshot the accessory was built from.
    pub device: Device,
}

/// Serialized form of an accessory in the host's cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAccessory {
    /// Accessory UUID.
    pub uuid: Uuid,
    /// Accessory display name.
    pub display_name: String,
    /// Persisted context.
    pub context: AccessoryContext,
}

/// An accessory: a set of services plus a persisted context.
///
/// Every accessory starts with an `AccessoryInformation` service.
///
/// # Examples
///
/// ```
/// use bond_bridge::device::Device;
/// use bond_bridge::host::{PlatformAccessory, ServiceKind};
/// use bond_bridge::types::DeviceType;
///
/// let device = Device::new("42", "Fan", DeviceType::CeilingFan).with_location("Bedroom");
/// let accessory = PlatformAccessory::new(device);
///
/// assert_eq!(accessory.display_name(), "Bedroom Fan");
/// assert!(accessory.service(ServiceKind::AccessoryInformation).is_some());
/// ```
pub struct PlatformAccessory {
    uuid: Uuid,
    display_name: String,
    context: RwLock<AccessoryContext>,
    services: RwLock<Vec<Arc<Service>>>,
}

impl PlatformAccessory {
    /// Returns the stable accessory UUID for a device unique id.
    #[must_use]
    pub fn uuid_for(unique_id: &str) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, unique_id.as_bytes())
    }

    /// Creates an accessory for `device`.
    #[must_use]
    pub fn new(device: Device) -> Arc<Self> {
        let uuid = Self::uuid_for(device.unique_id());
        let display_name = device.display_name();
        Self::with_parts(uuid, display_name, AccessoryContext { device })
    }

    /// Restores an accessory from its cached form.
    #[must_use]
    pub fn from_cached(cached: CachedAccessory) -> Arc<Self> {
        Self::with_parts(cached.uuid, cached.display_name, cached.context)
    }

    /// Restores an accessory from cached JSON.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if the JSON is not a cached accessory.
    pub fn from_json(json: &str) -> Result<Arc<Self>> {
        let cached: CachedAccessory = serde_json::from_str(json).map_err(ParseError::Json)?;
        Ok(Self::from_cached(cached))
    }

    fn with_parts(uuid: Uuid, display_name: String, context: AccessoryContext) -> Arc<Self> {
        let info = Service::new(ServiceKind::AccessoryInformation, display_name.clone(), None);
        Arc::new(Self {
            uuid,
            display_name,
            context: RwLock::new(context),
            services: RwLock::new(vec![info]),
        })
    }

    /// Returns the accessory UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns a copy of the persisted device snapshot.
    #[must_use]
    pub fn device(&self) -> Device {
        self.context.read().device.clone()
    }

    /// Replaces the persisted device snapshot.
    pub fn set_device(&self, device: Device) {
        self.context.write().device = device;
    }

    /// Returns the cached form of this accessory.
    #[must_use]
    pub fn to_cached(&self) -> CachedAccessory {
        CachedAccessory {
            uuid: self.uuid,
            display_name: self.display_name.clone(),
            context: self.context.read().clone(),
        }
    }

    /// Serializes the cached form to JSON.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_cached()).map_err(ParseError::Json)?)
    }

    // ========== Services ==========

    /// Returns all services.
    #[must_use]
    pub fn services(&self) -> Vec<Arc<Service>> {
        self.services.read().clone()
    }

    /// Returns the first service of `kind`.
    #[must_use]
    pub fn service(&self, kind: ServiceKind) -> Option<Arc<Service>> {
        self.services.read().iter().find(|s| s.kind() == kind).cloned()
    }

    /// Returns the service of `kind` with the given subtype.
    #[must_use]
    pub fn service_by_subtype(&self, kind: ServiceKind, subtype: &str) -> Option<Arc<Service>> {
        self.services
            .read()
            .iter()
            .find(|s| s.kind() == kind && s.subtype() == Some(subtype))
            .cloned()
    }

    /// Returns the service with the given display name.
    #[must_use]
    pub fn service_by_name(&self, name: &str) -> Option<Arc<Service>> {
        self.services.read().iter().find(|s| s.name() == name).cloned()
    }

    /// Adds a service.
    pub fn add_service(&self, service: Arc<Service>) -> Arc<Service> {
        self.services.write().push(Arc::clone(&service));
        service
    }

    /// Returns the matching service, adding a new one if missing.
    ///
    /// Services are matched by kind and subtype when a subtype is given,
    /// otherwise by kind and name.
    pub fn get_or_add_service(
        &self,
        kind: ServiceKind,
        name: &str,
        subtype: Option<&str>,
    ) -> Arc<Service> {
        let mut services = self.services.write();
        let existing = services.iter().find(|s| {
            s.kind() == kind
                && match subtype {
                    Some(subtype) => s.subtype() == Some(subtype),
                    None => s.subtype().is_none() && s.name() == name,
                }
        });
        if let Some(existing) = existing {
            return Arc::clone(existing);
        }
        let service = Service::new(kind, name, subtype);
        services.push(Arc::clone(&service));
        service
    }

    /// Removes the service with the given display name.
    ///
    /// Returns `true` if a service was removed.
    pub fn remove_service_by_name(&self, name: &str) -> bool {
        let mut services = self.services.write();
        let before = services.len();
        services.retain(|s| s.name() != name);
        services.len() != before
    }
}

impl fmt::Debug for PlatformAccessory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformAccessory")
            .field("uuid", &self.uuid)
            .field("display_name", &self.display_name)
            .field("services", &self.services.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeviceType;

    fn accessory() -> Arc<PlatformAccessory> {
        let device = Device::new("42", "Fan", DeviceType::CeilingFan)
            .with_location("Bedroom")
            .with_bond_id("ZZBL12345");
        PlatformAccessory::new(device)
    }

    #[test]
    fn uuid_is_stable_per_unique_id() {
        let acc = accessory();
        assert_eq!(acc.uuid(), PlatformAccessory::uuid_for("ZZBL1234542"));
        assert_ne!(acc.uuid(), PlatformAccessory::uuid_for("ZZBL1234543"));
    }

    #[test]
    fn get_or_add_matches_subtype() {
        let acc = accessory();
        let up = acc.get_or_add_service(ServiceKind::Lightbulb, "Up Light", Some("UpLight"));
        let again = acc.get_or_add_service(ServiceKind::Lightbulb, "Renamed", Some("UpLight"));
        let down = acc.get_or_add_service(ServiceKind::Lightbulb, "Down Light", Some("DownLight"));

        assert!(Arc::ptr_eq(&up, &again));
        assert!(!Arc::ptr_eq(&up, &down));
        assert!(acc.service_by_subtype(ServiceKind::Lightbulb, "DownLight").is_some());
    }

    #[test]
    fn remove_service_by_name() {
        let acc = accessory();
        acc.get_or_add_service(ServiceKind::Switch, "Bedroom Fan Dimmer", None);

        assert!(acc.remove_service_by_name("Bedroom Fan Dimmer"));
        assert!(!acc.remove_service_by_name("Bedroom Fan Dimmer"));
        assert!(acc.service_by_name("Bedroom Fan Dimmer").is_none());
    }

    #[test]
    fn cache_round_trip_keeps_device() {
        let acc = accessory();
        let json = acc.to_json().unwrap();
        let restored = PlatformAccessory::from_json(&json).unwrap();

        assert_eq!(restored.uuid(), acc.uuid());
        assert_eq!(restored.display_name(), "Bedroom Fan");
        assert_eq!(restored.device(), acc.device());
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(PlatformAccessory::from_json("{\"uuid\": 1}").is_err());
    }
}
