// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Services: named groups of characteristics.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::host::{Characteristic, CharacteristicKind, Value};

/// Service types used by the accessories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// Manufacturer, model and version block.
    AccessoryInformation,
    /// Fan with power, speed and direction.
    Fan,
    /// Light, optionally dimmable.
    Lightbulb,
    /// Plain on/off switch.
    Switch,
    /// Shades, blinds and awnings.
    WindowCovering,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A group of characteristics, addressable by kind and optional subtype.
///
/// # Examples
///
/// ```
/// use bond_bridge::host::{CharacteristicKind, Service, ServiceKind, Value};
///
/// let light = Service::new(ServiceKind::Lightbulb, "Porch Light", Some("UpLight"));
/// light.characteristic(CharacteristicKind::On).update_value(true);
///
/// assert_eq!(light.subtype(), Some("UpLight"));
/// assert_eq!(
///     light.get_characteristic(CharacteristicKind::On).unwrap().value(),
///     Value::Bool(true),
/// );
/// ```
pub struct Service {
    kind: ServiceKind,
    name: String,
    subtype: Option<String>,
    characteristics: RwLock<Vec<Arc<Characteristic>>>,
}

impl Service {
    /// Creates a service with a `Name` characteristic.
    #[must_use]
    pub fn new(kind: ServiceKind, name: impl Into<String>, subtype: Option<&str>) -> Arc<Self> {
        let name = name.into();
        let service = Self {
            kind,
            name: name.clone(),
            subtype: subtype.map(ToString::to_string),
            characteristics: RwLock::new(Vec::new()),
        };
        service.characteristic(CharacteristicKind::Name).update_value(name);
        Arc::new(service)
    }

    /// Returns the service type.
    #[must_use]
    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the sub-identifier distinguishing services of the same kind.
    #[must_use]
    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    /// Returns the characteristic of `kind`, creating it if missing.
    pub fn characteristic(&self, kind: CharacteristicKind) -> Arc<Characteristic> {
        if let Some(existing) = self.get_characteristic(kind) {
            return existing;
        }
        let mut characteristics = self.characteristics.write();
        // Re-check under the write lock
        if let Some(existing) = characteristics.iter().find(|c| c.kind() == kind) {
            return Arc::clone(existing);
        }
        let created = Characteristic::new(kind);
        characteristics.push(Arc::clone(&created));
        created
    }

    /// Returns the characteristic of `kind` if present.
    #[must_use]
    pub fn get_characteristic(&self, kind: CharacteristicKind) -> Option<Arc<Characteristic>> {
        self.characteristics
            .read()
            .iter()
            .find(|c| c.kind() == kind)
            .cloned()
    }

    /// Returns whether the service has a characteristic of `kind`.
    #[must_use]
    pub fn has_characteristic(&self, kind: CharacteristicKind) -> bool {
        self.get_characteristic(kind).is_some()
    }

    /// Sets a characteristic value, creating the characteristic if missing.
    pub fn set_characteristic(&self, kind: CharacteristicKind, value: impl Into<Value>) {
        self.characteristic(kind).update_value(value);
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("subtype", &self.subtype)
            .field("characteristics", &self.characteristics.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_characteristic_is_seeded() {
        let fan = Service::new(ServiceKind::Fan, "Bedroom Fan", None);
        assert_eq!(
            fan.get_characteristic(CharacteristicKind::Name).unwrap().value(),
            Value::from("Bedroom Fan")
        );
    }

    #[test]
    fn characteristic_is_created_once() {
        let fan = Service::new(ServiceKind::Fan, "Fan", None);
        assert!(!fan.has_characteristic(CharacteristicKind::RotationSpeed));

        let first = fan.characteristic(CharacteristicKind::RotationSpeed);
        let second = fan.characteristic(CharacteristicKind::RotationSpeed);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn set_characteristic() {
        let info = Service::new(ServiceKind::AccessoryInformation, "Fan", None);
        info.set_characteristic(CharacteristicKind::Model, "FP3");
        assert_eq!(
            info.characteristic(CharacteristicKind::Model).value(),
            Value::from("FP3")
        );
    }
}
