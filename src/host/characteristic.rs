// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Characteristics: single observable values of a service.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::host::{Props, Value};

/// Future returned by a set handler.
pub type SetFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// Future returned by a get handler.
pub type GetFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// Handler invoked when the host writes a value.
pub type SetHandler = Arc<dyn Fn(Value) -> SetFuture + Send + Sync>;

/// Handler invoked when the host reads a value.
pub type GetHandler = Arc<dyn Fn() -> GetFuture + Send + Sync>;

/// Characteristic types used by the accessories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicKind {
    /// Power state.
    On,
    /// Fan rotation speed step.
    RotationSpeed,
    /// Fan direction, `0` clockwise and `1` counter-clockwise.
    RotationDirection,
    /// Light brightness or flame height.
    Brightness,
    /// Window covering current position.
    CurrentPosition,
    /// Window covering target position.
    TargetPosition,
    /// Window covering motion, `2` when stopped.
    PositionState,
    /// Service name.
    Name,
    /// Accessory manufacturer.
    Manufacturer,
    /// Accessory model.
    Model,
    /// Accessory serial number.
    SerialNumber,
    /// Firmware version.
    FirmwareRevision,
    /// Hardware version.
    HardwareRevision,
}

impl CharacteristicKind {
    /// Returns the value a new characteristic starts with.
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            Self::On => Value::Bool(false),
            Self::RotationSpeed
            | Self::RotationDirection
            | Self::Brightness
            | Self::CurrentPosition
            | Self::TargetPosition => Value::Int(0),
            Self::PositionState => Value::Int(2),
            Self::Name
            | Self::Manufacturer
            | Self::Model
            | Self::SerialNumber
            | Self::FirmwareRevision
            | Self::HardwareRevision => Value::Text(String::new()),
        }
    }

    /// Returns the constraints a new characteristic starts with.
    #[must_use]
    pub fn default_props(&self) -> Props {
        match self {
            Self::RotationSpeed | Self::Brightness | Self::CurrentPosition | Self::TargetPosition => {
                Props::new().with_min_value(0).with_max_value(100).with_min_step(1)
            }
            Self::RotationDirection => Props::new().with_min_value(0).with_max_value(1),
            _ => Props::new(),
        }
    }
}

impl fmt::Display for CharacteristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

struct Inner {
    value: Value,
    props: Props,
    on_set: Option<SetHandler>,
    on_get: Option<GetHandler>,
}

/// A single value of a service, observable by the host.
///
/// The host reads with [`handle_get`](Self::handle_get) and writes with
/// [`handle_set`](Self::handle_set). The library pushes values with
/// [`update_value`](Self::update_value), which never calls the handlers.
///
/// # Examples
///
/// ```
/// use bond_bridge::host::{Characteristic, CharacteristicKind, Value};
///
/// let on = Characteristic::new(CharacteristicKind::On);
/// assert_eq!(on.value(), Value::Bool(false));
///
/// on.update_value(true);
/// assert_eq!(on.value(), Value::Bool(true));
/// ```
pub struct Characteristic {
    kind: CharacteristicKind,
    inner: RwLock<Inner>,
}

impl Characteristic {
    /// Creates a characteristic with the kind's default value.
    #[must_use]
    pub fn new(kind: CharacteristicKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            inner: RwLock::new(Inner {
                value: kind.default_value(),
                props: kind.default_props(),
                on_set: None,
                on_get: None,
            }),
        })
    }

    /// Returns the characteristic type.
    #[must_use]
    pub fn kind(&self) -> CharacteristicKind {
        self.kind
    }

    /// Returns the cached value.
    #[must_use]
    pub fn value(&self) -> Value {
        self.inner.read().value.clone()
    }

    /// Replaces the cached value without invoking handlers.
    pub fn update_value(&self, value: impl Into<Value>) {
        self.inner.write().value = value.into();
    }

    /// Returns the constraints.
    #[must_use]
    pub fn props(&self) -> Props {
        self.inner.read().props
    }

    /// Overlays new constraints on the current ones.
    pub fn set_props(&self, props: Props) {
        let mut inner = self.inner.write();
        inner.props = inner.props.merged(props);
    }

    /// Registers the write handler, replacing any previous one.
    pub fn on_set(&self, handler: SetHandler) {
        self.inner.write().on_set = Some(handler);
    }

    /// Registers the read handler, replacing any previous one.
    pub fn on_get(&self, handler: GetHandler) {
        self.inner.write().on_get = Some(handler);
    }

    /// Returns whether a write handler is registered.
    #[must_use]
    pub fn has_set_handler(&self) -> bool {
        self.inner.read().on_set.is_some()
    }

    /// Host entry point for writes.
    ///
    /// Without a handler the value is stored directly.
    ///
    /// # Errors
    ///
    /// Returns the handler's error.
    pub async fn handle_set(&self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let handler = self.inner.read().on_set.clone();
        match handler {
            Some(handler) => handler(value).await,
            None => {
                self.update_value(value);
                Ok(())
            }
        }
    }

    /// Host entry point for reads.
    ///
    /// Without a handler the cached value is returned.
    ///
    /// # Errors
    ///
    /// Returns the handler's error.
    pub async fn handle_get(&self) -> Result<Value> {
        let handler = self.inner.read().on_get.clone();
        match handler {
            Some(handler) => handler().await,
            None => Ok(self.value()),
        }
    }
}

impl fmt::Debug for Characteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Characteristic")
            .field("kind", &self.kind)
            .field("value", &inner.value)
            .field("props", &inner.props)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_per_kind() {
        assert_eq!(Characteristic::new(CharacteristicKind::PositionState).value(), Value::Int(2));
        assert_eq!(
            Characteristic::new(CharacteristicKind::RotationSpeed).props().max_value,
            Some(100)
        );
        assert_eq!(
            Characteristic::new(CharacteristicKind::Model).value(),
            Value::Text(String::new())
        );
    }

    #[test]
    fn set_props_overlays() {
        let speed = Characteristic::new(CharacteristicKind::RotationSpeed);
        speed.set_props(Props::new().with_max_value(99).with_min_step(33));
        let props = speed.props();
        assert_eq!(props.min_value, Some(0));
        assert_eq!(props.max_value, Some(99));
        assert_eq!(props.min_step, Some(33));
    }

    #[tokio::test]
    async fn set_without_handler_stores_value() {
        let on = Characteristic::new(CharacteristicKind::On);
        on.handle_set(true).await.unwrap();
        assert_eq!(on.value(), Value::Bool(true));
        assert_eq!(on.handle_get().await.unwrap(), Value::Bool(true));
    }

    #[tokio::test]
    async fn handlers_are_invoked() {
        let brightness = Characteristic::new(CharacteristicKind::Brightness);
        brightness.on_get(Arc::new(|| -> GetFuture { Box::pin(async { Ok(Value::Int(42)) }) }));
        brightness.on_set(Arc::new(|_: Value| -> SetFuture { Box::pin(async { Ok(()) }) }));

        assert!(brightness.has_set_handler());
        assert_eq!(brightness.handle_get().await.unwrap(), Value::Int(42));

        // The handler decides whether to store the value
        brightness.handle_set(10).await.unwrap();
        assert_eq!(brightness.value(), Value::Int(0));
    }
}
