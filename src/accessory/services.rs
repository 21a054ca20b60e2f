// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed views over the host services an accessory exposes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::host::{
    Characteristic, CharacteristicKind, PlatformAccessory, Service, ServiceKind, SetFuture, Value,
};
use crate::observer::{Observer, remote};
use crate::state::BondState;

/// Delay after which a momentary button turns itself off.
pub const BUTTON_RESET_DELAY: Duration = Duration::from_millis(500);

/// Subtype of the up light service and its controls.
pub const UP_LIGHT: &str = "UpLight";

/// Subtype of the down light service and its controls.
pub const DOWN_LIGHT: &str = "DownLight";

/// Fan service: power, optional speed and optional direction.
#[derive(Debug, Clone)]
pub struct FanService {
    /// Power.
    pub on: Arc<Characteristic>,
    /// Rotation speed step, when the fan has absolute speed control.
    pub rotation_speed: Option<Arc<Characteristic>>,
    /// Rotation direction, when the fan can reverse.
    pub rotation_direction: Option<Arc<Characteristic>>,
}

impl FanService {
    /// Gets or adds the fan service.
    #[must_use]
    pub fn new(accessory: &PlatformAccessory, speed: bool, direction: bool) -> Self {
        let service = accessory.service(ServiceKind::Fan).unwrap_or_else(|| {
            accessory.add_service(Service::new(ServiceKind::Fan, accessory.display_name(), None))
        });

        Self {
            on: service.characteristic(CharacteristicKind::On),
            rotation_speed: speed.then(|| service.characteristic(CharacteristicKind::RotationSpeed)),
            rotation_direction: direction
                .then(|| service.characteristic(CharacteristicKind::RotationDirection)),
        }
    }
}

/// Light service, optionally dimmable.
///
/// The subtype selects which state field drives the `On` characteristic:
/// [`UP_LIGHT`] reads `up_light`, [`DOWN_LIGHT`] reads `down_light`, and
/// anything else reads `light`.
#[derive(Debug, Clone)]
pub struct LightbulbService {
    /// Power.
    pub on: Arc<Characteristic>,
    /// Brightness, when the light is dimmable.
    pub brightness: Option<Arc<Characteristic>>,
    subtype: Option<String>,
}

impl LightbulbService {
    /// Gets or adds a light service.
    #[must_use]
    pub fn new(
        accessory: &PlatformAccessory,
        name: &str,
        subtype: Option<&str>,
        dimmable: bool,
    ) -> Self {
        let service = accessory.get_or_add_service(ServiceKind::Lightbulb, name, subtype);
        Self {
            on: service.characteristic(CharacteristicKind::On),
            brightness: dimmable.then(|| service.characteristic(CharacteristicKind::Brightness)),
            subtype: subtype.map(ToString::to_string),
        }
    }

    /// Returns the service subtype.
    #[must_use]
    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    /// Returns the state field for this light.
    #[must_use]
    pub fn light_state(&self, state: &BondState) -> Option<u8> {
        match self.subtype() {
            Some(UP_LIGHT) => state.up_light,
            Some(DOWN_LIGHT) => state.down_light,
            _ => state.light,
        }
    }

    /// Renders the fields of `state` this light shows.
    pub fn update_state(&self, state: &BondState) {
        if let Some(light) = self.light_state(state) {
            self.on.update_value(light == 1);
        }
        if let (Some(brightness), Some(value)) = (&self.brightness, state.brightness) {
            brightness.update_value(value);
        }
    }
}

/// A plain switch with no remote state.
#[derive(Debug, Clone)]
pub struct SwitchService {
    /// Switch position.
    pub on: Arc<Characteristic>,
}

impl SwitchService {
    /// Gets or adds a switch service.
    #[must_use]
    pub fn new(accessory: &PlatformAccessory, name: &str, subtype: Option<&str>) -> Self {
        let service = accessory.get_or_add_service(ServiceKind::Switch, name, subtype);
        Self {
            on: service.characteristic(CharacteristicKind::On),
        }
    }

    /// Binds the switch, starting in the off position.
    pub async fn bind<S>(&self, observer: &Observer, set: S)
    where
        S: Fn(Value) -> Option<SetFuture> + Send + Sync + 'static,
    {
        observer
            .add(&self.on, || async { Ok(Value::Bool(false)) }, set, None)
            .await;
    }
}

/// A switch that turns itself off [`BUTTON_RESET_DELAY`] after being
/// turned on, standing in for a momentary button.
#[derive(Debug, Clone)]
pub struct ButtonService {
    /// Button position.
    pub on: Arc<Characteristic>,
    subtype: Option<String>,
}

impl ButtonService {
    /// Gets or adds a button service.
    #[must_use]
    pub fn new(accessory: &PlatformAccessory, name: &str, subtype: Option<&str>) -> Self {
        let service = accessory.get_or_add_service(ServiceKind::Switch, name, subtype);
        Self {
            on: service.characteristic(CharacteristicKind::On),
            subtype: subtype.map(ToString::to_string),
        }
    }

    /// Returns the service subtype.
    #[must_use]
    pub fn subtype(&self) -> Option<&str> {
        self.subtype.as_deref()
    }

    /// Binds `press` to the button.
    ///
    /// Pressing runs `press` and schedules the reset. Turning the button
    /// off by hand does nothing remotely.
    pub async fn bind<P, F>(&self, observer: &Observer, press: P)
    where
        P: Fn() -> F + Send + Sync + 'static,
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let weak = Arc::downgrade(&self.on);
        let set = move |value: Value| {
            if value != Value::Bool(true) {
                return None;
            }
            let call = press();
            let weak = weak.clone();
            remote(async move {
                let result = call.await;
                tokio::spawn(async move {
                    tokio::time::sleep(BUTTON_RESET_DELAY).await;
                    if let Some(on) = weak.upgrade() {
                        on.update_value(false);
                    }
                });
                result
            })
        };
        observer
            .add(&self.on, || async { Ok(Value::Bool(false)) }, set, None)
            .await;
    }
}

/// Window covering service.
#[derive(Debug, Clone)]
pub struct WindowCoveringService {
    /// Current position, 0-100.
    pub current_position: Arc<Characteristic>,
    /// Target position, 0-100.
    pub target_position: Arc<Characteristic>,
    /// Motion state; always stopped.
    pub position_state: Arc<Characteristic>,
}

impl WindowCoveringService {
    /// Gets or adds the window covering service.
    #[must_use]
    pub fn new(accessory: &PlatformAccessory) -> Self {
        let service = accessory.service(ServiceKind::WindowCovering).unwrap_or_else(|| {
            accessory.add_service(Service::new(
                ServiceKind::WindowCovering,
                accessory.display_name(),
                None,
            ))
        });

        Self {
            current_position: service.characteristic(CharacteristicKind::CurrentPosition),
            target_position: service.characteristic(CharacteristicKind::TargetPosition),
            position_state: service.characteristic(CharacteristicKind::PositionState),
        }
    }

    /// Shows the covering at `position`, not moving.
    pub fn show_position(&self, position: u8) {
        self.current_position.update_value(position);
        self.target_position.update_value(position);
        self.position_state.update_value(2);
    }
}

/// Fireplace flame: a dimmable light when the flame height can be set,
/// otherwise a switch.
#[derive(Debug, Clone)]
pub struct FlameService {
    /// Power.
    pub on: Arc<Characteristic>,
    /// Flame height, when adjustable.
    pub brightness: Option<Arc<Characteristic>>,
}

impl FlameService {
    /// Subtype of the flame service.
    pub const SUBTYPE: &'static str = "Flame";

    /// Gets or adds the flame service.
    #[must_use]
    pub fn new(accessory: &PlatformAccessory, adjustable: bool) -> Self {
        let name = accessory.display_name().to_string();
        if adjustable {
            let light = LightbulbService::new(accessory, &name, Some(Self::SUBTYPE), true);
            Self {
                on: light.on,
                brightness: light.brightness,
            }
        } else {
            let switch = SwitchService::new(accessory, &name, Some(Self::SUBTYPE));
            Self {
                on: switch.on,
                brightness: None,
            }
        }
    }

    /// Renders power and flame height.
    pub fn update_state(&self, state: &BondState) {
        if let Some(power) = state.power {
            self.on.update_value(power == 1);
        }
        if let (Some(brightness), Some(flame)) = (&self.brightness, state.flame) {
            brightness.update_value(flame);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::device::Device;
    use crate::types::DeviceType;

    fn accessory() -> Arc<PlatformAccessory> {
        PlatformAccessory::new(Device::new("1", "Fan", DeviceType::CeilingFan).with_location("Den"))
    }

    #[test]
    fn fan_service_is_shared() {
        let acc = accessory();
        let first = FanService::new(&acc, true, false);
        let second = FanService::new(&acc, true, false);

        assert!(Arc::ptr_eq(&first.on, &second.on));
        assert!(first.rotation_direction.is_none());
    }

    #[test]
    fn up_light_reads_its_own_field() {
        let acc = accessory();
        let up = LightbulbService::new(&acc, "Den Fan Up Light", Some(UP_LIGHT), false);
        let state = BondState {
            light: Some(0),
            up_light: Some(1),
            ..BondState::default()
        };

        up.update_state(&state);
        assert_eq!(up.on.value(), Value::Bool(true));
    }

    #[test]
    fn light_ignores_absent_fields() {
        let acc = accessory();
        let light = LightbulbService::new(&acc, "Den Fan Light", None, true);
        light.on.update_value(true);

        light.update_state(&BondState {
            brightness: Some(40),
            ..BondState::default()
        });
        assert_eq!(light.on.value(), Value::Bool(true));
        assert_eq!(light.brightness.as_ref().unwrap().value(), Value::Int(40));
    }

    #[tokio::test(start_paused = true)]
    async fn button_resets_after_delay() {
        let presses = Arc::new(AtomicUsize::new(0));
        let acc = accessory();
        let button = ButtonService::new(&acc, "Toggle Light State", Some("ToggleState"));

        let counter = Arc::clone(&presses);
        button
            .bind(&Observer::new("Den Fan"), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;

        button.on.handle_set(true).await.unwrap();
        assert_eq!(button.on.value(), Value::Bool(true));
        assert_eq!(presses.load(Ordering::SeqCst), 1);

        tokio::time::sleep(BUTTON_RESET_DELAY + Duration::from_millis(1)).await;
        assert_eq!(button.on.value(), Value::Bool(false));
    }

    #[tokio::test]
    async fn button_off_does_nothing() {
        let presses = Arc::new(AtomicUsize::new(0));
        let acc = accessory();
        let button = ButtonService::new(&acc, "Preset", Some("Preset"));

        let counter = Arc::clone(&presses);
        button
            .bind(&Observer::new("Den Shade"), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;

        // Stuck on, e.g. after a restart
        button.on.update_value(true);
        button.on.handle_set(false).await.unwrap();
        assert_eq!(button.on.value(), Value::Bool(false));
        assert_eq!(presses.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn flame_without_height_is_a_switch() {
        let acc = accessory();
        let flame = FlameService::new(&acc, false);
        assert!(flame.brightness.is_none());
        assert!(
            acc.service_by_subtype(ServiceKind::Switch, FlameService::SUBTYPE)
                .is_some()
        );

        flame.update_state(&BondState {
            power: Some(1),
            ..BondState::default()
        });
        assert_eq!(flame.on.value(), Value::Bool(true));
    }

    #[test]
    fn window_covering_shows_stopped() {
        let acc = accessory();
        let covering = WindowCoveringService::new(&acc);
        covering.show_position(100);
        assert_eq!(covering.target_position.value(), Value::Int(100));
        assert_eq!(covering.position_state.value(), Value::Int(2));
    }
}
