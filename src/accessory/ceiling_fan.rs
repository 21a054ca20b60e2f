// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ceiling fan composer.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::accessory::lightbulb::LightControl;
use crate::accessory::services::{
    ButtonService, DOWN_LIGHT, FanService, LightbulbService, SwitchService, UP_LIGHT,
};
use crate::accessory::{AccessoryOptions, BondAccessory, invoke, press, prune, toggle};
use crate::capabilities::{BrightnessControl, FanCapabilities, SpeedControl};
use crate::device::Device;
use crate::error::ValueError;
use crate::host::{Characteristic, PlatformAccessory, Props, Value};
use crate::observer::{Observer, rejected, remote};
use crate::protocol::{BondApi, Transport};
use crate::state::{BondState, ToggleProperty};
use crate::types::{Action, SpeedSteps};

const TOGGLE_LIGHT: &str = "Toggle Light State";
const TOGGLE_UP_LIGHT: &str = "Toggle Up Light State";
const TOGGLE_DOWN_LIGHT: &str = "Toggle Down Light State";

/// Ceiling fan with optional lights.
///
/// Services, depending on the device:
///
/// - Fan: power (`TurnOn`/`TurnOff`), speed (`SetSpeed`), direction
///   (`ToggleDirection`)
/// - `"<name> Increase Speed"` / `"<name> Decrease Speed"` buttons for fans
///   with relative speed control only
/// - `"<name> Light"`, or `"<name> Up Light"` and `"<name> Down Light"`
/// - Toggle-state buttons and dimmer switches when enabled in the options
/// - `"<name> Increase Brightness"` / `"<name> Decrease Brightness"`
///   switches for lights with directional dimmers
pub struct CeilingFanAccessory<T: Transport> {
    accessory: Arc<PlatformAccessory>,
    device: Arc<Device>,
    fan: FanService,
    speeds: Option<SpeedSteps>,
    lights: Vec<LightControl<T>>,
    state: Mutex<BondState>,
}

impl<T: Transport> CeilingFanAccessory<T> {
    /// Adds and binds the fan's services.
    pub async fn new(
        api: Arc<BondApi<T>>,
        accessory: Arc<PlatformAccessory>,
        device: Arc<Device>,
        caps: FanCapabilities,
        options: &AccessoryOptions,
    ) -> Self {
        let name = accessory.display_name().to_string();
        let observer = Observer::new(name.clone());

        let speeds = match &caps.speed {
            SpeedControl::Absolute(steps) => Some(steps.clone()),
            SpeedControl::Incremental | SpeedControl::None => None,
        };
        let fan = FanService::new(&accessory, speeds.is_some(), caps.direction);

        if caps.power {
            let (api, device) = (Arc::clone(&api), Arc::clone(&device));
            observer.set(&fan.on, move |value| match value.as_bool() {
                Ok(true) => invoke(&api, &device, Action::TurnOn, None),
                Ok(false) => invoke(&api, &device, Action::TurnOff, None),
                Err(e) => rejected(e),
            });
        } else {
            tracing::error!(device = %name, "Ceiling fan is missing TurnOn/TurnOff");
        }

        if let (Some(steps), Some(speed)) = (&speeds, &fan.rotation_speed) {
            Self::bind_speed(&observer, &api, &device, steps, speed);
        }

        let increase_speed = format!("{name} Increase Speed");
        let decrease_speed = format!("{name} Decrease Speed");
        match caps.speed {
            SpeedControl::Incremental => {
                ButtonService::new(&accessory, &increase_speed, Some("IncreaseSpeed"))
                    .bind(&observer, press(&api, &device, Action::IncreaseSpeed))
                    .await;
                ButtonService::new(&accessory, &decrease_speed, Some("DecreaseSpeed"))
                    .bind(&observer, press(&api, &device, Action::DecreaseSpeed))
                    .await;
            }
            SpeedControl::Absolute(_) => prune(&accessory, &[&increase_speed, &decrease_speed]),
            SpeedControl::None => {
                prune(&accessory, &[&increase_speed, &decrease_speed]);
                tracing::error!(
                    device = %name,
                    "Fan speed is not supported, missing max_speed or IncreaseSpeed/DecreaseSpeed"
                );
            }
        }

        if let Some(direction) = &fan.rotation_direction {
            let (api, device) = (Arc::clone(&api), Arc::clone(&device));
            observer.set(direction, move |_| invoke(&api, &device, Action::ToggleDirection, None));
        }

        let mut lights = Vec::new();
        let light = caps.light;
        if light.up_down {
            let sides = [
                (
                    "Up Light",
                    UP_LIGHT,
                    ToggleProperty::UpLight,
                    Action::StartUpLightDimmer,
                    TOGGLE_UP_LIGHT,
                ),
                (
                    "Down Light",
                    DOWN_LIGHT,
                    ToggleProperty::DownLight,
                    Action::StartDownLightDimmer,
                    TOGGLE_DOWN_LIGHT,
                ),
            ];
            for (label, subtype, property, dimmer_action, toggle_name) in sides {
                let service_name = format!("{name} {label}");
                let service = LightbulbService::new(&accessory, &service_name, Some(subtype), false);
                lights.push(LightControl::bind(
                    service,
                    &observer,
                    &api,
                    &device,
                    BrightnessControl::None,
                    options.dimmer_step,
                ));

                let toggle_subtype = format!("Toggle{subtype}");
                if options.include_toggle_state {
                    ButtonService::new(&accessory, toggle_name, Some(&toggle_subtype))
                        .bind(&observer, toggle(&api, &device, property))
                        .await;
                } else {
                    prune(&accessory, &[toggle_name]);
                }

                let dimmer_name = format!("{name} {label} Dimmer");
                if options.include_dimmer && light.dimmer {
                    let switch = SwitchService::new(&accessory, &dimmer_name, Some(subtype));
                    Self::bind_dimmer_switch(&observer, &api, &device, &switch, dimmer_action).await;
                } else {
                    prune(&accessory, &[&dimmer_name]);
                }
            }
        } else if light.toggle {
            let dimmable = light.brightness != BrightnessControl::None;
            let service_name = format!("{name} Light");
            let service = LightbulbService::new(&accessory, &service_name, None, dimmable);
            lights.push(LightControl::bind(
                service,
                &observer,
                &api,
                &device,
                light.brightness,
                options.dimmer_step,
            ));

            if options.include_toggle_state {
                ButtonService::new(&accessory, TOGGLE_LIGHT, Some("ToggleState"))
                    .bind(&observer, toggle(&api, &device, ToggleProperty::Light))
                    .await;
            } else {
                prune(&accessory, &[TOGGLE_LIGHT]);
            }

            let dimmer_name = format!("{name} Dimmer");
            if options.include_dimmer && light.dimmer {
                let switch = SwitchService::new(&accessory, &dimmer_name, Some("Dimmer"));
                Self::bind_dimmer_switch(&observer, &api, &device, &switch, Action::StartDimmer).await;
            } else {
                prune(&accessory, &[&dimmer_name]);
            }
        }

        let increase_name = format!("{name} Increase Brightness");
        let decrease_name = format!("{name} Decrease Brightness");
        if options.include_dimmer && light.separate_dimmers {
            let increase =
                SwitchService::new(&accessory, &increase_name, Some("IncreaseBrightness"));
            let decrease =
                SwitchService::new(&accessory, &decrease_name, Some("DecreaseBrightness"));
            let directions = [
                (&increase, &decrease, Action::StartIncreasingBrightness),
                (&decrease, &increase, Action::StartDecreasingBrightness),
            ];
            for (switch, opposite, start) in directions {
                Self::bind_brightness_switch(&observer, &api, &device, switch, opposite, start)
                    .await;
            }
        } else {
            prune(&accessory, &[&increase_name, &decrease_name]);
        }

        Self {
            accessory,
            device,
            fan,
            speeds,
            lights,
            state: Mutex::new(BondState::default()),
        }
    }

    /// Returns the fan service.
    #[must_use]
    pub fn fan(&self) -> &FanService {
        &self.fan
    }

    /// Returns the speed steps, for fans with absolute speed control.
    #[must_use]
    pub fn speeds(&self) -> Option<&SpeedSteps> {
        self.speeds.as_ref()
    }

    /// Returns the bound lights.
    #[must_use]
    pub fn lights(&self) -> &[LightControl<T>] {
        &self.lights
    }

    fn bind_speed(
        observer: &Observer,
        api: &Arc<BondApi<T>>,
        device: &Arc<Device>,
        steps: &SpeedSteps,
        speed: &Arc<Characteristic>,
    ) {
        speed.set_props(
            Props::new()
                .with_min_value(0)
                .with_max_value(i64::from(steps.max_value()))
                .with_min_step(i64::from(steps.min_step())),
        );

        let (api, device, steps) = (Arc::clone(api), Arc::clone(device), steps.clone());
        observer.set(speed, move |value| {
            let step = match value.as_int() {
                Ok(step) => step,
                Err(e) => return rejected(e),
            };
            // Step 0 is "off", handled by the power binding
            if step == 0 {
                return None;
            }
            match u32::try_from(step).ok().and_then(|s| steps.speed_for(s)) {
                Some(speed) => invoke(&api, &device, Action::SetSpeed, Some(i64::from(speed))),
                None => rejected(ValueError::OutOfRange {
                    min: 0,
                    max: i64::from(steps.max_value()),
                    actual: step,
                }),
            }
        });
    }

    async fn bind_dimmer_switch(
        observer: &Observer,
        api: &Arc<BondApi<T>>,
        device: &Arc<Device>,
        switch: &SwitchService,
        start: Action,
    ) {
        let (api, device) = (Arc::clone(api), Arc::clone(device));
        switch
            .bind(observer, move |value| match value.as_bool() {
                Ok(true) => invoke(&api, &device, start, None),
                Ok(false) => invoke(&api, &device, Action::Stop, None),
                Err(e) => rejected(e),
            })
            .await;
    }

    /// Binds one directional brightness switch. Turning it on stops the
    /// opposite direction first and shows that switch as off.
    async fn bind_brightness_switch(
        observer: &Observer,
        api: &Arc<BondApi<T>>,
        device: &Arc<Device>,
        switch: &SwitchService,
        opposite: &SwitchService,
        start: Action,
    ) {
        let (api, device) = (Arc::clone(api), Arc::clone(device));
        let opposite = Arc::downgrade(&opposite.on);
        switch
            .bind(observer, move |value| {
                let on = match value.as_bool() {
                    Ok(on) => on,
                    Err(e) => return rejected(e),
                };
                if !on {
                    return invoke(&api, &device, Action::Stop, None);
                }

                let stop_opposite = match opposite.upgrade() {
                    Some(o) if o.value() == Value::Bool(true) => {
                        o.update_value(false);
                        true
                    }
                    _ => false,
                };
                let (api, device) = (Arc::clone(&api), Arc::clone(&device));
                remote(async move {
                    if stop_opposite {
                        api.action(&device, Action::Stop, None).await?;
                    }
                    api.action(&device, start, None).await
                })
            })
            .await;
    }
}

impl<T: Transport> BondAccessory for CeilingFanAccessory<T> {
    fn accessory(&self) -> &Arc<PlatformAccessory> {
        &self.accessory
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn update_state(&self, update: &BondState) {
        let state = {
            let mut cached = self.state.lock();
            cached.merge(update);
            cached.clone()
        };

        if let Some(power) = update.power {
            self.fan.on.update_value(power == 1);
        }

        // The step depends on both power and speed
        if let (Some(steps), Some(speed)) = (&self.speeds, &self.fan.rotation_speed)
            && (update.power.is_some() || update.speed.is_some())
        {
            speed.update_value(steps.step_for(state.power, state.speed));
        }

        // Bond reports 1 / -1, the host expects 1 / 0
        if let (Some(direction), Some(value)) = (&self.fan.rotation_direction, update.direction) {
            direction.update_value(i64::from(value == 1));
        }

        for light in &self.lights {
            light.update_state(update);
        }
    }
}
