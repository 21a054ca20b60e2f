// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light bindings shared by the light and ceiling fan accessories.

use std::sync::Arc;
use std::time::Duration;

use crate::accessory::dimmer::TimedDimmer;
use crate::accessory::invoke;
use crate::accessory::services::{DOWN_LIGHT, LightbulbService, UP_LIGHT};
use crate::capabilities::BrightnessControl;
use crate::device::Device;
use crate::error::ValueError;
use crate::host::Value;
use crate::observer::{Observer, rejected, remote};
use crate::protocol::{BondApi, Transport};
use crate::state::BondState;
use crate::types::Action;

/// A light service bound to its remote actions.
pub struct LightControl<T: Transport> {
    service: LightbulbService,
    dimmer: Option<Arc<TimedDimmer<T>>>,
}

impl<T: Transport> LightControl<T> {
    /// Binds power and, when supported, brightness of `service`.
    ///
    /// Power uses the toggle action matching the service subtype; a device
    /// without that action gets no power binding and an error is logged.
    pub fn bind(
        service: LightbulbService,
        observer: &Observer,
        api: &Arc<BondApi<T>>,
        device: &Arc<Device>,
        brightness: BrightnessControl,
        dimmer_step: Duration,
    ) -> Self {
        let toggle = match service.subtype() {
            Some(UP_LIGHT) => Action::ToggleUpLight,
            Some(DOWN_LIGHT) => Action::ToggleDownLight,
            _ => Action::ToggleLight,
        };

        if device.has_action(toggle) {
            let (api, device) = (Arc::clone(api), Arc::clone(device));
            observer.set(&service.on, move |_| invoke(&api, &device, toggle, None));
        } else {
            tracing::error!(device = %observer.name(), action = %toggle, "Light is missing its toggle action");
        }

        let mut dimmer = None;
        if let Some(characteristic) = &service.brightness {
            match brightness {
                BrightnessControl::Absolute => {
                    let (api, device) = (Arc::clone(api), Arc::clone(device));
                    observer.set(characteristic, move |value| match value.as_int() {
                        Ok(0) => invoke(&api, &device, Action::TurnLightOff, None),
                        Ok(level) => invoke(&api, &device, Action::SetBrightness, Some(level)),
                        Err(e) => rejected(e),
                    });
                }
                BrightnessControl::Timed => {
                    let timed = TimedDimmer::new(Arc::clone(api), Arc::clone(device), dimmer_step);
                    let weak = Arc::downgrade(characteristic);
                    let handle = Arc::clone(&timed);
                    observer.set(characteristic, move |value| {
                        let from = weak.upgrade().map(|c| c.value());
                        let dimmer = Arc::clone(&handle);
                        remote(async move {
                            let from = percent(&from.unwrap_or(Value::Int(0)))?;
                            let to = percent(&value)?;
                            dimmer.set_brightness(from, to).await
                        })
                    });
                    dimmer = Some(timed);
                }
                BrightnessControl::None => {}
            }
        }

        Self { service, dimmer }
    }

    /// Returns the light service.
    #[must_use]
    pub fn service(&self) -> &LightbulbService {
        &self.service
    }

    /// Returns the timed dimmer, for lights without absolute brightness.
    #[must_use]
    pub fn dimmer(&self) -> Option<&Arc<TimedDimmer<T>>> {
        self.dimmer.as_ref()
    }

    /// Renders the light's fields of `state`.
    pub fn update_state(&self, state: &BondState) {
        self.service.update_state(state);
    }
}

fn percent(value: &Value) -> Result<u8, ValueError> {
    let level = value.as_int()?;
    u8::try_from(level)
        .ok()
        .filter(|l| *l <= 100)
        .ok_or(ValueError::OutOfRange {
            min: 0,
            max: 100,
            actual: level,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_bounds() {
        assert_eq!(percent(&Value::Int(55)), Ok(55));
        assert!(percent(&Value::Int(101)).is_err());
        assert!(percent(&Value::Int(-1)).is_err());
        assert!(percent(&Value::Bool(true)).is_err());
    }
}
