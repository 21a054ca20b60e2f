// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brightness emulation for lights that can only dim up or down.
//!
//! Such lights accept `StartIncreasingBrightness`,
//! `StartDecreasingBrightness` and `Stop`. Reaching a target level means
//! starting in the right direction and sending `Stop` after a time
//! proportional to the distance to travel.
//!
//! ```text
//!            set_brightness(20 -> 50)
//!   Idle ─────────────────────────────────▶ Dimming { timer }
//!    ▲   StartIncreasingBrightness, timer = 30 * step
//!    │                                          │
//!    └────────── timer fires: Stop ─────────────┘
//!
//!   A new request while Dimming aborts the pending timer first.
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::device::Device;
use crate::error::Result;
use crate::protocol::{BondApi, Transport};
use crate::types::Action;

/// Default time the light takes to change brightness by one percent.
pub const DEFAULT_DIMMER_STEP: Duration = Duration::from_millis(50);

#[derive(Debug, Default)]
enum DimmerState {
    #[default]
    Idle,
    Dimming {
        timer: JoinHandle<()>,
        generation: u64,
    },
}

#[derive(Debug, Default)]
struct Inner {
    state: DimmerState,
    generation: u64,
}

/// Timed dimmer for one brightness control.
///
/// At most one stop timer is pending at any time.
pub struct TimedDimmer<T: Transport> {
    api: Arc<BondApi<T>>,
    device: Arc<Device>,
    step: Duration,
    inner: Mutex<Inner>,
}

impl<T: Transport> TimedDimmer<T> {
    /// Creates an idle dimmer.
    #[must_use]
    pub fn new(api: Arc<BondApi<T>>, device: Arc<Device>, step: Duration) -> Arc<Self> {
        Arc::new(Self {
            api,
            device,
            step,
            inner: Mutex::new(Inner::default()),
        })
    }

    /// Returns the time per percent of brightness.
    #[must_use]
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Returns whether a stop timer is pending.
    #[must_use]
    pub fn is_dimming(&self) -> bool {
        matches!(self.inner.lock().state, DimmerState::Dimming { .. })
    }

    /// Cancels the pending stop timer, if any, without sending `Stop`.
    pub fn cancel(&self) {
        let previous = std::mem::take(&mut self.inner.lock().state);
        if let DimmerState::Dimming { timer, .. } = previous {
            timer.abort();
            tracing::debug!(device = %self.device.name, "Dimmer timer cancelled");
        }
    }

    /// Moves the brightness from `from` to `to`.
    ///
    /// Cancels any pending timer, starts dimming in the needed direction and
    /// schedules `Stop` after `|to - from|` steps.
    ///
    /// # Errors
    ///
    /// Returns error if the start action fails; no timer is scheduled then.
    pub async fn set_brightness(self: &Arc<Self>, from: u8, to: u8) -> Result<()> {
        self.cancel();
        if from == to {
            return Ok(());
        }

        let action = if to > from {
            Action::StartIncreasingBrightness
        } else {
            Action::StartDecreasingBrightness
        };
        self.api.action(&self.device, action, None).await?;

        let delta = u32::from(from.abs_diff(to));
        let duration = self.step.saturating_mul(delta);

        let previous = {
            let mut inner = self.inner.lock();
            inner.generation = inner.generation.wrapping_add(1);
            let generation = inner.generation;

            let dimmer = Arc::clone(self);
            let timer = tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                dimmer.finish(generation).await;
            });
            std::mem::replace(&mut inner.state, DimmerState::Dimming { timer, generation })
        };
        // A concurrent request may have started in the meantime
        if let DimmerState::Dimming { timer, .. } = previous {
            timer.abort();
        }

        tracing::debug!(
            device = %self.device.name,
            action = %action,
            duration_ms = duration.as_millis(),
            "Dimming started"
        );
        Ok(())
    }

    async fn finish(&self, generation: u64) {
        if let Err(e) = self.api.action(&self.device, Action::Stop, None).await {
            tracing::error!(device = %self.device.name, error = %e, "Failed to stop dimming");
        }

        let mut inner = self.inner.lock();
        if matches!(inner.state, DimmerState::Dimming { generation: g, .. } if g == generation) {
            inner.state = DimmerState::Idle;
        }
    }
}

impl<T: Transport> std::fmt::Debug for TimedDimmer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedDimmer")
            .field("device", &self.device.id)
            .field("step", &self.step)
            .field("dimming", &self.is_dimming())
            .finish_non_exhaustive()
    }
}
