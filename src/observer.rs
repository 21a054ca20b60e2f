// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binding of host characteristics to remote actions.
//!
//! An [`Observer`] attaches a `set` closure (and optionally a `get` closure)
//! to a [`Characteristic`]. The closure turns a host value into an optional
//! remote call:
//!
//! - `None` means no remote call is needed and the value is accepted as is
//! - `Some(future)` is awaited; on success the value is stored, on failure
//!   the error is logged and the displayed value stays unchanged
//!
//! Writes that repeat the current value are ignored. Failures never reach
//! the host: the host's write always resolves.
//!
//! # Examples
//!
//! ```
//! use bond_bridge::host::{Characteristic, CharacteristicKind, Value};
//! use bond_bridge::observer::Observer;
//!
//! # async fn example() {
//! let on = Characteristic::new(CharacteristicKind::On);
//! Observer::new("Bedroom Fan").set(&on, |_value| None);
//!
//! on.handle_set(true).await.unwrap();
//! assert_eq!(on.value(), Value::Bool(true));
//! # }
//! ```

use std::future::Future;
use std::sync::{Arc, Weak};

use crate::error::{Error, Result};
use crate::host::{Characteristic, GetFuture, Props, SetFuture, Value};

/// Wraps a remote call as the result of a `set` closure.
pub fn remote<F>(call: F) -> Option<SetFuture>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    Some(Box::pin(call))
}

/// Fails a `set` without a remote call, e.g. for a value of the wrong kind.
pub fn rejected(error: impl Into<Error>) -> Option<SetFuture> {
    let error = error.into();
    remote(async move { Err(error) })
}

/// Binds characteristics of one accessory.
#[derive(Debug, Clone)]
pub struct Observer {
    name: String,
}

impl Observer {
    /// Creates an observer; `name` is the accessory name used in logs.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the accessory name used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers `set` as the write handler of `characteristic`.
    pub fn set<S>(&self, characteristic: &Arc<Characteristic>, set: S)
    where
        S: Fn(Value) -> Option<SetFuture> + Send + Sync + 'static,
    {
        let weak = Arc::downgrade(characteristic);
        let name = self.name.clone();
        let set = Arc::new(set);

        characteristic.on_set(Arc::new(move |value: Value| -> SetFuture {
            let weak = Weak::clone(&weak);
            let name = name.clone();
            let set = Arc::clone(&set);
            Box::pin(async move {
                let Some(characteristic) = weak.upgrade() else {
                    return Ok(());
                };
                let kind = characteristic.kind();

                if characteristic.value() == value {
                    tracing::trace!(device = %name, characteristic = %kind, value = %value, "Value unchanged, ignoring set");
                    return Ok(());
                }

                match set(value.clone()) {
                    None => characteristic.update_value(value),
                    Some(remote) => match remote.await {
                        Ok(()) => {
                            tracing::debug!(device = %name, characteristic = %kind, value = %value, "Set");
                            characteristic.update_value(value);
                        }
                        Err(e) => {
                            tracing::error!(device = %name, characteristic = %kind, value = %value, error = %e, "Set failed");
                        }
                    },
                }
                Ok(())
            })
        }));
    }

    /// Binds `characteristic` to a `get`/`set` pair.
    ///
    /// Applies `props`, seeds the displayed value with one call to `get`,
    /// then serves host reads from `get` and writes through `set`. A failing
    /// read is logged and answered with the cached value.
    pub async fn add<G, F, S>(
        &self,
        characteristic: &Arc<Characteristic>,
        get: G,
        set: S,
        props: Option<Props>,
    ) where
        G: Fn() -> F + Send + Sync + 'static,
        F: Future<Output = Result<Value>> + Send + 'static,
        S: Fn(Value) -> Option<SetFuture> + Send + Sync + 'static,
    {
        if let Some(props) = props {
            characteristic.set_props(props);
        }

        let get = Arc::new(get);
        match get().await {
            Ok(value) => characteristic.update_value(value),
            Err(e) => {
                tracing::warn!(device = %self.name, characteristic = %characteristic.kind(), error = %e, "Initial read failed");
            }
        }

        let weak = Arc::downgrade(characteristic);
        let name = self.name.clone();
        characteristic.on_get(Arc::new(move || -> GetFuture {
            let weak = Weak::clone(&weak);
            let name = name.clone();
            let get = Arc::clone(&get);
            Box::pin(async move {
                match get().await {
                    Ok(value) => {
                        if let Some(characteristic) = weak.upgrade() {
                            characteristic.update_value(value.clone());
                        }
                        Ok(value)
                    }
                    Err(e) => {
                        tracing::error!(device = %name, error = %e, "Read failed");
                        weak.upgrade().map(|c| c.value()).ok_or(e)
                    }
                }
            })
        }));

        self.set(characteristic, set);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::{DeviceError, ProtocolError};
    use crate::host::CharacteristicKind;

    fn counting(
        calls: &Arc<AtomicUsize>,
        fail: bool,
    ) -> impl Fn(Value) -> Option<SetFuture> + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move |_value| {
            calls.fetch_add(1, Ordering::SeqCst);
            remote(async move {
                if fail {
                    Err::<(), Error>(ProtocolError::AuthenticationFailed.into())
                } else {
                    Ok(())
                }
            })
        }
    }

    #[tokio::test]
    async fn successful_set_updates_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let on = Characteristic::new(CharacteristicKind::On);
        Observer::new("Fan").set(&on, counting(&calls, false));

        on.handle_set(true).await.unwrap();
        assert_eq!(on.value(), Value::Bool(true));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unchanged_value_skips_remote_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let on = Characteristic::new(CharacteristicKind::On);
        Observer::new("Fan").set(&on, counting(&calls, false));

        on.handle_set(false).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_set_resolves_and_keeps_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let speed = Characteristic::new(CharacteristicKind::RotationSpeed);
        speed.update_value(33);
        Observer::new("Fan").set(&speed, counting(&calls, true));

        assert!(speed.handle_set(66).await.is_ok());
        assert_eq!(speed.value(), Value::Int(33));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn none_accepts_value_without_call() {
        let speed = Characteristic::new(CharacteristicKind::RotationSpeed);
        speed.update_value(33);
        Observer::new("Fan").set(&speed, |_| None);

        speed.handle_set(0).await.unwrap();
        assert_eq!(speed.value(), Value::Int(0));
    }

    #[tokio::test]
    async fn add_seeds_and_serves_reads() {
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reads);
        let brightness = Characteristic::new(CharacteristicKind::Brightness);

        Observer::new("Light")
            .add(
                &brightness,
                move || {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    async move { Ok(Value::from(if n == 0 { 40 } else { 55 })) }
                },
                |_| None,
                Some(Props::new().with_min_step(5)),
            )
            .await;

        assert_eq!(brightness.value(), Value::Int(40));
        assert_eq!(brightness.props().min_step, Some(5));

        assert_eq!(brightness.handle_get().await.unwrap(), Value::Int(55));
        assert_eq!(brightness.value(), Value::Int(55));
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failing_read_returns_cached_value() {
        let on = Characteristic::new(CharacteristicKind::On);
        on.update_value(true);

        Observer::new("Light")
            .add(
                &on,
                || async {
                    Err::<Value, Error>(DeviceError::MissingStateField("light".to_string()).into())
                },
                |_| None,
                None,
            )
            .await;

        assert_eq!(on.value(), Value::Bool(true));
        assert_eq!(on.handle_get().await.unwrap(), Value::Bool(true));
    }
}
