// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed remote command client.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::device::{Command, Device, Properties};
use crate::error::{Error, ParseError, ProtocolError, Result};
use crate::protocol::{
    ActionQueue, ApiRequest, BondUri, HttpConfig, HttpTransport, Method, RequestIdGenerator,
    SequentialRequestIds, Transport,
};
use crate::state::{BondState, ToggleProperty};
use crate::types::{Action, Version};

/// Client for one Bond's local API.
///
/// Every request gets a fresh identifier from the client's
/// [`RequestIdGenerator`]. When action spacing is configured, `PUT` and
/// `PATCH` requests pass through an [`ActionQueue`]; reads are never
/// delayed.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use bond_bridge::protocol::{BondApi, HttpConfig};
///
/// # async fn example() -> bond_bridge::Result<()> {
/// let api = BondApi::http(HttpConfig::new("192.168.1.50", "token"))?
///     .with_action_spacing(Duration::from_millis(250));
///
/// let fan = api.get_device("3c4d5e6f").await?;
/// api.toggle_state(&fan, "light").await?;
/// # Ok(())
/// # }
/// ```
pub struct BondApi<T: Transport> {
    transport: T,
    ids: Arc<dyn RequestIdGenerator>,
    queue: Option<ActionQueue>,
}

impl BondApi<HttpTransport> {
    /// Creates a client that talks HTTP to the configured Bond.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn http(config: HttpConfig) -> Result<Self> {
        Ok(Self::new(config.into_transport()?))
    }
}

impl<T: Transport> BondApi<T> {
    /// Creates a client over `transport`.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            ids: Arc::new(SequentialRequestIds::new()),
            queue: None,
        }
    }

    /// Replaces the request identifier generator.
    #[must_use]
    pub fn with_request_ids(mut self, ids: impl RequestIdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Spaces write requests at least `interval` apart.
    #[must_use]
    pub fn with_action_spacing(mut self, interval: Duration) -> Self {
        self.queue = Some(ActionQueue::new(interval));
        self
    }

    /// Returns the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ========== Reads ==========

    /// Fetches the Bond's identity block.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is malformed.
    pub async fn get_version(&self) -> Result<Version> {
        self.get(BondUri::version()).await
    }

    /// Lists the ids of all devices on the Bond.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is not an object.
    pub async fn get_device_ids(&self) -> Result<Vec<String>> {
        let json = self.request(Method::Get, BondUri::devices(), None).await?;
        object_keys(json)
    }

    /// Fetches a device with its properties and, if it has any, its
    /// commands.
    ///
    /// # Errors
    ///
    /// Returns error if any request fails or a response is malformed.
    pub async fn get_device(&self, id: &str) -> Result<Device> {
        let json = self.request(Method::Get, BondUri::device(id), None).await?;
        let Value::Object(mut map) = json else {
            return Err(ParseError::UnexpectedFormat(format!("device {id} is not an object")).into());
        };

        // Link objects, replaced by their own fetches below
        let has_commands = map.remove("commands").is_some();
        map.remove("properties");
        map.insert("id".to_string(), Value::String(id.to_string()));

        let mut device: Device = serde_json::from_value(Value::Object(map)).map_err(ParseError::Json)?;
        device.properties = self.get_properties(id).await?;
        if has_commands {
            device.commands = Some(self.get_commands(id).await?);
        }
        Ok(device)
    }

    /// Fetches several devices one after another.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered.
    pub async fn get_devices(&self, ids: &[String]) -> Result<Vec<Device>> {
        let mut devices = Vec::with_capacity(ids.len());
        for id in ids {
            devices.push(self.get_device(id).await?);
        }
        Ok(devices)
    }

    /// Fetches the current state of a device.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is malformed.
    pub async fn get_state(&self, id: &str) -> Result<BondState> {
        self.get(BondUri::state(id)).await
    }

    /// Fetches the properties of a device.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is malformed.
    pub async fn get_properties(&self, id: &str) -> Result<Properties> {
        self.get(BondUri::properties(id)).await
    }

    /// Fetches every command taught to a Bond Bridge device.
    ///
    /// # Errors
    ///
    /// Returns error if any request fails or a response is malformed.
    pub async fn get_commands(&self, id: &str) -> Result<Vec<Command>> {
        let json = self.request(Method::Get, BondUri::commands(id), None).await?;
        let mut commands = Vec::new();
        for command_id in object_keys(json)? {
            commands.push(self.get(BondUri::command(id, &command_id)).await?);
        }
        Ok(commands)
    }

    // ========== Writes ==========

    /// Invokes `action` on a device, with an argument for parameterised
    /// actions such as `SetSpeed`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn action(&self, device: &Device, action: Action, argument: Option<i64>) -> Result<()> {
        let body = match argument {
            Some(argument) => json!({ "argument": argument }),
            None => json!({}),
        };
        self.request(Method::Put, BondUri::action(&device.id, action), Some(body))
            .await?;
        Ok(())
    }

    /// Patches the Bond's belief of a device's state without sending a
    /// signal to the device.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn update_state(&self, device: &Device, state: &BondState) -> Result<()> {
        let body = serde_json::to_value(state).map_err(ParseError::Json)?;
        self.request(Method::Patch, BondUri::state(&device.id), Some(body))
            .await?;
        Ok(())
    }

    /// Flips a boolean-like state property with one read and one patch.
    ///
    /// `property` must be one of `open`, `power`, `light`, `up_light` or
    /// `down_light`.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::InvalidToggleProperty` without any request if
    /// `property` cannot be toggled, `DeviceError::MissingStateField`
    /// without patching if the device does not report it, or the request
    /// error.
    pub async fn toggle_state(&self, device: &Device, property: &str) -> Result<()> {
        let property: ToggleProperty = property.parse()?;
        let state = self.get_state(&device.id).await?;
        let patch = state.toggled(property)?;
        self.update_state(device, &patch).await
    }

    // ========== Helpers ==========

    async fn get<R: DeserializeOwned>(&self, path: String) -> Result<R> {
        let json = self.request(Method::Get, path, None).await?;
        Ok(serde_json::from_value(json).map_err(ParseError::Json)?)
    }

    async fn request(&self, method: Method, path: String, body: Option<Value>) -> Result<Value> {
        let mut request = ApiRequest::new(method, path, self.ids.next_id());
        if let Some(body) = body {
            request = request.with_body(body);
        }
        let request_id = request.request_id.clone();
        let path = request.path.clone();

        let result = match (&self.queue, method.is_write()) {
            (Some(queue), true) => queue.run(self.transport.execute(request)).await,
            _ => self.transport.execute(request).await,
        };

        match &result {
            Err(Error::Protocol(ProtocolError::AuthenticationFailed)) => {
                tracing::debug!(
                    request_id = %request_id,
                    path = %path,
                    "Unauthorized, check that the bond token is correct"
                );
            }
            Err(err) => {
                tracing::debug!(request_id = %request_id, path = %path, error = %err, "Request failed");
            }
            Ok(_) => {}
        }
        result
    }
}

/// Returns the keys of a Bond listing, skipping the `_` hash key.
fn object_keys(json: Value) -> Result<Vec<String>> {
    match json {
        Value::Object(map) => Ok(map.into_iter().map(|(k, _)| k).filter(|k| k.len() > 1).collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(ParseError::UnexpectedFormat(format!("expected an object, got {other}")).into()),
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::error::DeviceError;
    use crate::types::DeviceType;

    /// Answers from a fixed route table and records every request.
    #[derive(Default)]
    struct FakeTransport {
        routes: Vec<(Method, String, Value)>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl FakeTransport {
        fn route(mut self, method: Method, path: &str, response: Value) -> Self {
            self.routes.push((method, path.to_string(), response));
            self
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().clone()
        }
    }

    impl Transport for FakeTransport {
        async fn execute(&self, request: ApiRequest) -> Result<Value> {
            self.requests.lock().push(request.clone());
            self.routes
                .iter()
                .find(|(m, p, _)| *m == request.method && *p == request.path)
                .map(|(_, _, v)| v.clone())
                .ok_or_else(|| {
                    ProtocolError::Status {
                        status: 404,
                        reason: "Not Found".to_string(),
                    }
                    .into()
                })
        }
    }

    fn fan() -> Device {
        Device::new("42", "Fan", DeviceType::CeilingFan)
    }

    #[tokio::test]
    async fn device_ids_skip_hash_key() {
        let transport = FakeTransport::default().route(
            Method::Get,
            "/v2/devices",
            json!({"_": "7fc1e84b", "3c4d5e6f": {"_": "1"}, "aabbccdd": {"_": "2"}}),
        );
        let api = BondApi::new(transport);
        let mut ids = api.get_device_ids().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["3c4d5e6f", "aabbccdd"]);
    }

    #[tokio::test]
    async fn get_device_fetches_properties_and_commands() {
        let transport = FakeTransport::default()
            .route(
                Method::Get,
                "/v2/devices/42",
                json!({
                    "name": "Fan",
                    "type": "CF",
                    "location": "Den",
                    "actions": ["SetSpeed", "TurnOff"],
                    "properties": {"_": "p"},
                    "state": {"_": "s"},
                    "commands": {"_": "c"}
                }),
            )
            .route(Method::Get, "/v2/devices/42/properties", json!({"max_speed": 3}))
            .route(
                Method::Get,
                "/v2/devices/42/commands",
                json!({"_": "c", "a1": {"_": "1"}}),
            )
            .route(
                Method::Get,
                "/v2/devices/42/commands/a1",
                json!({"name": "Speed 2", "action": "SetSpeed", "argument": 2}),
            );
        let api = BondApi::new(transport);

        let device = api.get_device("42").await.unwrap();
        assert_eq!(device.id, "42");
        assert_eq!(device.display_name(), "Den Fan");
        assert_eq!(device.properties.max_speed, Some(3));
        let commands = device.commands.unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].argument, Some(2));
    }

    #[tokio::test]
    async fn device_without_commands_link_skips_command_fetch() {
        let transport = FakeTransport::default()
            .route(Method::Get, "/v2/devices/7", json!({"name": "Lamp", "type": "LT", "actions": []}))
            .route(Method::Get, "/v2/devices/7/properties", json!({}));
        let api = BondApi::new(transport);

        let device = api.get_device("7").await.unwrap();
        assert!(device.commands.is_none());
        assert_eq!(api.transport().requests().len(), 2);
    }

    #[tokio::test]
    async fn action_sends_argument() {
        let transport = FakeTransport::default().route(
            Method::Put,
            "/v2/devices/42/actions/SetSpeed",
            Value::Null,
        );
        let api = BondApi::new(transport);

        api.action(&fan(), Action::SetSpeed, Some(2)).await.unwrap();

        let requests = api.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, Some(json!({"argument": 2})));
    }

    #[tokio::test]
    async fn toggle_state_reads_then_patches() {
        let transport = FakeTransport::default()
            .route(Method::Get, "/v2/devices/42/state", json!({"light": 1, "power": 0}))
            .route(Method::Patch, "/v2/devices/42/state", Value::Null);
        let api = BondApi::new(transport);

        api.toggle_state(&fan(), "light").await.unwrap();

        let requests = api.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[1].method, Method::Patch);
        assert_eq!(requests[1].body, Some(json!({"light": 0})));
    }

    #[tokio::test]
    async fn toggle_state_rejects_unknown_property() {
        let api = BondApi::new(FakeTransport::default());

        let err = api.toggle_state(&fan(), "speed").await.unwrap_err();
        assert!(matches!(err, Error::Device(DeviceError::InvalidToggleProperty(_))));
        assert!(api.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn toggle_state_missing_field_does_not_patch() {
        let transport = FakeTransport::default()
            .route(Method::Get, "/v2/devices/42/state", json!({"power": 1}));
        let api = BondApi::new(transport);

        let err = api.toggle_state(&fan(), "light").await.unwrap_err();
        assert!(matches!(err, Error::Device(DeviceError::MissingStateField(_))));
        assert_eq!(api.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn every_request_gets_a_distinct_id() {
        let transport = FakeTransport::default()
            .route(Method::Get, "/v2/devices/42/state", json!({"power": 1}));
        let api = BondApi::new(transport).with_request_ids(SequentialRequestIds::with_seed("t", 5));

        api.get_state("42").await.unwrap();
        api.get_state("42").await.unwrap();

        let ids: Vec<_> = api
            .transport()
            .requests()
            .into_iter()
            .map(|r| r.request_id)
            .collect();
        assert_eq!(ids, vec!["t-0000000000000005", "t-0000000000000006"]);
    }

    #[tokio::test]
    async fn non_object_listing_is_a_parse_error() {
        let transport = FakeTransport::default().route(Method::Get, "/v2/devices", json!([1, 2]));
        let api = BondApi::new(transport);
        assert!(matches!(
            api.get_device_ids().await,
            Err(Error::Parse(ParseError::UnexpectedFormat(_)))
        ));
    }
}
