// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resource paths of the Bond local API.

use crate::types::Action;

/// Builds resource paths for the Bond v2 API.
///
/// Identifiers are percent-encoded so device ids cannot escape their
/// path segment.
///
/// # Examples
///
/// ```
/// use bond_bridge::protocol::BondUri;
/// use bond_bridge::types::Action;
///
/// assert_eq!(BondUri::state("42"), "/v2/devices/42/state");
/// assert_eq!(BondUri::action("42", Action::SetSpeed), "/v2/devices/42/actions/SetSpeed");
/// ```
pub struct BondUri;

impl BondUri {
    /// `GET /v2/sys/version`
    #[must_use]
    pub fn version() -> String {
        "/v2/sys/version".to_string()
    }

    /// `GET /v2/devices`
    #[must_use]
    pub fn devices() -> String {
        "/v2/devices".to_string()
    }

    /// `GET /v2/devices/{id}`
    #[must_use]
    pub fn device(id: &str) -> String {
        format!("/v2/devices/{}", urlencoding::encode(id))
    }

    /// `GET`/`PATCH /v2/devices/{id}/state`
    #[must_use]
    pub fn state(id: &str) -> String {
        format!("{}/state", Self::device(id))
    }

    /// `PUT /v2/devices/{id}/actions/{action}`
    #[must_use]
    pub fn action(id: &str, action: Action) -> String {
        format!("{}/actions/{}", Self::device(id), action.as_str())
    }

    /// `GET /v2/devices/{id}/properties`
    #[must_use]
    pub fn properties(id: &str) -> String {
        format!("{}/properties", Self::device(id))
    }

    /// `GET /v2/devices/{id}/commands`
    #[must_use]
    pub fn commands(id: &str) -> String {
        format!("{}/commands", Self::device(id))
    }

    /// `GET /v2/devices/{id}/commands/{command_id}`
    #[must_use]
    pub fn command(id: &str, command_id: &str) -> String {
        format!("{}/{}", Self::commands(id), urlencoding::encode(command_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_paths() {
        assert_eq!(BondUri::devices(), "/v2/devices");
        assert_eq!(BondUri::device("abc"), "/v2/devices/abc");
        assert_eq!(BondUri::properties("abc"), "/v2/devices/abc/properties");
        assert_eq!(BondUri::commands("abc"), "/v2/devices/abc/commands");
        assert_eq!(BondUri::command("abc", "1f"), "/v2/devices/abc/commands/1f");
        assert_eq!(BondUri::version(), "/v2/sys/version");
    }

    #[test]
    fn ids_are_encoded() {
        assert_eq!(BondUri::state("a/b"), "/v2/devices/a%2Fb/state");
    }

    #[test]
    fn action_suffix() {
        assert_eq!(
            BondUri::action("7", Action::StartIncreasingBrightness),
            "/v2/devices/7/actions/StartIncreasingBrightness"
        );
    }
}
