// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bond identity and firmware information.

use serde::{Deserialize, Serialize};

/// Identity block returned by `GET /v2/sys/version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Unique Bond identifier (e.g. `ZZBL12345`).
    pub bondid: String,
    /// Firmware version.
    pub fw_ver: String,
    /// API version.
    #[serde(default)]
    pub api: Option<u32>,
    /// Hardware target.
    #[serde(default)]
    pub target: Option<String>,
    /// Manufacturer.
    #[serde(default)]
    pub make: Option<String>,
    /// Model.
    #[serde(default)]
    pub model: Option<String>,
    /// Radio MCU firmware version.
    #[serde(default)]
    pub mcu_ver: Option<String>,
}

impl Version {
    /// Returns the manufacturer shown on accessories.
    ///
    /// Falls back to `Bond (<target>)` when the Bond reports no make.
    #[must_use]
    pub fn manufacturer(&self) -> String {
        match &self.make {
            Some(make) => make.clone(),
            None => format!("Bond ({})", self.target.as_deref().unwrap_or("unknown")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_version() {
        let version: Version =
            serde_json::from_str(r#"{"bondid":"ZZBL12345","fw_ver":"v2.10.8","target":"zermatt"}"#)
                .unwrap();
        assert_eq!(version.bondid, "ZZBL12345");
        assert_eq!(version.manufacturer(), "Bond (zermatt)");
    }

    #[test]
    fn make_wins_over_target() {
        let version = Version {
            bondid: "ZZ1".to_string(),
            fw_ver: "v3".to_string(),
            api: Some(2),
            target: Some("snowbird".to_string()),
            make: Some("Olibra".to_string()),
            model: None,
            mcu_ver: None,
        };
        assert_eq!(version.manufacturer(), "Olibra");
    }
}
