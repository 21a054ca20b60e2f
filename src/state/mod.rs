// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state types.
//!
//! [`BondState`] is the sparse state a Bond reports for a device, used for
//! pulled state, pushed updates and `PATCH` bodies alike.
//! [`ToggleProperty`] names the keys a read-modify-write toggle may flip.
//!
//! # Examples
//!
//! ```
//! use bond_bridge::state::{BondState, ToggleProperty};
//!
//! let mut state: BondState = serde_json::from_str(r#"{"power":1,"light":0}"#).unwrap();
//!
//! let push: BondState = serde_json::from_str(r#"{"light":1}"#).unwrap();
//! assert!(state.merge(&push));
//! assert_eq!(state.get(ToggleProperty::Light), Some(1));
//! ```

mod bond_state;
mod toggle;

pub use bond_state::BondState;
pub use toggle::ToggleProperty;
