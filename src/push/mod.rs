// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local push channel (BPUP).
//!
//! A Bond pushes state changes as JSON datagrams to every client that sent
//! it a keep-alive on UDP port 30007 within the last few minutes.
//! [`PushListener`] keeps that subscription alive and hands decoded
//! [`PushPacket`]s to a handler, which reconciles them with the accessories
//! of the matching device.
//!
//! ```text
//! Bond ──UDP──▶ PushListener ──PushPacket──▶ Bond::received_packet()
//!                                                   │
//!                                state_for(device.id)
//!                                                   ▼
//!                                  accessory.update_state(&state)
//! ```

mod listener;
mod packet;

pub use listener::{PacketHandler, PushConfig, PushListener};
pub use packet::PushPacket;
