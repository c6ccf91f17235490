// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Realtime event contract between browsers and the switch server.
//!
//! Every message is one JSON object `{"event": <name>, "data": <payload>}`
//! carried in a WebSocket text frame.

pub mod codec;
pub mod types;

pub use codec::{encode_server_event, parse_client_event};
pub use types::{ClientEvent, RawSelector, ServerEvent, StatusPayload, SwitchRequest};
