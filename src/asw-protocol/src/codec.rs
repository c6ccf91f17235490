// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use crate::types::{ClientEvent, ServerEvent, SwitchRequest};

/// Parse a browser text frame into a ClientEvent.
///
/// First tries the tagged `{"event": ..., "data": ...}` form. If that fails,
/// tries a bare `{"radio": ..., "antenna": ...}` object and treats it as
/// `switch-antenna`.
pub fn parse_client_event(input: &str) -> Result<ClientEvent, serde_json::Error> {
    match serde_json::from_str::<ClientEvent>(input) {
        Ok(event) => Ok(event),
        Err(_) => {
            let request = serde_json::from_str::<SwitchRequest>(input)?;
            Ok(ClientEvent::SwitchAntenna(request))
        }
    }
}

pub fn encode_server_event(event: &ServerEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}
