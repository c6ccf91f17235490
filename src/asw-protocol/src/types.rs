// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Event DTOs for the WebSocket channel.

use serde::{Deserialize, Serialize};

use asw_core::{AntennaCatalog, AntennaState, SwitchError, SwitchStatus};

/// Event sent by a browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    SwitchAntenna(SwitchRequest),
}

/// Payload of `switch-antenna`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRequest {
    pub radio: u64,
    pub antenna: RawSelector,
}

/// Antenna selector as sent by a browser: a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSelector {
    Number(u64),
    Text(String),
}

impl RawSelector {
    /// Numeric value, if the selector is one.
    pub fn as_number(&self) -> Option<u64> {
        match self {
            RawSelector::Number(n) => Some(*n),
            RawSelector::Text(s) => {
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                s.parse().ok()
            }
        }
    }
}

impl From<u64> for RawSelector {
    fn from(value: u64) -> Self {
        RawSelector::Number(value)
    }
}

/// Event sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Outcome of the receiver's own `switch-antenna` request.
    Status(StatusPayload),
    /// Controller-reported antennas for all radios.
    AntennaState(AntennaState),
    /// Antenna display names, sent once on connect.
    Catalog(AntennaCatalog),
}

/// `status` payload: the raw controller token or `{"error": <kind>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusPayload {
    Reply(String),
    Failure { error: String },
}

impl StatusPayload {
    pub fn failure(err: &SwitchError) -> Self {
        StatusPayload::Failure {
            error: err.kind().to_string(),
        }
    }
}

impl From<&SwitchStatus> for StatusPayload {
    fn from(status: &SwitchStatus) -> Self {
        StatusPayload::Reply(status.token().to_string())
    }
}
