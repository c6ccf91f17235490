// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failures raised while validating, encoding or executing a switch command.
///
/// A busy controller is not an error: it decodes to
/// [`SwitchStatus::Busy`](crate::SwitchStatus::Busy).
#[derive(Debug, Error)]
pub enum SwitchError {
    /// Radio or antenna outside the configured domain. Raised before any I/O.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Token cannot be placed on the line without corrupting the framing.
    #[error("invalid selector {0:?}: wire tokens must be non-empty ASCII alphanumeric")]
    InvalidSelector(String),

    #[error("no response from controller within {0:?}")]
    ProtocolTimeout(Duration),

    #[error("cannot decode controller response: {0}")]
    DecodeError(String),

    #[error("controller link failure: {0}")]
    Io(#[from] io::Error),

    #[error("controller link is not connected")]
    Disconnected,
}

impl SwitchError {
    /// Stable name reported to clients in `{error: <kind>}` status payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            SwitchError::InvalidRequest(_) => "InvalidRequest",
            SwitchError::InvalidSelector(_) => "InvalidSelector",
            SwitchError::ProtocolTimeout(_) => "ProtocolTimeout",
            SwitchError::DecodeError(_) => "DecodeError",
            SwitchError::Io(_) => "LinkError",
            SwitchError::Disconnected => "Disconnected",
        }
    }

    /// True for errors raised before the serial link was touched.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SwitchError::InvalidRequest(_) | SwitchError::InvalidSelector(_)
        )
    }
}

pub type SwitchResult<T> = Result<T, SwitchError>;
