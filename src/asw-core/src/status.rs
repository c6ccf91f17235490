// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

/// Controller reply to a `SET` command.
///
/// Every variant keeps the raw token so the originating client sees exactly
/// what the controller said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchStatus {
    /// Any token that is not a recognised sentinel (e.g. `OK`, `+OK`).
    Accepted(String),
    /// `BUSY` / `!BUSY`: the antenna is held by another radio.
    Busy(String),
    /// `ERR` / `!ERR`: the controller refused the parameters.
    Rejected(String),
}

impl SwitchStatus {
    pub fn token(&self) -> &str {
        match self {
            SwitchStatus::Accepted(token)
            | SwitchStatus::Busy(token)
            | SwitchStatus::Rejected(token) => token,
        }
    }
}
