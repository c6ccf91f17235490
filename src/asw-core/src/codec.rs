// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Line codec for the switch controller.
//!
//! Requests are `SET <radio> <antenna>\n`, `GET <radio>\n` and `?\n`. The
//! controller answers each request with exactly one line. There is no
//! escaping, so every token must be plain ASCII alphanumeric.

use std::borrow::Cow;

use crate::antenna::AntennaSelector;
use crate::error::{SwitchError, SwitchResult};
use crate::radio::RadioId;
use crate::status::SwitchStatus;

const IDENTIFY: &str = "?\n";

/// A value that can be rendered as a wire token.
pub trait WireToken {
    fn wire_token(&self) -> Cow<'_, str>;
}

impl WireToken for RadioId {
    fn wire_token(&self) -> Cow<'_, str> {
        Cow::Owned(self.get().to_string())
    }
}

impl WireToken for AntennaSelector {
    fn wire_token(&self) -> Cow<'_, str> {
        Cow::Owned(self.get().to_string())
    }
}

impl WireToken for u8 {
    fn wire_token(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }
}

impl WireToken for str {
    fn wire_token(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl WireToken for String {
    fn wire_token(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

fn checked_token<T: WireToken + ?Sized>(value: &T) -> SwitchResult<Cow<'_, str>> {
    let token = value.wire_token();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(SwitchError::InvalidSelector(token.into_owned()));
    }
    Ok(token)
}

/// Encode a request to connect `antenna` to `radio`.
pub fn encode_set<R, A>(radio: &R, antenna: &A) -> SwitchResult<String>
where
    R: WireToken + ?Sized,
    A: WireToken + ?Sized,
{
    let radio = checked_token(radio)?;
    let antenna = checked_token(antenna)?;
    Ok(format!("SET {} {}\n", radio, antenna))
}

/// Encode a query for the antenna currently connected to `radio`.
pub fn encode_get<R: WireToken + ?Sized>(radio: &R) -> SwitchResult<String> {
    let radio = checked_token(radio)?;
    Ok(format!("GET {}\n", radio))
}

/// Request for the controller's identification banner.
pub fn encode_identify() -> &'static str {
    IDENTIFY
}

/// Decode the reply to a `SET` request.
///
/// Busy and error sentinels are matched with or without the `!` prefix the
/// firmware puts in front of them.
pub fn decode_status(line: &str) -> SwitchResult<SwitchStatus> {
    let token = line.trim();
    if token.is_empty() {
        return Err(SwitchError::DecodeError("empty status line".into()));
    }
    let bare = token.trim_start_matches(['!', '+']);
    let status = if bare.eq_ignore_ascii_case("BUSY") {
        SwitchStatus::Busy(token.to_string())
    } else if bare.eq_ignore_ascii_case("ERR") {
        SwitchStatus::Rejected(token.to_string())
    } else {
        SwitchStatus::Accepted(token.to_string())
    };
    Ok(status)
}

/// Decode the reply to a `GET` request into the active antenna selector.
pub fn decode_get_reply(line: &str) -> SwitchResult<AntennaSelector> {
    let token = line.trim();
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SwitchError::DecodeError(format!(
            "unexpected GET reply {:?}",
            token
        )));
    }
    token
        .parse::<u8>()
        .map(AntennaSelector::new)
        .map_err(|e| SwitchError::DecodeError(format!("GET reply {:?}: {}", token, e)))
}
