// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Dummy switch controller for development and testing.
//!
//! Holds relay state in memory and answers the line protocol the way the
//! switch firmware does. No hardware or serial port required.

use std::collections::VecDeque;

use asw_core::{LineFuture, LineIo};

const BANNER: &str = "Dummy Antenna Switch";
const OK: &str = "+OK";
const ERR: &str = "!ERR";
const BUSY: &str = "!BUSY";

pub struct DummySwitch {
    antennas: u8,
    /// Selected antenna per radio, `0` when disconnected.
    current: Vec<u8>,
    replies: VecDeque<String>,
}

impl DummySwitch {
    pub fn new(radios: u8, antennas: u8) -> Self {
        Self {
            antennas,
            current: vec![0; usize::from(radios)],
            replies: VecDeque::new(),
        }
    }

    /// Answer one command line. Unknown commands get no reply at all.
    pub fn respond(&mut self, command: &str) -> Option<String> {
        let lowered = command.trim().to_ascii_lowercase();
        let mut parts = lowered.split_whitespace();
        match parts.next()? {
            "set" => {
                let radio = parts.next().and_then(|t| t.parse::<usize>().ok());
                let antenna = parts.next().and_then(|t| t.parse::<u8>().ok());
                Some(self.select(radio, antenna).to_string())
            }
            "get" => {
                let slot = parts
                    .next()
                    .and_then(|t| t.parse::<usize>().ok())
                    .and_then(|r| r.checked_sub(1))
                    .and_then(|idx| self.current.get(idx));
                Some(match slot {
                    Some(antenna) => antenna.to_string(),
                    None => ERR.to_string(),
                })
            }
            "?" => Some(BANNER.to_string()),
            _ => None,
        }
    }

    fn select(&mut self, radio: Option<usize>, antenna: Option<u8>) -> &'static str {
        let (Some(radio), Some(antenna)) = (radio, antenna) else {
            return ERR;
        };
        let Some(idx) = radio.checked_sub(1).filter(|idx| *idx < self.current.len()) else {
            return ERR;
        };
        if antenna > self.antennas {
            return ERR;
        }
        if antenna > 0
            && self
                .current
                .iter()
                .enumerate()
                .any(|(other, held)| other != idx && *held == antenna)
        {
            return BUSY;
        }
        self.current[idx] = antenna;
        OK
    }
}

impl LineIo for DummySwitch {
    fn write_line<'a>(&'a mut self, line: &'a str) -> LineFuture<'a, ()> {
        if let Some(reply) = self.respond(line) {
            self.replies.push_back(reply);
        }
        Box::pin(async { Ok(()) })
    }

    fn read_line<'a>(&'a mut self) -> LineFuture<'a, Vec<u8>> {
        let reply = self.replies.pop_front();
        Box::pin(async move {
            match reply {
                Some(line) => Ok(format!("{}\r\n", line).into_bytes()),
                // The firmware stays silent on commands it does not know.
                None => std::future::pending().await,
            }
        })
    }

    fn discard_input(&mut self) {
        self.replies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let mut sw = DummySwitch::new(2, 6);
        assert_eq!(sw.respond("SET 1 3").as_deref(), Some("+OK"));
        assert_eq!(sw.respond("GET 1").as_deref(), Some("3"));
        assert_eq!(sw.respond("GET 2").as_deref(), Some("0"));
    }

    #[test]
    fn test_commands_are_case_insensitive() {
        let mut sw = DummySwitch::new(2, 6);
        assert_eq!(sw.respond("set 2 5\r").as_deref(), Some("+OK"));
        assert_eq!(sw.respond("get 2").as_deref(), Some("5"));
    }

    #[test]
    fn test_antenna_held_by_other_radio_is_busy() {
        let mut sw = DummySwitch::new(2, 6);
        sw.respond("SET 1 4");
        assert_eq!(sw.respond("SET 2 4").as_deref(), Some("!BUSY"));
        assert_eq!(sw.respond("GET 2").as_deref(), Some("0"));
        // Disconnecting is never blocked.
        assert_eq!(sw.respond("SET 2 0").as_deref(), Some("+OK"));
    }

    #[test]
    fn test_out_of_range_is_error() {
        let mut sw = DummySwitch::new(2, 6);
        assert_eq!(sw.respond("SET 3 1").as_deref(), Some("!ERR"));
        assert_eq!(sw.respond("SET 0 1").as_deref(), Some("!ERR"));
        assert_eq!(sw.respond("SET 1 7").as_deref(), Some("!ERR"));
        assert_eq!(sw.respond("SET 1").as_deref(), Some("!ERR"));
        assert_eq!(sw.respond("GET 9").as_deref(), Some("!ERR"));
    }

    #[test]
    fn test_identify_and_unknown() {
        let mut sw = DummySwitch::new(2, 6);
        assert_eq!(sw.respond("?").as_deref(), Some(BANNER));
        assert_eq!(sw.respond("blink 3"), None);
        assert_eq!(sw.respond(""), None);
    }

    #[tokio::test]
    async fn test_discard_drops_unread_replies() {
        let mut sw = DummySwitch::new(2, 6);
        sw.write_line("GET 1\n").await.unwrap();
        sw.discard_input();
        sw.write_line("SET 1 2\n").await.unwrap();
        assert_eq!(sw.read_line().await.unwrap(), b"+OK\r\n".to_vec());
    }
}
