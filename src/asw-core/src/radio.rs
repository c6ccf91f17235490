// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::fmt;

use serde::Serialize;

/// One-based identifier of a radio port on the switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RadioId(u8);

impl RadioId {
    pub const fn new(number: u8) -> Option<Self> {
        if number == 0 {
            None
        } else {
            Some(Self(number))
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for RadioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The radios wired to the switch, numbered `1..=count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioSet {
    count: u8,
}

impl RadioSet {
    pub const fn new(count: u8) -> Option<Self> {
        if count == 0 {
            None
        } else {
            Some(Self { count })
        }
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    /// Resolve a raw client-supplied radio number.
    pub fn lookup(&self, raw: u64) -> Option<RadioId> {
        let number = u8::try_from(raw).ok()?;
        if number > self.count {
            return None;
        }
        RadioId::new(number)
    }

    /// Radios in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = RadioId> {
        (1..=self.count).map(RadioId)
    }
}

impl Default for RadioSet {
    fn default() -> Self {
        Self { count: 2 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radio_zero_is_invalid() {
        assert!(RadioId::new(0).is_none());
        assert!(RadioSet::new(0).is_none());
    }

    #[test]
    fn test_lookup_bounds() {
        let set = RadioSet::default();
        assert_eq!(set.lookup(1).map(RadioId::get), Some(1));
        assert_eq!(set.lookup(2).map(RadioId::get), Some(2));
        assert!(set.lookup(0).is_none());
        assert!(set.lookup(3).is_none());
        assert!(set.lookup(u64::from(u8::MAX) + 2).is_none());
    }

    #[test]
    fn test_iter_is_ordered() {
        let set = RadioSet::new(3).unwrap();
        let ids: Vec<u8> = set.iter().map(RadioId::get).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
