// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Antenna catalog and the per-radio antenna state reported by the controller.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::radio::RadioId;

/// Wire value of an antenna port. `0` means the radio is disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AntennaSelector(u8);

impl AntennaSelector {
    pub const DISCONNECTED: Self = Self(0);

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub fn is_disconnected(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for AntennaSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntennaDescriptor {
    pub index: AntennaSelector,
    pub name: String,
}

/// Ordered antennas available on the switch. Entry `n` (0-based) answers to
/// selector `n + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AntennaCatalog {
    antennas: Vec<AntennaDescriptor>,
}

impl AntennaCatalog {
    /// Largest catalog the two-digit controller selectors can address.
    pub const MAX_ANTENNAS: usize = 99;

    /// Build a catalog from display names. Returns `None` when there are more
    /// names than [`Self::MAX_ANTENNAS`].
    pub fn from_names<I, S>(names: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut antennas = Vec::new();
        for (idx, name) in names.into_iter().enumerate() {
            if idx >= Self::MAX_ANTENNAS {
                return None;
            }
            let index = u8::try_from(idx + 1).ok()?;
            antennas.push(AntennaDescriptor {
                index: AntennaSelector(index),
                name: name.into(),
            });
        }
        Some(Self { antennas })
    }

    pub fn len(&self) -> usize {
        self.antennas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.antennas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AntennaDescriptor> {
        self.antennas.iter()
    }

    /// Resolve a raw client selector. `0` (disconnect) is always valid.
    pub fn lookup(&self, raw: u64) -> Option<AntennaSelector> {
        let value = u8::try_from(raw).ok()?;
        if usize::from(value) > self.antennas.len() {
            return None;
        }
        Some(AntennaSelector(value))
    }

    /// Catalog entry for a raw selector. `0` has no entry.
    pub fn get(&self, raw: u64) -> Option<&AntennaDescriptor> {
        let idx = usize::try_from(raw).ok()?.checked_sub(1)?;
        self.antennas.get(idx)
    }

    pub fn name_of(&self, selector: AntennaSelector) -> Option<&str> {
        self.get(u64::from(selector.0)).map(|a| a.name.as_str())
    }
}

/// Antenna connected to each radio. Serialized as `{"radio1": 3, "radio2": 0}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AntennaState {
    radios: BTreeMap<RadioId, AntennaSelector>,
}

impl AntennaState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, radio: RadioId, antenna: AntennaSelector) {
        self.radios.insert(radio, antenna);
    }

    pub fn get(&self, radio: RadioId) -> Option<AntennaSelector> {
        self.radios.get(&radio).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RadioId, AntennaSelector)> + '_ {
        self.radios.iter().map(|(r, a)| (*r, *a))
    }

    pub fn len(&self) -> usize {
        self.radios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radios.is_empty()
    }
}

impl Serialize for AntennaState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.radios.len()))?;
        for (radio, antenna) in &self.radios {
            map.serialize_entry(&format!("radio{}", radio), antenna)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AntennaState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StateVisitor;

        impl<'de> Visitor<'de> for StateVisitor {
            type Value = AntennaState;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of radioN keys to antenna selectors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut state = AntennaState::new();
                while let Some((key, antenna)) = access.next_entry::<String, AntennaSelector>()? {
                    let radio = key
                        .strip_prefix("radio")
                        .and_then(|n| n.parse::<u8>().ok())
                        .and_then(RadioId::new)
                        .ok_or_else(|| de::Error::custom(format!("invalid radio key {key:?}")))?;
                    state.insert(radio, antenna);
                }
                Ok(state)
            }
        }

        deserializer.deserialize_map(StateVisitor)
    }
}
