//! Item types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::heap::{LeagueHeapId, StringHeapId};

use super::errors::{ItemError, ItemResult};

/// Fixed-width, opaque item identifier.
///
/// Upstream ingestion hands items 64-character hex identifiers; those
/// decode to the 32 bytes carried here. Equality and hashing are defined;
/// callers must not read meaning into byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId([u8; 32]);

impl ItemId {
    /// Width of an encoded id in bytes.
    pub const WIDTH: usize = 32;

    /// Wraps raw id bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        ItemId(bytes)
    }

    /// Parses a 64-character hex identifier.
    pub fn from_hex(hex: &str) -> ItemResult<Self> {
        if hex.len() != Self::WIDTH * 2 {
            return Err(ItemError::BadId(format!(
                "expected {} hex chars, got {}",
                Self::WIDTH * 2,
                hex.len()
            )));
        }
        let mut bytes = [0u8; Self::WIDTH];
        for (byte, pair) in bytes.iter_mut().zip(hex.as_bytes().chunks_exact(2)) {
            let digits = std::str::from_utf8(pair)
                .map_err(|_| ItemError::BadId("non-ascii characters".into()))?;
            *byte = u8::from_str_radix(digits, 16)
                .map_err(|_| ItemError::BadId(format!("non-hex digits at {:?}", digits)))?;
        }
        Ok(ItemId(bytes))
    }

    /// Raw id bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex rendering of the id.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.to_hex())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ItemId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        ItemId::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// One mod on an item, in public form.
///
/// `values` carries the raw numbers from the mod template, e.g. a
/// "adds # to # damage" mod has two. They are unscaled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMod {
    /// Mod template, e.g. `+#% to Fire Resistance`
    pub template: String,
    /// Raw template values, unscaled
    pub values: Vec<u16>,
}

impl ItemMod {
    /// Convenience constructor for a single-value mod.
    pub fn single(template: impl Into<String>, value: u16) -> Self {
        ItemMod {
            template: template.into(),
            values: vec![value],
        }
    }
}

/// An item in public form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Opaque item identifier
    pub id: ItemId,
    /// League the item belongs to
    pub league: String,
    /// Root type, e.g. `Armour`
    pub root_type: String,
    /// Root flavor, e.g. `Boots`
    pub root_flavor: String,
    /// Mods attached to the item
    pub mods: Vec<ItemMod>,
    /// When the item entered the database
    pub added_at: DateTime<Utc>,
}

/// One mod in stored form: template interned, values as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactMod {
    /// Interned mod template
    pub template: StringHeapId,
    /// Raw template values, unscaled
    pub values: Vec<u16>,
}

/// An item in stored form; the id is the bucket key, not part of the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactItem {
    /// Interned root type
    pub root_type: StringHeapId,
    /// Interned root flavor
    pub root_flavor: StringHeapId,
    /// League the body is stored under
    pub league: LeagueHeapId,
    /// Interned mods
    pub mods: Vec<CompactMod>,
    /// When the item entered the database
    pub added_at: DateTime<Utc>,
}
