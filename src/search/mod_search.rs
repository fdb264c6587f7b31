//! The mod-search predicate

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::item::Item;

use super::errors::SearchResult;

/// A search for items carrying a set of mods at minimum values.
///
/// `mods` and `min_values` are positionally related; deserialization
/// rejects mismatched lengths. Minimum values are the raw, unscaled
/// numbers a user would read off an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawModSearch")]
pub struct ModSearch {
    /// Result size bound
    #[serde(rename = "maxDesired")]
    pub max_desired: usize,
    /// Root type name, e.g. `Armour`
    #[serde(rename = "rootType")]
    pub root_type: String,
    /// Root flavor name, e.g. `Boots`
    #[serde(rename = "rootFlavor")]
    pub root_flavor: String,
    /// League name
    pub league: String,
    /// Mod templates searched for
    pub mods: Vec<String>,
    /// Minimum values, positionally tied to `mods`
    #[serde(rename = "minValues")]
    pub min_values: Vec<u16>,
}

/// Wire mirror of [`ModSearch`], validated on conversion.
#[derive(Deserialize)]
struct RawModSearch {
    #[serde(rename = "maxDesired")]
    max_desired: usize,
    #[serde(rename = "rootType")]
    root_type: String,
    #[serde(rename = "rootFlavor")]
    root_flavor: String,
    league: String,
    mods: Vec<String>,
    #[serde(rename = "minValues")]
    min_values: Vec<u16>,
}

impl TryFrom<RawModSearch> for ModSearch {
    type Error = String;

    fn try_from(raw: RawModSearch) -> Result<Self, Self::Error> {
        if raw.mods.len() != raw.min_values.len() {
            return Err(format!(
                "mods and minValues must pair up: {} mods, {} minValues",
                raw.mods.len(),
                raw.min_values.len()
            ));
        }
        Ok(ModSearch {
            max_desired: raw.max_desired,
            root_type: raw.root_type,
            root_flavor: raw.root_flavor,
            league: raw.league,
            mods: raw.mods,
            min_values: raw.min_values,
        })
    }
}

impl ModSearch {
    /// Loads a search from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> SearchResult<ModSearch> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Checks that every item satisfies the search.
    ///
    /// For each mod in the search, an item must carry at least one mod
    /// instance of that template whose first value meets the unscaled
    /// minimum. Items are free to carry extra mods outside the search.
    /// An empty item list is vacuously satisfied.
    ///
    /// # Panics
    ///
    /// When `mods` and `min_values` differ in length; a search in that
    /// state is a programmer error.
    pub fn satisfies(&self, items: &[Item]) -> bool {
        assert_eq!(
            self.mods.len(),
            self.min_values.len(),
            "mismatched mods and min_values lengths"
        );

        items.iter().all(|item| {
            self.mods.iter().zip(&self.min_values).all(|(mod_name, min)| {
                item.mods.iter().any(|instance| {
                    instance.template == *mod_name
                        && instance.values.first().is_some_and(|v| v >= min)
                })
            })
        })
    }
}

impl fmt::Display for ModSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "RootType: {}, RootFlavor: {},",
            self.root_type, self.root_flavor
        )?;
        writeln!(f, "League: {}, MaxDesired: {}", self.league, self.max_desired)?;

        if self.mods.len() != self.min_values.len() {
            return write!(f, "invalid mods: len(mods) != len(minValues)");
        }
        if self.mods.is_empty() {
            return write!(f, "no mods present");
        }

        let rendered: Vec<String> = self
            .mods
            .iter()
            .zip(&self.min_values)
            .map(|(mod_name, min)| format!("{}: {}", mod_name, min))
            .collect();
        write!(f, "{}", rendered.join("\n"))
    }
}
