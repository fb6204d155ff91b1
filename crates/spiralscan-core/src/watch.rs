//! The species watch list and species-name lookup.
//!
//! Both are built once at start-up and shared read-only between workers.

use crate::types::SpeciesId;
use std::collections::{HashMap, HashSet};

/// Set of species a scan flags as wanted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchList(HashSet<SpeciesId>);

impl WatchList {
    /// Create an empty watch list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `species` is on the list.
    #[must_use]
    pub fn contains(&self, species: SpeciesId) -> bool {
        self.0.contains(&species)
    }

    /// Number of watched species.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is watched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the watched species.
    pub fn iter(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<SpeciesId> for WatchList {
    fn from_iter<I: IntoIterator<Item = SpeciesId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<u32>> for WatchList {
    fn from(ids: Vec<u32>) -> Self {
        ids.into_iter().map(SpeciesId).collect()
    }
}

/// Lookup from species id to display name.
///
/// Partial in general; expected to cover every watched species.
#[derive(Debug, Clone, Default)]
pub struct SpeciesNames(HashMap<SpeciesId, String>);

impl SpeciesNames {
    /// Create an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name, replacing any previous one.
    pub fn insert(&mut self, species: SpeciesId, name: impl Into<String>) {
        self.0.insert(species, name.into());
    }

    /// Name of `species`, if known.
    #[must_use]
    pub fn name_of(&self, species: SpeciesId) -> Option<&str> {
        self.0.get(&species).map(String::as_str)
    }

    /// Watched species that have no registered name.
    #[must_use]
    pub fn missing_from(&self, watch_list: &WatchList) -> Vec<SpeciesId> {
        let mut missing: Vec<_> = watch_list
            .iter()
            .filter(|species| !self.0.contains_key(species))
            .collect();
        missing.sort();
        missing
    }
}

impl<S: Into<String>> FromIterator<(SpeciesId, S)> for SpeciesNames {
    fn from_iter<I: IntoIterator<Item = (SpeciesId, S)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(species, name)| (species, name.into()))
                .collect(),
        )
    }
}
