//! Turns map cells into time-bounded sightings.

use crate::client::{MapCell, WildEntity};
use serde::Serialize;
use spiralscan_core::{Coordinate, SpeciesId, Timestamp, WatchList};
use tracing::warn;

/// A wild entity seen in a response, with its computed expiry.
///
/// Built fresh for every response and handed straight to the sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sighting {
    /// `<spawn point>-<species>`; stable across repeated sightings
    pub key: String,
    /// Encounter identifier, when the service sent one
    pub encounter_id: Option<u64>,
    /// Species seen
    pub species_id: SpeciesId,
    /// Where the entity is
    pub coordinate: Coordinate,
    /// When the entity disappears
    pub expires_at: Timestamp,
    /// Whether the species is on the watch list
    pub is_wanted: bool,
}

impl Sighting {
    fn from_entity(entity: &WildEntity, watch_list: &WatchList, now: Timestamp) -> Option<Self> {
        let species_id = SpeciesId(entity.data.species_id);
        let key = sighting_key(&entity.spawn_point_id, species_id);
        let Some(expires_at) = now.checked_add_millis(entity.time_till_hidden_ms) else {
            warn!(
                "Dropping {}: visibility of {}ms is out of range",
                key, entity.time_till_hidden_ms
            );
            return None;
        };

        Some(Self {
            key,
            encounter_id: entity.encounter_id,
            species_id,
            coordinate: Coordinate::new(entity.latitude, entity.longitude),
            expires_at,
            is_wanted: watch_list.contains(species_id),
        })
    }
}

/// Key identifying a spawn of one species at one spawn point.
#[must_use]
pub fn sighting_key(spawn_point_id: &str, species_id: SpeciesId) -> String {
    format!("{spawn_point_id}-{species_id}")
}

/// Extract the still-visible entities of `cells`, in response order.
///
/// `now` is read once. Entities with non-positive remaining visibility, or an
/// expiry past the representable range, are dropped.
pub fn extract(
    cells: &[MapCell],
    watch_list: &WatchList,
    now: impl FnOnce() -> Timestamp,
) -> Vec<Sighting> {
    let now = now();
    cells
        .iter()
        .filter_map(|cell| cell.wild_entities.as_deref())
        .flatten()
        .filter(|entity| entity.time_till_hidden_ms > 0)
        .filter_map(|entity| Sighting::from_entity(entity, watch_list, now))
        .collect()
}
