//! Seam to the remote map-objects service and the shape of its responses.
//!
//! Session establishment and the wire encoding live behind
//! [`MapObjectsClient`]; the scanner only sees the decoded response tree and
//! classifies it with [`classify`].

use crate::error::QueryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use spiralscan_core::{CellId, Coordinate};

/// Key under `responses` holding the map-objects payload.
pub const MAP_OBJECTS_KEY: &str = "GET_MAP_OBJECTS";

/// Status code the service uses for a successful map-objects call.
pub const STATUS_OK: i64 = 1;

/// One map-objects query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapObjectsRequest {
    /// Position reported to the service
    pub position: Coordinate,
    /// Cells to cover, ascending
    pub cell_ids: Vec<CellId>,
    /// One entry per cell id; zero asks for everything
    pub since_timestamps_ms: Vec<i64>,
}

impl MapObjectsRequest {
    /// Build a request that asks for everything in `cell_ids`.
    #[must_use]
    pub fn new(position: Coordinate, cell_ids: Vec<CellId>) -> Self {
        let since_timestamps_ms = vec![0; cell_ids.len()];
        Self {
            position,
            cell_ids,
            since_timestamps_ms,
        }
    }
}

/// An authenticated handle to the map-objects service.
///
/// Implementations own their session; one handle is used by exactly one worker.
#[async_trait]
pub trait MapObjectsClient: Send + Sync {
    /// Short label used in logs, usually the account name.
    fn label(&self) -> &str;

    /// Issue the query and return the decoded response tree.
    async fn get_map_objects(&self, request: &MapObjectsRequest) -> Result<Value, QueryError>;
}

/// A map cell fragment of a successful response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapCell {
    /// Cell the fragment describes
    #[serde(default, rename = "s2_cell_id")]
    pub cell_id: Option<CellId>,
    /// Wild entities currently visible in the cell
    #[serde(default, rename = "wild_pokemons")]
    pub wild_entities: Option<Vec<WildEntity>>,
}

/// A wild entity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildEntity {
    /// Encounter identifier, when the service sends one
    #[serde(default)]
    pub encounter_id: Option<u64>,
    /// Spawn point the entity appeared at
    pub spawn_point_id: String,
    /// Species details
    #[serde(rename = "pokemon_data")]
    pub data: EntityData,
    /// Remaining visibility; non-positive means already gone
    #[serde(default)]
    pub time_till_hidden_ms: i64,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

/// Species details of a [`WildEntity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    /// Species identifier
    #[serde(rename = "pokemon_id")]
    pub species_id: u32,
}

#[derive(Debug, Deserialize)]
struct MapObjects {
    #[serde(default)]
    map_cells: Vec<MapCell>,
}

/// Outcome of one query attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Status ok and the payload decoded.
    Success(Vec<MapCell>),
    /// Transport error, timeout or a non-ok status.
    TransientFailure(String),
    /// The response is missing the expected structure.
    Malformed(String),
}

impl QueryResult {
    /// Whether the attempt succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<QueryError> for QueryResult {
    fn from(err: QueryError) -> Self {
        Self::TransientFailure(err.to_string())
    }
}

/// Classify a decoded response tree.
///
/// Success requires `responses.GET_MAP_OBJECTS.status == 1` and a payload
/// whose `map_cells` decode.
#[must_use]
pub fn classify(response: Value) -> QueryResult {
    let Some(payload) = response
        .get("responses")
        .and_then(|responses| responses.get(MAP_OBJECTS_KEY))
    else {
        return QueryResult::Malformed(format!("response has no responses.{MAP_OBJECTS_KEY}"));
    };

    let Some(status) = payload.get("status") else {
        return QueryResult::Malformed(format!("{MAP_OBJECTS_KEY} has no status"));
    };

    match status.as_i64() {
        Some(STATUS_OK) => {}
        Some(other) => return QueryResult::TransientFailure(format!("status {other}")),
        None => return QueryResult::Malformed(format!("non-numeric status {status}")),
    }

    match MapObjects::deserialize(payload) {
        Ok(objects) => QueryResult::Success(objects.map_cells),
        Err(e) => QueryResult::Malformed(format!("undecodable map cells: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_zero_timestamps() {
        let request = MapObjectsRequest::new(
            Coordinate::new(1.0, 2.0),
            vec![CellId(1), CellId(3), CellId(5)],
        );
        assert_eq!(request.since_timestamps_ms, vec![0, 0, 0]);
    }

    #[test]
    fn test_classify_success() {
        let response = json!({
            "responses": {
                "GET_MAP_OBJECTS": {
                    "status": 1,
                    "map_cells": [
                        { "s2_cell_id": 1_152_921_505_680_588_800_u64 },
                        {
                            "wild_pokemons": [{
                                "encounter_id": 77,
                                "spawn_point_id": "89c25",
                                "pokemon_data": { "pokemon_id": 16 },
                                "time_till_hidden_ms": 120_000,
                                "latitude": 10.0,
                                "longitude": 20.0
                            }]
                        }
                    ]
                }
            }
        });

        let QueryResult::Success(cells) = classify(response) else {
            panic!("expected success");
        };
        assert_eq!(cells.len(), 2);
        assert!(cells[0].wild_entities.is_none());
        let entities = cells[1].wild_entities.as_ref().expect("wild entities");
        assert_eq!(entities[0].data.species_id, 16);
        assert_eq!(entities[0].encounter_id, Some(77));
    }

    #[test]
    fn test_classify_success_without_cells() {
        let response = json!({ "responses": { "GET_MAP_OBJECTS": { "status": 1 } } });
        assert_eq!(classify(response), QueryResult::Success(vec![]));
    }

    #[test]
    fn test_classify_non_ok_status() {
        let response = json!({ "responses": { "GET_MAP_OBJECTS": { "status": 2 } } });
        assert_eq!(
            classify(response),
            QueryResult::TransientFailure("status 2".to_string())
        );
    }

    #[test]
    fn test_classify_missing_structure() {
        assert!(matches!(classify(json!({})), QueryResult::Malformed(_)));
        assert!(matches!(
            classify(json!({ "responses": {} })),
            QueryResult::Malformed(_)
        ));
        assert!(matches!(
            classify(json!({ "responses": { "GET_MAP_OBJECTS": {} } })),
            QueryResult::Malformed(_)
        ));
        assert!(matches!(
            classify(json!({ "responses": { "GET_MAP_OBJECTS": { "status": "ok" } } })),
            QueryResult::Malformed(_)
        ));
    }

    #[test]
    fn test_classify_undecodable_cells() {
        let response = json!({
            "responses": {
                "GET_MAP_OBJECTS": {
                    "status": 1,
                    "map_cells": [{ "wild_pokemons": [{ "spawn_point_id": 5 }] }]
                }
            }
        });
        assert!(matches!(classify(response), QueryResult::Malformed(_)));
    }

    #[test]
    fn test_query_error_is_transient() {
        let result = QueryResult::from(QueryError::Transport("connection reset".to_string()));
        assert_eq!(
            result,
            QueryResult::TransientFailure("transport error: connection reset".to_string())
        );
        assert!(!result.is_success());
    }
}
