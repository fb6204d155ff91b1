#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use spiralscan_core::Coordinate;
use spiralscan_scanner::{MapObjectsClient, MapObjectsRequest, QueryError};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Client that replays a fixed script, repeating the last entry once the
/// script runs out, and records every call it receives.
pub struct ScriptedClient {
    label: String,
    latency: Duration,
    script: Mutex<VecDeque<Result<Value, QueryError>>>,
    last: Mutex<Option<Result<Value, QueryError>>>,
    calls: Mutex<Vec<(Instant, MapObjectsRequest)>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Result<Value, QueryError>>) -> Self {
        Self {
            label: "scripted".to_string(),
            latency: Duration::ZERO,
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(response: Result<Value, QueryError>) -> Self {
        Self::new(vec![response])
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(at, _)| *at)
            .collect()
    }

    pub fn positions(&self) -> Vec<Coordinate> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(_, request)| request.position)
            .collect()
    }

    pub fn requests(&self) -> Vec<MapObjectsRequest> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    fn next_response(&self) -> Result<Value, QueryError> {
        let mut script = self.script.lock().expect("script lock");
        let mut last = self.last.lock().expect("last lock");
        if let Some(next) = script.pop_front() {
            *last = Some(next);
        }
        last.clone().expect("scripted client needs at least one response")
    }
}

#[async_trait]
impl MapObjectsClient for ScriptedClient {
    fn label(&self) -> &str {
        &self.label
    }

    async fn get_map_objects(&self, request: &MapObjectsRequest) -> Result<Value, QueryError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((Instant::now(), request.clone()));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.next_response()
    }
}

pub fn entity(spawn_point: &str, species: u32, ttl_ms: i64) -> Value {
    json!({
        "spawn_point_id": spawn_point,
        "pokemon_data": { "pokemon_id": species },
        "time_till_hidden_ms": ttl_ms,
        "latitude": 10.0005,
        "longitude": 20.0005
    })
}

pub fn ok_response(entities: Vec<Value>) -> Result<Value, QueryError> {
    Ok(json!({
        "responses": {
            "GET_MAP_OBJECTS": {
                "status": 1,
                "map_cells": [
                    { "s2_cell_id": 1_152_921_505_680_588_800_u64 },
                    { "wild_pokemons": entities }
                ]
            }
        }
    }))
}

pub fn status_response(status: i64) -> Result<Value, QueryError> {
    Ok(json!({ "responses": { "GET_MAP_OBJECTS": { "status": status } } }))
}

pub fn transport_error() -> Result<Value, QueryError> {
    Err(QueryError::Transport("connection reset".to_string()))
}

/// Everything a `ChannelSink` has received so far.
pub fn drain(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<spiralscan_scanner::ScanEvent>,
) -> (Vec<spiralscan_scanner::Sighting>, Vec<(Coordinate, String)>) {
    let mut sightings = Vec::new();
    let mut failures = Vec::new();
    while let Ok(event) = rx.try_recv() {
        match event {
            spiralscan_scanner::ScanEvent::Sighting(sighting) => sightings.push(sighting),
            spiralscan_scanner::ScanEvent::Failure { coordinate, reason } => {
                failures.push((coordinate, reason));
            }
        }
    }
    (sightings, failures)
}

/// Compare durations measured on the paused test clock, allowing for the
/// timer wheel's millisecond rounding.
pub fn assert_about(actual: Duration, expected: Duration) {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff <= Duration::from_millis(10),
        "expected about {expected:?}, got {actual:?}"
    );
}
