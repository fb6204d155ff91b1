//! Destinations for sightings and skipped coordinates.
//!
//! Every worker reports into the same sink, so implementations must accept
//! concurrent calls and must never block.

use crate::extractor::Sighting;
use spiralscan_core::{Coordinate, SpeciesNames};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Receives what the workers find.
pub trait SightingSink: Send + Sync {
    /// Called once per extracted sighting.
    fn report(&self, sighting: &Sighting);

    /// Called when a coordinate is skipped after exhausting its retries.
    fn report_failure(&self, coordinate: Coordinate, reason: &str);
}

/// Sink that only logs. Wanted sightings are announced by name at `info`.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    names: Arc<SpeciesNames>,
}

impl TracingSink {
    /// Create a sink resolving species names through `names`.
    #[must_use]
    pub fn new(names: Arc<SpeciesNames>) -> Self {
        Self { names }
    }
}

impl SightingSink for TracingSink {
    fn report(&self, sighting: &Sighting) {
        if sighting.is_wanted {
            let name = self
                .names
                .name_of(sighting.species_id)
                .unwrap_or("unknown");
            info!(
                key = %sighting.key,
                species = %sighting.species_id,
                at = %sighting.coordinate,
                hides_at = %sighting.expires_at,
                "{} found",
                name
            );
        } else {
            debug!(
                key = %sighting.key,
                species = %sighting.species_id,
                hides_at = %sighting.expires_at,
                "Sighting"
            );
        }
    }

    fn report_failure(&self, coordinate: Coordinate, reason: &str) {
        warn!("Skipping {} after failed requests: {}", coordinate, reason);
    }
}

/// What a [`ChannelSink`] forwards.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// A sighting was extracted.
    Sighting(Sighting),
    /// A coordinate was skipped.
    Failure {
        /// The skipped coordinate
        coordinate: Coordinate,
        /// Last failure seen for it
        reason: String,
    },
}

/// Fan-in sink forwarding every report over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ScanEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver its events arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScanEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: ScanEvent) {
        if self.tx.send(event).is_err() {
            debug!("Scan event receiver dropped, discarding event");
        }
    }
}

impl SightingSink for ChannelSink {
    fn report(&self, sighting: &Sighting) {
        self.send(ScanEvent::Sighting(sighting.clone()));
    }

    fn report_failure(&self, coordinate: Coordinate, reason: &str) {
        self.send(ScanEvent::Failure {
            coordinate,
            reason: reason.to_string(),
        });
    }
}
