//! Spiralscan Scanner - Spiral scan scheduling and sighting extraction.
//!
//! This crate samples a remote map-objects service across a neighbourhood to
//! catch short-lived sightings before they expire. It generates the spiral of
//! sample points, maps each point to the index cells a query must cover,
//! splits the spiral across worker accounts and runs one throttled polling
//! loop per account.
//!
//! # Features
//!
//! - Deterministic square spiral with optional sub-cell jitter
//! - S2 cell neighbourhoods in the ascending order the service requires
//! - Interleaved partitioning so every worker starts near the origin
//! - Per-worker cadence enforcement and bounded retries
//! - Cancellation of all workers through a single token
//!
//! # Example
//!
//! ```rust,ignore
//! use spiralscan_scanner::{ScanCoordinator, ScanSettings, TracingSink};
//! use std::sync::Arc;
//!
//! let coordinator = ScanCoordinator::new(
//!     ScanSettings::from(&config),
//!     clients,
//!     Arc::new(config.watch_list()),
//!     Arc::new(TracingSink::new(Arc::new(config.species_names()))),
//! )?;
//!
//! coordinator.run().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cells;
pub mod client;
pub mod coordinator;
pub mod error;
pub mod extractor;
pub mod partition;
pub mod poller;
pub mod sink;
pub mod spiral;

// Re-export commonly used types
pub use cells::{cells_for, DEFAULT_CELL_RADIUS, QUERY_CELL_LEVEL};
pub use client::{
    classify, EntityData, MapCell, MapObjectsClient, MapObjectsRequest, QueryResult, WildEntity,
};
pub use coordinator::{ScanCoordinator, ScanSettings};
pub use error::{QueryError, Result, ScanError};
pub use extractor::{extract, sighting_key, Sighting};
pub use partition::{estimated_cycle_time, partition, scan_jobs, ScanJob};
pub use poller::{CoordinateOutcome, PollerConfig, ThrottledPoller};
pub use sink::{ChannelSink, ScanEvent, SightingSink, TracingSink};
pub use spiral::{Jitter, SpiralGenerator};
