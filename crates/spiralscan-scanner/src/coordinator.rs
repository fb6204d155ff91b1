//! Builds the worker pool and runs it for the life of the process.

use crate::client::MapObjectsClient;
use crate::error::{Result, ScanError};
use crate::partition::{estimated_cycle_time, scan_jobs, ScanJob};
use crate::poller::{PollerConfig, ThrottledPoller};
use crate::sink::SightingSink;
use crate::spiral::{Jitter, SpiralGenerator};
use futures::stream::{FuturesUnordered, StreamExt};
use spiralscan_core::{AppConfig, Coordinate, WatchList};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Everything needed to lay out a scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanSettings {
    /// Centre of the spiral
    pub origin: Coordinate,
    /// Distance between neighbouring spiral points in degrees
    pub step_size: f64,
    /// Spiral points after the origin
    pub step_limit: usize,
    /// Random offset added to spiral points
    pub jitter: Jitter,
    /// Cadence and retry settings shared by all workers
    pub poller: PollerConfig,
}

impl ScanSettings {
    /// The spiral these settings describe.
    #[must_use]
    pub fn spiral(&self) -> SpiralGenerator {
        SpiralGenerator::new(self.step_size, self.step_limit).with_jitter(self.jitter)
    }
}

impl From<&AppConfig> for ScanSettings {
    fn from(config: &AppConfig) -> Self {
        let scanning = &config.scanning;
        let jitter = if scanning.jitter_degrees > 0.0 {
            Jitter::Uniform {
                max: scanning.jitter_degrees,
            }
        } else {
            Jitter::None
        };

        Self {
            origin: config.origin.coordinate(),
            step_size: scanning.step_size,
            step_limit: scanning.step_limit,
            jitter,
            poller: PollerConfig::from(scanning),
        }
    }
}

/// Owns one [`ThrottledPoller`] per authenticated client.
pub struct ScanCoordinator {
    workers: Vec<ThrottledPoller>,
    coordinate_count: usize,
    cadence: Duration,
    cancel: CancellationToken,
}

impl ScanCoordinator {
    /// Generate the spiral for `settings` and split it across `clients`.
    ///
    /// # Errors
    /// Returns [`ScanError::NoWorkersAvailable`] if `clients` is empty and
    /// [`ScanError::InvalidCoordinate`] if the origin is not a valid
    /// coordinate. No worker is started in either case.
    pub fn new(
        settings: &ScanSettings,
        clients: Vec<Arc<dyn MapObjectsClient>>,
        watch_list: Arc<WatchList>,
        sink: Arc<dyn SightingSink>,
    ) -> Result<Self> {
        if clients.is_empty() {
            return Err(ScanError::NoWorkersAvailable);
        }
        if !settings.origin.is_valid() {
            return Err(ScanError::InvalidCoordinate {
                lat: settings.origin.lat,
                lng: settings.origin.lng,
            });
        }

        let coordinates = settings.spiral().generate(settings.origin);
        Self::with_coordinates(&coordinates, settings.poller, clients, watch_list, sink)
    }

    /// Split an explicit coordinate sequence across `clients`.
    ///
    /// # Errors
    /// Returns [`ScanError::NoWorkersAvailable`] if `clients` is empty and
    /// [`ScanError::InvalidRetryAttempts`] if the retry budget is zero.
    pub fn with_coordinates(
        coordinates: &[Coordinate],
        poller: PollerConfig,
        clients: Vec<Arc<dyn MapObjectsClient>>,
        watch_list: Arc<WatchList>,
        sink: Arc<dyn SightingSink>,
    ) -> Result<Self> {
        if clients.is_empty() {
            return Err(ScanError::NoWorkersAvailable);
        }
        if poller.retry_attempts == 0 {
            return Err(ScanError::InvalidRetryAttempts(poller.retry_attempts));
        }

        let cancel = CancellationToken::new();
        let jobs = scan_jobs(coordinates, clients.len())?;
        let workers = jobs
            .into_iter()
            .zip(clients)
            .map(|(job, client)| {
                ThrottledPoller::new(
                    job,
                    client,
                    Arc::clone(&sink),
                    Arc::clone(&watch_list),
                    poller,
                    cancel.child_token(),
                )
            })
            .collect();

        Ok(Self {
            workers,
            coordinate_count: coordinates.len(),
            cadence: poller.cadence,
            cancel,
        })
    }

    /// Number of workers.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Total number of coordinates across all workers.
    #[must_use]
    pub fn coordinate_count(&self) -> usize {
        self.coordinate_count
    }

    /// The per-worker assignments.
    pub fn jobs(&self) -> impl Iterator<Item = &ScanJob> {
        self.workers.iter().map(ThrottledPoller::job)
    }

    /// Lower bound on the time one full pass over the spiral takes: the
    /// busiest worker's coordinate count times the cadence.
    #[must_use]
    pub fn estimated_cycle_time(&self) -> Duration {
        estimated_cycle_time(self.jobs(), self.cadence)
    }

    /// Token that stops every worker when cancelled.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run every worker concurrently until the cancellation token fires.
    ///
    /// There is no natural completion: workers cycle their coordinates
    /// indefinitely. Returns once every worker task has stopped.
    pub async fn run(self) {
        tracing::info!(
            "Running with {} accounts over {} coordinates",
            self.workers.len(),
            self.coordinate_count
        );
        tracing::info!(
            "Estimated scan time: {} seconds",
            self.estimated_cycle_time().as_secs()
        );

        let mut handles: FuturesUnordered<_> = self
            .workers
            .into_iter()
            .map(|worker| tokio::spawn(worker.run()))
            .collect();

        while let Some(result) = handles.next().await {
            if let Err(e) = result {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        tracing::info!("All workers stopped");
    }
}

impl std::fmt::Debug for ScanCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCoordinator")
            .field("workers", &self.workers)
            .field("coordinate_count", &self.coordinate_count)
            .field("cadence", &self.cadence)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
