//! Per-worker polling loop.
//!
//! Each worker walks its [`ScanJob`] in order. For every coordinate it queries
//! the map-objects service for the surrounding cells, retrying failed
//! attempts immediately up to the retry budget. After every attempt the worker
//! waits out the rest of the cadence interval, so it never issues queries
//! faster than one per interval regardless of how quickly the service answers.
//! When the list is exhausted the worker starts over from its first
//! coordinate; the scan only ends when the cancellation token fires. A cycle
//! in which no coordinate could be queried is followed by one cadence interval
//! of rest.

use crate::cells::{cells_for, DEFAULT_CELL_RADIUS};
use crate::client::{classify, MapObjectsClient, MapObjectsRequest, QueryResult};
use crate::error::QueryError;
use crate::extractor::extract;
use crate::partition::ScanJob;
use crate::sink::SightingSink;
use spiralscan_core::{Coordinate, ScanningConfig, Timestamp, WatchList};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default minimum interval between two queries of one worker.
pub const DEFAULT_CADENCE: Duration = Duration::from_secs(5);

/// Default attempts per coordinate.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Default upper bound on a single query.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cadence and retry settings of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Minimum interval between the starts of two attempts
    pub cadence: Duration,
    /// Attempts per coordinate before it is skipped
    pub retry_attempts: u32,
    /// Cells queried on each side of the centre cell
    pub cell_radius: u32,
    /// Upper bound on a single attempt
    pub request_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            cadence: DEFAULT_CADENCE,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            cell_radius: DEFAULT_CELL_RADIUS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl From<&ScanningConfig> for PollerConfig {
    fn from(config: &ScanningConfig) -> Self {
        Self {
            cadence: Duration::from_millis(config.cadence_ms),
            retry_attempts: config.retry_attempts,
            cell_radius: config.cell_radius,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// What happened at one coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinateOutcome {
    /// Queries issued
    pub attempts: u32,
    /// Whether one of them succeeded
    pub succeeded: bool,
    /// Sightings reported from the successful response
    pub sightings: usize,
}

/// One worker: a scan job, the client that serves it and where results go.
pub struct ThrottledPoller {
    job: ScanJob,
    client: Arc<dyn MapObjectsClient>,
    sink: Arc<dyn SightingSink>,
    watch_list: Arc<WatchList>,
    config: PollerConfig,
    cancel: CancellationToken,
}

impl ThrottledPoller {
    /// Create a worker for `job`.
    #[must_use]
    pub fn new(
        job: ScanJob,
        client: Arc<dyn MapObjectsClient>,
        sink: Arc<dyn SightingSink>,
        watch_list: Arc<WatchList>,
        config: PollerConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            job,
            client,
            sink,
            watch_list,
            config,
            cancel,
        }
    }

    /// The job this worker owns.
    #[must_use]
    pub fn job(&self) -> &ScanJob {
        &self.job
    }

    /// Poll the job's coordinates cyclically until cancelled.
    ///
    /// A worker with an empty job never polls; it just waits for cancellation.
    pub async fn run(self) {
        let worker = self.job.account_index;

        if self.job.is_idle() {
            debug!("Worker {} ({}) has no coordinates, idling", worker, self.client.label());
            self.cancel.cancelled().await;
            return;
        }

        info!(
            "Worker {} ({}) scanning {} coordinates",
            worker,
            self.client.label(),
            self.job.coordinates.len()
        );

        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            let mut skipped = 0usize;
            let mut sightings = 0usize;
            let mut attempts = 0u32;

            for &coordinate in &self.job.coordinates {
                if self.cancel.is_cancelled() {
                    info!("Worker {} stopped during cycle {}", worker, cycle);
                    return;
                }

                let outcome = self.poll_coordinate(coordinate).await;
                if !outcome.succeeded {
                    skipped += 1;
                }
                sightings += outcome.sightings;
                attempts = attempts.saturating_add(outcome.attempts);
            }

            info!(
                "Worker {} finished cycle {}: {} sightings, {} coordinates skipped",
                worker, cycle, sightings, skipped
            );

            // A cycle that queried nothing has no cadence wait of its own.
            if attempts == 0 {
                warn!(
                    "Worker {} has no queryable coordinates, retrying in {:?}",
                    worker, self.config.cadence
                );
                tokio::task::yield_now().await;
                tokio::select! {
                    () = self.cancel.cancelled() => return,
                    () = tokio::time::sleep(self.config.cadence) => {}
                }
            }
        }
    }

    /// Query one coordinate, retrying up to the budget.
    ///
    /// Sightings from a successful response are reported before this returns.
    /// If every attempt fails the coordinate is reported as a failure. A
    /// cancellation during the cadence wait returns immediately without
    /// reporting anything further.
    pub async fn poll_coordinate(&self, coordinate: Coordinate) -> CoordinateOutcome {
        let mut outcome = CoordinateOutcome::default();

        let cell_ids = match cells_for(coordinate, self.config.cell_radius) {
            Ok(cell_ids) => cell_ids,
            Err(e) => {
                warn!("Worker {}: {}", self.job.account_index, e);
                self.sink.report_failure(coordinate, &e.to_string());
                tokio::task::yield_now().await;
                return outcome;
            }
        };
        let request = MapObjectsRequest::new(coordinate, cell_ids);
        debug!(
            "Worker {} querying {} ({} cells)",
            self.job.account_index,
            coordinate,
            request.cell_ids.len()
        );

        let mut last_failure = String::from("no attempts made");
        while outcome.attempts < self.config.retry_attempts {
            outcome.attempts += 1;

            let started = Instant::now();
            let result = self.attempt(&request).await;
            let elapsed = started.elapsed();

            match result {
                QueryResult::Success(cells) => {
                    let sightings = extract(&cells, &self.watch_list, Timestamp::now);
                    for sighting in &sightings {
                        self.sink.report(sighting);
                    }
                    outcome.succeeded = true;
                    outcome.sightings = sightings.len();
                }
                QueryResult::TransientFailure(reason) | QueryResult::Malformed(reason) => {
                    warn!(
                        "Worker {} request for {} failed (attempt {}/{}): {}",
                        self.job.account_index,
                        coordinate,
                        outcome.attempts,
                        self.config.retry_attempts,
                        reason
                    );
                    last_failure = reason;
                }
            }

            if !self.wait_out_cadence(elapsed).await {
                return outcome;
            }
            if outcome.succeeded {
                return outcome;
            }
        }

        warn!(
            "Worker {} giving up on {} after {} attempts",
            self.job.account_index, coordinate, outcome.attempts
        );
        self.sink.report_failure(coordinate, &last_failure);
        outcome
    }

    async fn attempt(&self, request: &MapObjectsRequest) -> QueryResult {
        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, self.client.get_map_objects(request)).await {
            Ok(Ok(response)) => classify(response),
            Ok(Err(e)) => e.into(),
            Err(_) => QueryError::Timeout(timeout).into(),
        }
    }

    /// Sleep for the rest of the cadence interval after an attempt that took
    /// `elapsed`. Attempts that already took the whole interval continue at
    /// once. Returns false if cancelled.
    async fn wait_out_cadence(&self, elapsed: Duration) -> bool {
        if elapsed.is_zero() || elapsed >= self.config.cadence {
            tokio::task::yield_now().await;
            return !self.cancel.is_cancelled();
        }

        let remaining = self.config.cadence - elapsed;
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(remaining) => true,
        }
    }
}

impl std::fmt::Debug for ThrottledPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThrottledPoller")
            .field("account_index", &self.job.account_index)
            .field("coordinates", &self.job.coordinates.len())
            .field("client", &self.client.label())
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
