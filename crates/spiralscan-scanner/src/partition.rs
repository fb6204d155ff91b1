//! Splits the spiral across workers.

use crate::error::{Result, ScanError};
use spiralscan_core::Coordinate;
use std::time::Duration;

/// The coordinates one worker visits, fixed at start-up.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanJob {
    /// Index of the worker account
    pub account_index: usize,
    /// Coordinates in visiting order
    pub coordinates: Vec<Coordinate>,
}

impl ScanJob {
    /// Whether the worker has nothing to poll.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.coordinates.is_empty()
    }
}

/// Deal `coords` round-robin into `worker_count` lists.
///
/// Coordinate `i` goes to worker `i % worker_count`, so every worker gets a
/// share of the spiral centre. Relative order is preserved inside each list;
/// surplus workers get empty lists.
///
/// # Errors
/// Returns [`ScanError::InvalidPartitionCount`] when `worker_count` is zero.
pub fn partition(coords: &[Coordinate], worker_count: usize) -> Result<Vec<Vec<Coordinate>>> {
    if worker_count == 0 {
        return Err(ScanError::InvalidPartitionCount(worker_count));
    }

    let mut partitions: Vec<Vec<Coordinate>> = (0..worker_count)
        .map(|_| Vec::with_capacity(coords.len().div_ceil(worker_count)))
        .collect();
    for (index, coord) in coords.iter().enumerate() {
        partitions[index % worker_count].push(*coord);
    }

    Ok(partitions)
}

/// Partition `coords` into one [`ScanJob`] per worker.
pub fn scan_jobs(coords: &[Coordinate], worker_count: usize) -> Result<Vec<ScanJob>> {
    Ok(partition(coords, worker_count)?
        .into_iter()
        .enumerate()
        .map(|(account_index, coordinates)| ScanJob {
            account_index,
            coordinates,
        })
        .collect())
}

/// Lower bound on one full pass over the spiral: the busiest job's
/// coordinate count times the cadence.
#[must_use]
pub fn estimated_cycle_time<'a>(
    jobs: impl IntoIterator<Item = &'a ScanJob>,
    cadence: Duration,
) -> Duration {
    let busiest = jobs
        .into_iter()
        .map(|job| job.coordinates.len())
        .max()
        .unwrap_or(0);
    cadence.saturating_mul(u32::try_from(busiest).unwrap_or(u32::MAX))
}
