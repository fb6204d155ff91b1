//! Map-objects client that replays recorded responses.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use spiralscan_scanner::{MapObjectsClient, MapObjectsRequest, QueryError};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Serves recorded responses in order, wrapping around at the end.
///
/// A `None` entry is served as a transport error.
#[derive(Debug)]
pub struct ReplayClient {
    label: String,
    responses: Arc<Vec<Option<Value>>>,
    cursor: AtomicUsize,
}

impl ReplayClient {
    /// Create a client for `label` serving `responses`.
    pub fn new(label: &str, responses: Arc<Vec<Option<Value>>>) -> Self {
        Self {
            label: label.to_string(),
            responses,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Read a JSON array of responses from `path`.
    pub fn load_responses(path: &Path) -> Result<Arc<Vec<Option<Value>>>> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let responses: Vec<Option<Value>> = serde_json::from_str(&contents)
            .with_context(|| format!("{} is not a JSON array", path.display()))?;
        if responses.is_empty() {
            bail!("{} contains no responses", path.display());
        }
        Ok(Arc::new(responses))
    }
}

#[async_trait]
impl MapObjectsClient for ReplayClient {
    fn label(&self) -> &str {
        &self.label
    }

    async fn get_map_objects(&self, _request: &MapObjectsRequest) -> Result<Value, QueryError> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.responses.len();
        self.responses[index]
            .clone()
            .ok_or_else(|| QueryError::Transport("recorded transport failure".to_string()))
    }
}
