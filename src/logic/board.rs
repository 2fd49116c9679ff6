//! Snapshot Board
//!
//! Holds the outcome of the most recent polling cycle for the status
//! endpoints. Written once per cycle by the polling task; readers get a
//! cheap `Arc` clone and never block the writer for long.
//!
//! Detection ids are derived from `device:flow`, so a flow that keeps
//! attacking keeps its id from one cycle to the next.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::logic::decision::{NetworkState, Verdict};

const DETECTION_NAMESPACE: Uuid = Uuid::from_u128(0x6f1d_52a3_8c4e_4b7a_9e21_d0c5_3a8f_17b4);

/// A verdict flagged by the batch rule
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub id: Uuid,
    /// `device:flow` the id is derived from
    pub key: String,
    /// First cycle of the current run of detections for this key
    pub detected_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    #[serde(flatten)]
    pub verdict: Verdict,
}

impl Detection {
    fn new(verdict: &Verdict, position: usize, polled_at: DateTime<Utc>) -> Self {
        let key = detection_key(verdict, position);
        Self {
            id: Uuid::new_v5(&DETECTION_NAMESPACE, key.as_bytes()),
            key,
            detected_at: polled_at,
            last_seen: polled_at,
            verdict: verdict.clone(),
        }
    }
}

/// Flows without an id fall back to their position in the batch
fn detection_key(verdict: &Verdict, position: usize) -> String {
    let device = verdict.device_id.as_deref().unwrap_or("-");
    match verdict.flow_id.as_deref() {
        Some(flow) => format!("{}:{}", device, flow),
        None => format!("{}:#{}", device, position),
    }
}

/// One completed polling cycle
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub polled_at: DateTime<Utc>,
    pub baseline_label: String,
    pub state: NetworkState,
    /// Fetched records dropped as malformed, outside `state.total_flows`
    pub skipped_flows: usize,
    pub verdicts: Vec<Verdict>,
    #[serde(skip)]
    pub detections: Vec<Detection>,
}

impl Snapshot {
    /// Build a snapshot; verdicts whose label is not the baseline become detections
    pub fn new(
        polled_at: DateTime<Utc>,
        baseline_label: impl Into<String>,
        state: NetworkState,
        verdicts: Vec<Verdict>,
    ) -> Self {
        let baseline_label = baseline_label.into();
        let detections = verdicts
            .iter()
            .enumerate()
            .filter(|(_, v)| v.label != baseline_label)
            .map(|(position, v)| Detection::new(v, position, polled_at))
            .collect();

        Self {
            polled_at,
            baseline_label,
            state,
            skipped_flows: 0,
            verdicts,
            detections,
        }
    }

    pub fn with_skipped(mut self, skipped_flows: usize) -> Self {
        self.skipped_flows = skipped_flows;
        self
    }
}

#[derive(Debug, Default)]
pub struct SnapshotBoard {
    latest: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the previous snapshot.
    ///
    /// Detections still present keep their first `detected_at`.
    pub fn publish(&self, mut snapshot: Snapshot) {
        let mut latest = self.latest.write();

        if let Some(previous) = latest.as_ref() {
            for detection in &mut snapshot.detections {
                if let Some(earlier) = previous.detections.iter().find(|d| d.id == detection.id) {
                    detection.detected_at = earlier.detected_at;
                }
            }
        }

        *latest = Some(Arc::new(snapshot));
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.latest.read().clone()
    }

    pub fn detection(&self, id: Uuid) -> Option<Detection> {
        let snapshot = self.latest()?;
        snapshot.detections.iter().find(|d| d.id == id).cloned()
    }
}
