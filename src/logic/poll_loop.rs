//! Polling Loop
//!
//! Sequential fetch → classify → aggregate → publish, once per interval.
//! Transient failures are logged and retried next tick; fatal ones end the
//! loop and bubble up to `main`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::logic::board::{Snapshot, SnapshotBoard};
use crate::logic::decision::NetworkState;
use crate::logic::error::Result;
use crate::logic::features::{FeatureExtractor, FeatureVector};
use crate::logic::pipeline::Pipeline;
use crate::logic::source::FlowSource;

/// Run classification cycles until a fatal error occurs
pub async fn run<S: FlowSource>(
    source: S,
    pipeline: Arc<Pipeline>,
    board: Arc<SnapshotBoard>,
    interval: Duration,
) -> Result<()> {
    tracing::info!(
        "Polling loop started (interval={:?}, baseline={})",
        interval,
        pipeline.policy().baseline_label()
    );

    loop {
        match run_cycle(&source, &pipeline, &board).await {
            Ok(_) => {}
            Err(e) if e.is_fatal() => {
                tracing::error!("Polling loop stopped: {}", e);
                return Err(e);
            }
            Err(e) => tracing::warn!("Poll failed: {}", e),
        }

        tokio::time::sleep(interval).await;
    }
}

/// One fetch-classify-publish cycle
pub async fn run_cycle<S: FlowSource>(
    source: &S,
    pipeline: &Pipeline,
    board: &SnapshotBoard,
) -> Result<NetworkState> {
    let batch = source.fetch().await?;
    let polled_at = Utc::now();

    if batch.is_empty() {
        tracing::info!("No flows");
    }

    let outcome = pipeline.classify_batch(batch)?;
    let state = outcome.state;

    tracing::info!(
        flows = state.total_flows,
        attacks = state.attack_flows,
        skipped = outcome.skipped,
        "Flows: {} | Skipped: {} | Attacks: {} | Status: {}",
        state.total_flows,
        outcome.skipped,
        state.attack_flows,
        state.status
    );

    let snapshot = Snapshot::new(
        polled_at,
        pipeline.policy().baseline_label(),
        state,
        outcome.verdicts,
    )
    .with_skipped(outcome.skipped);

    for detection in &snapshot.detections {
        let flow = &detection.verdict.flow;
        tracing::warn!(
            id = %detection.id,
            src = ?flow.src_addr,
            dst = ?flow.dst_addr,
            dst_port = ?flow.dst_port,
            protocol = ?flow.protocol,
            "Attack {} on {}",
            detection.verdict.label,
            detection.key
        );
    }

    board.publish(snapshot);

    Ok(state)
}

// ============================================================================
// FEATURE DUMP
// ============================================================================

/// Poll and log extracted features without classifying
pub async fn run_feature_dump<S: FlowSource>(
    source: S,
    extractor: &FeatureExtractor,
    interval: Duration,
) -> Result<()> {
    tracing::info!("Feature dump started (interval={:?})", interval);

    loop {
        match feature_cycle(&source, extractor).await {
            Ok(vectors) => {
                for (flow_id, features) in &vectors {
                    tracing::info!(flow_id = ?flow_id, "{}", features.to_log_entry());
                }
                if vectors.is_empty() {
                    tracing::info!("No flows");
                }
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => tracing::warn!("Poll failed: {}", e),
        }

        tokio::time::sleep(interval).await;
    }
}

pub async fn feature_cycle<S: FlowSource>(
    source: &S,
    extractor: &FeatureExtractor,
) -> Result<Vec<(Option<String>, FeatureVector)>> {
    let batch = source.fetch().await?;

    let mut vectors = Vec::with_capacity(batch.len());
    for item in batch {
        match item {
            Ok(flow) => {
                let features = extractor.extract(&flow);
                vectors.push((flow.id, features));
            }
            Err(e) => tracing::warn!("Skipping flow: {}", e),
        }
    }
    Ok(vectors)
}
