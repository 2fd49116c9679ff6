//! Flow Source Adapter
//!
//! HTTP client for the controller's flow-statistics endpoint.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::logic::error::{IdsError, Result};
use crate::models::RawFlow;

/// Anything that can produce the current flow table
pub trait FlowSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<FlowBatch>> + Send;
}

// ============================================================================
// FLOW BATCH
// ============================================================================

/// Flow list from one fetch.
///
/// Records are decoded lazily while iterating; the batch is consumed by
/// iteration, a new snapshot needs a new fetch.
#[derive(Debug)]
pub struct FlowBatch {
    records: Vec<Value>,
}

impl FlowBatch {
    /// Take the `flows` list out of a controller response body
    pub fn from_body(body: Value) -> Result<Self> {
        let Value::Object(mut map) = body else {
            return Err(IdsError::MalformedResponse("response body is not a JSON object".to_string()));
        };

        match map.remove("flows") {
            Some(Value::Array(records)) => Ok(Self { records }),
            Some(_) => Err(IdsError::MalformedResponse("`flows` is not a list".to_string())),
            None => Err(IdsError::MalformedResponse("response has no `flows` field".to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IntoIterator for FlowBatch {
    type Item = Result<RawFlow>;
    type IntoIter = FlowIter;

    fn into_iter(self) -> FlowIter {
        FlowIter {
            inner: self.records.into_iter(),
            position: 0,
        }
    }
}

pub struct FlowIter {
    inner: std::vec::IntoIter<Value>,
    position: usize,
}

impl Iterator for FlowIter {
    type Item = Result<RawFlow>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.inner.next()?;
        let position = self.position;
        self.position += 1;

        Some(serde_json::from_value(record).map_err(|e| {
            IdsError::MalformedResponse(format!("flow #{}: {}", position, e))
        }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for FlowIter {}

// ============================================================================
// CONTROLLER CLIENT
// ============================================================================

/// Controller connection settings
#[derive(Clone)]
pub struct ControllerConfig {
    pub base_url: String,
    pub flows_path: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl fmt::Debug for ControllerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerConfig")
            .field("base_url", &self.base_url)
            .field("flows_path", &self.flows_path)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ControllerConfig {
    pub fn flows_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.flows_path.trim_start_matches('/')
        )
    }
}

/// Basic-auth GET against the controller flow endpoint
pub struct ControllerSource {
    config: ControllerConfig,
    url: String,
    http_client: reqwest::Client,
}

impl ControllerSource {
    pub fn new(config: ControllerConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IdsError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: config.flows_url(),
            config,
            http_client,
        })
    }
}

impl FlowSource for ControllerSource {
    async fn fetch(&self) -> Result<FlowBatch> {
        let response = self
            .http_client
            .get(&self.url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| IdsError::SourceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdsError::SourceUnavailable(format!(
                "controller returned status {}",
                status.as_u16()
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            if e.is_decode() {
                IdsError::MalformedResponse(e.to_string())
            } else {
                IdsError::SourceUnavailable(e.to_string())
            }
        })?;

        let batch = FlowBatch::from_body(body)?;
        tracing::debug!("Fetched {} flows from {}", batch.len(), self.url);
        Ok(batch)
    }
}
