//! Live HTTP evaluator.
//!
//! Posts serialized plans to the analysis backend's evaluate endpoints.
//! Calls are blocking: the dashboard contract is one synchronous render pass
//! per interaction, with no retry or partial-result policy. Async callers
//! (the gateway) run the whole pass on a blocking task.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::grid::GridImage;
use crate::plan::{CollectionPlan, ImagePlan};
use crate::{Evaluator, QueryError, Result};

/// Remote evaluator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEvaluatorConfig {
    /// Base URL of the analysis backend, e.g. `https://ee.example.net`.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_sec: u64,
}

impl RemoteEvaluatorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_sec: 30,
        }
    }
}

#[derive(Serialize)]
struct SizeRequest<'a> {
    plan: &'a CollectionPlan,
}

#[derive(Deserialize)]
struct SizeResponse {
    size: usize,
}

#[derive(Serialize)]
struct MetadataRequest<'a> {
    plan: &'a ImagePlan,
    key: &'a str,
}

#[derive(Deserialize)]
struct MetadataResponse {
    value: Option<String>,
}

#[derive(Serialize)]
struct EvaluateRequest<'a> {
    plan: &'a ImagePlan,
}

/// Blocking client for the analysis backend's evaluate endpoints.
pub struct RemoteEvaluator {
    config: RemoteEvaluatorConfig,
    client: reqwest::blocking::Client,
}

impl RemoteEvaluator {
    pub fn new(config: RemoteEvaluatorConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .build()?;
        Ok(Self { config, client })
    }

    fn post<B: Serialize, R: for<'de> Deserialize<'de>>(&self, path: &str, body: &B) -> Result<R> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        debug!(%url, "posting plan to analysis backend");
        let resp = self.client.post(&url).json(body).send()?;
        if !resp.status().is_success() {
            let status = resp.status();
            let message = resp.text().unwrap_or_default();
            return Err(QueryError::Remote(format!("{status}: {message}")));
        }
        Ok(resp.json()?)
    }
}

impl Evaluator for RemoteEvaluator {
    fn collection_size(&self, plan: &CollectionPlan) -> Result<usize> {
        let resp: SizeResponse = self.post("/v1/collection/size", &SizeRequest { plan })?;
        Ok(resp.size)
    }

    fn image_metadata(&self, plan: &ImagePlan, key: &str) -> Result<Option<String>> {
        let resp: MetadataResponse = self.post("/v1/image/metadata", &MetadataRequest { plan, key })?;
        Ok(resp.value)
    }

    fn evaluate_image(&self, plan: &ImagePlan) -> Result<GridImage> {
        self.post("/v1/image/evaluate", &EvaluateRequest { plan })
    }
}
