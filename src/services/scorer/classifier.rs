// Text classifier adapter
// Interface to the external AI-text classifier plus an HTTP-backed
// implementation. The classifier is a black box returning a label/score
// pair; transient failures are error values the ensemble recovers from.

use crate::models::ClassifierVerdict;
use reqwest::Client;
use serde::Serialize;
use std::env;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8008/classify";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const WARM_UP_TEXT: &str = "warm-up request, please ignore";

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("classifier error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("malformed classifier response: {0}")]
    InvalidResponse(String),
}

/// Oracle producing an AI-probability verdict for a piece of text.
/// Implementations may suspend on network or model-load latency and may
/// fail transiently; callers treat a failure as "no classifier signal".
#[allow(async_fn_in_trait)]
pub trait TextClassifier {
    async fn classify(&self, text: &str) -> Result<ClassifierVerdict, ClassifierError>;
}

#[derive(Debug, Clone, Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
}

pub struct RemoteClassifier {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl Default for RemoteClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteClassifier {
    pub fn new() -> Self {
        let endpoint =
            env::var("SLOPSIFT_CLASSIFIER_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let api_key = env::var("SLOPSIFT_CLASSIFIER_KEY").ok().filter(|k| !k.trim().is_empty());
        Self::with_endpoint(endpoint, api_key)
    }

    pub fn with_endpoint(endpoint: String, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client, endpoint, api_key }
    }

    /// Eagerly prime the remote model so the first real classification
    /// does not pay the load latency. Best-effort; callers log and move on.
    pub async fn warm_up(&self) -> Result<(), ClassifierError> {
        let started = Instant::now();
        self.call(WARM_UP_TEXT).await?;
        info!(latency_ms = started.elapsed().as_millis() as i64, "classifier warm-up complete");
        Ok(())
    }

    async fn call(&self, text: &str) -> Result<ClassifierVerdict, ClassifierError> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { text });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(%request_id, status = status.as_u16(), "classifier returned error status");
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let verdict: ClassifierVerdict = response
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;

        if !verdict.score.is_finite() || !(0.0..=1.0).contains(&verdict.score) {
            return Err(ClassifierError::InvalidResponse(format!(
                "score {} outside [0, 1]",
                verdict.score
            )));
        }

        info!(
            %request_id,
            latency_ms = started.elapsed().as_millis() as i64,
            label = ?verdict.label,
            "classifier verdict received"
        );
        Ok(verdict)
    }
}

impl TextClassifier for RemoteClassifier {
    async fn classify(&self, text: &str) -> Result<ClassifierVerdict, ClassifierError> {
        self.call(text).await
    }
}
