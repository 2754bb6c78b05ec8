use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use super::error::{CandidateFailure, ProbeError};
use super::resources::Shape;
use super::transport::{HttpRequest, Transport};

/// Longest slice of an error body kept in a failure.
const MAX_ERROR_BODY: usize = 200;

/// A rendered candidate endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Path relative to the base URL, for logging
    pub path: String,
    pub url: Url,
}

/// The first candidate that answered with a plausible payload.
#[derive(Debug, Clone)]
pub struct Probed {
    pub endpoint: String,
    pub payload: Value,
}

/// Walks candidate endpoints in order until one answers plausibly.
///
/// Candidates are never retried here and never raced against each other.
/// Retries belong to the transport.
#[derive(Clone)]
pub struct EndpointProbe {
    transport: Arc<dyn Transport>,
    headers: HeaderMap,
    timeout: Duration,
    cancel: CancellationToken,
}

impl EndpointProbe {
    pub fn new(
        transport: Arc<dyn Transport>,
        headers: HeaderMap,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        EndpointProbe {
            transport,
            headers,
            timeout,
            cancel,
        }
    }

    pub async fn probe(
        &self,
        resource: &str,
        candidates: &[Candidate],
        shape: Shape,
    ) -> Result<Probed, ProbeError> {
        let mut last = None;

        for candidate in candidates {
            if self.cancel.is_cancelled() {
                debug!(resource, "Probe cancelled before {}", candidate.path);
                return Err(ProbeError::Cancelled);
            }

            let outcome = match self.fetch(candidate).await {
                Ok((_, payload)) if shape.accepts(&payload) => Ok(payload),
                Ok(_) => Err(CandidateFailure::UnrecognizedShape),
                Err(failure) => Err(failure),
            };

            match outcome {
                Ok(payload) => {
                    info!(resource, endpoint = %candidate.path, "NeatQueue endpoint answered");
                    return Ok(Probed {
                        endpoint: candidate.path.clone(),
                        payload,
                    });
                }
                Err(failure) => {
                    debug!(
                        resource,
                        endpoint = %candidate.path,
                        error = %failure,
                        "Candidate endpoint failed"
                    );
                    last = Some(failure);
                }
            }
        }

        match last {
            Some(last) => Err(ProbeError::Exhausted {
                attempted: candidates.len(),
                last,
            }),
            None => Err(ProbeError::NoCandidates),
        }
    }

    /// Issue one GET and parse the body as JSON. Returns the status with it.
    pub async fn fetch(&self, candidate: &Candidate) -> Result<(u16, Value), CandidateFailure> {
        let request = HttpRequest {
            method: Method::GET,
            url: candidate.url.clone(),
            headers: self.headers.clone(),
            timeout: self.timeout,
        };

        let resp = self.transport.send(&request).await?;
        if !resp.is_success() {
            return Err(CandidateFailure::Status {
                status: resp.status,
                body: resp.body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let payload = serde_json::from_str(&resp.body)
            .map_err(|e| CandidateFailure::InvalidJson(e.to_string()))?;
        Ok((resp.status, payload))
    }
}
