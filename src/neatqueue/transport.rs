use async_trait::async_trait;
use rand::Rng;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::TransportError;

/// One fully rendered HTTP call.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Capability the probe uses to reach the network.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `reqwest`-backed transport.
///
/// Transport errors, 429 and 5xx responses are retried up to `retries` times
/// per request, sleeping `retry_delay` plus up to 25% jitter in between. The
/// budget applies to each request independently.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
    retries: u32,
    retry_delay: Duration,
}

impl ReqwestTransport {
    pub fn new(retries: u32, retry_delay: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().build()?;
        Ok(ReqwestTransport {
            http,
            retries,
            retry_delay,
        })
    }

    async fn attempt(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let resp = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .timeout(request.timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(classify)?;
        Ok(HttpResponse { status, body })
    }

    fn backoff(&self) -> Duration {
        let base = self.retry_delay.as_millis() as u64;
        let jitter = rand::thread_rng().gen_range(0..=base / 4);
        Duration::from_millis(base + jitter)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut attempt = 0u32;
        loop {
            let result = self.attempt(request).await;
            let retry = match &result {
                Ok(resp) => is_retryable(resp.status),
                Err(_) => true,
            };
            if !retry || attempt >= self.retries {
                return result;
            }
            attempt += 1;
            let delay = self.backoff();
            debug!(
                url = %request.url,
                attempt,
                ?delay,
                "Retrying NeatQueue request"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn is_retryable(status: u16) -> bool {
    status == 429 || status >= 500
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}
