//! Scripted in-memory transport for tests.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use std::collections::HashMap;
use std::sync::Mutex;

use super::error::TransportError;
use super::transport::{HttpRequest, HttpResponse, Transport};

/// Answers by path (plus query, if any). Unscripted paths get a 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: HashMap<String, Result<HttpResponse, TransportError>>,
    calls: Mutex<Vec<String>>,
    headers: Mutex<Vec<HeaderMap>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, path: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            path.to_string(),
            Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
        );
        self
    }

    pub fn fail(mut self, path: &str, error: TransportError) -> Self {
        self.routes.insert(path.to_string(), Err(error));
        self
    }

    /// Paths requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.headers.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let key = match request.url.query() {
            Some(q) => format!("{}?{}", request.url.path(), q),
            None => request.url.path().to_string(),
        };
        self.calls.lock().unwrap().push(key.clone());
        self.headers.lock().unwrap().push(request.headers.clone());

        self.routes.get(&key).cloned().unwrap_or(Ok(HttpResponse {
            status: 404,
            body: "Not Found".to_string(),
        }))
    }
}
