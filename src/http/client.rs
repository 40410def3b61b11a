use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::http::pool::create_http_client;
use crate::transport::{ApiRequest, Transport};

/// [`Transport`] backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_http_client(request_timeout)?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<StatusCode> {
        let ApiRequest {
            method,
            uri,
            headers,
            body,
        } = request;

        let start = std::time::Instant::now();
        let response = self
            .client
            .request(method, uri)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Reqwest error: {}", e)))?;

        let status = response.status();
        debug!("API responded {} in {}ms", status, start.elapsed().as_millis());

        Ok(status)
    }
}
