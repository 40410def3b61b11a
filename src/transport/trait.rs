use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use url::Url;
use crate::error::Result;

/// A fully built outgoing API call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub uri: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiRequest {
    /// POST with a JSON body.
    pub fn post_json(uri: Url, body: Vec<u8>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Self {
            method: Method::POST,
            uri,
            headers,
            body,
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and resolve with the response status
    async fn send(&self, request: ApiRequest) -> Result<StatusCode>;
}
