use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::mpsc;

use crate::error::{AppError, Result};
use crate::transport::{ApiRequest, Transport};

/// In-memory transport that hands every request to the test.
pub(crate) struct RecordingTransport {
    tx: mpsc::UnboundedSender<ApiRequest>,
    fail: bool,
}

impl RecordingTransport {
    pub(crate) fn new() -> (Self, mpsc::UnboundedReceiver<ApiRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, fail: false }, rx)
    }

    /// Records requests but answers every one with an error.
    pub(crate) fn failing() -> (Self, mpsc::UnboundedReceiver<ApiRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, fail: true }, rx)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: ApiRequest) -> Result<StatusCode> {
        let _ = self.tx.send(request);
        if self.fail {
            return Err(AppError::Transport("connection refused".into()));
        }
        Ok(StatusCode::OK)
    }
}
