use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::analytics::stats::SubmitStats;
use crate::config::Config;
use crate::document::{to_payload, Document};
use crate::error::{AppError, Result};
use crate::http::{HttpTransport, PermitGate};
use crate::transport::{ApiRequest, Transport};
use crate::utils::time::{elapsed_ms, now_instant, TimeUnit};

pub const DOCUMENT_CREATE_URI: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";

/// Rate-limited client for the document create endpoint.
///
/// Each submission is serialized, waits for a permit from the shared
/// [`PermitGate`], then is dispatched fire-and-forget: the HTTP call runs
/// on a detached task and its outcome never reaches the caller.
///
/// Clones share the same gate, so build one per process and clone it
/// into every call site.
#[derive(Clone)]
pub struct DocumentSubmitter {
    gate: Arc<PermitGate>,
    transport: Arc<dyn Transport>,
    endpoint: Url,
    stats: Arc<SubmitStats>,
}

impl DocumentSubmitter {
    /// At most `request_limit` submissions per window of the default
    /// length in `time_unit`.
    pub fn new(time_unit: TimeUnit, request_limit: usize) -> Result<Self> {
        Self::from_config(&Config::new(time_unit, request_limit))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let gate = PermitGate::new(config.request_limit, config.period())?;
        let transport = HttpTransport::new(config.http_timeout())?;

        info!(
            "Document submitter ready: {} requests per {:?}",
            config.request_limit,
            config.period()
        );

        Self::with_transport(gate, Arc::new(transport))
    }

    pub fn with_transport(gate: PermitGate, transport: Arc<dyn Transport>) -> Result<Self> {
        let endpoint = Url::parse(DOCUMENT_CREATE_URI)
            .map_err(|e| AppError::Init(format!("Invalid endpoint URI: {}", e)))?;

        Ok(Self {
            gate: Arc::new(gate),
            transport,
            endpoint,
            stats: Arc::new(SubmitStats::new()),
        })
    }

    pub async fn create_document(&self, document: &Document) -> Result<()> {
        debug!("Submitting document {}", document.doc_id);
        self.submit(document).await
    }

    /// Serialize `document`, wait for a permit and dispatch it.
    pub async fn submit<D>(&self, document: &D) -> Result<()>
    where
        D: Serialize + ?Sized,
    {
        self.submit_or_cancel(document, std::future::pending()).await
    }

    /// Like [`submit`](Self::submit), but abandons the permit wait with
    /// [`AppError::Cancelled`] once `cancel` resolves. Nothing is sent
    /// for a cancelled submission.
    pub async fn submit_or_cancel<D, C>(&self, document: &D, cancel: C) -> Result<()>
    where
        D: Serialize + ?Sized,
        C: Future<Output = ()>,
    {
        self.stats.inc_submitted();

        let body = to_payload(document).map_err(|e| {
            self.stats.inc_rejected();
            warn!("Document rejected: {}", e);
            e
        })?;

        let start = now_instant();
        if let Err(e) = self.gate.acquire_or_cancel(cancel).await {
            if matches!(e, AppError::Cancelled) {
                self.stats.inc_cancelled();
            }
            debug!("Submission abandoned while waiting for a permit: {}", e);
            return Err(e);
        }
        self.stats.update_wait(elapsed_ms(start));

        self.dispatch(body);
        Ok(())
    }

    /// Fire-and-forget send. The join handle is dropped on purpose; transport
    /// failures are traced at debug level only.
    fn dispatch(&self, body: Vec<u8>) {
        let request = ApiRequest::post_json(self.endpoint.clone(), body);
        let transport = self.transport.clone();

        tokio::spawn(async move {
            match transport.send(request).await {
                Ok(status) => debug!("Document dispatched, status {}", status),
                Err(e) => debug!("Document dispatch failed: {}", e),
            }
        });

        self.stats.inc_dispatched();
    }

    pub fn gate(&self) -> &PermitGate {
        &self.gate
    }

    pub fn stats(&self) -> &SubmitStats {
        &self.stats
    }

    /// Stop the refill timer. Pending and future submissions fail with
    /// [`AppError::GateClosed`].
    pub async fn shutdown(&self) -> Result<()> {
        self.gate.shutdown().await?;
        self.stats.log_stats(self.gate.refills());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use reqwest::header::CONTENT_TYPE;
    use reqwest::Method;
    use tokio::time::sleep;

    use crate::document::tests::sample_document;
    use crate::transport::mock::RecordingTransport;

    const PERIOD: Duration = Duration::from_secs(1);

    type Requests = tokio::sync::mpsc::UnboundedReceiver<ApiRequest>;

    fn submitter(limit: usize) -> (DocumentSubmitter, Requests) {
        let (transport, rx) = RecordingTransport::new();
        let gate = PermitGate::new(limit, PERIOD).unwrap();
        (DocumentSubmitter::with_transport(gate, Arc::new(transport)).unwrap(), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_posts_json_to_endpoint() {
        let (submitter, mut rx) = submitter(3);

        submitter.create_document(&sample_document()).await.unwrap();

        let request = rx.recv().await.unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.uri.as_str(), DOCUMENT_CREATE_URI);
        assert_eq!(request.headers[CONTENT_TYPE], "application/json");

        let body = String::from_utf8(request.body).unwrap();
        assert!(body.contains("\"LP_INTRODUCE_GOODS\""));
        assert_eq!(body.as_bytes(), to_payload(&sample_document()).unwrap());

        sleep(Duration::from_millis(10)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(submitter.stats().dispatched.load(Ordering::Relaxed), 1);
        assert_eq!(submitter.gate().available(), 2);

        submitter.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_submissions_are_throttled_per_window() {
        let (submitter, mut rx) = submitter(2);

        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let submitter = submitter.clone();
                tokio::spawn(async move { submitter.create_document(&sample_document()).await })
            })
            .collect();

        sleep(PERIOD / 2).await;
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());

        sleep(PERIOD).await;
        assert!(rx.try_recv().is_ok());

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // The third submission waited a full window for the refill
        let waited = submitter.stats().last_wait_ms.load(Ordering::Relaxed);
        assert!(waited >= PERIOD.as_millis() as u64, "waited {}ms", waited);
        submitter.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_submission_sends_nothing() {
        let (submitter, mut rx) = submitter(1);
        assert!(submitter.gate().try_acquire());

        let result = submitter
            .submit_or_cancel(&sample_document(), sleep(PERIOD / 4))
            .await;

        assert!(matches!(result, Err(AppError::Cancelled)));
        assert_eq!(submitter.stats().cancelled.load(Ordering::Relaxed), 1);

        sleep(PERIOD).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(submitter.gate().available(), 1);

        submitter.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_serialization_failure_consumes_no_permit() {
        use std::collections::BTreeMap;

        let (submitter, mut rx) = submitter(1);
        let mut bad = BTreeMap::new();
        bad.insert((1u8, 2u8), "x");

        let result = submitter.submit(&bad).await;

        assert!(matches!(result, Err(AppError::Serialization(_))));
        assert_eq!(submitter.gate().available(), 1);
        assert_eq!(submitter.stats().rejected.load(Ordering::Relaxed), 1);
        sleep(Duration::from_millis(10)).await;
        assert!(rx.try_recv().is_err());

        submitter.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_is_not_surfaced() {
        let (transport, mut rx) = RecordingTransport::failing();
        let gate = PermitGate::new(1, PERIOD).unwrap();
        let submitter = DocumentSubmitter::with_transport(gate, Arc::new(transport)).unwrap();

        submitter.create_document(&sample_document()).await.unwrap();

        assert!(rx.recv().await.is_some());
        submitter.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_fails_pending_submission() {
        let (submitter, mut rx) = submitter(1);
        assert!(submitter.gate().try_acquire());

        let pending = {
            let submitter = submitter.clone();
            tokio::spawn(async move { submitter.create_document(&sample_document()).await })
        };

        sleep(PERIOD / 4).await;
        submitter.shutdown().await.unwrap();

        assert!(matches!(pending.await.unwrap(), Err(AppError::GateClosed)));
        assert!(matches!(
            submitter.create_document(&sample_document()).await,
            Err(AppError::GateClosed)
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_new_validates_request_limit() {
        assert!(matches!(
            DocumentSubmitter::new(TimeUnit::Seconds, 0),
            Err(AppError::InvalidCapacity(0))
        ));

        let submitter = DocumentSubmitter::new(TimeUnit::Seconds, 4).unwrap();
        assert_eq!(submitter.gate().capacity(), 4);
        assert_eq!(submitter.gate().period(), Duration::from_secs(5));
        submitter.shutdown().await.unwrap();
    }
}
