#[cfg(test)]
pub(crate) mod mock;

use std::error::Error as StdError;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::config::FinderConfig;

const USER_AGENT: &str = concat!("openapi-finder/", env!("CARGO_PKG_VERSION"));

/// Failure of a single request attempt on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("TLS failure: {0}")]
    Tls(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The executor has been closed; nothing may be sent through it anymore.
    #[error("HTTP executor is closed")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Raw request issuing, without admission control or deadlines.
///
/// `head` and `get_status` report the status of the URL itself and never
/// follow redirects. `get` follows redirects and reads the body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn head(&self, url: &str) -> Result<u16, TransportError>;

    /// GET whose body is not needed.
    async fn get_status(&self, url: &str) -> Result<u16, TransportError>;

    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    /// Hook for transports that hold resources beyond their own drop.
    /// Called once by the executor.
    async fn close(&self) {}
}

/// Two clients over one config: status checks must see the candidate's own
/// answer, while provider requests may be redirected.
pub struct ReqwestTransport {
    status_client: reqwest::Client,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &FinderConfig) -> Result<Self> {
        let status_client = client_builder(config)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to create probing HTTP client")?;
        let client = client_builder(config)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            status_client,
            client,
        })
    }
}

fn client_builder(config: &FinderConfig) -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .pool_max_idle_per_host(config.max_concurrent)
        .user_agent(USER_AGENT)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn head(&self, url: &str) -> Result<u16, TransportError> {
        let resp = self.status_client.head(url).send().await.map_err(classify)?;
        Ok(resp.status().as_u16())
    }

    async fn get_status(&self, url: &str) -> Result<u16, TransportError> {
        // dropping the response leaves the body unread
        let resp = self.status_client.get(url).send().await.map_err(classify)?;
        Ok(resp.status().as_u16())
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let resp = self.client.get(url).send().await.map_err(classify)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(classify)?;
        Ok(HttpResponse::new(status, body))
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }

    // rustls errors surface somewhere down the source chain
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        let text = cause.to_string().to_lowercase();
        if text.contains("certificate") || text.contains("tls") {
            return TransportError::Tls(cause.to_string());
        }
        source = cause.source();
    }

    TransportError::Connection(err.to_string())
}

/// Shared request executor: every request waits for a slot in one global
/// admission gate and is bounded by an absolute deadline.
pub struct BoundedExecutor {
    transport: Arc<dyn Transport>,
    gate: Semaphore,
    limit: usize,
    timeout: Duration,
    closed: AtomicBool,
}

impl BoundedExecutor {
    pub fn new(transport: Arc<dyn Transport>, limit: usize, timeout: Duration) -> Self {
        let limit = limit.max(1);
        Self {
            transport,
            gate: Semaphore::new(limit),
            limit,
            timeout,
            closed: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &FinderConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(
            Arc::new(transport),
            config.max_concurrent,
            config.request_timeout,
        ))
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// HEAD request; yields the candidate's own status.
    pub async fn probe(&self, url: &str) -> Result<u16, HttpError> {
        self.admit(self.transport.head(url)).await
    }

    /// Body-less GET; yields the candidate's own status.
    pub async fn confirm(&self, url: &str) -> Result<u16, HttpError> {
        self.admit(self.transport.get_status(url)).await
    }

    /// GET request; yields status and body whatever the status is.
    pub async fn fetch(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.admit(self.transport.get(url)).await
    }

    async fn admit<T>(
        &self,
        request: impl Future<Output = Result<T, TransportError>>,
    ) -> Result<T, HttpError> {
        let _permit = self.gate.acquire().await.map_err(|_| HttpError::Closed)?;
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(TransportError::Timeout.into()),
        }
    }

    /// Close the gate and release the transport. Only the first call has any effect.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("HTTP executor already closed");
            return;
        }
        self.gate.close();
        self.transport.close().await;
        info!(limit = self.limit, "HTTP executor closed");
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
