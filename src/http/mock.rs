//! Scripted transport for exercising the executor and the strategies, plus a
//! loopback HTTP server for exercising the real transport.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::{HttpResponse, Transport, TransportError};

type Reply = Result<HttpResponse, TransportError>;
type Handler = Box<dyn Fn(&str) -> Option<Reply> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Head,
    Get,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Unknown URLs answer 404 with an empty body.
#[derive(Default)]
pub(crate) struct MockTransport {
    replies: HashMap<String, Reply>,
    head_statuses: HashMap<String, u16>,
    handler: Option<Handler>,
    panic_on: Vec<String>,
    hang_on: Vec<String>,
    latency: Duration,
    calls: Mutex<Vec<(Method, String)>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    closes: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(url, HttpResponse::new(status, ""))
    }

    pub(crate) fn with_response(mut self, url: &str, response: HttpResponse) -> Self {
        self.replies.insert(url.to_string(), Ok(response));
        self
    }

    /// Override only the HEAD answer for `url`; GETs still use the other replies.
    pub(crate) fn with_head_status(mut self, url: &str, status: u16) -> Self {
        self.head_statuses.insert(url.to_string(), status);
        self
    }

    pub(crate) fn with_failure(mut self, url: &str, err: TransportError) -> Self {
        self.replies.insert(url.to_string(), Err(err));
        self
    }

    /// Consulted before the fixed replies; `None` falls through.
    pub(crate) fn with_handler(
        mut self,
        handler: impl Fn(&str) -> Option<Reply> + Send + Sync + 'static,
    ) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Panic on any URL containing `needle`.
    pub(crate) fn with_panic(mut self, needle: &str) -> Self {
        self.panic_on.push(needle.to_string());
        self
    }

    /// Never answer any URL containing `needle`.
    pub(crate) fn with_hang(mut self, needle: &str) -> Self {
        self.hang_on.push(needle.to_string());
        self
    }

    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn calls(&self) -> Vec<(Method, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn head_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| *m == Method::Head)
            .map(|(_, url)| url)
            .collect()
    }

    pub(crate) fn get_urls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(m, _)| *m == Method::Get)
            .map(|(_, url)| url)
            .collect()
    }

    pub(crate) fn head_calls(&self) -> usize {
        self.head_urls().len()
    }

    pub(crate) fn get_calls(&self) -> usize {
        self.get_urls().len()
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn close_calls(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    async fn answer(&self, method: Method, url: &str) -> Reply {
        self.calls.lock().unwrap().push((method, url.to_string()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.panic_on.iter().any(|needle| url.contains(needle.as_str())) {
            panic!("scripted panic for {}", url);
        }
        if self.hang_on.iter().any(|needle| url.contains(needle.as_str())) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Some(reply) = self.handler.as_ref().and_then(|h| h(url)) {
            return reply;
        }
        self.replies
            .get(url)
            .cloned()
            .unwrap_or_else(|| Ok(HttpResponse::new(404, "")))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn head(&self, url: &str) -> Result<u16, TransportError> {
        let status = self.answer(Method::Head, url).await?.status;
        Ok(self.head_statuses.get(url).copied().unwrap_or(status))
    }

    async fn get_status(&self, url: &str) -> Result<u16, TransportError> {
        Ok(self.answer(Method::Get, url).await?.status)
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.answer(Method::Get, url).await
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Serve HTTP/1.1 on a loopback port. `respond` gets the request method and
/// path and returns the full response; `None` holds the connection without
/// ever answering. HEAD responses are sent without their body.
pub(crate) async fn serve(
    respond: impl Fn(&str, &str) -> Option<String> + Send + Sync + 'static,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let respond = respond.clone();
            tokio::spawn(async move {
                let mut request: Vec<u8> = Vec::new();
                let mut chunk = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&chunk[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&request).into_owned();
                let mut line = head.split_whitespace();
                let method = line.next().unwrap_or_default();
                let path = line.next().unwrap_or_default();

                let Some(mut reply) = (*respond)(method, path) else {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    return;
                };
                if method == "HEAD" {
                    if let Some(end) = reply.find("\r\n\r\n") {
                        reply.truncate(end + 4);
                    }
                }
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

pub(crate) fn response(status: &str, headers: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        headers,
        body.len(),
        body
    )
}

/// Answers `/` with a page and sends every other path there with a 302.
pub(crate) fn redirect_to_root(_method: &str, path: &str) -> Option<String> {
    if path == "/" {
        Some(response("200 OK", "", "home"))
    } else {
        Some(response("302 Found", "Location: /\r\n", ""))
    }
}
