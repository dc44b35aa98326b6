use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};
use url::{Origin, Url};

use crate::http::{BoundedExecutor, HttpError};

use super::types::ProbeOutcome;

/// Conventional documentation paths, highest priority first.
pub const STANDARD_PATHS: [&str; 6] = [
    "/openapi.json",
    "/openapi.yaml",
    "/swagger.json",
    "/swagger.yaml",
    "/api-docs",
    "/redoc",
];

/// Checks the conventional documentation paths on a method's host.
pub struct DirectProbe {
    executor: Arc<BoundedExecutor>,
    confirm_with_get: bool,
}

impl DirectProbe {
    pub fn new(executor: Arc<BoundedExecutor>, confirm_with_get: bool) -> Self {
        Self {
            executor,
            confirm_with_get,
        }
    }

    /// Try each standard path in order and stop at the first one that answers.
    ///
    /// Transport failures only rule out the candidate at hand. The only error
    /// returned is a closed executor.
    pub async fn find(&self, method_link: &str) -> Result<ProbeOutcome> {
        let Some(base) = base_url(method_link) else {
            debug!(method_link, "no usable host, skipping direct probe");
            return Ok(ProbeOutcome::NotFound);
        };

        for path in STANDARD_PATHS {
            let candidate = format!("{}{}", base, path);
            if self.check(&candidate).await? {
                info!(url = %candidate, "OpenAPI document found");
                return Ok(ProbeOutcome::Found(candidate));
            }
        }

        debug!(base = %base, "no standard documentation path answered");
        Ok(ProbeOutcome::NotFound)
    }

    async fn check(&self, candidate: &str) -> Result<bool, HttpError> {
        let status = match self.executor.probe(candidate).await {
            Ok(status) => status,
            Err(HttpError::Transport(e)) => {
                debug!(url = candidate, error = %e, "HEAD failed");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        match status {
            200 => Ok(true),
            404 => Ok(false),
            other if self.confirm_with_get => {
                debug!(url = candidate, status = other, "confirming with GET");
                match self.executor.confirm(candidate).await {
                    Ok(status) => Ok(status == 200),
                    Err(HttpError::Transport(e)) => {
                        debug!(url = candidate, error = %e, "GET failed");
                        Ok(false)
                    }
                    Err(e) => Err(e),
                }
            }
            other => {
                debug!(url = candidate, status = other, "HEAD rejected");
                Ok(false)
            }
        }
    }
}

/// Scheme, host and port of a link, e.g. `https://api.example.com`.
pub fn base_url(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    url.host_str()?;
    match url.origin() {
        origin @ Origin::Tuple(..) => Some(origin.ascii_serialization()),
        Origin::Opaque(_) => None,
    }
}
