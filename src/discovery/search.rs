use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::http::{BoundedExecutor, HttpError, TransportError};

use super::types::{Engine, MethodRecord, SearchOutcome, SearchQuery, SlotValue};

/// Why a single search query yielded no link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("search provider answered with status {0}")]
    BadStatus(u16),
    #[error("malformed search payload: {0}")]
    MalformedPayload(String),
    #[error("search returned no usable link")]
    EmptyResult,
    #[error("search provider rejected the query: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
enum SlotError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Fallback search against the paid provider: four independent queries per
/// method, two query templates crossed with two engines.
pub struct MultiSearch {
    executor: Arc<BoundedExecutor>,
    endpoint: String,
    api_key: String,
}

impl MultiSearch {
    pub fn new(
        executor: Arc<BoundedExecutor>,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// Run all four queries concurrently. Provider and transport failures
    /// become the error sentinel for their own slot; only a closed executor
    /// or an unusable endpoint is returned as an error.
    pub async fn search_all(&self, record: &MethodRecord) -> Result<SearchOutcome> {
        let [q1, q2, q3, q4] = SearchQuery::for_record(record);
        let (search_method_name, search_method_link, ai_method_name, ai_method_link) =
            futures::try_join!(
                self.run_query(&q1),
                self.run_query(&q2),
                self.run_query(&q3),
                self.run_query(&q4),
            )?;

        let outcome = SearchOutcome {
            search_method_name,
            search_method_link,
            ai_method_name,
            ai_method_link,
        };
        info!(
            name = %record.name,
            method = %record.method_label,
            errors = outcome.error_count(),
            "search fallback finished"
        );
        Ok(outcome)
    }

    async fn run_query(&self, query: &SearchQuery) -> Result<SlotValue> {
        let url = self.request_url(query)?;
        match self.query_link(query.engine, url.as_str()).await {
            Ok(Ok(link)) => {
                debug!(slot = query.slot.field_name(), link = %link, "search hit");
                Ok(SlotValue::Link(link))
            }
            Ok(Err(e)) => {
                debug!(
                    slot = query.slot.field_name(),
                    engine = query.engine.as_param(),
                    query = %query.text,
                    error = %e,
                    "search slot failed"
                );
                Ok(SlotValue::Error)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Outer error: the executor refused the request. Inner error: this slot failed.
    async fn query_link(
        &self,
        engine: Engine,
        url: &str,
    ) -> Result<Result<String, SlotError>, HttpError> {
        let resp = match self.executor.fetch(url).await {
            Ok(resp) => resp,
            Err(HttpError::Transport(e)) => return Ok(Err(e.into())),
            Err(e) => return Err(e),
        };
        if !resp.is_success() {
            return Ok(Err(ProviderError::BadStatus(resp.status).into()));
        }
        Ok(extract_link(engine, &resp.body).map_err(SlotError::from))
    }

    fn request_url(&self, query: &SearchQuery) -> Result<Url> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("api_key", self.api_key.as_str()),
                ("engine", query.engine.as_param()),
                ("q", query.text.as_str()),
            ],
        )?;
        Ok(url)
    }
}

/// Pull the single result link out of a provider payload.
pub fn extract_link(engine: Engine, body: &str) -> Result<String, ProviderError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedPayload(e.to_string()))?;
    if !payload.is_object() {
        return Err(ProviderError::MalformedPayload(
            "expected a JSON object".to_string(),
        ));
    }
    if let Some(err) = payload.get("error") {
        let message = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
        return Err(ProviderError::Rejected(message));
    }

    let link = match engine {
        Engine::Fast => first_link(&payload["organic_results"]),
        Engine::AiAssisted => {
            non_empty(&payload["link"]).or_else(|| first_link(&payload["references"]))
        }
    };
    link.ok_or(ProviderError::EmptyResult)
}

fn first_link(list: &Value) -> Option<String> {
    list.get(0).and_then(|item| non_empty(&item["link"]))
}

fn non_empty(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
