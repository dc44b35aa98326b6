pub mod probe;
pub mod search;
pub mod types;

use std::any::Any;
use std::panic::AssertUnwindSafe;

use anyhow::Result;
use futures::FutureExt;
use tracing::{debug, warn};

use probe::DirectProbe;
use search::MultiSearch;
use types::{MethodRecord, ProbeOutcome, Resolution, ResultRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Success,
    /// Processing hit a defect; the result carries the all-error fallback.
    Failure(String),
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Success)
    }
}

#[derive(Debug, Clone)]
pub struct ItemReport {
    pub result: ResultRecord,
    pub outcome: ItemOutcome,
}

/// Per-item pipeline: direct probe first, paid search only when probing found nothing.
pub struct MethodProcessor {
    probe: DirectProbe,
    search: MultiSearch,
}

impl MethodProcessor {
    pub fn new(probe: DirectProbe, search: MultiSearch) -> Self {
        Self { probe, search }
    }

    /// Never fails: errors and panics raised while resolving the record are
    /// turned into an all-error result here.
    pub async fn process(&self, record: MethodRecord) -> ItemReport {
        let attempt = AssertUnwindSafe(self.resolve(&record)).catch_unwind().await;

        let failure = match attempt {
            Ok(Ok(resolution)) => {
                return ItemReport {
                    result: ResultRecord::new(record, resolution),
                    outcome: ItemOutcome::Success,
                };
            }
            Ok(Err(e)) => format!("{:#}", e),
            Err(panic) => panic_message(panic.as_ref()),
        };

        warn!(
            name = %record.name,
            method = %record.method_label,
            error = %failure,
            "item failed, recording errors"
        );
        ItemReport {
            result: ResultRecord::failed(record),
            outcome: ItemOutcome::Failure(failure),
        }
    }

    async fn resolve(&self, record: &MethodRecord) -> Result<Resolution> {
        if let ProbeOutcome::Found(link) = self.probe.find(&record.method_link).await? {
            return Ok(Resolution::OpenApi(link));
        }

        debug!(name = %record.name, method = %record.method_label, "falling back to search");
        let outcome = self.search.search_all(record).await?;
        Ok(Resolution::Search(outcome))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic during processing".to_string()
    }
}
