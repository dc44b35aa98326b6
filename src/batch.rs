use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use futures::stream::{self, StreamExt};
use tracing::info;

use crate::config::FinderConfig;
use crate::discovery::probe::DirectProbe;
use crate::discovery::search::MultiSearch;
use crate::discovery::types::{MethodRecord, ResultRecord};
use crate::discovery::MethodProcessor;
use crate::http::BoundedExecutor;
use crate::progress::{ItemEvent, ItemObserver};

pub struct BatchReport {
    /// One entry per input record, in completion order.
    pub results: Vec<ResultRecord>,
    pub succeeded: usize,
    pub failed: usize,
}

/// Fans the item pipeline out over a batch. All items share one executor,
/// so the request cap is global to the run.
pub struct BatchCoordinator {
    processor: MethodProcessor,
    executor: Arc<BoundedExecutor>,
    item_parallelism: usize,
}

impl BatchCoordinator {
    pub fn new(
        processor: MethodProcessor,
        executor: Arc<BoundedExecutor>,
        item_parallelism: usize,
    ) -> Self {
        Self {
            processor,
            executor,
            item_parallelism: item_parallelism.max(1),
        }
    }

    pub fn from_config(config: &FinderConfig) -> Result<Self> {
        let executor = Arc::new(BoundedExecutor::from_config(config)?);
        Ok(Self::with_executor(executor, config))
    }

    /// Wire the strategies onto an existing executor.
    pub fn with_executor(executor: Arc<BoundedExecutor>, config: &FinderConfig) -> Self {
        let processor = MethodProcessor::new(
            DirectProbe::new(executor.clone(), config.confirm_with_get),
            MultiSearch::new(
                executor.clone(),
                config.search_endpoint.clone(),
                config.api_key.clone(),
            ),
        );
        Self::new(processor, executor, config.item_parallelism)
    }

    /// Process every record and release the executor once all of them are done.
    pub async fn run(self, records: Vec<MethodRecord>, observer: &dyn ItemObserver) -> BatchReport {
        let total = records.len();
        let started = Instant::now();
        info!(
            total,
            request_limit = self.executor.limit(),
            item_parallelism = self.item_parallelism,
            "Starting discovery batch"
        );

        let processor = &self.processor;
        let mut pending = stream::iter(records)
            .map(|record| processor.process(record))
            .buffer_unordered(self.item_parallelism);

        let mut results = Vec::with_capacity(total);
        let mut failed = 0;
        while let Some(report) = pending.next().await {
            let event = ItemEvent {
                name: report.result.method.name.clone(),
                method_label: report.result.method.method_label.clone(),
                outcome: report.outcome.clone(),
                documented: report.result.is_documented(),
            };
            // failures were already logged by the processor
            if event.outcome.is_success() {
                info!(
                    name = %event.name,
                    method = %event.method_label,
                    documented = event.documented,
                    "item done"
                );
            } else {
                failed += 1;
            }
            observer.item_finished(&event);
            results.push(report.result);
        }
        drop(pending);

        self.executor.close().await;

        let succeeded = results.len() - failed;
        info!(
            total,
            succeeded,
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Discovery batch complete"
        );
        BatchReport {
            results,
            succeeded,
            failed,
        }
    }
}
