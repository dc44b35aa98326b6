use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::discovery::ItemOutcome;

/// Emitted once per completed item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEvent {
    pub name: String,
    pub method_label: String,
    pub outcome: ItemOutcome,
    /// At least one usable link came back.
    pub documented: bool,
}

pub trait ItemObserver: Send + Sync {
    fn item_finished(&self, event: &ItemEvent);
}

/// Terminal progress bar with one line per finished item.
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    pub fn new(total: usize) -> Result<Self> {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner} [{elapsed_precise}] methods {pos}/{len} ({percent}%) {wide_msg}",
            )?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Ok(Self { bar })
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("done");
    }
}

impl ItemObserver for ProgressReporter {
    fn item_finished(&self, event: &ItemEvent) {
        let line = format_event(event);
        self.bar.println(line);
        self.bar.set_message(format!("{} {}", event.name, event.method_label));
        self.bar.inc(1);
    }
}

fn format_event(event: &ItemEvent) -> String {
    match &event.outcome {
        ItemOutcome::Success if event.documented => {
            format!("✅ found for {} {}", event.name, event.method_label)
        }
        ItemOutcome::Success => format!(
            "❌ nothing for {} {}: no documentation found",
            event.name, event.method_label
        ),
        ItemOutcome::Failure(error) => {
            format!("❌ error for {} {}: {}", event.name, event.method_label, error)
        }
    }
}
