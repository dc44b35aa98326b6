use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use tracing::Level;

use crate::config::{FinderConfig, DEFAULT_MAX_CONCURRENT, DEFAULT_SEARCH_ENDPOINT};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "openapi-finder",
    version,
    about = "Find OpenAPI/Swagger documentation for a list of API methods",
    after_help = "Examples:\n  openapi-finder --input input.csv\n  openapi-finder --input methods.json --output data/results"
)]
pub struct Cli {
    /// CSV or JSON file with name, method and method_link fields
    #[arg(long)]
    pub input: PathBuf,

    /// Base name for the output files, without extension
    #[arg(long, default_value = "results")]
    pub output: String,

    /// Search provider API key
    #[arg(long, env = "SERPAPI_KEY", hide_env_values = true)]
    pub serpapi_key: String,

    /// Maximum simultaneous outbound requests
    #[arg(long, env = "FINDER_MAX_CONCURRENT", default_value_t = DEFAULT_MAX_CONCURRENT)]
    pub max_concurrent: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "FINDER_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Methods processed at once (0 = same as --max-concurrent)
    #[arg(long, env = "FINDER_ITEM_PARALLELISM", default_value_t = 0)]
    pub item_parallelism: usize,

    /// Search provider endpoint
    #[arg(long, env = "FINDER_SEARCH_ENDPOINT", default_value = DEFAULT_SEARCH_ENDPOINT)]
    pub search_endpoint: String,

    /// Re-check documentation paths with GET when HEAD is neither 200 nor 404
    #[arg(long, default_value_t = false)]
    pub confirm_with_get: bool,

    /// Increase verbosity. Can be used multiple times (e.g., -v, -vv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn build_config(&self) -> FinderConfig {
        let item_parallelism = if self.item_parallelism == 0 {
            self.max_concurrent
        } else {
            self.item_parallelism
        };
        FinderConfig {
            max_concurrent: self.max_concurrent,
            request_timeout: Duration::from_secs(self.timeout_secs),
            item_parallelism,
            search_endpoint: self.search_endpoint.clone(),
            api_key: self.serpapi_key.clone(),
            confirm_with_get: self.confirm_with_get,
        }
    }

    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}
