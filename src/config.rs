use std::time::Duration;

/// Upper bound on simultaneous outbound requests across the whole batch.
pub const DEFAULT_MAX_CONCURRENT: usize = 20;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://serpapi.com/search.json";

/// Tunable discovery parameters, assembled by the CLI.
#[derive(Debug, Clone)]
pub struct FinderConfig {
    pub max_concurrent: usize,
    pub request_timeout: Duration,
    /// How many items may be inside the pipeline at once.
    pub item_parallelism: usize,
    pub search_endpoint: String,
    pub api_key: String,
    /// Confirm ambiguous HEAD answers (neither 200 nor 404) with a GET.
    pub confirm_with_get: bool,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            item_parallelism: DEFAULT_MAX_CONCURRENT,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            api_key: String::new(),
            confirm_with_get: false,
        }
    }
}
