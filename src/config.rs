use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,
    /// GitHub issue search configuration
    pub github: GitHubConfig,
    /// Stack Exchange question search configuration
    pub stackoverflow: StackOverflowConfig,
    /// Onion search and payload limits
    pub search: SearchConfig,
    /// Relevance scoring weights and thresholds
    pub ranking: RankingConfig,
    /// Number of analyzed traces kept in the response cache (0 = disabled)
    pub cache_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Base URL for the GitHub REST API
    pub base_url: String,
    /// Personal access token; unauthenticated search is heavily rate limited.
    pub token: Option<String>,
    /// Issues requested per query
    pub per_page: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            token: None,
            per_page: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackOverflowConfig {
    /// Base URL for the Stack Exchange API
    pub base_url: String,
    /// Optional app key, raises the daily quota
    pub api_key: Option<String>,
    /// Questions requested per query
    pub page_size: u32,
}

impl Default for StackOverflowConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.stackexchange.com/2.3".to_string(),
            api_key: None,
            page_size: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Stop issuing repo query tiers once this many distinct issues are collected.
    pub min_repo_results: usize,
    /// Final payload size after merging both sources.
    pub max_results: usize,
    /// Per-request upstream timeout in seconds (capped at 30).
    pub fetch_timeout_secs: u64,
    /// Accepted trace length bounds, in characters after trimming.
    pub min_input_chars: usize,
    pub max_input_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_repo_results: 5,
            max_results: 15,
            fetch_timeout_secs: 10,
            min_input_chars: 10,
            max_input_chars: 50_000,
        }
    }
}

/// Weights and thresholds used by [`crate::search::ranking`].
///
/// These were tuned by hand against a small set of real traces; they are
/// plain fields so tests and deployments can adjust them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    pub repo_reaction_weight: f64,
    pub repo_overlap_weight: f64,
    pub repo_recency_weight: f64,
    /// Added when an exception-shaped keyword appears in the issue title.
    pub title_bonus: f64,
    /// Added when the issue lives under a trusted organisation.
    pub trusted_org_bonus: f64,
    /// Minimum share of strong keywords an issue must mention.
    pub min_strong_coverage: f64,

    pub qa_engagement_weight: f64,
    pub qa_overlap_weight: f64,
    pub qa_recency_weight: f64,
    pub qa_source_weight: f64,
    /// Added for answered questions with at least one answer.
    pub accepted_bonus: f64,

    /// Age in days at which recency reaches zero.
    pub recency_window_days: i64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            repo_reaction_weight: 0.25,
            repo_overlap_weight: 0.40,
            repo_recency_weight: 0.10,
            title_bonus: 0.30,
            trusted_org_bonus: 0.15,
            min_strong_coverage: 0.5,
            qa_engagement_weight: 0.20,
            qa_overlap_weight: 0.40,
            qa_recency_weight: 0.10,
            qa_source_weight: 0.20,
            accepted_bonus: 0.10,
            recency_window_days: 730,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9000".to_string(),
            github: GitHubConfig::default(),
            stackoverflow: StackOverflowConfig::default(),
            search: SearchConfig::default(),
            ranking: RankingConfig::default(),
            cache_capacity: 256,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("TRACE_SEARCH_BIND_ADDR") {
            config.bind_addr = addr;
        }

        // GitHub
        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            config.github.base_url = url;
        }
        if let Ok(token) = std::env::var("GITHUB_API_TOKEN") {
            if !token.trim().is_empty() {
                config.github.token = Some(token);
            }
        }
        if let Ok(val) = std::env::var("GITHUB_PER_PAGE") {
            if let Ok(v) = val.parse() {
                config.github.per_page = v;
            }
        }

        // Stack Exchange
        if let Ok(url) = std::env::var("STACKOVERFLOW_API_URL") {
            config.stackoverflow.base_url = url;
        }
        if let Ok(key) = std::env::var("STACKOVERFLOW_API_KEY") {
            if !key.trim().is_empty() {
                config.stackoverflow.api_key = Some(key);
            }
        }
        if let Ok(val) = std::env::var("STACKOVERFLOW_PAGE_SIZE") {
            if let Ok(v) = val.parse() {
                config.stackoverflow.page_size = v;
            }
        }

        // Search limits
        if let Ok(val) = std::env::var("TRACE_SEARCH_FETCH_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.search.fetch_timeout_secs = v.min(30); // Cap at 30s
            }
        }
        if let Ok(val) = std::env::var("TRACE_SEARCH_MIN_REPO_RESULTS") {
            if let Ok(v) = val.parse() {
                config.search.min_repo_results = v;
            }
        }
        if let Ok(val) = std::env::var("TRACE_SEARCH_MAX_RESULTS") {
            if let Ok(v) = val.parse() {
                config.search.max_results = v;
            }
        }
        if let Ok(val) = std::env::var("TRACE_SEARCH_MIN_INPUT_CHARS") {
            if let Ok(v) = val.parse() {
                config.search.min_input_chars = v;
            }
        }
        if let Ok(val) = std::env::var("TRACE_SEARCH_MAX_INPUT_CHARS") {
            if let Ok(v) = val.parse() {
                config.search.max_input_chars = v;
            }
        }
        if let Ok(val) = std::env::var("TRACE_SEARCH_CACHE_CAPACITY") {
            if let Ok(v) = val.parse() {
                config.cache_capacity = v;
            }
        }

        config
    }

    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.search.fetch_timeout_secs.clamp(1, 30))
    }
}
