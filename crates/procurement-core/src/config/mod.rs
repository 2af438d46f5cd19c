//! Configuration management

use crate::error::{ProcurementError, Result};
use crate::scoring::ScoringPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Web search provider and query templates
    #[serde(default)]
    pub search: SearchConfig,

    /// Enrichment source endpoints and limits
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Generative text providers
    #[serde(default)]
    pub llm: LLMConfig,

    /// Result cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Confidence scoring weights
    #[serde(default)]
    pub scoring: ScoringPolicy,

    /// Benchmark thresholds
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
}

/// Primary and fallback generative text providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Fast provider tried first
    #[serde(default)]
    pub primary: LLMServiceConfig,

    /// More capable provider used once when the primary fails
    #[serde(default)]
    pub fallback: Option<LLMServiceConfig>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            primary: LLMServiceConfig::default(),
            fallback: LLMServiceConfig::fallback_from_env(),
        }
    }
}

/// OpenAI-compatible chat completion service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL including the API version segment, e.g. `https://api.groq.com/openai/v1`
    #[serde(default = "default_llm_url")]
    pub url: String,

    /// Model name for chat completions
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl LLMServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Fallback provider from environment, present only when configured
    fn fallback_from_env() -> Option<Self> {
        let api_key = std::env::var("PROCUREMENT_FALLBACK_LLM_API_KEY").ok();
        let url = std::env::var("PROCUREMENT_FALLBACK_LLM_URL").ok();
        if api_key.is_none() && url.is_none() {
            return None;
        }

        Some(Self {
            url: url.unwrap_or_else(|| {
                "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
            }),
            model: std::env::var("PROCUREMENT_FALLBACK_LLM_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            api_key,
            timeout_secs: 30,
            temperature: default_temperature(),
            max_tokens: 1500,
        })
    }
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: default_llm_url(),
            model: default_chat_model(),
            api_key: std::env::var("PROCUREMENT_LLM_API_KEY").ok(),
            timeout_secs: default_llm_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_llm_url() -> String {
    std::env::var("PROCUREMENT_LLM_URL").unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string())
}

fn default_chat_model() -> String {
    std::env::var("PROCUREMENT_LLM_MODEL").unwrap_or_else(|_| "llama-3.1-8b-instant".to_string())
}

fn default_llm_timeout() -> u64 {
    15
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    800
}

/// Web search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Base URL of a SearxNG-compatible JSON search endpoint
    #[serde(default = "default_search_url")]
    pub url: String,

    /// Query templates; `{term}` is replaced with the cleaned query text
    #[serde(default = "default_templates")]
    pub templates: Vec<String>,

    /// Maximum hits returned per search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Hits requested from the provider per template
    #[serde(default = "default_results_per_query")]
    pub results_per_query: usize,

    /// Minimum delay between outbound search calls, process-wide
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl SearchConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: default_search_url(),
            templates: default_templates(),
            max_results: default_max_results(),
            results_per_query: default_results_per_query(),
            min_interval_ms: default_min_interval_ms(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_url() -> String {
    std::env::var("PROCUREMENT_SEARCH_URL").unwrap_or_else(|_| "http://localhost:8888".to_string())
}

fn default_templates() -> Vec<String> {
    [
        "{term} suppliers",
        "{term} manufacturers",
        "{term} vendors distributors",
        "certified {term} companies",
        "wholesale {term} suppliers",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_max_results() -> usize {
    20
}

fn default_results_per_query() -> usize {
    5
}

fn default_min_interval_ms() -> u64 {
    1000
}

fn default_search_timeout() -> u64 {
    10
}

/// Enrichment source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Logo CDN base URL; the domain is appended as a path segment
    #[serde(default = "default_logo_url")]
    pub logo_url: String,

    /// Public-company directory base URL
    #[serde(default = "default_financial_url")]
    pub financial_url: String,

    /// Financial lookups are skipped without a key
    #[serde(default)]
    pub financial_api_key: Option<String>,

    /// RDAP bootstrap service base URL
    #[serde(default = "default_rdap_url")]
    pub rdap_url: String,

    /// Per sub-fetch timeout in seconds
    #[serde(default = "default_enrichment_timeout")]
    pub timeout_secs: u64,

    /// Candidates enriched concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            logo_url: default_logo_url(),
            financial_url: default_financial_url(),
            financial_api_key: std::env::var("PROCUREMENT_FINANCIAL_API_KEY").ok(),
            rdap_url: default_rdap_url(),
            timeout_secs: default_enrichment_timeout(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_logo_url() -> String {
    "https://logo.clearbit.com".to_string()
}

fn default_financial_url() -> String {
    "https://financialmodelingprep.com/api/v3".to_string()
}

fn default_rdap_url() -> String {
    "https://rdap.org".to_string()
}

fn default_enrichment_timeout() -> u64 {
    8
}

fn default_concurrency() -> usize {
    4
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for search and enrichment entries
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    /// Entry cap per cache
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// TTL for benchmark market snapshots
    #[serde(default = "default_benchmark_ttl")]
    pub benchmark_ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn benchmark_ttl(&self) -> Duration {
        Duration::from_secs(self.benchmark_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            max_entries: default_max_entries(),
            benchmark_ttl_secs: default_benchmark_ttl(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    30 * 60
}

fn default_max_entries() -> usize {
    1000
}

fn default_benchmark_ttl() -> u64 {
    24 * 60 * 60
}

/// Thresholds for market position, trend classification and timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Quote within ±this percentage of the average counts as at market
    pub position_band_pct: f64,
    /// First-to-last change needed to call a trend upward/downward
    pub trend_threshold_pct: f64,
    /// Coefficient of variation below which volatility is low
    pub volatility_low: f64,
    /// Coefficient of variation below which volatility is medium
    pub volatility_medium: f64,
    /// Forecast centre within ±this percentage is stable
    pub forecast_flat_pct: f64,
    /// 60-day rise at or above which urgency is high
    pub high_urgency_pct: f64,
    /// Points kept in the historical series
    pub history_points: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            position_band_pct: 5.0,
            trend_threshold_pct: 5.0,
            volatility_low: 0.05,
            volatility_medium: 0.15,
            forecast_flat_pct: 1.0,
            high_urgency_pct: 5.0,
            history_points: 6,
        }
    }
}

impl Config {
    /// Load config from default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load config from an explicit path, falling back to defaults when absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    fn validate(&self) -> Result<()> {
        if self.search.templates.is_empty() {
            return Err(ProcurementError::Config(
                "search.templates must not be empty".to_string(),
            ));
        }
        if self.enrichment.concurrency == 0 {
            return Err(ProcurementError::Config(
                "enrichment.concurrency must be at least 1".to_string(),
            ));
        }
        if self.scoring.min_score > self.scoring.max_score {
            return Err(ProcurementError::Config(
                "scoring.min_score must not exceed scoring.max_score".to_string(),
            ));
        }
        Ok(())
    }
}
