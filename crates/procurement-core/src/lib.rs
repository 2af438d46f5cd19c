//! Procurement Core Library
//!
//! Supplier discovery and competitive quote benchmarking.
//!
//! # Features
//! - Templated web search with rate limiting, de-duplication and ranking
//! - Multi-source supplier enrichment (logo, financials, registration, website)
//! - Bounded confidence and risk scoring under a tunable policy
//! - Primary/fallback generative text for extraction and narrative synthesis
//! - Quote benchmarking: market position, price trend and buy-timing forecast
//! - In-memory TTL caches with single-flight population

pub mod benchmark;
pub mod cache;
pub mod config;
pub mod enrich;
pub mod error;
pub mod llm;
pub mod rate_limit;
pub mod scoring;
pub mod search;
pub mod services;
pub mod workflow;

pub use benchmark::{BenchmarkEngine, BenchmarkRequest, BenchmarkResult};
pub use cache::{CacheStats, TtlCache};
pub use config::{
    BenchmarkConfig, CacheConfig, Config, EnrichmentConfig, LLMConfig, LLMServiceConfig,
    SearchConfig,
};
pub use enrich::{EnrichmentBundle, EnrichmentEngine, SupplierCandidate};
pub use error::{ProcurementError, Result};
pub use llm::{ChatMessage, GenerationAdapter, GenerationUnavailable, HttpChatClient, LLMClient};
pub use rate_limit::MinIntervalLimiter;
pub use scoring::{confidence_score, risk_score, RiskPolicy, ScoringPolicy};
pub use search::{Query, RawHit, SearchOrchestrator, SearchProvider, SearxngProvider};
pub use services::Services;
pub use workflow::{
    Coordinator, MarketInsight, PriceTrend, SupplierProfile, WorkflowResult, WorkflowStage,
};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "procurement";
