//! Process-wide wiring of providers, caches and the rate limiter

use crate::benchmark::{BenchmarkEngine, BenchmarkRequest, BenchmarkResult, MarketSnapshot};
use crate::cache::TtlCache;
use crate::config::Config;
use crate::enrich::{EnrichmentBundle, EnrichmentEngine};
use crate::error::Result;
use crate::llm::GenerationAdapter;
use crate::rate_limit::MinIntervalLimiter;
use crate::search::{Query, RawHit, SearchOrchestrator, SearchProvider, SearxngProvider};
use crate::workflow::{Coordinator, WorkflowResult};
use std::sync::Arc;

/// Both entry points over one shared set of caches and one search limiter
pub struct Services {
    coordinator: Coordinator,
    benchmark: BenchmarkEngine,
}

impl Services {
    /// Build HTTP-backed providers from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider: Arc<dyn SearchProvider> = Arc::new(SearxngProvider::new(&config.search)?);

        let generation = if config.llm.primary.api_key.is_some() || config.llm.fallback.is_some() {
            Some(Arc::new(GenerationAdapter::from_config(&config.llm)?))
        } else {
            tracing::info!("No generative provider key configured; using template output");
            None
        };

        let enrichment_cache = Arc::new(TtlCache::<EnrichmentBundle>::new(
            config.cache.ttl(),
            config.cache.max_entries,
        ));
        let mut enrichment = EnrichmentEngine::from_config(&config.enrichment, enrichment_cache)?
            .with_risk_policy(config.scoring.risk.clone());
        if let Some(ref adapter) = generation {
            enrichment = enrichment.with_generation(adapter.clone());
        }

        Ok(Self::assemble(provider, enrichment, generation, config))
    }

    /// Build around an explicit search provider and enrichment engine
    pub fn assemble(
        provider: Arc<dyn SearchProvider>,
        enrichment: EnrichmentEngine,
        generation: Option<Arc<GenerationAdapter>>,
        config: &Config,
    ) -> Self {
        let limiter = Arc::new(MinIntervalLimiter::new(config.search.min_interval()));
        let search_cache = Arc::new(TtlCache::<Vec<RawHit>>::new(
            config.cache.ttl(),
            config.cache.max_entries,
        ));
        let search = Arc::new(SearchOrchestrator::new(
            provider,
            limiter,
            search_cache,
            &config.search,
        ));

        let snapshot_cache = Arc::new(TtlCache::<MarketSnapshot>::new(
            config.cache.benchmark_ttl(),
            config.cache.max_entries,
        ));

        Self {
            coordinator: Coordinator::new(
                search.clone(),
                Arc::new(enrichment),
                generation.clone(),
                config.scoring.clone(),
            ),
            benchmark: BenchmarkEngine::new(
                search,
                generation,
                snapshot_cache,
                config.benchmark.clone(),
            ),
        }
    }

    /// Supplier discovery and analysis; never fails
    pub async fn analyze(&self, query: Query) -> WorkflowResult {
        self.coordinator.analyze(query).await
    }

    /// Quote benchmark; fails only on invalid input
    pub async fn benchmark(&self, request: &BenchmarkRequest) -> Result<BenchmarkResult> {
        self.benchmark.benchmark(request).await
    }
}
