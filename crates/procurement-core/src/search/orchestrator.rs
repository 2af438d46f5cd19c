//! Templated multi-query search with dedupe, spam filtering and ranking

use super::{clean_query, domain_of, normalize_url, Query, RawHit, SearchProvider};
use crate::cache::{cache_key, TtlCache};
use crate::config::SearchConfig;
use crate::error::{with_timeout, ProcurementError, Result};
use crate::rate_limit::MinIntervalLimiter;
use chrono::Datelike;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Phrases marking advertising or marketplace noise
const SPAM_INDICATORS: &[&str] = &[
    "click here",
    "sign up",
    "register now",
    "free download",
    "limited time",
    "special offer",
    "wikipedia",
    "amazon.com",
    "ebay.com",
];

const SUPPLIER_KEYWORDS: &[&str] = &[
    "supplier",
    "manufacturer",
    "vendor",
    "distributor",
    "company",
    "corporation",
    "inc",
    "llc",
    "ltd",
    "wholesale",
    "industrial",
    "factory",
    "producer",
    "exporter",
];

const MARKET_KEYWORDS: &[&str] = &[
    "market",
    "price",
    "pricing",
    "cost",
    "analysis",
    "report",
    "trend",
    "forecast",
    "industry",
    "outlook",
];

const BASE_RELEVANCE: f64 = 0.5;

/// What a batch of hits is for; decides dedupe granularity and keyword boost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HitKind {
    /// One hit per domain, boosted by supplier vocabulary
    Supplier,
    /// One hit per page, boosted by market vocabulary
    Market,
}

impl HitKind {
    fn keywords(self) -> &'static [&'static str] {
        match self {
            HitKind::Supplier => SUPPLIER_KEYWORDS,
            HitKind::Market => MARKET_KEYWORDS,
        }
    }

    fn keyword_boost(self) -> f64 {
        match self {
            HitKind::Supplier => 0.2,
            HitKind::Market => 0.3,
        }
    }

    fn namespace(self) -> &'static str {
        match self {
            HitKind::Supplier => "search",
            HitKind::Market => "market",
        }
    }
}

/// Expands queries into templated variants and merges their results
pub struct SearchOrchestrator {
    provider: Arc<dyn SearchProvider>,
    limiter: Arc<MinIntervalLimiter>,
    cache: Arc<TtlCache<Vec<RawHit>>>,
    templates: Vec<String>,
    max_results: usize,
    results_per_query: usize,
    timeout: Duration,
}

impl SearchOrchestrator {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        limiter: Arc<MinIntervalLimiter>,
        cache: Arc<TtlCache<Vec<RawHit>>>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            provider,
            limiter,
            cache,
            templates: config.templates.clone(),
            max_results: config.max_results,
            results_per_query: config.results_per_query,
            timeout: config.timeout(),
        }
    }

    /// Search for suppliers matching `query`.
    ///
    /// Returns [`ProcurementError::SearchProvider`] only when every variant
    /// failed; a partial failure yields the hits that did arrive.
    pub async fn search(&self, query: &Query) -> Result<Vec<RawHit>> {
        let key = cache_key(
            HitKind::Supplier.namespace(),
            &[Some(query.text.as_str()), query.location(), query.category()],
        );

        if let Some(hits) = self.cache.get(&key) {
            tracing::debug!("Search cache hit for '{}'", query.text);
            return Ok(hits);
        }

        let variants = self.build_queries(query);
        self.cache
            .get_or_try_insert_with(&key, || {
                self.run(variants, &query.text, HitKind::Supplier)
            })
            .await
    }

    /// Search for market pricing data about `product`
    pub async fn search_market(&self, product: &str, location: Option<&str>) -> Result<Vec<RawHit>> {
        let location = location.map(str::trim).filter(|l| !l.is_empty());
        let key = cache_key(HitKind::Market.namespace(), &[Some(product), location]);

        if let Some(hits) = self.cache.get(&key) {
            tracing::debug!("Market search cache hit for '{}'", product);
            return Ok(hits);
        }

        let year = chrono::Utc::now().year();
        let variants = market_queries(product, location, year);
        self.cache
            .get_or_try_insert_with(&key, || self.run(variants, product, HitKind::Market))
            .await
    }

    /// Query variants for a supplier search, in issue order and without duplicates
    pub fn build_queries(&self, query: &Query) -> Vec<String> {
        let term = clean_query(&query.text);
        let mut variants: Vec<String> = self
            .templates
            .iter()
            .map(|template| template.replace("{term}", &term))
            .collect();

        if let Some(category) = query.category() {
            variants.push(format!("{} {} suppliers", term, clean_query(category)));
        }

        if let Some(location) = query.location() {
            for variant in variants.iter_mut() {
                variant.push(' ');
                variant.push_str(location);
            }
        }

        dedupe_strings(variants)
    }

    async fn run(&self, variants: Vec<String>, original: &str, kind: HitKind) -> Result<Vec<RawHit>> {
        tracing::info!(
            "Searching {} with {} query variants via {}",
            original,
            variants.len(),
            self.provider.name()
        );

        // Each variant waits for its own limiter slot, so starts are spaced
        // even though the futures are polled together.
        let calls = variants.iter().map(|variant| async move {
            self.limiter.acquire().await;
            let result = with_timeout(
                self.timeout,
                self.provider.search(variant, self.results_per_query),
            )
            .await;
            (variant, result)
        });
        let outcomes = futures::future::join_all(calls).await;

        let mut hits = Vec::new();
        let mut failures = Vec::new();
        for (variant, outcome) in outcomes {
            match outcome {
                Ok(batch) => hits.extend(batch),
                Err(e) => {
                    tracing::warn!("Search variant '{}' failed: {}", variant, e);
                    failures.push(e.to_string());
                }
            }
        }

        if !variants.is_empty() && failures.len() == variants.len() {
            return Err(ProcurementError::SearchProvider(format!(
                "all {} query variants failed; last error: {}",
                variants.len(),
                failures.last().map(String::as_str).unwrap_or("unknown")
            )));
        }

        let ranked = rank_hits(filter_spam(dedupe_hits(hits, kind)), original, kind);
        let ranked: Vec<RawHit> = ranked.into_iter().take(self.max_results).collect();

        tracing::info!("Search for '{}' returned {} hits", original, ranked.len());
        Ok(ranked)
    }
}

/// Query variants used to gather pricing signals for a product
fn market_queries(product: &str, location: Option<&str>, year: i32) -> Vec<String> {
    let term = clean_query(product);
    let mut variants = vec![
        format!("{} industry average price benchmark {}", term, year),
        format!("{} market pricing analysis", term),
        format!("{} cost comparison supplier pricing", term),
    ];
    if let Some(location) = location {
        variants.push(format!("{} pricing {} market rates", term, location));
    }
    variants
}

fn dedupe_strings(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.to_lowercase()))
        .collect()
}

fn dedupe_hits(hits: Vec<RawHit>, kind: HitKind) -> Vec<RawHit> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|hit| {
            let key = match kind {
                HitKind::Supplier => domain_of(&hit.url).unwrap_or_else(|| normalize_url(&hit.url)),
                HitKind::Market => normalize_url(&hit.url),
            };
            seen.insert(key)
        })
        .collect()
}

fn is_spam(hit: &RawHit) -> bool {
    let content = format!("{} {}", hit.title, hit.snippet).to_lowercase();
    SPAM_INDICATORS.iter().any(|indicator| content.contains(indicator))
        || SPAM_INDICATORS.iter().any(|indicator| hit.url.to_lowercase().contains(indicator))
}

fn filter_spam(hits: Vec<RawHit>) -> Vec<RawHit> {
    hits.into_iter().filter(|hit| !is_spam(hit)).collect()
}

fn relevance(hit: &RawHit, query_terms: &HashSet<String>, kind: HitKind) -> f64 {
    let mut score = BASE_RELEVANCE;

    let content_terms: HashSet<String> = clean_query(&format!("{} {}", hit.title, hit.snippet))
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if kind
        .keywords()
        .iter()
        .any(|keyword| content_terms.iter().any(|term| term.starts_with(keyword)))
    {
        score += kind.keyword_boost();
    }

    if !query_terms.is_empty() {
        let title_terms: HashSet<String> =
            clean_query(&hit.title).split_whitespace().map(str::to_string).collect();
        let snippet_terms: HashSet<String> =
            clean_query(&hit.snippet).split_whitespace().map(str::to_string).collect();

        let title_overlap = query_terms.intersection(&title_terms).count() as f64;
        let snippet_overlap = query_terms.intersection(&snippet_terms).count() as f64;
        score += (title_overlap * 0.3 + snippet_overlap * 0.1) / query_terms.len() as f64;
    }

    score.min(1.0)
}

/// Stable sort by relevance, highest first
fn rank_hits(hits: Vec<RawHit>, original: &str, kind: HitKind) -> Vec<RawHit> {
    let query_terms: HashSet<String> = clean_query(original)
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let mut scored: Vec<(f64, RawHit)> = hits
        .into_iter()
        .map(|hit| (relevance(&hit, &query_terms, kind), hit))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().map(|(_, hit)| hit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn hit(title: &str, url: &str, snippet: &str) -> RawHit {
        RawHit {
            title: title.to_string(),
            url: url.to_string(),
            snippet: snippet.to_string(),
            source: domain_of(url).unwrap_or_default(),
        }
    }

    /// Fails every query containing `fail_marker`, counts every call
    struct RecordingProvider {
        fail_marker: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl RecordingProvider {
        fn new(fail_marker: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                fail_marker,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SearchProvider for RecordingProvider {
        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<RawHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(marker) = self.fail_marker {
                if query.contains(marker) {
                    return Err(ProcurementError::ExternalError("HTTP 502".to_string()));
                }
            }
            let slug = query.replace(' ', "-");
            Ok(vec![
                hit(
                    &format!("Steel Works {} - Supplier", slug),
                    &format!("https://{}.example.com/", slug),
                    "Industrial steel manufacturer",
                ),
                hit("Shared Metals Inc", "https://www.shared-metals.com", "steel supplier"),
            ])
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn orchestrator(provider: Arc<RecordingProvider>, interval_ms: u64) -> SearchOrchestrator {
        let config = SearchConfig {
            url: "http://unused".to_string(),
            min_interval_ms: interval_ms,
            ..SearchConfig::default()
        };
        SearchOrchestrator::new(
            provider,
            Arc::new(MinIntervalLimiter::new(config.min_interval())),
            Arc::new(TtlCache::new(Duration::from_secs(60), 100)),
            &config,
        )
    }

    #[test]
    fn test_build_queries_with_location_and_category() {
        let orch = orchestrator(RecordingProvider::new(None), 0);
        let query = Query::new("Industrial Steel!")
            .with_location("Texas")
            .with_category("metals");

        let variants = orch.build_queries(&query);
        assert_eq!(variants.len(), 6);
        assert_eq!(variants[0], "industrial steel suppliers Texas");
        assert_eq!(variants[3], "certified industrial steel companies Texas");
        assert_eq!(variants[5], "industrial steel metals suppliers Texas");
    }

    #[test]
    fn test_market_queries() {
        let variants = market_queries("Steel Pipes", Some("Ohio"), 2025);
        assert_eq!(variants[0], "steel pipes industry average price benchmark 2025");
        assert_eq!(variants.len(), 4);
        assert_eq!(market_queries("steel pipes", None, 2025).len(), 3);
    }

    #[test]
    fn test_spam_filter() {
        let hits = vec![
            hit("Steel deals - click here", "https://deals.com", ""),
            hit("Steel - Wikipedia", "https://en.wikipedia.org/wiki/Steel", ""),
            hit("Acme Steel", "https://acme.com", "ISO certified steel"),
        ];
        let kept = filter_spam(hits);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "https://acme.com");
    }

    #[test]
    fn test_ranking_prefers_overlap_and_is_stable() {
        let hits = vec![
            hit("Unrelated Page", "https://a.com", "nothing here"),
            hit("Other Page", "https://b.com", "nothing here either"),
            hit("Industrial Steel Supplier", "https://c.com", "industrial steel"),
        ];
        let ranked = rank_hits(hits, "industrial steel", HitKind::Supplier);
        assert_eq!(ranked[0].url, "https://c.com");
        assert_eq!(ranked[1].url, "https://a.com");
        assert_eq!(ranked[2].url, "https://b.com");
    }

    #[test]
    fn test_supplier_dedupe_by_domain() {
        let hits = vec![
            hit("A", "https://www.acme.com/steel", ""),
            hit("A again", "http://acme.com/pipes/", ""),
            hit("B", "https://beta.com", ""),
        ];
        assert_eq!(dedupe_hits(hits.clone(), HitKind::Supplier).len(), 2);
        assert_eq!(dedupe_hits(hits, HitKind::Market).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_keeps_other_results() {
        let provider = RecordingProvider::new(Some("manufacturers"));
        let orch = orchestrator(provider.clone(), 100);

        let hits = orch.search(&Query::new("steel")).await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
        // four succeeding variants each add a unique domain, shared-metals dedupes
        assert_eq!(hits.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_failure_is_search_provider_error() {
        let provider = RecordingProvider::new(Some("steel"));
        let orch = orchestrator(provider.clone(), 100);

        let err = orch.search(&Query::new("steel")).await.unwrap_err();
        assert!(matches!(err, ProcurementError::SearchProvider(_)));

        // errors are not cached: a retry hits the provider again
        let _ = orch.search(&Query::new("steel")).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_hit_skips_provider() {
        let provider = RecordingProvider::new(None);
        let orch = orchestrator(provider.clone(), 100);

        let first = orch.search(&Query::new("Steel").with_location("Texas")).await.unwrap();
        let second = orch
            .search(&Query::new("  steel ").with_location("TEXAS"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_spaced_by_limiter() {
        let provider = RecordingProvider::new(None);
        let orch = orchestrator(provider, 1000);
        let start = tokio::time::Instant::now();

        orch.search(&Query::new("steel")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_results_truncates() {
        let provider = RecordingProvider::new(None);
        let config = SearchConfig {
            url: "http://unused".to_string(),
            max_results: 3,
            min_interval_ms: 0,
            ..SearchConfig::default()
        };
        let orch = SearchOrchestrator::new(
            provider,
            Arc::new(MinIntervalLimiter::new(Duration::ZERO)),
            Arc::new(TtlCache::new(Duration::from_secs(60), 10)),
            &config,
        );

        let hits = orch.search(&Query::new("steel")).await.unwrap();
        assert_eq!(hits.len(), 3);
    }
}
