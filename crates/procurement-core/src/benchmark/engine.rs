//! Benchmark pipeline: market snapshot, positioning, trends and negotiation

use super::pricing::{
    fallback_counter_offer, filter_outliers, market_position, mean, percentile_rank, price_signals,
    round_cents, variance_pct,
};
use super::{
    timing, trends, BenchmarkRequest, BenchmarkResult, Competitor, CompetitorStanding,
    MarketPosition, NegotiationStrategy,
};
use crate::cache::{cache_key, TtlCache};
use crate::config::BenchmarkConfig;
use crate::error::{ProcurementError, Result};
use crate::llm::GenerationAdapter;
use crate::search::{RawHit, SearchOrchestrator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Hits described to the research extraction
const CONTEXT_HITS: usize = 15;

const MAX_COMPETITORS: usize = 5;

const RESEARCH_SCHEMA: &str = r#"Summarize the market research as a JSON object:
{"average_price": <typical unit price as a number, or null>,
 "competitors": [{"name": "<supplier>", "price": <number or null>, "market_position": "leader" | "challenger" | "follower", "strengths": ["..."]}],
 "price_history": [<monthly unit prices, oldest first, up to 6 numbers>],
 "insights": ["3-5 key market insights"]}
Use only figures supported by the text; leave fields empty when unknown."#;

const NEGOTIATION_SCHEMA: &str = r#"Recommend a negotiation strategy as a JSON object:
{"suggested_counter_offer": <number or null>, "leverage_points": ["..."], "alternative_suppliers": ["..."], "risk_factors": ["..."], "timeline_recommendation": "...", "opening_approach": "..."}"#;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchCompetitor {
    pub name: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub market_position: Option<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
}

/// Structured market research extracted from search hits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketResearch {
    #[serde(default)]
    pub average_price: Option<f64>,
    #[serde(default)]
    pub competitors: Vec<ResearchCompetitor>,
    #[serde(default)]
    pub price_history: Vec<f64>,
    #[serde(default)]
    pub insights: Vec<String>,
}

/// Quote-independent market data, cached per product and location
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub price_signals: Vec<f64>,
    pub research: Option<MarketResearch>,
}

impl MarketSnapshot {
    /// Every price observation: snippet amounts, competitor prices and the research estimate
    fn observations(&self) -> Vec<f64> {
        let mut values = self.price_signals.clone();
        if let Some(ref research) = self.research {
            values.extend(research.competitors.iter().filter_map(|c| c.price));
            values.extend(research.average_price);
        }
        values.retain(|v| v.is_finite() && *v > 0.0);
        values
    }
}

#[derive(Debug, Default, Deserialize)]
struct NegotiationDraft {
    #[serde(default)]
    suggested_counter_offer: Option<f64>,
    #[serde(default)]
    leverage_points: Vec<String>,
    #[serde(default)]
    alternative_suppliers: Vec<String>,
    #[serde(default)]
    risk_factors: Vec<String>,
    #[serde(default)]
    timeline_recommendation: String,
    #[serde(default)]
    opening_approach: String,
}

/// Market positioning for a single quote
struct Positioning {
    average: Option<f64>,
    variance_pct: Option<f64>,
    position: Option<MarketPosition>,
    percentile: Option<u8>,
}

pub struct BenchmarkEngine {
    search: Arc<SearchOrchestrator>,
    generation: Option<Arc<GenerationAdapter>>,
    cache: Arc<TtlCache<MarketSnapshot>>,
    config: BenchmarkConfig,
}

impl BenchmarkEngine {
    /// `cache` should be built with the benchmark TTL
    pub fn new(
        search: Arc<SearchOrchestrator>,
        generation: Option<Arc<GenerationAdapter>>,
        cache: Arc<TtlCache<MarketSnapshot>>,
        config: BenchmarkConfig,
    ) -> Self {
        Self {
            search,
            generation,
            cache,
            config,
        }
    }

    /// Benchmark a quote against inferred market pricing.
    ///
    /// Only an invalid request is an error; missing market data leaves the
    /// corresponding fields empty.
    pub async fn benchmark(&self, request: &BenchmarkRequest) -> Result<BenchmarkResult> {
        let start = Instant::now();
        request.validate()?;
        let today = chrono::Local::now().date_naive();

        tracing::info!("Benchmarking '{}'", request.product.trim());
        let snapshot = self.snapshot(request).await;

        let positioning = self.position(&snapshot, request.quote);
        let competitors = snapshot
            .research
            .as_ref()
            .map(|r| competitors_from(&r.competitors))
            .unwrap_or_default();

        let history: &[f64] = snapshot
            .research
            .as_ref()
            .map(|r| r.price_history.as_slice())
            .unwrap_or_default();
        let historical_trends = trends::analyze(history, today, &self.config);
        let timing_intelligence = historical_trends.as_ref().and_then(|t| {
            let series: Vec<f64> = t.price_history.iter().map(|p| p.price).collect();
            timing::analyze(
                &series,
                t.volatility,
                request.quote,
                positioning.average,
                request.quantity,
                today,
                &self.config,
            )
        });

        let negotiation_strategy = self.negotiate(request, &positioning, &competitors).await;
        let market_insights = market_insights(&request.product, snapshot.research.as_ref());

        let processing_time_s = start.elapsed().as_secs_f64().max(f64::MIN_POSITIVE);
        tracing::info!(
            average = ?positioning.average,
            percentile = ?positioning.percentile,
            "Benchmark finished in {:.2}s",
            processing_time_s
        );

        Ok(BenchmarkResult {
            market_average_price: positioning.average,
            price_variance_pct: positioning.variance_pct,
            market_position: positioning.position,
            percentile_rank: positioning.percentile,
            key_competitors: competitors,
            negotiation_strategy,
            historical_trends,
            timing_intelligence,
            market_insights,
            processing_time_s,
        })
    }

    /// Cached market snapshot; an upstream failure yields an empty, uncached snapshot
    async fn snapshot(&self, request: &BenchmarkRequest) -> MarketSnapshot {
        let key = cache_key("benchmark", &[Some(request.product.as_str()), request.location()]);

        let result = self
            .cache
            .get_or_try_insert_with(&key, || self.fetch_snapshot(request))
            .await;
        match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("No market data for '{}': {}", request.product.trim(), e);
                MarketSnapshot::default()
            }
        }
    }

    async fn fetch_snapshot(&self, request: &BenchmarkRequest) -> Result<MarketSnapshot> {
        let product = request.product.trim();
        let hits = self.search.search_market(product, request.location()).await?;
        if hits.is_empty() {
            return Err(ProcurementError::SearchProvider(format!(
                "no market results for '{}'",
                product
            )));
        }

        let price_signals: Vec<f64> = hits
            .iter()
            .flat_map(|hit| price_signals(&format!("{} {}", hit.title, hit.snippet)))
            .collect();
        tracing::debug!(
            "{} market hits, {} price signals for '{}'",
            hits.len(),
            price_signals.len(),
            product
        );

        let research = match self.generation {
            Some(ref adapter) => {
                let context = research_context(product, request.location(), &hits);
                match adapter.extract::<MarketResearch>(&context, RESEARCH_SCHEMA).await {
                    Ok(research) => Some(research),
                    Err(e) => {
                        tracing::warn!("Market research extraction failed: {}", e);
                        None
                    }
                }
            }
            None => None,
        };

        Ok(MarketSnapshot {
            price_signals,
            research,
        })
    }

    fn position(&self, snapshot: &MarketSnapshot, quote: Option<f64>) -> Positioning {
        let observations = filter_outliers(&snapshot.observations(), quote);
        let average = mean(&observations).map(round_cents);

        let variance = match (quote, average) {
            (Some(q), Some(avg)) => variance_pct(q, avg).map(round_cents),
            _ => None,
        };
        Positioning {
            average,
            variance_pct: variance,
            position: variance.map(|v| market_position(v, self.config.position_band_pct)),
            percentile: quote.and_then(|q| percentile_rank(q, &observations)),
        }
    }

    async fn negotiate(
        &self,
        request: &BenchmarkRequest,
        positioning: &Positioning,
        competitors: &[Competitor],
    ) -> NegotiationStrategy {
        let fallback = fallback_strategy(request, positioning);

        let Some(ref adapter) = self.generation else {
            return fallback;
        };
        let context = negotiation_context(request, positioning, competitors);
        match adapter.extract::<NegotiationDraft>(&context, NEGOTIATION_SCHEMA).await {
            Ok(draft) => merge_strategy(draft, fallback),
            Err(e) => {
                tracing::warn!("Negotiation strategy generation failed: {}", e);
                fallback
            }
        }
    }
}

fn competitors_from(research: &[ResearchCompetitor]) -> Vec<Competitor> {
    research
        .iter()
        .filter(|c| !c.name.trim().is_empty())
        .take(MAX_COMPETITORS)
        .map(|c| Competitor {
            name: c.name.trim().to_string(),
            price: c.price.filter(|p| p.is_finite() && *p > 0.0),
            market_position: c
                .market_position
                .as_deref()
                .map(CompetitorStanding::from_label)
                .unwrap_or(CompetitorStanding::Follower),
            strengths: non_blank(&c.strengths),
        })
        .collect()
}

fn market_insights(product: &str, research: Option<&MarketResearch>) -> Vec<String> {
    let insights = research.map(|r| non_blank(&r.insights)).unwrap_or_default();
    if !insights.is_empty() {
        return insights;
    }
    vec![
        format!("Limited market data available for {}", product.trim()),
        "Consider conducting more detailed market research".to_string(),
        "Pricing may vary significantly based on specifications and volume".to_string(),
    ]
}

fn fallback_strategy(request: &BenchmarkRequest, positioning: &Positioning) -> NegotiationStrategy {
    let mut leverage_points = vec![
        "Request volume discount for large orders".to_string(),
        "Negotiate payment terms for better rates".to_string(),
        "Explore long-term contract pricing".to_string(),
    ];
    if let Some(quote) = request.quote {
        let point = match (positioning.position, positioning.average) {
            (Some(MarketPosition::AboveMarket), Some(avg)) => format!(
                "Current quote of ${:.2} is above the market average of ${:.2}",
                quote, avg
            ),
            _ => format!("Current quote of ${:.2} needs market validation", quote),
        };
        leverage_points.insert(0, point);
    }

    let mut risk_factors = Vec::new();
    if positioning.average.is_none() {
        risk_factors.push("Limited market research data available".to_string());
    }
    risk_factors.push("Pricing may vary significantly by region".to_string());

    NegotiationStrategy {
        suggested_counter_offer: request
            .quote
            .map(|q| round_cents(fallback_counter_offer(q, positioning.average, positioning.position))),
        leverage_points,
        alternative_suppliers: vec![
            "Research additional suppliers for comparison".to_string(),
            "Consider regional suppliers for cost savings".to_string(),
        ],
        risk_factors,
        timeline_recommendation: "Allow 2-3 weeks for thorough market comparison".to_string(),
        opening_approach:
            "Start with market research presentation and request for competitive pricing"
                .to_string(),
    }
}

/// Generated fields win; empty ones keep the fallback's
fn merge_strategy(draft: NegotiationDraft, fallback: NegotiationStrategy) -> NegotiationStrategy {
    let or_list = |generated: Vec<String>, default: Vec<String>| {
        let generated = non_blank(&generated);
        if generated.is_empty() {
            default
        } else {
            generated
        }
    };
    let or_text = |generated: String, default: String| {
        if generated.trim().is_empty() {
            default
        } else {
            generated.trim().to_string()
        }
    };

    NegotiationStrategy {
        suggested_counter_offer: draft
            .suggested_counter_offer
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(round_cents)
            .or(fallback.suggested_counter_offer),
        leverage_points: or_list(draft.leverage_points, fallback.leverage_points),
        alternative_suppliers: or_list(draft.alternative_suppliers, fallback.alternative_suppliers),
        risk_factors: or_list(draft.risk_factors, fallback.risk_factors),
        timeline_recommendation: or_text(
            draft.timeline_recommendation,
            fallback.timeline_recommendation,
        ),
        opening_approach: or_text(draft.opening_approach, fallback.opening_approach),
    }
}

fn non_blank(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn research_context(product: &str, location: Option<&str>, hits: &[RawHit]) -> String {
    let mut context = format!(
        "Product: {}\nLocation: {}\n\nMarket research results:\n",
        product,
        location.unwrap_or("Global")
    );
    for hit in hits.iter().take(CONTEXT_HITS) {
        context.push_str(&format!(
            "Source: {}\nTitle: {}\nContent: {}\n\n",
            hit.source, hit.title, hit.snippet
        ));
    }
    context
}

fn negotiation_context(
    request: &BenchmarkRequest,
    positioning: &Positioning,
    competitors: &[Competitor],
) -> String {
    let money = |v: Option<f64>| v.map_or("unknown".to_string(), |v| format!("${:.2}", v));
    let position = match positioning.position {
        Some(MarketPosition::AboveMarket) => "above market",
        Some(MarketPosition::BelowMarket) => "below market",
        Some(MarketPosition::AtMarket) => "at market",
        None => "unknown",
    };
    let names: Vec<&str> = competitors.iter().map(|c| c.name.as_str()).collect();

    format!(
        "Product: {}\nSupplier quote: {}\nQuantity: {}\nLocation: {}\n\
         Market average: {}\nQuote position: {}\nPercentile rank: {}\nKnown competitors: {}",
        request.product.trim(),
        money(request.quote),
        request
            .quantity
            .map_or("not specified".to_string(), |q| q.to_string()),
        request.location().unwrap_or("Global"),
        money(positioning.average),
        position,
        positioning
            .percentile
            .map_or("unknown".to_string(), |p| p.to_string()),
        if names.is_empty() {
            "none identified".to_string()
        } else {
            names.join(", ")
        }
    )
}
