//! Four-stage supplier analysis pipeline

use super::filter;
use super::state::{Analyzed, Searched, Synthesized};
use super::{MarketInsight, PriceTrend, SupplierProfile, WorkflowResult, WorkflowStage};
use crate::enrich::{build_candidates, extractors, EnrichedCandidate, EnrichmentEngine};
use crate::llm::GenerationAdapter;
use crate::scoring::{confidence_score, ScoringPolicy};
use crate::search::{Query, SearchOrchestrator};
use chrono::Datelike;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

/// Scores at or above this count as high confidence in the summary
pub const HIGH_CONFIDENCE_SCORE: u8 = 80;

/// Suppliers described to the generative adapter
const CONTEXT_SUPPLIERS: usize = 5;

const INSIGHT_SCHEMA: &str = r#"Generate procurement market insights as a JSON object:
{"price_trend": "increasing" | "decreasing" | "stable", "key_factors": ["3-5 key market factors"], "recommendations": ["3-5 procurement recommendations"]}"#;

#[derive(Debug, Deserialize)]
struct InsightDraft {
    #[serde(default)]
    price_trend: Option<String>,
    #[serde(default)]
    key_factors: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
}

/// Owns per-request state and sequences the analysis stages
pub struct Coordinator {
    search: Arc<SearchOrchestrator>,
    enrichment: Arc<EnrichmentEngine>,
    generation: Option<Arc<GenerationAdapter>>,
    scoring: ScoringPolicy,
}

impl Coordinator {
    pub fn new(
        search: Arc<SearchOrchestrator>,
        enrichment: Arc<EnrichmentEngine>,
        generation: Option<Arc<GenerationAdapter>>,
        scoring: ScoringPolicy,
    ) -> Self {
        Self {
            search,
            enrichment,
            generation,
            scoring,
        }
    }

    /// Run the full analysis. Never fails: problems surface in the result.
    pub async fn analyze(&self, query: Query) -> WorkflowResult {
        let start = Instant::now();

        if let Err(e) = query.validate() {
            tracing::warn!("Rejecting query: {}", e);
            return WorkflowResult {
                suppliers: Vec::new(),
                market_insight: MarketInsight::fallback(),
                summary: format!("Analysis could not run: {}", e),
                processing_time_s: elapsed_secs(start),
                stage: WorkflowStage::Failed,
                error: Some(e.to_string()),
            };
        }

        let searched = self.run_search(query).await;
        let analyzed = self.run_analysis(searched).await;
        let synthesized = self.run_insights(analyzed).await;
        let summary = self.run_summary(&synthesized).await;

        let Synthesized { analyzed, insight } = synthesized;
        let processing_time_s = elapsed_secs(start);
        tracing::info!(
            stage = %WorkflowStage::Done,
            suppliers = analyzed.suppliers.len(),
            "Analysis finished in {:.2}s",
            processing_time_s
        );

        WorkflowResult {
            suppliers: analyzed.suppliers,
            market_insight: insight,
            summary,
            processing_time_s,
            stage: WorkflowStage::Done,
            error: None,
        }
    }

    async fn run_search(&self, query: Query) -> Searched {
        tracing::info!(stage = %WorkflowStage::Searching, "Searching for '{}'", query.text);

        match self.search.search(&query).await {
            Ok(hits) => Searched {
                query,
                hits,
                search_error: None,
            },
            Err(e) => {
                tracing::warn!("Search failed, continuing with no candidates: {}", e);
                Searched {
                    query,
                    hits: Vec::new(),
                    search_error: Some(e.to_string()),
                }
            }
        }
    }

    async fn run_analysis(&self, searched: Searched) -> Analyzed {
        tracing::info!(
            stage = %WorkflowStage::Analyzing,
            "Analyzing {} search hits",
            searched.hits.len()
        );

        let candidates = build_candidates(&searched.hits, &searched.query);
        let enriched = self.enrichment.enrich_all(candidates).await;

        let policy = self
            .scoring
            .clone()
            .anchored_at(chrono::Utc::now().year());
        let suppliers = filter::apply(score_suppliers(enriched, &policy), &searched.query);

        Analyzed {
            searched,
            suppliers,
        }
    }

    async fn run_insights(&self, analyzed: Analyzed) -> Synthesized {
        tracing::info!(stage = %WorkflowStage::SynthesizingInsights, "Synthesizing market insights");

        let insight = match self.generation {
            Some(ref adapter) if !analyzed.suppliers.is_empty() => {
                let context = insight_context(&analyzed);
                match adapter.extract::<InsightDraft>(&context, INSIGHT_SCHEMA).await {
                    Ok(draft) => insight_from_draft(draft),
                    Err(e) => {
                        tracing::warn!("Using fallback market insight: {}", e);
                        MarketInsight::fallback()
                    }
                }
            }
            _ => MarketInsight::fallback(),
        };

        Synthesized { analyzed, insight }
    }

    async fn run_summary(&self, synthesized: &Synthesized) -> String {
        tracing::info!(stage = %WorkflowStage::Summarizing, "Writing summary");

        let summary = template_summary(&synthesized.analyzed, &synthesized.insight);
        if synthesized.analyzed.suppliers.is_empty() {
            return summary;
        }

        let Some(ref adapter) = self.generation else {
            return summary;
        };

        let context = format!(
            "Write a two-sentence executive briefing for a procurement team.\n\n{}\nPrice trend: {}\nKey factors: {}\nRecommendations: {}",
            insight_context(&synthesized.analyzed),
            synthesized.insight.price_trend,
            synthesized.insight.key_factors.join("; "),
            synthesized.insight.recommendations.join("; ")
        );
        match adapter.synthesize(&context).await {
            Ok(narrative) => format!("{} {}", summary, narrative),
            Err(e) => {
                tracing::debug!("Summary narrative unavailable: {}", e);
                summary
            }
        }
    }
}

/// Score enriched candidates and order them by confidence, highest first
fn score_suppliers(enriched: Vec<EnrichedCandidate>, policy: &ScoringPolicy) -> Vec<SupplierProfile> {
    let mut suppliers: Vec<SupplierProfile> = enriched
        .into_iter()
        .map(|EnrichedCandidate { candidate, bundle, details }| {
            let score = confidence_score(&candidate, &bundle, policy);
            let described = extractors::certifications(&candidate.description);
            let scraped: &[String] = bundle
                .web_intel
                .as_ref()
                .map(|w| w.certifications.as_slice())
                .unwrap_or(&[]);
            let certifications = extractors::merge_certifications([
                scraped,
                described.as_slice(),
                details.certifications.as_slice(),
            ]);

            SupplierProfile {
                candidate,
                enrichment: bundle,
                confidence_score: score,
                certifications,
                rating: details.rating,
            }
        })
        .collect();

    // Stable: ties keep candidate order
    suppliers.sort_by(|a, b| b.confidence_score.cmp(&a.confidence_score));
    suppliers
}

fn insight_from_draft(draft: InsightDraft) -> MarketInsight {
    let fallback = MarketInsight::fallback();
    let non_empty = |items: Vec<String>| -> Vec<String> {
        items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    };

    let key_factors = non_empty(draft.key_factors);
    let recommendations = non_empty(draft.recommendations);

    MarketInsight {
        price_trend: draft
            .price_trend
            .as_deref()
            .map(PriceTrend::from_label)
            .unwrap_or(PriceTrend::Stable),
        key_factors: if key_factors.is_empty() {
            fallback.key_factors
        } else {
            key_factors
        },
        recommendations: if recommendations.is_empty() {
            fallback.recommendations
        } else {
            recommendations
        },
    }
}

fn insight_context(analyzed: &Analyzed) -> String {
    let query = analyzed.query();
    let mut context = format!("Procurement query: {}\n", query.text);
    if let Some(location) = query.location() {
        context.push_str(&format!("Location: {}\n", location));
    }
    if let Some(category) = query.category() {
        context.push_str(&format!("Category: {}\n", category));
    }
    if let Some(ref timeline) = query.timeline {
        context.push_str(&format!("Timeline: {}\n", timeline));
    }
    if !query.requirements.is_empty() {
        context.push_str(&format!("Requirements: {}\n", query.requirements.join(", ")));
    }

    context.push_str(&format!("Found {} suppliers. Top suppliers:\n", analyzed.suppliers.len()));
    for supplier in analyzed.suppliers.iter().take(CONTEXT_SUPPLIERS) {
        context.push_str(&format!(
            "- {} ({}), confidence {}/100: {}\n",
            supplier.candidate.name,
            supplier.candidate.location,
            supplier.confidence_score,
            supplier.candidate.description
        ));
    }
    context
}

fn template_summary(analyzed: &Analyzed, insight: &MarketInsight) -> String {
    let query = analyzed.query();
    let location = query
        .location()
        .map(|l| format!(" in {}", l))
        .unwrap_or_default();
    let count = analyzed.suppliers.len();

    if count == 0 {
        return format!(
            "No suppliers were found for '{}'{}. Market trend: {}. Try a broader query or a different location.",
            query.text.trim(),
            location,
            insight.price_trend
        );
    }

    let mut summary = format!(
        "Found {} suppliers for '{}'{}. Market trend: {}.",
        count,
        query.text.trim(),
        location,
        insight.price_trend
    );
    let high = analyzed.high_confidence_count(HIGH_CONFIDENCE_SCORE);
    if high > 0 {
        summary.push_str(&format!(" {} high-confidence suppliers identified.", high));
    }
    summary
}

fn elapsed_secs(start: Instant) -> f64 {
    start.elapsed().as_secs_f64().max(f64::MIN_POSITIVE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{EnrichmentBundle, SupplierCandidate, UNKNOWN_LOCATION};

    fn enriched(name: &str, logo: bool) -> EnrichedCandidate {
        EnrichedCandidate {
            candidate: SupplierCandidate {
                name: name.to_string(),
                location: "Houston, TX".to_string(),
                description: "RoHS compliant fittings".to_string(),
                website: Some(format!("https://{}.com", name.to_lowercase())),
                source_urls: vec![],
                contact: None,
            },
            bundle: EnrichmentBundle {
                logo_url: logo.then(|| "logo".to_string()),
                ..Default::default()
            },
            details: crate::enrich::ExtractedDetails {
                certifications: vec!["ISO 9001".to_string(), "rohs".to_string()],
                rating: Some(4.0),
            },
        }
    }

    #[test]
    fn test_scoring_orders_by_score_stably() {
        let policy = ScoringPolicy::default().with_reference_year(2024);
        let suppliers = score_suppliers(
            vec![enriched("Alpha", false), enriched("Beta", true), enriched("Gamma", false)],
            &policy,
        );

        let names: Vec<_> = suppliers.iter().map(|s| s.candidate.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "Alpha", "Gamma"]);
        assert_eq!(suppliers[0].confidence_score, 65);
        assert_eq!(suppliers[1].certifications, vec!["RoHS", "ISO 9001"]);
        assert_eq!(suppliers[1].rating, Some(4.0));
    }

    #[test]
    fn test_draft_fills_gaps_from_fallback() {
        let insight = insight_from_draft(InsightDraft {
            price_trend: Some("Increasing".to_string()),
            key_factors: vec![" ".to_string()],
            recommendations: vec!["Lock in Q3 pricing".to_string()],
        });
        assert_eq!(insight.price_trend, PriceTrend::Increasing);
        assert_eq!(insight.key_factors, vec!["Limited market data available"]);
        assert_eq!(insight.recommendations, vec!["Lock in Q3 pricing"]);
    }

    #[test]
    fn test_template_summary_variants() {
        let searched = Searched {
            query: Query::new("industrial steel").with_location("Texas"),
            hits: vec![],
            search_error: None,
        };
        let empty = Analyzed {
            searched: searched.clone(),
            suppliers: vec![],
        };
        let summary = template_summary(&empty, &MarketInsight::fallback());
        assert!(summary.starts_with("No suppliers were found for 'industrial steel' in Texas."));

        let mut top = score_suppliers(vec![enriched("Beta", true)], &ScoringPolicy::default());
        top[0].confidence_score = 85;
        let mut other = score_suppliers(vec![enriched("Alpha", false)], &ScoringPolicy::default());
        other[0].candidate.location = UNKNOWN_LOCATION.to_string();
        top.extend(other);

        let analyzed = Analyzed {
            searched,
            suppliers: top,
        };
        assert_eq!(
            template_summary(&analyzed, &MarketInsight::fallback()),
            "Found 2 suppliers for 'industrial steel' in Texas. Market trend: stable. 1 high-confidence suppliers identified."
        );
    }
}
