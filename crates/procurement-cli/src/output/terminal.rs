//! Terminal output formatter

use super::{money, or_dash};
use procurement_core::benchmark::{MarketPosition, Recommendation};
use procurement_core::{BenchmarkRequest, BenchmarkResult, WorkflowResult};

pub fn format_workflow(result: &WorkflowResult) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n\n", result.summary));

    for (rank, supplier) in result.suppliers.iter().enumerate() {
        let candidate = &supplier.candidate;
        output.push_str(&format!(
            "{:>2}. {:>3}% {} ({})\n",
            rank + 1,
            supplier.confidence_score,
            candidate.name,
            candidate.location
        ));
        if let Some(ref website) = candidate.website {
            output.push_str(&format!("      {}\n", website));
        }
        if let Some(ref contact) = candidate.contact {
            output.push_str(&format!("      contact: {}\n", contact));
        }
        if !supplier.certifications.is_empty() {
            output.push_str(&format!("      certified: {}\n", supplier.certifications.join(", ")));
        }
        if let Some(ref risk) = supplier.enrichment.risk {
            output.push_str(&format!("      risk: {}/100\n", risk.risk_score));
        }
    }

    let insight = &result.market_insight;
    output.push_str(&format!("\nMarket trend: {}\n", insight.price_trend));
    for factor in &insight.key_factors {
        output.push_str(&format!("  * {}\n", factor));
    }
    if !insight.recommendations.is_empty() {
        output.push_str("Recommendations:\n");
        for rec in &insight.recommendations {
            output.push_str(&format!("  - {}\n", rec));
        }
    }
    output.push_str(&format!("\n({:.2}s)\n", result.processing_time_s));
    output
}

pub fn format_benchmark(request: &BenchmarkRequest, result: &BenchmarkResult) -> String {
    let mut output = String::new();
    output.push_str(&format!("Benchmark: {}\n\n", request.product.trim()));

    output.push_str(&format!("Quote:           {}\n", or_dash(request.quote.map(money))));
    output.push_str(&format!(
        "Market average:  {}\n",
        or_dash(result.market_average_price.map(money))
    ));
    if let Some(variance) = result.price_variance_pct {
        let position = match result.market_position {
            Some(MarketPosition::AboveMarket) => "above market",
            Some(MarketPosition::BelowMarket) => "below market",
            _ => "at market",
        };
        output.push_str(&format!("Variance:        {:+.1}% ({})\n", variance, position));
    }
    output.push_str(&format!("Percentile:      {}\n", or_dash(result.percentile_rank)));

    if !result.key_competitors.is_empty() {
        output.push_str("\nCompetitors:\n");
        for competitor in &result.key_competitors {
            output.push_str(&format!(
                "  {} {}\n",
                competitor.name,
                competitor.price.map(money).unwrap_or_default()
            ));
        }
    }

    let strategy = &result.negotiation_strategy;
    output.push_str("\nNegotiation:\n");
    if let Some(counter) = strategy.suggested_counter_offer {
        output.push_str(&format!("  Counter-offer: {}\n", money(counter)));
    }
    for point in &strategy.leverage_points {
        output.push_str(&format!("  * {}\n", point));
    }
    output.push_str(&format!("  Timeline: {}\n", strategy.timeline_recommendation));

    if let Some(ref trends) = result.historical_trends {
        output.push_str(&format!(
            "\nTrend: {:?}, volatility {:?}, {}\n",
            trends.direction, trends.volatility, trends.current_position
        ));
    }
    if let Some(ref timing) = result.timing_intelligence {
        let recommendation = match timing.recommendation {
            Recommendation::BuyNow => "BUY NOW",
            Recommendation::Wait => "WAIT",
            Recommendation::Monitor => "MONITOR",
        };
        output.push_str(&format!(
            "Timing: {} ({:?} urgency), 30d {}, 60d {}\n",
            recommendation,
            timing.urgency,
            timing.forecast_30d.range_label(),
            timing.forecast_60d.range_label()
        ));
        output.push_str(&format!(
            "  Window {} to {}: {}\n",
            timing.optimal_window.start_date,
            timing.optimal_window.end_date,
            timing.optimal_window.reasoning
        ));
    }

    if !result.market_insights.is_empty() {
        output.push_str("\nInsights:\n");
        for insight in &result.market_insights {
            output.push_str(&format!("  - {}\n", insight));
        }
    }
    output.push_str(&format!("\n({:.2}s)\n", result.processing_time_s));
    output
}
