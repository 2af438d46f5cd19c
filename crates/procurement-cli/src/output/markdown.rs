//! Markdown output formatter

use super::{money, or_dash};
use procurement_core::{BenchmarkRequest, BenchmarkResult, WorkflowResult};

pub fn format_workflow(result: &WorkflowResult) -> String {
    let mut output = String::from("# Supplier Analysis\n\n");
    output.push_str(&format!("{}\n\n", result.summary));

    if !result.suppliers.is_empty() {
        output.push_str("| # | Supplier | Location | Score | Website |\n");
        output.push_str("|---|----------|----------|-------|---------|\n");
        for (rank, supplier) in result.suppliers.iter().enumerate() {
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                rank + 1,
                escape(&supplier.candidate.name),
                escape(&supplier.candidate.location),
                supplier.confidence_score,
                or_dash(supplier.candidate.website.as_deref())
            ));
        }
        output.push('\n');
    }

    let insight = &result.market_insight;
    output.push_str(&format!("## Market\n\nPrice trend: **{}**\n\n", insight.price_trend));
    for factor in &insight.key_factors {
        output.push_str(&format!("- {}\n", factor));
    }
    if !insight.recommendations.is_empty() {
        output.push_str("\n### Recommendations\n\n");
        for rec in &insight.recommendations {
            output.push_str(&format!("- {}\n", rec));
        }
    }
    output
}

pub fn format_benchmark(request: &BenchmarkRequest, result: &BenchmarkResult) -> String {
    let mut output = format!("# Benchmark: {}\n\n", request.product.trim());

    output.push_str("| Metric | Value |\n|--------|-------|\n");
    output.push_str(&format!("| Quote | {} |\n", or_dash(request.quote.map(money))));
    output.push_str(&format!(
        "| Market average | {} |\n",
        or_dash(result.market_average_price.map(money))
    ));
    output.push_str(&format!(
        "| Variance | {} |\n",
        or_dash(result.price_variance_pct.map(|v| format!("{:+.1}%", v)))
    ));
    output.push_str(&format!("| Percentile | {} |\n\n", or_dash(result.percentile_rank)));

    let strategy = &result.negotiation_strategy;
    output.push_str("## Negotiation\n\n");
    if let Some(counter) = strategy.suggested_counter_offer {
        output.push_str(&format!("Suggested counter-offer: **{}**\n\n", money(counter)));
    }
    for point in &strategy.leverage_points {
        output.push_str(&format!("- {}\n", point));
    }
    output.push_str(&format!("\n{}\n", strategy.opening_approach));

    if let Some(ref timing) = result.timing_intelligence {
        output.push_str(&format!(
            "\n## Timing\n\n{:?} ({:?} urgency). Buy between {} and {}: {}\n",
            timing.recommendation,
            timing.urgency,
            timing.optimal_window.start_date,
            timing.optimal_window.end_date,
            timing.optimal_window.reasoning
        ));
    }

    if !result.market_insights.is_empty() {
        output.push_str("\n## Insights\n\n");
        for insight in &result.market_insights {
            output.push_str(&format!("- {}\n", insight));
        }
    }
    output
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|")
}
