//! Output formatters

pub mod json;
pub mod markdown;
pub mod terminal;

use crate::app::OutputFormat;
use procurement_core::{BenchmarkRequest, BenchmarkResult, WorkflowResult};

/// Format an analysis result
pub fn format_workflow(result: &WorkflowResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(result),
        OutputFormat::Md => markdown::format_workflow(result),
        OutputFormat::Cli => terminal::format_workflow(result),
    }
}

/// Format a benchmark result
pub fn format_benchmark(
    request: &BenchmarkRequest,
    result: &BenchmarkResult,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Json => json::format_value(result),
        OutputFormat::Md => markdown::format_benchmark(request, result),
        OutputFormat::Cli => terminal::format_benchmark(request, result),
    }
}

/// `$1,234.50`
pub(crate) fn money(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

pub(crate) fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
