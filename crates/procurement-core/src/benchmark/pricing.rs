//! Price signals and quote positioning

use super::MarketPosition;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DOLLAR_AMOUNT: Regex = Regex::new(
        r"(?i)(?:\$|\bUSD\s?|\bUS\$\s?)(\d{1,3}(?:,\d{3})+|\d+)(\.\d+)?\s?(k\b|thousand\b|million\b|m\b)?"
    )
    .unwrap();
    static ref TRAILING_USD: Regex =
        Regex::new(r"(?i)\b(\d{1,3}(?:,\d{3})+|\d+)(\.\d+)?\s?(?:USD|dollars)\b").unwrap();
}

/// Currency amounts mentioned in free text, in order of appearance
pub fn price_signals(text: &str) -> Vec<f64> {
    let mut found: Vec<(usize, f64)> = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::new();

    for caps in DOLLAR_AMOUNT.captures_iter(text) {
        let whole = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let fraction = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let multiplier = match caps.get(3).map(|m| m.as_str().to_lowercase()) {
            Some(s) if s == "k" || s == "thousand" => 1_000.0,
            Some(s) if s == "m" || s == "million" => 1_000_000.0,
            _ => 1.0,
        };
        if let (Some(value), Some(m)) = (parse_amount(whole, fraction), caps.get(0)) {
            found.push((m.start(), value * multiplier));
            spans.push((m.start(), m.end()));
        }
    }

    for caps in TRAILING_USD.captures_iter(text) {
        let (start, end) = caps.get(0).map_or((0, 0), |m| (m.start(), m.end()));
        // "$40 USD" is one amount
        if spans.iter().any(|(s, e)| start < *e && *s < end) {
            continue;
        }
        let whole = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let fraction = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        if let Some(value) = parse_amount(whole, fraction) {
            found.push((start, value));
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, v)| v).filter(|v| *v > 0.0).collect()
}

fn parse_amount(whole: &str, fraction: &str) -> Option<f64> {
    format!("{}{}", whole.replace(',', ""), fraction)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Drop values outside `[0.1×, 10×]` of the reference
///
/// The reference is the quote when given, otherwise the median of the values.
pub fn filter_outliers(values: &[f64], quote: Option<f64>) -> Vec<f64> {
    let reference = match quote.or_else(|| median(values)) {
        Some(r) if r > 0.0 => r,
        _ => return values.to_vec(),
    };
    values
        .iter()
        .copied()
        .filter(|v| *v >= reference * 0.1 && *v <= reference * 10.0)
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let var = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Percentile rank of `quote` within `values`: `(below + 0.5·equal) / n × 100`
pub fn percentile_rank(quote: f64, values: &[f64]) -> Option<u8> {
    if values.is_empty() || !quote.is_finite() {
        return None;
    }
    let below = values.iter().filter(|v| **v < quote).count() as f64;
    let equal = values.iter().filter(|v| **v == quote).count() as f64;
    let pct = (below + 0.5 * equal) / values.len() as f64 * 100.0;
    Some(pct.round().clamp(0.0, 100.0) as u8)
}

/// `(quote − avg) / avg × 100`
pub fn variance_pct(quote: f64, average: f64) -> Option<f64> {
    if average <= 0.0 {
        return None;
    }
    Some((quote - average) / average * 100.0)
}

pub fn market_position(variance_pct: f64, band_pct: f64) -> MarketPosition {
    if variance_pct > band_pct {
        MarketPosition::AboveMarket
    } else if variance_pct < -band_pct {
        MarketPosition::BelowMarket
    } else {
        MarketPosition::AtMarket
    }
}

/// Counter-offer used when no generated strategy is available
pub fn fallback_counter_offer(quote: f64, average: Option<f64>, position: Option<MarketPosition>) -> f64 {
    match (average, position) {
        (Some(avg), Some(MarketPosition::AboveMarket)) => avg.max(quote * 0.9),
        _ => quote * 0.95,
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
