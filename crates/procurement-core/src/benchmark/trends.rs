//! Monthly price series analysis

use super::pricing::{mean, std_dev};
use super::{HistoricalTrends, PricePoint, TrendDirection, Volatility};
use crate::config::BenchmarkConfig;
use chrono::{Datelike, NaiveDate};

/// Label the last `config.history_points` prices with months ending at `today`
///
/// Prices are oldest first; non-positive values are dropped.
pub fn price_history(prices: &[f64], today: NaiveDate, config: &BenchmarkConfig) -> Vec<PricePoint> {
    let valid: Vec<f64> = prices
        .iter()
        .copied()
        .filter(|p| p.is_finite() && *p > 0.0)
        .collect();
    let keep = valid.len().min(config.history_points);
    let tail = &valid[valid.len() - keep..];

    tail.iter()
        .enumerate()
        .map(|(i, price)| PricePoint {
            month: month_label(today, (keep - 1 - i) as i32),
            price: *price,
        })
        .collect()
}

fn month_label(today: NaiveDate, months_back: i32) -> String {
    let index = today.year() * 12 + today.month0() as i32 - months_back;
    format!("{:04}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1)
}

/// First-to-last change, in percent
pub fn overall_change_pct(prices: &[f64]) -> Option<f64> {
    let first = *prices.first()?;
    let last = *prices.last()?;
    if prices.len() < 2 || first <= 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

pub fn direction(prices: &[f64], threshold_pct: f64) -> TrendDirection {
    match overall_change_pct(prices) {
        Some(c) if c > threshold_pct => TrendDirection::Upward,
        Some(c) if c < -threshold_pct => TrendDirection::Downward,
        _ => TrendDirection::Stable,
    }
}

/// Coefficient of variation of the series
pub fn coefficient_of_variation(prices: &[f64]) -> Option<f64> {
    let avg = mean(prices)?;
    if avg <= 0.0 {
        return None;
    }
    Some(std_dev(prices)? / avg)
}

pub fn volatility(prices: &[f64], config: &BenchmarkConfig) -> Volatility {
    match coefficient_of_variation(prices) {
        Some(cv) if cv < config.volatility_low => Volatility::Low,
        Some(cv) if cv < config.volatility_medium => Volatility::Medium,
        Some(_) => Volatility::High,
        None => Volatility::Low,
    }
}

/// Where the latest price sits in the series range
fn current_position(prices: &[f64]) -> String {
    let last = prices.last().copied().unwrap_or_default();
    let max = prices.iter().copied().fold(f64::MIN, f64::max);
    let min = prices.iter().copied().fold(f64::MAX, f64::min);
    let months = prices.len();

    if max - min <= f64::EPSILON {
        format!("flat at {:.2} over {} months", last, months)
    } else if last >= max * 0.98 {
        format!("near the {}-month high", months)
    } else if last <= min * 1.02 {
        format!("near the {}-month low", months)
    } else {
        format!("mid-range of the {}-month band", months)
    }
}

/// Trend summary for a monthly series; `None` with fewer than two points
pub fn analyze(prices: &[f64], today: NaiveDate, config: &BenchmarkConfig) -> Option<HistoricalTrends> {
    let history = price_history(prices, today, config);
    if history.len() < 2 {
        return None;
    }
    let series: Vec<f64> = history.iter().map(|p| p.price).collect();

    let direction = direction(&series, config.trend_threshold_pct);
    let volatility = volatility(&series, config);
    let change = overall_change_pct(&series).unwrap_or_default();
    let cv = coefficient_of_variation(&series).unwrap_or_default();

    let mut insights = Vec::new();
    match direction {
        TrendDirection::Upward => insights.push(format!(
            "Prices rose {:.1}% over the last {} months",
            change,
            series.len()
        )),
        TrendDirection::Downward => insights.push(format!(
            "Prices fell {:.1}% over the last {} months",
            change.abs(),
            series.len()
        )),
        TrendDirection::Stable => insights.push(format!(
            "Prices held within {:.1}% over the last {} months",
            config.trend_threshold_pct,
            series.len()
        )),
    }
    let volatility_label = match volatility {
        Volatility::Low => "low",
        Volatility::Medium => "moderate",
        Volatility::High => "high",
    };
    insights.push(format!(
        "Month-to-month volatility is {} (coefficient of variation {:.1}%)",
        volatility_label,
        cv * 100.0
    ));

    Some(HistoricalTrends {
        current_position: current_position(&series),
        price_history: history,
        direction,
        volatility,
        insights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_history_keeps_last_points_and_labels_months() {
        let config = BenchmarkConfig::default();
        let prices = [90.0, 95.0, 100.0, 101.0, 102.0, 104.0, 108.0, 110.0];
        let history = price_history(&prices, day(2024, 2, 15), &config);

        assert_eq!(history.len(), 6);
        assert_eq!(history[0].price, 100.0);
        assert_eq!(history[0].month, "2023-09");
        assert_eq!(history[5].month, "2024-02");
        assert_eq!(history[5].price, 110.0);
    }

    #[test]
    fn test_history_drops_invalid_prices() {
        let config = BenchmarkConfig::default();
        let history = price_history(&[0.0, -3.0, f64::NAN, 100.0], day(2024, 1, 1), &config);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].month, "2024-01");
    }

    #[test]
    fn test_direction_threshold() {
        assert_eq!(direction(&[100.0, 104.0], 5.0), TrendDirection::Stable);
        assert_eq!(direction(&[100.0, 106.0], 5.0), TrendDirection::Upward);
        assert_eq!(direction(&[100.0, 90.0], 5.0), TrendDirection::Downward);
        assert_eq!(direction(&[100.0], 5.0), TrendDirection::Stable);
    }

    #[test]
    fn test_volatility_buckets() {
        let config = BenchmarkConfig::default();
        assert_eq!(volatility(&[100.0, 101.0, 99.0, 100.0], &config), Volatility::Low);
        assert_eq!(volatility(&[100.0, 110.0, 90.0, 100.0], &config), Volatility::Medium);
        assert_eq!(volatility(&[100.0, 150.0, 60.0, 120.0], &config), Volatility::High);
    }

    #[test]
    fn test_analyze_rising_series() {
        let config = BenchmarkConfig::default();
        let trends = analyze(
            &[100.0, 102.0, 104.0, 106.0, 108.0, 110.0],
            day(2024, 6, 1),
            &config,
        )
        .unwrap();

        assert_eq!(trends.direction, TrendDirection::Upward);
        assert_eq!(trends.volatility, Volatility::Low);
        assert_eq!(trends.current_position, "near the 6-month high");
        assert!(trends.insights[0].starts_with("Prices rose 10.0%"));
    }

    #[test]
    fn test_analyze_needs_two_points() {
        let config = BenchmarkConfig::default();
        assert!(analyze(&[100.0], day(2024, 6, 1), &config).is_none());
        assert!(analyze(&[], day(2024, 6, 1), &config).is_none());
    }
}
