//! Buy-timing forecast from a monthly price series

use super::pricing::{mean, round_cents, std_dev};
use super::{
    ForecastDirection, OptimalWindow, PriceForecast, Recommendation, SavingsOpportunity,
    TimingIntelligence, Urgency, Volatility,
};
use crate::config::BenchmarkConfig;
use chrono::{Duration, NaiveDate};

/// Month-over-month changes, in percent
pub fn monthly_changes(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0] * 100.0)
        .collect()
}

fn forecast(centre: f64, spread: f64, flat_pct: f64) -> PriceForecast {
    let direction = if centre > flat_pct {
        ForecastDirection::Up
    } else if centre < -flat_pct {
        ForecastDirection::Down
    } else {
        ForecastDirection::Stable
    };
    PriceForecast {
        direction,
        change_pct: round_cents(centre),
        low_pct: round_cents(centre - spread / 2.0),
        high_pct: round_cents(centre + spread / 2.0),
    }
}

/// 30- and 60-day forecasts: centred on `m` and `2m`, each ±σ/2
pub fn forecasts(prices: &[f64], config: &BenchmarkConfig) -> Option<(PriceForecast, PriceForecast)> {
    let changes = monthly_changes(prices);
    let m = mean(&changes)?;
    let sigma = std_dev(&changes)?;
    Some((
        forecast(m, sigma, config.forecast_flat_pct),
        forecast(2.0 * m, sigma, config.forecast_flat_pct),
    ))
}

pub fn urgency(forecast_60d: &PriceForecast, volatility: Volatility, config: &BenchmarkConfig) -> Urgency {
    if forecast_60d.change_pct >= config.high_urgency_pct {
        Urgency::High
    } else if forecast_60d.direction == ForecastDirection::Up || volatility == Volatility::High {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}

pub fn recommendation(direction: ForecastDirection, volatility: Volatility) -> Recommendation {
    match direction {
        ForecastDirection::Up => Recommendation::BuyNow,
        ForecastDirection::Down if volatility == Volatility::High => Recommendation::Monitor,
        ForecastDirection::Down => Recommendation::Wait,
        ForecastDirection::Stable => Recommendation::Monitor,
    }
}

pub fn optimal_window(recommendation: Recommendation, urgency: Urgency, today: NaiveDate) -> OptimalWindow {
    let (start, end, reasoning) = match recommendation {
        Recommendation::BuyNow => {
            let days = if urgency == Urgency::High { 7 } else { 14 };
            (
                0,
                days,
                format!(
                    "Prices are forecast to rise; lock in pricing within {} days",
                    days
                ),
            )
        }
        Recommendation::Wait => (
            30,
            60,
            "Prices are forecast to ease; revisit the quote in 30 to 60 days".to_string(),
        ),
        Recommendation::Monitor => (
            0,
            30,
            "No clear price movement expected; review pricing weekly and buy on a dip".to_string(),
        ),
    };
    OptimalWindow {
        start_date: (today + Duration::days(start)).format("%Y-%m-%d").to_string(),
        end_date: (today + Duration::days(end)).format("%Y-%m-%d").to_string(),
        reasoning,
    }
}

/// Savings from following the recommendation, per unit and in total
pub fn savings_opportunity(
    recommendation: Recommendation,
    forecast_60d: &PriceForecast,
    quote: f64,
    market_average: Option<f64>,
    quantity: Option<u32>,
) -> SavingsOpportunity {
    let per_unit = match recommendation {
        Recommendation::BuyNow => quote * forecast_60d.change_pct.max(0.0) / 100.0,
        Recommendation::Wait => quote * (-forecast_60d.change_pct).max(0.0) / 100.0,
        Recommendation::Monitor => market_average.map_or(0.0, |avg| (quote - avg).max(0.0)),
    };
    let risk_of_waiting = match forecast_60d.direction {
        ForecastDirection::Up => format!(
            "High: prices may rise about {:.1}% within 60 days",
            forecast_60d.change_pct
        ),
        ForecastDirection::Down => "Low: prices are forecast to ease".to_string(),
        ForecastDirection::Stable => "Low: prices are expected to hold steady".to_string(),
    };
    SavingsOpportunity {
        amount_per_unit: round_cents(per_unit),
        total_potential: quantity.map(|q| round_cents(per_unit * q as f64)),
        risk_of_waiting,
    }
}

/// Timing intelligence for a series; `None` with fewer than two prices
pub fn analyze(
    prices: &[f64],
    volatility: Volatility,
    quote: Option<f64>,
    market_average: Option<f64>,
    quantity: Option<u32>,
    today: NaiveDate,
    config: &BenchmarkConfig,
) -> Option<TimingIntelligence> {
    let (forecast_30d, forecast_60d) = forecasts(prices, config)?;
    let urgency = urgency(&forecast_60d, volatility, config);
    let recommendation = recommendation(forecast_60d.direction, volatility);

    Some(TimingIntelligence {
        recommendation,
        urgency,
        optimal_window: optimal_window(recommendation, urgency, today),
        savings_opportunity: quote.map(|q| {
            savings_opportunity(recommendation, &forecast_60d, q, market_average, quantity)
        }),
        forecast_30d,
        forecast_60d,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_monthly_changes() {
        assert_eq!(monthly_changes(&[100.0, 110.0, 99.0]), vec![10.0, -10.0]);
        assert!(monthly_changes(&[100.0]).is_empty());
    }

    #[test]
    fn test_forecast_centres_and_ranges() {
        let config = BenchmarkConfig::default();
        // +2% then +4%: m = 3, σ = 1
        let (f30, f60) = forecasts(&[100.0, 102.0, 106.08], &config).unwrap();
        assert_eq!(f30.change_pct, 3.0);
        assert_eq!(f30.low_pct, 2.5);
        assert_eq!(f30.high_pct, 3.5);
        assert_eq!(f30.direction, ForecastDirection::Up);
        assert_eq!(f60.change_pct, 6.0);
        assert_eq!(f60.low_pct, 5.5);
        assert_eq!(f60.high_pct, 6.5);
    }

    #[test]
    fn test_flat_series_is_stable() {
        let config = BenchmarkConfig::default();
        let (f30, f60) = forecasts(&[100.0, 100.0, 100.0], &config).unwrap();
        assert_eq!(f30.direction, ForecastDirection::Stable);
        assert_eq!(f60.direction, ForecastDirection::Stable);
        assert!(forecasts(&[100.0], &config).is_none());
    }

    #[test]
    fn test_urgency_rules() {
        let config = BenchmarkConfig::default();
        let rising_fast = forecast(6.0, 1.0, 1.0);
        let rising = forecast(2.0, 1.0, 1.0);
        let flat = forecast(0.2, 1.0, 1.0);

        assert_eq!(urgency(&rising_fast, Volatility::Low, &config), Urgency::High);
        assert_eq!(urgency(&rising, Volatility::Low, &config), Urgency::Medium);
        assert_eq!(urgency(&flat, Volatility::High, &config), Urgency::Medium);
        assert_eq!(urgency(&flat, Volatility::Low, &config), Urgency::Low);
    }

    #[test]
    fn test_recommendation_rules() {
        assert_eq!(recommendation(ForecastDirection::Up, Volatility::High), Recommendation::BuyNow);
        assert_eq!(recommendation(ForecastDirection::Down, Volatility::Low), Recommendation::Wait);
        assert_eq!(recommendation(ForecastDirection::Down, Volatility::High), Recommendation::Monitor);
        assert_eq!(recommendation(ForecastDirection::Stable, Volatility::Low), Recommendation::Monitor);
    }

    #[test]
    fn test_optimal_window_dates() {
        let window = optimal_window(Recommendation::Wait, Urgency::Low, today());
        assert_eq!(window.start_date, "2024-03-31");
        assert_eq!(window.end_date, "2024-04-30");

        let window = optimal_window(Recommendation::BuyNow, Urgency::High, today());
        assert_eq!(window.start_date, "2024-03-01");
        assert_eq!(window.end_date, "2024-03-08");
    }

    #[test]
    fn test_savings_scale_with_quantity() {
        let falling = forecast(-4.0, 1.0, 1.0);
        let savings = savings_opportunity(Recommendation::Wait, &falling, 500.0, None, Some(100));
        assert_eq!(savings.amount_per_unit, 20.0);
        assert_eq!(savings.total_potential, Some(2000.0));

        let flat = forecast(0.0, 1.0, 1.0);
        let savings = savings_opportunity(Recommendation::Monitor, &flat, 500.0, Some(450.0), None);
        assert_eq!(savings.amount_per_unit, 50.0);
        assert_eq!(savings.total_potential, None);
    }

    #[test]
    fn test_analyze_without_quote_has_no_savings() {
        let config = BenchmarkConfig::default();
        let timing = analyze(
            &[100.0, 103.0, 106.0, 109.0],
            Volatility::Low,
            None,
            None,
            None,
            today(),
            &config,
        )
        .unwrap();
        assert_eq!(timing.recommendation, Recommendation::BuyNow);
        assert_eq!(timing.urgency, Urgency::High);
        assert!(timing.savings_opportunity.is_none());
    }
}
