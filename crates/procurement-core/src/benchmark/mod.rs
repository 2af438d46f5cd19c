//! Competitive benchmarking of a supplier quote
//!
//! Market average, percentile rank, negotiation strategy, a monthly price
//! trend and a buy-timing forecast. Every sub-result is optional: missing
//! market data produces empty fields, never an error.

mod engine;
pub mod pricing;
pub mod timing;
pub mod trends;

pub use engine::{BenchmarkEngine, MarketResearch, MarketSnapshot, ResearchCompetitor};

use crate::error::{ProcurementError, Result};
use serde::{Deserialize, Serialize};

/// Quote to benchmark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRequest {
    pub product: String,
    pub quote: Option<f64>,
    pub quantity: Option<u32>,
    pub location: Option<String>,
}

impl BenchmarkRequest {
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            ..Default::default()
        }
    }

    pub fn with_quote(mut self, quote: f64) -> Self {
        self.quote = Some(quote);
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        let chars = self.product.trim().chars().count();
        if !crate::search::QUERY_TEXT_CHARS.contains(&chars) {
            return Err(ProcurementError::InvalidInput(format!(
                "product must be between 3 and 200 characters (got {})",
                chars
            )));
        }
        if let Some(location) = self.location() {
            if location.chars().count() > crate::search::MAX_LOCATION_CHARS {
                return Err(ProcurementError::InvalidInput(format!(
                    "location must be at most {} characters",
                    crate::search::MAX_LOCATION_CHARS
                )));
            }
        }
        if let Some(quote) = self.quote {
            if !quote.is_finite() || quote <= 0.0 {
                return Err(ProcurementError::InvalidInput(
                    "quote must be a positive amount".to_string(),
                ));
            }
        }
        if self.quantity == Some(0) {
            return Err(ProcurementError::InvalidInput(
                "quantity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Quote relative to the market average
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketPosition {
    AboveMarket,
    AtMarket,
    BelowMarket,
}

/// Competitor standing in the market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitorStanding {
    Leader,
    Challenger,
    Follower,
}

impl CompetitorStanding {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "leader" => CompetitorStanding::Leader,
            "challenger" => CompetitorStanding::Challenger,
            _ => CompetitorStanding::Follower,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    pub price: Option<f64>,
    pub market_position: CompetitorStanding,
    pub strengths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationStrategy {
    pub suggested_counter_offer: Option<f64>,
    pub leverage_points: Vec<String>,
    pub alternative_suppliers: Vec<String>,
    pub risk_factors: Vec<String>,
    pub timeline_recommendation: String,
    pub opening_approach: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// `YYYY-MM`
    pub month: String,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Upward,
    Downward,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Volatility {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalTrends {
    pub price_history: Vec<PricePoint>,
    pub direction: TrendDirection,
    pub volatility: Volatility,
    pub current_position: String,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    BuyNow,
    Wait,
    Monitor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastDirection {
    Up,
    Down,
    Stable,
}

/// Expected price change over a horizon, in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceForecast {
    pub direction: ForecastDirection,
    pub change_pct: f64,
    pub low_pct: f64,
    pub high_pct: f64,
}

impl PriceForecast {
    /// e.g. `+1.2% to +3.4%`
    pub fn range_label(&self) -> String {
        format!("{:+.1}% to {:+.1}%", self.low_pct, self.high_pct)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalWindow {
    /// `YYYY-MM-DD`
    pub start_date: String,
    pub end_date: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsOpportunity {
    pub amount_per_unit: f64,
    /// Per-unit amount times quantity, when the quantity is known
    pub total_potential: Option<f64>,
    pub risk_of_waiting: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingIntelligence {
    pub recommendation: Recommendation,
    pub urgency: Urgency,
    pub forecast_30d: PriceForecast,
    pub forecast_60d: PriceForecast,
    pub optimal_window: OptimalWindow,
    pub savings_opportunity: Option<SavingsOpportunity>,
}

/// Benchmark outcome; absent market data leaves fields empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub market_average_price: Option<f64>,
    pub price_variance_pct: Option<f64>,
    pub market_position: Option<MarketPosition>,
    /// 0–100
    pub percentile_rank: Option<u8>,
    pub key_competitors: Vec<Competitor>,
    pub negotiation_strategy: NegotiationStrategy,
    pub historical_trends: Option<HistoricalTrends>,
    pub timing_intelligence: Option<TimingIntelligence>,
    pub market_insights: Vec<String>,
    pub processing_time_s: f64,
}
