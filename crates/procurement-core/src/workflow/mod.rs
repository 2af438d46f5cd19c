//! Supplier analysis workflow
//!
//! `SEARCHING → ANALYZING → SYNTHESIZING_INSIGHTS → SUMMARIZING → DONE`.
//! Each stage consumes the previous stage's record and produces a new one;
//! upstream failures degrade to empty or fallback values. Only malformed input
//! ends in `FAILED`.

mod coordinator;
pub mod filter;
mod state;

pub use coordinator::Coordinator;
pub use state::{Analyzed, Searched, Synthesized};

use crate::enrich::{EnrichmentBundle, SupplierCandidate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStage {
    Searching,
    Analyzing,
    SynthesizingInsights,
    Summarizing,
    Done,
    Failed,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::Searching => "SEARCHING",
            WorkflowStage::Analyzing => "ANALYZING",
            WorkflowStage::SynthesizingInsights => "SYNTHESIZING_INSIGHTS",
            WorkflowStage::Summarizing => "SUMMARIZING",
            WorkflowStage::Done => "DONE",
            WorkflowStage::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Enriched, scored supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierProfile {
    #[serde(flatten)]
    pub candidate: SupplierCandidate,
    #[serde(flatten)]
    pub enrichment: EnrichmentBundle,
    /// 30–95
    pub confidence_score: u8,
    pub certifications: Vec<String>,
    pub rating: Option<f64>,
}

/// Direction of market prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    Increasing,
    Decreasing,
    Stable,
}

impl PriceTrend {
    /// Read a free-form trend label; anything unrecognised is stable
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        if label.starts_with("increas") || label.starts_with("rising") || label == "up" {
            PriceTrend::Increasing
        } else if label.starts_with("decreas") || label.starts_with("falling") || label == "down" {
            PriceTrend::Decreasing
        } else {
            PriceTrend::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTrend::Increasing => "increasing",
            PriceTrend::Decreasing => "decreasing",
            PriceTrend::Stable => "stable",
        }
    }
}

impl fmt::Display for PriceTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synthesized market view for the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInsight {
    pub price_trend: PriceTrend,
    pub key_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

impl MarketInsight {
    /// Insight used when no market data or generation is available
    pub fn fallback() -> Self {
        Self {
            price_trend: PriceTrend::Stable,
            key_factors: vec!["Limited market data available".to_string()],
            recommendations: vec!["Conduct further market research".to_string()],
        }
    }
}

/// Outcome of one analysis; always structurally complete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub suppliers: Vec<SupplierProfile>,
    pub market_insight: MarketInsight,
    pub summary: String,
    pub processing_time_s: f64,
    /// Terminal stage: `DONE` or `FAILED`
    pub stage: WorkflowStage,
    pub error: Option<String>,
}
