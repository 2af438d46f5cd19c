//! Immutable per-stage workflow records

use super::{MarketInsight, SupplierProfile};
use crate::search::{Query, RawHit};

/// Output of `SEARCHING`
#[derive(Debug, Clone)]
pub struct Searched {
    pub query: Query,
    pub hits: Vec<RawHit>,
    /// Why search returned nothing, when every provider call failed
    pub search_error: Option<String>,
}

/// Output of `ANALYZING`
#[derive(Debug, Clone)]
pub struct Analyzed {
    pub searched: Searched,
    /// Ordered by confidence score, highest first
    pub suppliers: Vec<SupplierProfile>,
}

impl Analyzed {
    pub fn query(&self) -> &Query {
        &self.searched.query
    }

    pub fn high_confidence_count(&self, threshold: u8) -> usize {
        self.suppliers
            .iter()
            .filter(|s| s.confidence_score >= threshold)
            .count()
    }
}

/// Output of `SYNTHESIZING_INSIGHTS`
#[derive(Debug, Clone)]
pub struct Synthesized {
    pub analyzed: Analyzed,
    pub insight: MarketInsight,
}
