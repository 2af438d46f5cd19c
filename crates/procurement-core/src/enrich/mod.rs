//! Supplier candidates and third-party enrichment
//!
//! Candidates are extracted from raw search hits, then enriched with a logo,
//! a financial snapshot, web-presence signals and risk indicators. Every
//! sub-fetch degrades to `None` on its own.

mod candidates;
mod engine;
pub mod extractors;
mod sources;

pub use candidates::build_candidates;
pub use engine::{EnrichedCandidate, EnrichmentEngine, ExtractedDetails};
pub use sources::{
    ClearbitLogoSource, FinancialSource, FmpFinancialSource, HttpSiteSource, LogoSource,
    RdapRegistrationSource, RegistrationSource, SiteSnapshot, SiteSource,
};

use crate::search::domain_of;
use serde::{Deserialize, Serialize};

/// Placeholder used when no location could be extracted
pub const UNKNOWN_LOCATION: &str = "Location not specified";

/// Unverified supplier extracted from search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierCandidate {
    pub name: String,
    pub location: String,
    pub description: String,
    pub website: Option<String>,
    pub source_urls: Vec<String>,
    /// Email address or phone number found in the snippet
    #[serde(default)]
    pub contact: Option<String>,
}

impl SupplierCandidate {
    /// Registrable host of the website, without `www.`
    pub fn domain(&self) -> Option<String> {
        self.website.as_deref().and_then(domain_of)
    }

    pub fn has_location(&self) -> bool {
        !self.location.trim().is_empty() && self.location != UNKNOWN_LOCATION
    }

    /// Whether any way of reaching or locating the supplier was extracted
    pub fn has_contact_or_location(&self) -> bool {
        self.has_location() || self.contact.is_some()
    }
}

/// Third-party signals for one candidate; each field independently absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentBundle {
    pub logo_url: Option<String>,
    pub financial: Option<FinancialSnapshot>,
    pub web_intel: Option<WebIntelligence>,
    pub risk: Option<RiskAssessment>,
}

/// Public-company data for a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub ticker: String,
    pub market_cap: Option<f64>,
    pub sector: Option<String>,
    /// 0–100
    pub health_score: u8,
}

/// Signals scraped from the supplier's own site
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebIntelligence {
    pub founded_year: Option<i32>,
    pub team_size_estimate: Option<u32>,
    pub certifications: Vec<String>,
    pub social_platforms: Vec<String>,
    pub tech_stack: Vec<String>,
}

/// Domain and transport risk indicators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub domain_age_years: Option<f64>,
    pub ssl_valid: Option<bool>,
    pub load_time_ms: Option<u64>,
    /// 0–100, higher is riskier
    pub risk_score: u8,
}
