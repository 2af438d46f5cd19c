//! Confidence, risk and financial-health scoring
//!
//! All functions here are pure and deterministic. Weights and thresholds come
//! from [`ScoringPolicy`], which carries the reference year used to compute
//! years in business so no clock is read during scoring.

use crate::enrich::{extractors, EnrichmentBundle, SupplierCandidate};
use serde::{Deserialize, Serialize};

/// Weights, caps and clamp bounds for [`confidence_score`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub base: i32,
    pub logo_bonus: i32,
    pub financial_bonus: i32,
    /// Extra bonus when the financial health score reaches `healthy_threshold`
    pub healthy_financial_bonus: i32,
    pub healthy_threshold: u8,
    pub certification_bonus: i32,
    pub social_platform_bonus: i32,
    pub social_platform_cap: i32,
    pub year_in_business_bonus: i32,
    pub years_in_business_cap: i32,
    pub no_website_penalty: i32,
    pub no_contact_penalty: i32,
    pub high_risk_penalty: i32,
    /// Risk scores strictly above this are penalized
    pub high_risk_threshold: u8,
    pub min_score: i32,
    pub max_score: i32,
    /// Year against which `founded_year` is measured; unset means the current year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_year: Option<i32>,
    pub risk: RiskPolicy,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            base: 30,
            logo_bonus: 20,
            financial_bonus: 25,
            healthy_financial_bonus: 10,
            healthy_threshold: 70,
            certification_bonus: 15,
            social_platform_bonus: 10,
            social_platform_cap: 30,
            year_in_business_bonus: 5,
            years_in_business_cap: 25,
            no_website_penalty: 10,
            no_contact_penalty: 15,
            high_risk_penalty: 20,
            high_risk_threshold: 60,
            min_score: 30,
            max_score: 95,
            reference_year: None,
            risk: RiskPolicy::default(),
        }
    }
}

impl ScoringPolicy {
    /// Same policy measured against a different year
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// Pin an unset reference year to `current_year`; a configured year wins
    pub fn anchored_at(mut self, current_year: i32) -> Self {
        self.reference_year.get_or_insert(current_year);
        self
    }
}

/// Weights for [`risk_score`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskPolicy {
    pub base: i32,
    pub unknown_age: i32,
    /// Domain younger than one year
    pub new_domain: i32,
    /// Domain younger than three years
    pub young_domain: i32,
    /// Domain ten years or older (usually negative)
    pub established_domain: i32,
    pub tls_invalid: i32,
    pub tls_unknown: i32,
    pub tls_valid: i32,
    pub very_slow_ms: u64,
    pub very_slow: i32,
    pub slow_ms: u64,
    pub slow: i32,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            base: 30,
            unknown_age: 10,
            new_domain: 30,
            young_domain: 15,
            established_domain: -10,
            tls_invalid: 30,
            tls_unknown: 10,
            tls_valid: -10,
            very_slow_ms: 5000,
            very_slow: 15,
            slow_ms: 2000,
            slow: 5,
        }
    }
}

/// Map a candidate and its enrichment bundle to a bounded confidence score
pub fn confidence_score(
    candidate: &SupplierCandidate,
    bundle: &EnrichmentBundle,
    policy: &ScoringPolicy,
) -> u8 {
    let mut score = policy.base;

    if bundle.logo_url.is_some() {
        score += policy.logo_bonus;
    }

    if let Some(ref financial) = bundle.financial {
        score += policy.financial_bonus;
        if financial.health_score >= policy.healthy_threshold {
            score += policy.healthy_financial_bonus;
        }
    }

    let described = extractors::certifications(&candidate.description);
    let scraped: &[String] = bundle
        .web_intel
        .as_ref()
        .map(|w| w.certifications.as_slice())
        .unwrap_or(&[]);
    if !extractors::merge_certifications([scraped, described.as_slice()]).is_empty() {
        score += policy.certification_bonus;
    }

    if let Some(ref web) = bundle.web_intel {
        let platforms = distinct_count(&web.social_platforms) as i32;
        score += (platforms * policy.social_platform_bonus).min(policy.social_platform_cap);

        if let (Some(founded), Some(reference)) = (web.founded_year, policy.reference_year) {
            let years = (reference - founded).max(0);
            score += years
                .saturating_mul(policy.year_in_business_bonus)
                .min(policy.years_in_business_cap);
        }
    }

    if candidate.website.is_none() {
        score -= policy.no_website_penalty;
    }

    if !candidate.has_contact_or_location() {
        score -= policy.no_contact_penalty;
    }

    if let Some(ref risk) = bundle.risk {
        if risk.risk_score > policy.high_risk_threshold {
            score -= policy.high_risk_penalty;
        }
    }

    // Not clamp(): an inverted band resolves to max_score
    score.max(policy.min_score).min(policy.max_score).clamp(0, 100) as u8
}

/// Risk score in [0, 100] from registration age, TLS validity and latency
pub fn risk_score(
    domain_age_years: Option<f64>,
    ssl_valid: Option<bool>,
    load_time_ms: Option<u64>,
    policy: &RiskPolicy,
) -> u8 {
    let mut score = policy.base;

    score += match domain_age_years {
        None => policy.unknown_age,
        Some(age) if age < 1.0 => policy.new_domain,
        Some(age) if age < 3.0 => policy.young_domain,
        Some(age) if age >= 10.0 => policy.established_domain,
        Some(_) => 0,
    };

    score += match ssl_valid {
        Some(false) => policy.tls_invalid,
        None => policy.tls_unknown,
        Some(true) => policy.tls_valid,
    };

    score += match load_time_ms {
        Some(ms) if ms > policy.very_slow_ms => policy.very_slow,
        Some(ms) if ms > policy.slow_ms => policy.slow,
        _ => 0,
    };

    score.clamp(0, 100) as u8
}

/// Financial health score in [0, 100] from market cap, trading status and beta
pub fn financial_health_score(market_cap: Option<f64>, actively_trading: bool, beta: Option<f64>) -> u8 {
    let mut score: i32 = 50;

    score += match market_cap {
        Some(cap) if cap >= 10e9 => 25,
        Some(cap) if cap >= 1e9 => 15,
        Some(cap) if cap >= 100e6 => 5,
        _ => 0,
    };

    if actively_trading {
        score += 10;
    }

    score -= match beta {
        Some(b) if b > 2.0 => 15,
        Some(b) if b > 1.5 => 5,
        _ => 0,
    };

    score.clamp(0, 100) as u8
}

fn distinct_count(items: &[String]) -> usize {
    let mut seen: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let key = item.trim().to_lowercase();
        if !key.is_empty() && !seen.contains(&key) {
            seen.push(key);
        }
    }
    seen.len()
}
