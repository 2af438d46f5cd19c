//! Scoring performance benchmarks
//!
//! Measures performance of:
//! - Confidence scoring across bundle shapes
//! - Risk scoring
//! - Certification extraction feeding the score

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use procurement_core::enrich::{
    extractors, EnrichmentBundle, FinancialSnapshot, RiskAssessment, SupplierCandidate,
    WebIntelligence,
};
use procurement_core::{confidence_score, risk_score, RiskPolicy, ScoringPolicy};

fn candidate() -> SupplierCandidate {
    SupplierCandidate {
        name: "Lone Star Steel".to_string(),
        location: "Houston, Texas".to_string(),
        description: "ISO 9001 and AS9100 certified structural steel distributor since 1985"
            .to_string(),
        website: Some("https://lonestarsteel.com".to_string()),
        source_urls: vec!["https://lonestarsteel.com/about".to_string()],
        contact: Some("sales@lonestarsteel.com".to_string()),
    }
}

fn full_bundle() -> EnrichmentBundle {
    EnrichmentBundle {
        logo_url: Some("https://logo.clearbit.com/lonestarsteel.com".to_string()),
        financial: Some(FinancialSnapshot {
            ticker: "LSS".to_string(),
            market_cap: Some(2.5e9),
            sector: Some("Basic Materials".to_string()),
            health_score: 80,
        }),
        web_intel: Some(WebIntelligence {
            founded_year: Some(1985),
            team_size_estimate: Some(250),
            certifications: vec!["ISO 9001".to_string(), "AS9100".to_string()],
            social_platforms: vec!["LinkedIn".to_string(), "YouTube".to_string()],
            tech_stack: vec!["WordPress".to_string()],
        }),
        risk: Some(RiskAssessment {
            domain_age_years: Some(18.0),
            ssl_valid: Some(true),
            load_time_ms: Some(420),
            risk_score: 10,
        }),
    }
}

fn bench_confidence_score(c: &mut Criterion) {
    let policy = ScoringPolicy::default().with_reference_year(2025);
    let candidate = candidate();
    let mut group = c.benchmark_group("confidence_score");

    for (name, bundle) in [("empty", EnrichmentBundle::default()), ("full", full_bundle())] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &bundle, |b, bundle| {
            b.iter(|| confidence_score(black_box(&candidate), black_box(bundle), &policy));
        });
    }

    group.finish();
}

fn bench_risk_score(c: &mut Criterion) {
    let policy = RiskPolicy::default();
    c.bench_function("risk_score", |b| {
        b.iter(|| risk_score(black_box(Some(0.8)), black_box(None), black_box(Some(2500)), &policy));
    });
}

fn bench_certifications(c: &mut Criterion) {
    let text = candidate().description.repeat(20);
    c.bench_function("extract_certifications", |b| {
        b.iter(|| extractors::certifications(black_box(&text)));
    });
}

criterion_group!(benches, bench_confidence_score, bench_risk_score, bench_certifications);
criterion_main!(benches);
