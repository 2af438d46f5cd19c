//! Concurrent per-candidate enrichment

use super::extractors;
use super::sources::{
    ClearbitLogoSource, FinancialSource, FmpFinancialSource, HttpSiteSource, LogoSource,
    RdapRegistrationSource, RegistrationSource, SiteSnapshot, SiteSource,
};
use super::{EnrichmentBundle, RiskAssessment, SupplierCandidate, WebIntelligence};
use crate::cache::{cache_key, TtlCache};
use crate::config::EnrichmentConfig;
use crate::error::{with_timeout, Result};
use crate::llm::GenerationAdapter;
use crate::scoring::{risk_score, RiskPolicy};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const DETAILS_SCHEMA: &str = r#"From the supplier description below, extract a JSON object:
{"certifications": ["quality or compliance certifications explicitly mentioned"], "rating": number from 1.0 to 5.0 estimating supplier quality, or null}
Only list certifications that appear in the text."#;

/// Fields pulled out of the candidate description by the generative adapter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDetails {
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

/// A candidate with its enrichment bundle and extracted details
#[derive(Debug, Clone)]
pub struct EnrichedCandidate {
    pub candidate: SupplierCandidate,
    pub bundle: EnrichmentBundle,
    pub details: ExtractedDetails,
}

/// Gathers third-party signals for supplier candidates
pub struct EnrichmentEngine {
    logo: Option<Arc<dyn LogoSource>>,
    financial: Option<Arc<dyn FinancialSource>>,
    registration: Option<Arc<dyn RegistrationSource>>,
    site: Option<Arc<dyn SiteSource>>,
    generation: Option<Arc<GenerationAdapter>>,
    cache: Arc<TtlCache<EnrichmentBundle>>,
    risk_policy: RiskPolicy,
    timeout: Duration,
    concurrency: usize,
}

impl EnrichmentEngine {
    /// Engine with no sources attached; every bundle field stays empty until sources are added
    pub fn new(cache: Arc<TtlCache<EnrichmentBundle>>, timeout: Duration, concurrency: usize) -> Self {
        Self {
            logo: None,
            financial: None,
            registration: None,
            site: None,
            generation: None,
            cache,
            risk_policy: RiskPolicy::default(),
            timeout,
            concurrency: concurrency.max(1),
        }
    }

    /// Engine wired to the HTTP sources described by `config`
    pub fn from_config(
        config: &EnrichmentConfig,
        cache: Arc<TtlCache<EnrichmentBundle>>,
    ) -> Result<Self> {
        let mut engine = Self::new(cache, config.timeout(), config.concurrency)
            .with_logo_source(Arc::new(ClearbitLogoSource::new(config)?))
            .with_registration_source(Arc::new(RdapRegistrationSource::new(config)?))
            .with_site_source(Arc::new(HttpSiteSource::new(config)?));

        match FmpFinancialSource::new(config)? {
            Some(source) => engine = engine.with_financial_source(Arc::new(source)),
            None => tracing::info!("No financial API key configured; financial lookups disabled"),
        }

        Ok(engine)
    }

    pub fn with_logo_source(mut self, source: Arc<dyn LogoSource>) -> Self {
        self.logo = Some(source);
        self
    }

    pub fn with_financial_source(mut self, source: Arc<dyn FinancialSource>) -> Self {
        self.financial = Some(source);
        self
    }

    pub fn with_registration_source(mut self, source: Arc<dyn RegistrationSource>) -> Self {
        self.registration = Some(source);
        self
    }

    pub fn with_site_source(mut self, source: Arc<dyn SiteSource>) -> Self {
        self.site = Some(source);
        self
    }

    /// Run certification/rating extraction alongside enrichment
    pub fn with_generation(mut self, adapter: Arc<GenerationAdapter>) -> Self {
        self.generation = Some(adapter);
        self
    }

    pub fn with_risk_policy(mut self, policy: RiskPolicy) -> Self {
        self.risk_policy = policy;
        self
    }

    /// Enrich all candidates under the concurrency limit, preserving input order
    pub async fn enrich_all(&self, candidates: Vec<SupplierCandidate>) -> Vec<EnrichedCandidate> {
        let total = candidates.len();
        tracing::info!(
            "Enriching {} candidates ({} concurrent)",
            total,
            self.concurrency
        );

        let mut results: Vec<(usize, EnrichedCandidate)> = stream::iter(candidates)
            .enumerate()
            .map(|(idx, candidate)| async move {
                tracing::debug!("Enriching candidate {}/{}: {}", idx + 1, total, candidate.name);
                (idx, self.enrich(candidate).await)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, enriched)| enriched).collect()
    }

    /// Enrich a single candidate; never fails, missing signals stay `None`
    pub async fn enrich(&self, candidate: SupplierCandidate) -> EnrichedCandidate {
        let (bundle, details) =
            tokio::join!(self.cached_bundle(&candidate), self.extract_details(&candidate));

        let bundle = merge_extracted_certifications(bundle, &details.certifications);
        EnrichedCandidate {
            candidate,
            bundle,
            details,
        }
    }

    async fn cached_bundle(&self, candidate: &SupplierCandidate) -> EnrichmentBundle {
        let Some(domain) = candidate.domain() else {
            return self.fetch_bundle(candidate, None).await;
        };

        let key = cache_key(
            "enrich",
            &[Some(domain.as_str()), Some(candidate.name.as_str())],
        );
        let result: std::result::Result<EnrichmentBundle, Infallible> = self
            .cache
            .get_or_try_insert_with(&key, || async {
                Ok(self.fetch_bundle(candidate, Some(&domain)).await)
            })
            .await;

        match result {
            Ok(bundle) => bundle,
            Err(never) => match never {},
        }
    }

    async fn fetch_bundle(&self, candidate: &SupplierCandidate, domain: Option<&str>) -> EnrichmentBundle {
        let (logo_url, financial, domain_age_years, site) = tokio::join!(
            self.fetch_logo(domain),
            self.fetch_financial(&candidate.name),
            self.fetch_registration(domain),
            self.fetch_site(domain),
        );

        let web_intel = site
            .as_ref()
            .and_then(|s| s.body.as_deref())
            .map(web_intelligence_from_html);
        let risk = assess_risk(domain_age_years, site.as_ref(), &self.risk_policy);

        EnrichmentBundle {
            logo_url,
            financial,
            web_intel,
            risk,
        }
    }

    async fn fetch_logo(&self, domain: Option<&str>) -> Option<String> {
        let (source, domain) = (self.logo.as_ref()?, domain?);
        self.guarded("logo", domain, source.logo_url(domain)).await
    }

    async fn fetch_financial(&self, name: &str) -> Option<super::FinancialSnapshot> {
        let source = self.financial.as_ref()?;
        self.guarded("financial", name, source.lookup(name)).await
    }

    async fn fetch_registration(&self, domain: Option<&str>) -> Option<f64> {
        let (source, domain) = (self.registration.as_ref()?, domain?);
        self.guarded("registration", domain, source.domain_age_years(domain)).await
    }

    async fn fetch_site(&self, domain: Option<&str>) -> Option<SiteSnapshot> {
        let (source, domain) = (self.site.as_ref()?, domain?);
        self.guarded("site", domain, source.fetch(domain)).await
    }

    /// Apply the per-source timeout and fold failures into `None`
    async fn guarded<T, F>(&self, source: &str, subject: &str, fut: F) -> Option<T>
    where
        F: Future<Output = Result<Option<T>>>,
    {
        match with_timeout(self.timeout, fut).await {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("{} lookup for {} failed: {}", source, subject, e);
                None
            }
        }
    }

    async fn extract_details(&self, candidate: &SupplierCandidate) -> ExtractedDetails {
        let Some(ref adapter) = self.generation else {
            return ExtractedDetails::default();
        };
        if candidate.description.trim().is_empty() {
            return ExtractedDetails::default();
        }

        let text = format!("{}: {}", candidate.name, candidate.description);
        match adapter.extract::<ExtractedDetails>(&text, DETAILS_SCHEMA).await {
            Ok(details) => ExtractedDetails {
                rating: details.rating.filter(|r| r.is_finite()).map(|r| r.clamp(0.0, 5.0)),
                certifications: details.certifications,
            },
            Err(e) => {
                tracing::debug!("Detail extraction for {} unavailable: {}", candidate.name, e);
                ExtractedDetails::default()
            }
        }
    }
}

/// Web intelligence signals from a fetched home page
pub(crate) fn web_intelligence_from_html(html: &str) -> WebIntelligence {
    let text = extractors::visible_text(html);
    WebIntelligence {
        founded_year: extractors::founded_year(&text),
        team_size_estimate: extractors::team_size(&text),
        certifications: extractors::certifications(&text),
        social_platforms: extractors::social_platforms(html),
        tech_stack: extractors::tech_stack(html),
    }
}

/// Risk assessment from whatever indicators arrived; `None` when nothing is known
fn assess_risk(
    domain_age_years: Option<f64>,
    site: Option<&SiteSnapshot>,
    policy: &RiskPolicy,
) -> Option<RiskAssessment> {
    let ssl_valid = site.and_then(|s| s.tls_valid);
    let load_time_ms = site.and_then(|s| s.load_time_ms);

    if domain_age_years.is_none() && ssl_valid.is_none() && load_time_ms.is_none() {
        return None;
    }

    Some(RiskAssessment {
        domain_age_years,
        ssl_valid,
        load_time_ms,
        risk_score: risk_score(domain_age_years, ssl_valid, load_time_ms, policy),
    })
}

fn merge_extracted_certifications(mut bundle: EnrichmentBundle, extracted: &[String]) -> EnrichmentBundle {
    if extracted.is_empty() {
        return bundle;
    }
    let mut web_intel = bundle.web_intel.take().unwrap_or_default();
    web_intel.certifications =
        extractors::merge_certifications([web_intel.certifications.as_slice(), extracted]);
    bundle.web_intel = Some(web_intel);
    bundle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::FinancialSnapshot;
    use crate::error::ProcurementError;
    use crate::llm::{ChatMessage, LLMClient};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticLogo;

    #[async_trait]
    impl LogoSource for StaticLogo {
        async fn logo_url(&self, domain: &str) -> Result<Option<String>> {
            Ok(Some(format!("https://logos.test/{}", domain)))
        }
    }

    struct FailingFinancial;

    #[async_trait]
    impl FinancialSource for FailingFinancial {
        async fn lookup(&self, _company_name: &str) -> Result<Option<FinancialSnapshot>> {
            Err(ProcurementError::ExternalError("HTTP 500".to_string()))
        }
    }

    struct TickerFinancial;

    #[async_trait]
    impl FinancialSource for TickerFinancial {
        async fn lookup(&self, company_name: &str) -> Result<Option<FinancialSnapshot>> {
            Ok(Some(FinancialSnapshot {
                ticker: company_name.to_uppercase(),
                market_cap: None,
                sector: None,
                health_score: 50,
            }))
        }
    }

    struct HangingRegistration;

    #[async_trait]
    impl RegistrationSource for HangingRegistration {
        async fn domain_age_years(&self, _domain: &str) -> Result<Option<f64>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Some(20.0))
        }
    }

    struct CountingSite {
        calls: AtomicUsize,
        delay_ms: u64,
    }

    #[async_trait]
    impl SiteSource for CountingSite {
        async fn fetch(&self, domain: &str) -> Result<Option<SiteSnapshot>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            Ok(Some(SiteSnapshot {
                body: Some(format!(
                    "<p>{} was founded in 1990. ISO 9001 certified.</p>\
                     <a href=\"https://www.linkedin.com/company/x/\">in</a>",
                    domain
                )),
                tls_valid: Some(true),
                load_time_ms: Some(400),
            }))
        }
    }

    struct CertsLLM;

    #[async_trait]
    impl LLMClient for CertsLLM {
        async fn chat_completion(&self, _messages: Vec<ChatMessage>) -> Result<String> {
            Ok(r#"{"certifications": ["AS9100", "iso 9001"], "rating": 4.2}"#.to_string())
        }

        fn model_name(&self) -> &str {
            "certs"
        }
    }

    fn candidate(name: &str, website: Option<&str>) -> SupplierCandidate {
        SupplierCandidate {
            name: name.to_string(),
            location: "Houston, TX".to_string(),
            description: format!("{} supplies structural steel", name),
            website: website.map(str::to_string),
            source_urls: vec![],
            contact: None,
        }
    }

    fn engine(site: Arc<CountingSite>) -> EnrichmentEngine {
        EnrichmentEngine::new(
            Arc::new(TtlCache::new(Duration::from_secs(60), 100)),
            Duration::from_secs(2),
            2,
        )
        .with_logo_source(Arc::new(StaticLogo))
        .with_financial_source(Arc::new(FailingFinancial))
        .with_registration_source(Arc::new(HangingRegistration))
        .with_site_source(site)
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_fetch_failures_degrade_independently() {
        let site = Arc::new(CountingSite {
            calls: AtomicUsize::new(0),
            delay_ms: 10,
        });
        let enriched = engine(site).enrich(candidate("Acme", Some("https://acme.com"))).await;

        let bundle = &enriched.bundle;
        assert_eq!(bundle.logo_url.as_deref(), Some("https://logos.test/acme.com"));
        assert!(bundle.financial.is_none());

        let web = bundle.web_intel.as_ref().unwrap();
        assert_eq!(web.founded_year, Some(1990));
        assert_eq!(web.certifications, vec!["ISO 9001"]);
        assert_eq!(web.social_platforms, vec!["LinkedIn"]);

        // registration timed out: age unknown (+10), TLS valid (-10)
        let risk = bundle.risk.as_ref().unwrap();
        assert_eq!(risk.domain_age_years, None);
        assert_eq!(risk.risk_score, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_keep_input_order() {
        let site = Arc::new(CountingSite {
            calls: AtomicUsize::new(0),
            delay_ms: 50,
        });
        let candidates = vec![
            candidate("First", Some("https://first.com")),
            candidate("Second", Some("https://second.com")),
            candidate("Third", None),
            candidate("Fourth", Some("https://fourth.com")),
        ];

        let enriched = engine(site.clone()).enrich_all(candidates).await;
        let names: Vec<_> = enriched.iter().map(|e| e.candidate.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second", "Third", "Fourth"]);
        assert_eq!(site.calls.load(Ordering::SeqCst), 3);
        assert!(enriched[2].bundle.logo_url.is_none());
        assert!(enriched[2].bundle.risk.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bundles_are_cached_per_domain_and_name() {
        let site = Arc::new(CountingSite {
            calls: AtomicUsize::new(0),
            delay_ms: 10,
        });
        let engine = engine(site.clone());

        engine.enrich(candidate("Acme", Some("https://acme.com"))).await;
        engine.enrich(candidate("ACME ", Some("https://www.acme.com/about"))).await;
        assert_eq!(site.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_domain_keeps_financials_per_company() {
        let site = Arc::new(CountingSite {
            calls: AtomicUsize::new(0),
            delay_ms: 10,
        });
        let engine = engine(site.clone()).with_financial_source(Arc::new(TickerFinancial));

        let parent = engine.enrich(candidate("Acme Holdings", Some("https://acme.com"))).await;
        let division = engine.enrich(candidate("Acme Tubing", Some("https://acme.com/tubing"))).await;

        assert_eq!(parent.bundle.financial.unwrap().ticker, "ACME HOLDINGS");
        assert_eq!(division.bundle.financial.unwrap().ticker, "ACME TUBING");
        assert_eq!(site.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_extracted_certifications_merge_into_web_intel() {
        let adapter = Arc::new(GenerationAdapter::new(
            Arc::new(CertsLLM),
            None,
            Duration::from_secs(1),
        ));
        let engine = EnrichmentEngine::new(
            Arc::new(TtlCache::new(Duration::from_secs(60), 10)),
            Duration::from_secs(1),
            1,
        )
        .with_generation(adapter);

        let enriched = engine.enrich(candidate("Acme", None)).await;
        assert_eq!(enriched.details.rating, Some(4.2));
        assert_eq!(
            enriched.bundle.web_intel.unwrap().certifications,
            vec!["AS9100", "iso 9001"]
        );
    }

    #[test]
    fn test_assess_risk_requires_some_signal() {
        assert!(assess_risk(None, None, &RiskPolicy::default()).is_none());
        let site = SiteSnapshot {
            body: None,
            tls_valid: Some(false),
            load_time_ms: None,
        };
        let risk = assess_risk(Some(0.5), Some(&site), &RiskPolicy::default()).unwrap();
        assert_eq!(risk.risk_score, 90);
    }
}
