//! External enrichment sources
//!
//! Each source is a trait so the engine can be driven by in-process fakes;
//! the HTTP implementations below bind them to public services.

use super::FinancialSnapshot;
use crate::config::EnrichmentConfig;
use crate::error::{ProcurementError, Result};
use crate::scoring::financial_health_score;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Instant;

/// Upper bound on the page body kept for scraping
const MAX_BODY_BYTES: usize = 512 * 1024;

/// Logo lookup by domain
#[async_trait]
pub trait LogoSource: Send + Sync {
    async fn logo_url(&self, domain: &str) -> Result<Option<String>>;
}

/// Public-company directory lookup by company name
#[async_trait]
pub trait FinancialSource: Send + Sync {
    async fn lookup(&self, company_name: &str) -> Result<Option<FinancialSnapshot>>;
}

/// Domain registration metadata
#[async_trait]
pub trait RegistrationSource: Send + Sync {
    /// Years since the domain was first registered
    async fn domain_age_years(&self, domain: &str) -> Result<Option<f64>>;
}

/// Fetch of the supplier's home page
#[async_trait]
pub trait SiteSource: Send + Sync {
    async fn fetch(&self, domain: &str) -> Result<Option<SiteSnapshot>>;
}

/// Result of fetching a supplier's site; shared by web intelligence and risk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteSnapshot {
    pub body: Option<String>,
    /// `Some(false)` when HTTPS failed but plain HTTP answered
    pub tls_valid: Option<bool>,
    pub load_time_ms: Option<u64>,
}

fn build_client(config: &EnrichmentConfig) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(concat!("procurement/", env!("CARGO_PKG_VERSION")))
        .timeout(config.timeout())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()?)
}

/// Logo CDN returning an image for `{base}/{domain}`
pub struct ClearbitLogoSource {
    client: Client,
    base_url: String,
}

impl ClearbitLogoSource {
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.logo_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl LogoSource for ClearbitLogoSource {
    async fn logo_url(&self, domain: &str) -> Result<Option<String>> {
        let url = format!("{}/{}", self.base_url, domain);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            s if s.is_success() => Ok(Some(url)),
            StatusCode::NOT_FOUND => Ok(None),
            s => Err(ProcurementError::ExternalError(format!(
                "Logo service error ({}) for {}",
                s.as_u16(),
                domain
            ))),
        }
    }
}

/// Financial Modeling Prep compatible directory (`search`, then `profile/{ticker}`)
pub struct FmpFinancialSource {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct FmpSearchHit {
    symbol: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FmpProfile {
    symbol: String,
    #[serde(default)]
    mkt_cap: Option<f64>,
    #[serde(default)]
    sector: Option<String>,
    #[serde(default)]
    beta: Option<f64>,
    #[serde(default)]
    is_actively_trading: bool,
}

impl FmpFinancialSource {
    /// `None` when no API key is configured
    pub fn new(config: &EnrichmentConfig) -> Result<Option<Self>> {
        let Some(ref api_key) = config.financial_api_key else {
            return Ok(None);
        };
        Ok(Some(Self {
            client: build_client(config)?,
            base_url: config.financial_url.trim_end_matches('/').to_string(),
            api_key: api_key.clone(),
        }))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProcurementError::ExternalError(format!(
                "Financial data service error ({})",
                status.as_u16()
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl FinancialSource for FmpFinancialSource {
    async fn lookup(&self, company_name: &str) -> Result<Option<FinancialSnapshot>> {
        let hits: Vec<FmpSearchHit> = self
            .get_json("search", &[("query", company_name), ("limit", "1")])
            .await?;

        let Some(hit) = hits.into_iter().find(|h| names_match(company_name, &h.name)) else {
            return Ok(None);
        };

        let profiles: Vec<FmpProfile> = self.get_json(&format!("profile/{}", hit.symbol), &[]).await?;
        Ok(profiles.into_iter().next().map(snapshot_from_profile))
    }
}

fn snapshot_from_profile(profile: FmpProfile) -> FinancialSnapshot {
    FinancialSnapshot {
        health_score: financial_health_score(
            profile.mkt_cap,
            profile.is_actively_trading,
            profile.beta,
        ),
        ticker: profile.symbol,
        market_cap: profile.mkt_cap,
        sector: profile.sector.filter(|s| !s.trim().is_empty()),
    }
}

/// Directory names must share the first significant word of the candidate name
fn names_match(candidate: &str, listed: &str) -> bool {
    let listed = listed.to_lowercase();
    candidate
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .find(|w| w.len() > 2)
        .map(|word| listed.split_whitespace().any(|l| l.trim_matches(|c: char| !c.is_alphanumeric()) == word))
        .unwrap_or(false)
}

/// RDAP registry lookup (`{base}/domain/{domain}`)
pub struct RdapRegistrationSource {
    client: Client,
    base_url: String,
}

impl RdapRegistrationSource {
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            base_url: config.rdap_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RdapDomain {
    #[serde(default)]
    events: Vec<RdapEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RdapEvent {
    event_action: String,
    event_date: String,
}

#[async_trait]
impl RegistrationSource for RdapRegistrationSource {
    async fn domain_age_years(&self, domain: &str) -> Result<Option<f64>> {
        let response = self
            .client
            .get(format!("{}/domain/{}", self.base_url, domain))
            .header("Accept", "application/rdap+json")
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            s if !s.is_success() => {
                return Err(ProcurementError::ExternalError(format!(
                    "RDAP error ({}) for {}",
                    s.as_u16(),
                    domain
                )))
            }
            _ => {}
        }

        let record: RdapDomain = response.json().await?;
        Ok(registration_age_years(&record, Utc::now()))
    }
}

fn registration_age_years(record: &RdapDomain, now: DateTime<Utc>) -> Option<f64> {
    let registered = record
        .events
        .iter()
        .find(|e| e.event_action.eq_ignore_ascii_case("registration"))?;
    let date = DateTime::parse_from_rfc3339(&registered.event_date).ok()?;
    let days = (now - date.with_timezone(&Utc)).num_days();
    Some((days.max(0) as f64) / 365.25)
}

/// Home page fetch over HTTPS with a plain-HTTP retry
pub struct HttpSiteSource {
    client: Client,
}

impl HttpSiteSource {
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
        })
    }

    async fn timed_get(&self, url: &str) -> Result<(String, u64)> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let elapsed = start.elapsed().as_millis() as u64;

        if !response.status().is_success() {
            return Err(ProcurementError::ExternalError(format!(
                "HTTP {} fetching {}",
                response.status().as_u16(),
                url
            )));
        }

        let mut body = response.text().await?;
        if body.len() > MAX_BODY_BYTES {
            let mut cut = MAX_BODY_BYTES;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Ok((body, elapsed))
    }
}

#[async_trait]
impl SiteSource for HttpSiteSource {
    async fn fetch(&self, domain: &str) -> Result<Option<SiteSnapshot>> {
        let https_error = match self.timed_get(&format!("https://{}", domain)).await {
            Ok((body, load_time_ms)) => {
                return Ok(Some(SiteSnapshot {
                    body: Some(body),
                    tls_valid: Some(true),
                    load_time_ms: Some(load_time_ms),
                }))
            }
            Err(e) => e,
        };

        tracing::debug!("HTTPS fetch of {} failed ({}), retrying over HTTP", domain, https_error);

        match self.timed_get(&format!("http://{}", domain)).await {
            // Reachable without TLS: the certificate or TLS setup is the problem
            Ok((body, load_time_ms)) => Ok(Some(SiteSnapshot {
                body: Some(body),
                tls_valid: Some(false),
                load_time_ms: Some(load_time_ms),
            })),
            Err(_) => Err(https_error),
        }
    }
}
