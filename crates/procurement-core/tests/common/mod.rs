//! In-process providers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use procurement_core::cache::TtlCache;
use procurement_core::enrich::{LogoSource, SiteSnapshot, SiteSource};
use procurement_core::{
    ChatMessage, Config, EnrichmentEngine, GenerationAdapter, LLMClient, ProcurementError,
    RawHit, Result, SearchProvider, Services,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Search provider returning a fixed set of Texas steel suppliers
pub struct MockSearch {
    fail: bool,
    calls: AtomicUsize,
}

impl MockSearch {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<RawHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProcurementError::ExternalError("HTTP 503".to_string()));
        }
        Ok(vec![
            RawHit {
                title: "Lone Star Steel Supply - Industrial Steel Distributor".to_string(),
                url: "https://www.lonestarsteel.com/about".to_string(),
                snippet: "Based in Houston, Texas. ISO 9001 certified steel distributor founded in 1985. Contact sales@lonestarsteel.com".to_string(),
                source: "lonestarsteel.com".to_string(),
            },
            RawHit {
                title: "Gulf Coast Metals | Structural Steel Manufacturer".to_string(),
                url: "https://gulfcoastmetals.com/".to_string(),
                snippet: "Structural steel fabrication for the energy industry in Texas.".to_string(),
                source: "gulfcoastmetals.com".to_string(),
            },
            RawHit {
                title: "Panhandle Plate & Beam".to_string(),
                url: "https://panhandleplate.com/products".to_string(),
                snippet: "Steel plate supplier serving Amarillo, TX since 1992.".to_string(),
                source: "panhandleplate.com".to_string(),
            },
        ])
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub struct StaticLogo;

#[async_trait]
impl LogoSource for StaticLogo {
    async fn logo_url(&self, domain: &str) -> Result<Option<String>> {
        Ok(Some(format!("https://logo.example.com/{}", domain)))
    }
}

pub struct StaticSite;

#[async_trait]
impl SiteSource for StaticSite {
    async fn fetch(&self, domain: &str) -> Result<Option<SiteSnapshot>> {
        if domain.starts_with("panhandle") {
            return Err(ProcurementError::ExternalError("connection refused".to_string()));
        }
        Ok(Some(SiteSnapshot {
            body: Some(
                r#"<html><body><p>Established in 1985. ISO 9001 and AS9100 certified.</p>
                <a href="https://www.linkedin.com/company/acme">LinkedIn</a></body></html>"#
                    .to_string(),
            ),
            tls_valid: Some(true),
            load_time_ms: Some(350),
        }))
    }
}

pub enum Behavior {
    Reply(&'static str),
    Fail,
    Hang,
}

/// Chat client with a fixed behavior and a call counter
pub struct ScriptedLLM {
    name: &'static str,
    behavior: Behavior,
    calls: AtomicUsize,
}

impl ScriptedLLM {
    pub fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMClient for ScriptedLLM {
    async fn chat_completion(&self, _messages: Vec<ChatMessage>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Reply(text) => Ok(text.to_string()),
            Behavior::Fail => Err(ProcurementError::ExternalError("HTTP 503".to_string())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }
    }

    fn model_name(&self) -> &str {
        self.name
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.search.url = "http://search.invalid".to_string();
    config.search.min_interval_ms = 0;
    config.llm.fallback = None;
    config
}

/// Services over mock search and enrichment, with optional generation
pub fn services(search: Arc<MockSearch>, generation: Option<Arc<GenerationAdapter>>) -> Services {
    let config = test_config();
    let cache = Arc::new(TtlCache::new(config.cache.ttl(), config.cache.max_entries));
    let mut enrichment = EnrichmentEngine::new(cache, Duration::from_secs(2), 4)
        .with_logo_source(Arc::new(StaticLogo))
        .with_site_source(Arc::new(StaticSite));
    if let Some(ref adapter) = generation {
        enrichment = enrichment.with_generation(adapter.clone());
    }
    Services::assemble(search, enrichment, generation, &config)
}
