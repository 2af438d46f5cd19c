//! SearxNG-compatible JSON search backend

use super::{domain_of, RawHit, SearchProvider};
use crate::config::SearchConfig;
use crate::error::{ProcurementError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearxResponse {
    #[serde(default)]
    results: Vec<SearxResult>,
}

#[derive(Debug, Deserialize)]
struct SearxResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

/// Web search through a SearxNG instance (`GET {base}/search?q=..&format=json`)
pub struct SearxngProvider {
    client: Client,
    base_url: String,
}

impl SearxngProvider {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("procurement/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .build()?;
        Ok(Self::with_client(client, &config.url))
    }

    /// Create a provider with a custom client
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

#[async_trait]
impl SearchProvider for SearxngProvider {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawHit>> {
        let response = self
            .client
            .get(self.endpoint())
            .query(&[("q", query), ("format", "json")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProcurementError::ExternalError(format!("Search request timed out: {}", query))
                } else if e.is_connect() {
                    ProcurementError::ExternalError(format!(
                        "Cannot reach search service at {}",
                        self.base_url
                    ))
                } else {
                    ProcurementError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = match status {
                StatusCode::TOO_MANY_REQUESTS => "Search rate limit exceeded (429)".to_string(),
                StatusCode::FORBIDDEN => {
                    "Search service refused JSON output (403); enable the json format".to_string()
                }
                s => format!("Search service error ({})", s.as_u16()),
            };
            return Err(ProcurementError::ExternalError(message));
        }

        let body: SearxResponse = response.json().await?;
        let hits = body
            .results
            .into_iter()
            .filter(|r| r.url.starts_with("http"))
            .take(max_results)
            .map(|r| RawHit {
                source: domain_of(&r.url).unwrap_or_default(),
                title: r.title.trim().to_string(),
                snippet: r.content.trim().to_string(),
                url: r.url,
            })
            .collect();

        Ok(hits)
    }

    fn name(&self) -> &str {
        "searxng"
    }
}
