//! Web search: query model, provider seam and orchestration
//!
//! The [`SearchOrchestrator`] expands a [`Query`] into templated variants,
//! issues them through a [`SearchProvider`] under the shared rate limiter,
//! then deduplicates, filters and ranks the raw hits.

mod orchestrator;
mod searxng;

pub use orchestrator::SearchOrchestrator;
pub use searxng::SearxngProvider;

use crate::error::{ProcurementError, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref NON_QUERY_CHARS_RE: Regex = Regex::new(r"[^\w\s-]").unwrap();
}

/// Accepted length range for the query text, in characters
pub const QUERY_TEXT_CHARS: std::ops::RangeInclusive<usize> = 3..=200;

/// Maximum length of the location filter, in characters
pub const MAX_LOCATION_CHARS: usize = 100;

/// Free-text procurement query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub location: Option<String>,
    pub category: Option<String>,
    pub timeline: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_timeline(mut self, timeline: impl Into<String>) -> Self {
        self.timeline = Some(timeline.into());
        self
    }

    pub fn with_requirements(mut self, requirements: Vec<String>) -> Self {
        self.requirements = requirements;
        self
    }

    /// Location with surrounding whitespace removed, `None` when blank
    pub fn location(&self) -> Option<&str> {
        non_blank(self.location.as_deref())
    }

    pub fn category(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }

    /// Reject malformed input before any external call is made
    pub fn validate(&self) -> Result<()> {
        let chars = self.text.trim().chars().count();
        if !QUERY_TEXT_CHARS.contains(&chars) {
            return Err(ProcurementError::InvalidInput(format!(
                "query must be between {} and {} characters (got {})",
                QUERY_TEXT_CHARS.start(),
                QUERY_TEXT_CHARS.end(),
                chars
            )));
        }
        if let Some(location) = self.location() {
            if location.chars().count() > MAX_LOCATION_CHARS {
                return Err(ProcurementError::InvalidInput(format!(
                    "location must be at most {} characters",
                    MAX_LOCATION_CHARS
                )));
            }
        }
        Ok(())
    }
}

/// Unprocessed search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// Host the hit came from
    pub source: String,
}

/// Web search backend
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one query, returning at most `max_results` hits
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<RawHit>>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Strip punctuation except `-`, collapse whitespace, lowercase
pub fn clean_query(text: &str) -> String {
    NON_QUERY_CHARS_RE
        .replace_all(text.trim(), "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Host of a URL, lowercased and without a leading `www.`
pub fn domain_of(url: &str) -> Option<String> {
    let with_scheme = if url.contains("://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };
    let parsed = reqwest::Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Comparable form of a URL: no scheme, no `www.`, no trailing slash, lowercased
pub fn normalize_url(url: &str) -> String {
    let lower = url.trim().to_lowercase();
    let without_scheme = lower
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(&lower);
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);
    without_www.trim_end_matches('/').to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_validation_bounds() {
        assert!(Query::new("steel").validate().is_ok());
        assert!(Query::new("  ab  ").validate().is_err());
        assert!(Query::new("x".repeat(201)).validate().is_err());
        assert!(Query::new("x".repeat(200)).validate().is_ok());

        let err = Query::new("steel")
            .with_location("y".repeat(101))
            .validate()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_blank_filters_read_as_absent() {
        let query = Query::new("steel").with_location("   ").with_category(" Metals ");
        assert_eq!(query.location(), None);
        assert_eq!(query.category(), Some("Metals"));
    }

    #[test]
    fn test_clean_query() {
        assert_eq!(clean_query("  Industrial   Steel, Suppliers!! "), "industrial steel suppliers");
        assert_eq!(clean_query("cold-rolled (A36) steel"), "cold-rolled a36 steel");
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(
            domain_of("https://WWW.LoneStarSteel.com/products?id=1"),
            Some("lonestarsteel.com".to_string())
        );
        assert_eq!(domain_of("gulfmetals.net/about"), Some("gulfmetals.net".to_string()));
        assert_eq!(domain_of("not a url"), None);
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("https://www.Example.com/Steel/"), "example.com/steel");
        assert_eq!(normalize_url("http://example.com/steel"), "example.com/steel");
    }
}
