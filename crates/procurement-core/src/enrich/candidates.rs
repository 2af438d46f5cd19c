//! Candidate extraction from raw search hits

use super::extractors::{company_name_from_title, contact_from_text, location_from_snippet};
use super::{SupplierCandidate, UNKNOWN_LOCATION};
use crate::search::{domain_of, Query, RawHit};

/// Turn search hits into supplier candidates, merging duplicates.
///
/// Duplicates share a normalized `(name, domain)` key; the first occurrence
/// wins and later ones only contribute their source URLs and any missing
/// contact detail. Output keeps first-seen order.
pub fn build_candidates(hits: &[RawHit], query: &Query) -> Vec<SupplierCandidate> {
    let mut candidates: Vec<SupplierCandidate> = Vec::new();
    let mut keys: Vec<(String, String)> = Vec::new();

    for hit in hits {
        let Some(name) = company_name_from_title(&hit.title) else {
            tracing::debug!("Skipping hit without a usable company name: {}", hit.title);
            continue;
        };

        let domain = domain_of(&hit.url);
        let key = (normalize_name(&name), domain.clone().unwrap_or_default());

        if let Some(index) = keys.iter().position(|k| *k == key) {
            let existing = &mut candidates[index];
            if !existing.source_urls.contains(&hit.url) {
                existing.source_urls.push(hit.url.clone());
            }
            if existing.contact.is_none() {
                existing.contact = contact_from_text(&hit.snippet);
            }
            continue;
        }

        let location = location_from_snippet(&hit.snippet, query.location())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

        candidates.push(SupplierCandidate {
            name,
            location,
            description: hit.snippet.trim().to_string(),
            website: domain.map(|d| format!("https://{}", d)),
            source_urls: vec![hit.url.clone()],
            contact: contact_from_text(&hit.snippet),
        });
        keys.push(key);
    }

    candidates
}

/// Lowercase alphanumerics only, so "Acme Steel, Inc." and "ACME STEEL INC" collide
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
