//! Location and requirement filters over scored suppliers

use super::SupplierProfile;
use crate::enrich::extractors;
use crate::search::Query;

/// Fraction of requirements a supplier must mention to be kept
pub const REQUIREMENT_MATCH_RATIO: f64 = 0.5;

const US_STATES: &[(&str, &str)] = &[
    ("alabama", "AL"),
    ("alaska", "AK"),
    ("arizona", "AZ"),
    ("arkansas", "AR"),
    ("california", "CA"),
    ("colorado", "CO"),
    ("connecticut", "CT"),
    ("delaware", "DE"),
    ("district of columbia", "DC"),
    ("florida", "FL"),
    ("georgia", "GA"),
    ("hawaii", "HI"),
    ("idaho", "ID"),
    ("illinois", "IL"),
    ("indiana", "IN"),
    ("iowa", "IA"),
    ("kansas", "KS"),
    ("kentucky", "KY"),
    ("louisiana", "LA"),
    ("maine", "ME"),
    ("maryland", "MD"),
    ("massachusetts", "MA"),
    ("michigan", "MI"),
    ("minnesota", "MN"),
    ("mississippi", "MS"),
    ("missouri", "MO"),
    ("montana", "MT"),
    ("nebraska", "NE"),
    ("nevada", "NV"),
    ("new hampshire", "NH"),
    ("new jersey", "NJ"),
    ("new mexico", "NM"),
    ("new york", "NY"),
    ("north carolina", "NC"),
    ("north dakota", "ND"),
    ("ohio", "OH"),
    ("oklahoma", "OK"),
    ("oregon", "OR"),
    ("pennsylvania", "PA"),
    ("rhode island", "RI"),
    ("south carolina", "SC"),
    ("south dakota", "SD"),
    ("tennessee", "TN"),
    ("texas", "TX"),
    ("utah", "UT"),
    ("vermont", "VT"),
    ("virginia", "VA"),
    ("washington", "WA"),
    ("west virginia", "WV"),
    ("wisconsin", "WI"),
    ("wyoming", "WY"),
];

/// Lowercase words separated by single spaces, padded so phrase checks
/// only hit whole words
fn padded_words(text: &str) -> String {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    if words.is_empty() {
        String::new()
    } else {
        format!(" {} ", words.join(" "))
    }
}

fn has_phrase(padded: &str, phrase: &str) -> bool {
    !padded.is_empty() && padded.contains(&format!(" {} ", phrase))
}

/// Whether a state abbreviation appears as its own upper-case word
fn has_abbreviation(text: &str, abbreviation: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|w| w == abbreviation)
}

/// Whether the supplier's location satisfies the requested location.
///
/// Matches a whole-word phrase ("Houston, Texas" for "texas") or a US state
/// in either spelling ("Dallas, TX" for "Texas", "New York" for "NY").
pub fn location_matches(supplier_location: &str, requested_location: &str) -> bool {
    let supplier = padded_words(supplier_location);
    let requested = padded_words(requested_location);
    if supplier.is_empty() || requested.is_empty() {
        return false;
    }

    if supplier.contains(&requested) {
        return true;
    }

    US_STATES.iter().any(|(name, abbreviation)| {
        let abbr_lower = abbreviation.to_lowercase();
        let asks_for_state = has_phrase(&requested, name) || requested.trim() == abbr_lower;
        asks_for_state
            && (has_phrase(&supplier, name) || has_abbreviation(supplier_location, abbreviation))
    })
}

/// Whether the supplier mentions at least half of the requirements in its
/// description or certifications. An empty list is always met.
pub fn requirements_match(supplier: &SupplierProfile, requirements: &[String]) -> bool {
    let requirements: Vec<&str> = requirements
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .collect();
    if requirements.is_empty() {
        return true;
    }

    let searchable = padded_words(&format!(
        "{} {}",
        supplier.candidate.description,
        supplier.certifications.join(" ")
    ));

    let met = requirements
        .iter()
        .filter(|requirement| {
            let phrase = padded_words(requirement);
            if has_phrase(&searchable, phrase.trim()) {
                return true;
            }
            // "ISO-9001" and "iso9001" name the same certificate
            let wanted = extractors::certifications(requirement);
            !wanted.is_empty()
                && wanted.iter().all(|cert| {
                    supplier
                        .certifications
                        .iter()
                        .any(|have| have.eq_ignore_ascii_case(cert))
                })
        })
        .count();

    met as f64 >= requirements.len() as f64 * REQUIREMENT_MATCH_RATIO
}

/// Drop suppliers outside the requested location or short of the requirements.
///
/// Suppliers with no extracted location are kept; the location filter only
/// removes suppliers whose known location disagrees.
pub fn apply(mut suppliers: Vec<SupplierProfile>, query: &Query) -> Vec<SupplierProfile> {
    if let Some(requested) = query.location() {
        let initial_count = suppliers.len();
        suppliers.retain(|s| {
            !s.candidate.has_location() || location_matches(&s.candidate.location, requested)
        });
        tracing::info!(
            "Location filter '{}' applied: {} → {} suppliers",
            requested,
            initial_count,
            suppliers.len()
        );
    }

    if !query.requirements.is_empty() {
        let initial_count = suppliers.len();
        suppliers.retain(|s| requirements_match(s, &query.requirements));
        tracing::info!(
            "Requirements filter applied: {} → {} suppliers",
            initial_count,
            suppliers.len()
        );
    }

    suppliers
}
