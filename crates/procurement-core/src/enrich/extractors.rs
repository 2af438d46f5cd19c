//! Scraping heuristics over search snippets and supplier web pages
//!
//! Every function here is pure: text in, signal out. Nothing performs I/O.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SCRIPT_RE: Regex = Regex::new(r"(?is)<script\b.*?</script>").unwrap();
    static ref STYLE_RE: Regex = Regex::new(r"(?is)<style\b.*?</style>").unwrap();
    static ref TAG_RE: Regex = Regex::new(r"(?s)<[^>]*>").unwrap();
    static ref LIST_NUMBER_RE: Regex = Regex::new(r"^\s*(?:#?\d+[.):]\s*)+").unwrap();
    static ref TITLE_SEPARATOR_RE: Regex = Regex::new(r"\s+[-–—|:]\s+|\s*\|\s*").unwrap();
    static ref LOCATED_IN_RE: Regex = Regex::new(
        r"(?:[Ll]ocated|[Bb]ased|[Hh]eadquartered|[Hh]eadquarters|[Oo]ffices?)\s+(?:in|at)\s+([A-Z][a-zA-Z]+(?:,?\s+[A-Z][a-zA-Z]+)*)"
    )
    .unwrap();
    static ref CITY_STATE_RE: Regex =
        Regex::new(r"\b([A-Z][a-z]+(?:\s[A-Z][a-z]+)*,\s*[A-Z]{2})\b").unwrap();
    static ref EMAIL_RE: Regex =
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap();
    static ref PHONE_RE: Regex = Regex::new(
        r"(?:\+?1[\s.-]?)?\(?\b\d{3}\)?[\s.-]\d{3}[\s.-]\d{4}\b|\+\d{1,3}(?:[\s.-]\d{2,4}){2,4}\b"
    )
    .unwrap();
    static ref FOUNDED_RE: Regex = Regex::new(
        r"(?i)\b(?:founded|established|incorporated)\s+(?:in\s+)?(1[89]\d{2}|20\d{2})\b|\bsince\s+(1[89]\d{2}|20\d{2})\b|\best\.?\s*(1[89]\d{2}|20\d{2})\b"
    )
    .unwrap();
    static ref TEAM_SIZE_RE: Regex = Regex::new(
        r"(?i)\b(\d{1,3}(?:,\d{3})+|\d+)\+?\s+(?:employees|staff members|staff|people|workers|team members)\b|\bteam of\s+(\d{1,3}(?:,\d{3})+|\d+)\b"
    )
    .unwrap();
    static ref CERTIFICATION_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("ISO 9001", Regex::new(r"(?i)\biso[\s-]?9001\b").unwrap()),
        ("ISO 14001", Regex::new(r"(?i)\biso[\s-]?14001\b").unwrap()),
        ("ISO 45001", Regex::new(r"(?i)\biso[\s-]?45001\b").unwrap()),
        ("ISO 13485", Regex::new(r"(?i)\biso[\s-]?13485\b").unwrap()),
        ("IATF 16949", Regex::new(r"(?i)\biatf[\s-]?16949\b").unwrap()),
        ("AS9100", Regex::new(r"(?i)\bas[\s-]?9100[a-d]?\b").unwrap()),
        ("CE", Regex::new(r"\bCE[\s-](?:[Mm]ark(?:ed|ing)?|[Cc]ertified|[Cc]ompliant)\b").unwrap()),
        ("UL", Regex::new(r"\bUL[\s-](?:[Ll]isted|[Cc]ertified|[Rr]ecognized)\b").unwrap()),
        ("RoHS", Regex::new(r"(?i)\brohs\b").unwrap()),
        ("REACH", Regex::new(r"\bREACH(?:[\s-](?:[Cc]ompliant|[Cc]ompliance|[Cc]ertified)|\b)").unwrap()),
        ("FDA", Regex::new(r"\bFDA[\s-](?:[Rr]egistered|[Aa]pproved|[Cc]ompliant|[Cc]ertified)\b").unwrap()),
        ("GMP", Regex::new(r"\bc?GMP\b").unwrap()),
        ("OHSAS 18001", Regex::new(r"(?i)\bohsas[\s-]?18001\b").unwrap()),
    ];
    static ref SOCIAL_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("LinkedIn", Regex::new(r"(?i)linkedin\.com/(?:company|in|showcase)/").unwrap()),
        ("Facebook", Regex::new(r"(?i)facebook\.com/[A-Za-z0-9.]").unwrap()),
        ("X", Regex::new(r"(?i)(?:twitter|//x)\.com/[A-Za-z0-9_]").unwrap()),
        ("Instagram", Regex::new(r"(?i)instagram\.com/[A-Za-z0-9_.]").unwrap()),
        ("YouTube", Regex::new(r"(?i)youtube\.com/(?:channel|c|user|@)").unwrap()),
    ];
}

/// Lowercase markers identifying common web technologies in page source
const TECH_FINGERPRINTS: &[(&str, &[&str])] = &[
    ("WordPress", &["wp-content", "wp-includes"]),
    ("Shopify", &["cdn.shopify.com", "shopify.theme"]),
    ("React", &["data-reactroot", "react-dom"]),
    ("Next.js", &["/_next/", "__next_data__"]),
    ("Angular", &["ng-version", "ng-app"]),
    ("Vue", &["data-v-app", "vue.min.js", "vue.runtime"]),
    ("Drupal", &["drupal-settings-json", "/sites/default/files"]),
    ("Wix", &["static.wixstatic.com", "wix-code"]),
    ("Squarespace", &["static1.squarespace.com", "squarespace-cdn"]),
    ("Magento", &["mage/cookies", "magento_"]),
    ("Google Analytics", &["google-analytics.com", "googletagmanager.com/gtag"]),
    ("Cloudflare", &["cdnjs.cloudflare.com", "cf-ray", "__cf_bm"]),
    ("jQuery", &["jquery.min.js", "jquery.js", "code.jquery.com"]),
    ("Bootstrap", &["bootstrap.min.css", "bootstrap.min.js", "bootstrap.bundle"]),
    ("HubSpot", &["js.hs-scripts.com", "hubspot"]),
];

/// Minimum length a company name must exceed
const MIN_NAME_CHARS: usize = 2;

/// Text content of an HTML page with scripts, styles and tags removed
pub fn visible_text(html: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(html, " ");
    let without_styles = STYLE_RE.replace_all(&without_scripts, " ");
    TAG_RE
        .replace_all(&without_styles, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract a company name from a search result title.
///
/// Drops leading list numbering and anything after the first ` - ` / ` | `
/// separator. Names of two characters or fewer are rejected.
pub fn company_name_from_title(title: &str) -> Option<String> {
    let stripped = LIST_NUMBER_RE.replace(title, "");
    let name = TITLE_SEPARATOR_RE
        .split(&stripped)
        .next()
        .unwrap_or("")
        .trim()
        .trim_end_matches([',', '.', ':'])
        .trim();

    if name.chars().count() <= MIN_NAME_CHARS {
        None
    } else {
        Some(name.to_string())
    }
}

/// Extract a location from a snippet, preferring explicit "based in" phrasing.
///
/// Falls back to the requested location when the snippet mentions it.
pub fn location_from_snippet(snippet: &str, preferred: Option<&str>) -> Option<String> {
    let explicit = LOCATED_IN_RE
        .captures(snippet)
        .or_else(|| CITY_STATE_RE.captures(snippet))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_end_matches(',').to_string())
        .filter(|loc| loc.chars().count() > MIN_NAME_CHARS);

    if explicit.is_some() {
        return explicit;
    }

    let preferred = preferred.map(str::trim).filter(|p| !p.is_empty())?;
    if snippet.to_lowercase().contains(&preferred.to_lowercase()) {
        Some(preferred.to_string())
    } else {
        None
    }
}

/// First email address, else first phone number
pub fn contact_from_text(text: &str) -> Option<String> {
    EMAIL_RE
        .find(text)
        .or_else(|| PHONE_RE.find(text))
        .map(|m| m.as_str().trim().to_string())
}

/// Year the company was founded ("founded in 1987", "since 1987", "est. 1987")
pub fn founded_year(text: &str) -> Option<i32> {
    FOUNDED_RE.captures_iter(text).find_map(|caps| {
        caps.iter()
            .skip(1)
            .flatten()
            .next()
            .and_then(|m| m.as_str().parse().ok())
    })
}

/// Headcount estimate ("250 employees", "team of 40")
pub fn team_size(text: &str) -> Option<u32> {
    TEAM_SIZE_RE.captures_iter(text).find_map(|caps| {
        caps.iter()
            .skip(1)
            .flatten()
            .next()
            .and_then(|m| m.as_str().replace(',', "").parse::<u32>().ok())
            .filter(|n| *n > 0)
    })
}

/// Certification names mentioned in the text, in canonical form and order
pub fn certifications(text: &str) -> Vec<String> {
    CERTIFICATION_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Social platforms linked from the page
pub fn social_platforms(html: &str) -> Vec<String> {
    SOCIAL_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(html))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Technologies fingerprinted in the page source
pub fn tech_stack(html: &str) -> Vec<String> {
    let lower = html.to_lowercase();
    TECH_FINGERPRINTS
        .iter()
        .filter(|(_, markers)| markers.iter().any(|marker| lower.contains(marker)))
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Merge certification lists, keeping first-seen order and dropping case-insensitive duplicates
pub fn merge_certifications<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut merged: Vec<String> = Vec::new();
    for cert in lists.into_iter().flatten() {
        let cert = cert.trim();
        if cert.is_empty() {
            continue;
        }
        if !merged.iter().any(|c| c.eq_ignore_ascii_case(cert)) {
            merged.push(cert.to_string());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_text_drops_markup() {
        let html = "<html><head><style>p { color: red; }</style>\
            <script>var founded = 'founded in 1900';</script></head>\
            <body><p>Founded in 1987.</p><p>Team of 40</p></body></html>";
        assert_eq!(visible_text(html), "Founded in 1987. Team of 40");
    }

    #[test]
    fn test_company_name_strips_numbering_and_suffix() {
        assert_eq!(
            company_name_from_title("1. Lone Star Steel Co. - Industrial Steel Supplier"),
            Some("Lone Star Steel Co".to_string())
        );
        assert_eq!(
            company_name_from_title("Gulf Coast Metals | Houston, TX"),
            Some("Gulf Coast Metals".to_string())
        );
        assert_eq!(
            company_name_from_title("Acme Fasteners"),
            Some("Acme Fasteners".to_string())
        );
    }

    #[test]
    fn test_company_name_rejects_short_names() {
        assert_eq!(company_name_from_title("AB - Steel"), None);
        assert_eq!(company_name_from_title("3. X"), None);
        assert_eq!(company_name_from_title(""), None);
    }

    #[test]
    fn test_location_patterns() {
        assert_eq!(
            location_from_snippet("A steel service center based in Houston, Texas since 1990.", None),
            Some("Houston, Texas".to_string())
        );
        assert_eq!(
            location_from_snippet("Call our Dallas, TX office for quotes.", None),
            Some("Dallas, TX".to_string())
        );
    }

    #[test]
    fn test_location_falls_back_to_preferred_mention() {
        assert_eq!(
            location_from_snippet("serving customers across texas and oklahoma", Some("Texas")),
            Some("Texas".to_string())
        );
        assert_eq!(location_from_snippet("serving customers nationwide", Some("Texas")), None);
    }

    #[test]
    fn test_contact_prefers_email() {
        assert_eq!(
            contact_from_text("Reach sales@lonestarsteel.com or (713) 555-0142"),
            Some("sales@lonestarsteel.com".to_string())
        );
        assert_eq!(
            contact_from_text("Call (713) 555-0142 today"),
            Some("(713) 555-0142".to_string())
        );
        assert_eq!(contact_from_text("No contact details here"), None);
    }

    #[test]
    fn test_founded_year_variants() {
        assert_eq!(founded_year("Founded in 1987 by two engineers"), Some(1987));
        assert_eq!(founded_year("Serving Texas since 2004."), Some(2004));
        assert_eq!(founded_year("Est. 1952"), Some(1952));
        assert_eq!(founded_year("Over 1000 products"), None);
    }

    #[test]
    fn test_team_size_variants() {
        assert_eq!(team_size("We employ 1,200 employees worldwide"), Some(1200));
        assert_eq!(team_size("a dedicated team of 40 engineers"), Some(40));
        assert_eq!(team_size("500+ staff across three plants"), Some(500));
        assert_eq!(team_size("no headcount mentioned"), None);
    }

    #[test]
    fn test_certifications_canonical_names() {
        let certs = certifications("ISO-9001 and iso 14001 certified, RoHS compliant, AS9100D");
        assert_eq!(certs, vec!["ISO 9001", "ISO 14001", "AS9100", "RoHS"]);
        assert!(certifications("We reach customers everywhere").is_empty());
    }

    #[test]
    fn test_social_platforms() {
        let html = r#"<a href="https://www.linkedin.com/company/acme/">in</a>
            <a href="https://twitter.com/acme">tw</a>
            <a href="https://www.youtube.com/@acme">yt</a>"#;
        assert_eq!(social_platforms(html), vec!["LinkedIn", "X", "YouTube"]);
    }

    #[test]
    fn test_tech_stack() {
        let html = r#"<link href="/wp-content/themes/x/style.css">
            <script src="https://code.jquery.com/jquery.min.js"></script>"#;
        assert_eq!(tech_stack(html), vec!["WordPress", "jQuery"]);
    }

    #[test]
    fn test_merge_certifications_dedupes_case_insensitively() {
        let a = vec!["ISO 9001".to_string(), "RoHS".to_string()];
        let b = vec!["iso 9001".to_string(), "UL".to_string(), " ".to_string()];
        assert_eq!(
            merge_certifications([a.as_slice(), b.as_slice()]),
            vec!["ISO 9001", "RoHS", "UL"]
        );
    }
}
