//! Scraping provider: fetch an image search results page and pull image URLs
//! out of its markup.
//!
//! ## Query
//!
//! ```text
//! https://www.google.com/search?q=<term>[ filetype:<ext>]&tbm=isch&hl=<lang>[&tbs=<filters>]
//! ```
//!
//! `tbs` joins the non-empty filters with commas in a fixed order:
//! `sur:` (usage rights), `isz:` (size), `iar:` (aspect), `itp:` (type),
//! `ift:` (file extension). It is omitted when no filter is set.
//!
//! ## Extraction
//!
//! The results markup changes often, so extraction is two-tier:
//!
//! 1. **Strict**: `["<url>", <width>, <height>]` triples from the embedded
//!    result data, which carry real dimensions.
//! 2. **Permissive** (only when strict finds nothing): `data-ou` attributes
//!    and any quoted string ending in `.jpg|.jpeg|.png|.webp`. These have no
//!    dimensions and get a synthetic [`SYNTHETIC_WIDTH`]×[`SYNTHETIC_HEIGHT`]
//!    so the size floor does not reject them.
//!
//! JSON escapes (`\u003d`, `\/`) in captured URLs are decoded, and duplicates
//! are dropped keeping the first occurrence.

use super::{Candidate, ImageSearchProvider, SearchFilters, SearchRequest};
use crate::activity_log::LogSink;
use crate::http::Fetcher;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

pub const SEARCH_ENDPOINT: &str = "https://www.google.com/search";

pub const SYNTHETIC_WIDTH: u32 = 1200;
pub const SYNTHETIC_HEIGHT: u32 = 800;

static STRICT_TRIPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[\s*"(https?:\\?/\\?/[^"]+)"\s*,\s*(\d+)\s*,\s*(\d+)\s*\]"#)
        .expect("static regex is valid")
});

static DATA_OU: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-ou="(https?://[^"]*)""#).expect("static regex is valid"));

static QUOTED_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"(https?:\\?/\\?/[^"\s]+?\.(?:jpg|jpeg|png|webp))""#)
        .expect("static regex is valid")
});

/// Provider A.
#[derive(Debug, Clone)]
pub struct ScrapeProvider {
    endpoint: String,
}

impl ScrapeProvider {
    pub fn new() -> Self {
        Self {
            endpoint: SEARCH_ENDPOINT.to_string(),
        }
    }

    /// Provider pointed at a different search endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for ScrapeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSearchProvider for ScrapeProvider {
    fn name(&self) -> &'static str {
        "scrape"
    }

    fn search(
        &self,
        term: &str,
        request: &SearchRequest,
        fetcher: &dyn Fetcher,
        log: &mut dyn LogSink,
    ) -> Vec<Candidate> {
        let url = build_search_url(&self.endpoint, term, &request.language, &request.filters);
        log.info(&format!("Search URL built: {url}"));
        log.info("Sending search request...");

        let body = match fetcher.get_text(&url, &[]) {
            Ok(body) => body,
            Err(err) => {
                log.error(&format!("Search request failed: {err}"));
                return Vec::new();
            }
        };

        let candidates = extract_candidates(&body);
        if candidates.is_empty() {
            log.error("No images found in the search response.");
        }
        candidates
    }
}

/// Query term with the provider's own `filetype:` hint appended.
pub fn query_term(term: &str, filters: &SearchFilters) -> String {
    match filters.extension() {
        Some(ext) => format!("{term} filetype:{ext}"),
        None => term.to_string(),
    }
}

/// Comma-joined filter token, `None` when no filter is set.
pub fn filter_token(filters: &SearchFilters) -> Option<String> {
    let parts: Vec<String> = [
        ("sur", filters.rights.as_str()),
        ("isz", filters.size.as_str()),
        ("iar", filters.aspect.as_str()),
        ("itp", filters.image_type.as_str()),
        ("ift", filters.extension().unwrap_or("")),
    ]
    .into_iter()
    .filter(|(_, value)| !value.trim().is_empty())
    .map(|(key, value)| format!("{key}:{}", value.trim()))
    .collect();

    (!parts.is_empty()).then(|| parts.join(","))
}

pub fn build_search_url(
    endpoint: &str,
    term: &str,
    language: &str,
    filters: &SearchFilters,
) -> String {
    let mut url = format!(
        "{endpoint}?q={}&tbm=isch",
        urlencoding::encode(&query_term(term, filters))
    );
    if !language.trim().is_empty() {
        url.push_str(&format!("&hl={}", urlencoding::encode(language.trim())));
    }
    if let Some(token) = filter_token(filters) {
        url.push_str(&format!("&tbs={}", urlencoding::encode(&token)));
    }
    url
}

/// Pull candidates out of a results page. See the module docs for the two
/// tiers.
pub fn extract_candidates(body: &str) -> Vec<Candidate> {
    let strict: Vec<Candidate> = STRICT_TRIPLE
        .captures_iter(body)
        .filter_map(|caps| {
            let width = caps[2].parse().ok()?;
            let height = caps[3].parse().ok()?;
            Some(Candidate::new(decode_escapes(&caps[1]), width, height))
        })
        .collect();
    if !strict.is_empty() {
        log::debug!("strict pattern matched {} candidates", strict.len());
        return dedup(strict);
    }
    log::debug!("strict pattern matched nothing, trying permissive patterns");

    let permissive = DATA_OU
        .captures_iter(body)
        .chain(QUOTED_IMAGE.captures_iter(body))
        .map(|caps| Candidate::new(decode_escapes(&caps[1]), SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT))
        .collect();
    dedup(permissive)
}

/// Decode JSON string escapes. Falls back to the raw text when it is not a
/// valid JSON string body.
pub fn decode_escapes(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }
    serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_string())
}

fn dedup(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.url.clone()))
        .collect()
}
