//! API provider: a JSON image search endpoint authenticated with a
//! subscription key.
//!
//! ```text
//! GET https://api.bing.microsoft.com/v7.0/images/search?q=<term>&count=<n>&mkt=<locale>
//! Ocp-Apim-Subscription-Key: <key>
//! ```
//!
//! Only `value[].contentUrl`, `width` and `height` are read; everything else
//! in the response is ignored. Dimensions are authoritative, so no synthetic
//! sizing happens here.

use super::{Candidate, ImageSearchProvider, SearchRequest};
use crate::activity_log::LogSink;
use crate::http::Fetcher;
use serde::Deserialize;

pub const API_ENDPOINT: &str = "https://api.bing.microsoft.com/v7.0/images/search";
pub const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
pub const DEFAULT_COUNT: u32 = 35;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    value: Option<Vec<ApiImage>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiImage {
    content_url: Option<String>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

/// Provider B.
#[derive(Debug, Clone)]
pub struct ApiProvider {
    endpoint: String,
    key: String,
    count: u32,
}

impl ApiProvider {
    pub fn new(key: impl Into<String>, count: u32) -> Self {
        Self {
            endpoint: API_ENDPOINT.to_string(),
            key: key.into(),
            count: count.clamp(1, 150),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn build_url(&self, term: &str, language: &str) -> String {
        let mut url = format!(
            "{}?q={}&count={}",
            self.endpoint,
            urlencoding::encode(term),
            self.count
        );
        if let Some(market) = market_for(language) {
            url.push_str(&format!("&mkt={}", urlencoding::encode(&market)));
        }
        url
    }
}

impl ImageSearchProvider for ApiProvider {
    fn name(&self) -> &'static str {
        "api"
    }

    fn search(
        &self,
        term: &str,
        request: &SearchRequest,
        fetcher: &dyn Fetcher,
        log: &mut dyn LogSink,
    ) -> Vec<Candidate> {
        if self.key.trim().is_empty() {
            log.error("API search skipped: no API key configured.");
            return Vec::new();
        }

        let url = self.build_url(term, &request.language);
        log.info(&format!("API search URL built: {url}"));
        log.info("Sending API search request...");

        let body = match fetcher.get_text(&url, &[(KEY_HEADER, self.key.as_str())]) {
            Ok(body) => body,
            Err(err) => {
                log.error(&format!("API search request failed: {err}"));
                return Vec::new();
            }
        };

        match parse_response(&body) {
            Some(candidates) => candidates,
            None => {
                log.error("API response contained no result list.");
                Vec::new()
            }
        }
    }
}

/// Map a response body to candidates. `None` when the body is not JSON or
/// has no `value` array.
pub fn parse_response(body: &str) -> Option<Vec<Candidate>> {
    let response: ApiResponse = serde_json::from_str(body).ok()?;
    let images = response.value?;
    Some(
        images
            .into_iter()
            .filter_map(|image| {
                let url = image.content_url?;
                Some(Candidate::new(url, image.width, image.height))
            })
            .collect(),
    )
}

/// Market code for a language setting: `es` → `es-ES`, `en-us` → `en-US`.
pub fn market_for(language: &str) -> Option<String> {
    let language = language.trim();
    if language.is_empty() {
        return None;
    }
    let (lang, region) = match language.split_once(['-', '_']) {
        Some((lang, region)) => (lang.to_lowercase(), region.to_uppercase()),
        None => {
            let lang = language.to_lowercase();
            let region = match lang.as_str() {
                "en" => "US".to_string(),
                other => other.to_uppercase(),
            };
            (lang, region)
        }
    };
    Some(format!("{lang}-{region}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity_log::{ActivityLog, LogKind};
    use crate::http::{Download, FetchError, HeadInfo};
    use crate::search::{SearchFilters, SelectionPolicy};
    use std::cell::RefCell;

    struct RecordingFetcher {
        body: String,
        headers: RefCell<Vec<(String, String)>>,
    }

    impl Fetcher for RecordingFetcher {
        fn get_text(&self, _url: &str, headers: &[(&str, &str)]) -> Result<String, FetchError> {
            self.headers
                .borrow_mut()
                .extend(headers.iter().map(|(k, v)| (k.to_string(), v.to_string())));
            Ok(self.body.clone())
        }

        fn head(&self, _url: &str) -> Result<HeadInfo, FetchError> {
            unreachable!()
        }

        fn get_bytes(&self, _url: &str) -> Result<Download, FetchError> {
            unreachable!()
        }
    }

    fn request() -> SearchRequest {
        SearchRequest {
            title: "gatos".into(),
            language: "es".into(),
            filters: SearchFilters::default(),
            blacklist: vec![],
            selection: SelectionPolicy::First,
        }
    }

    #[test]
    fn parse_maps_results_one_to_one() {
        let body = r#"{"_type":"Images","value":[
            {"contentUrl":"https://a.com/1.jpg","width":1024,"height":768,"name":"x"},
            {"contentUrl":"https://b.com/2.png","width":300,"height":300}
        ]}"#;
        assert_eq!(
            parse_response(body).unwrap(),
            vec![
                Candidate::new("https://a.com/1.jpg", 1024, 768),
                Candidate::new("https://b.com/2.png", 300, 300),
            ]
        );
    }

    #[test]
    fn parse_skips_entries_without_url() {
        let body = r#"{"value":[{"width":10,"height":10},{"contentUrl":"https://a/1","width":5}]}"#;
        assert_eq!(parse_response(body).unwrap(), vec![Candidate::new("https://a/1", 5, 0)]);
    }

    #[test]
    fn parse_without_value_is_none() {
        assert_eq!(parse_response(r#"{"error":"quota"}"#), None);
        assert_eq!(parse_response("<html>"), None);
    }

    #[test]
    fn market_codes() {
        assert_eq!(market_for("es").as_deref(), Some("es-ES"));
        assert_eq!(market_for("en").as_deref(), Some("en-US"));
        assert_eq!(market_for("pt_br").as_deref(), Some("pt-BR"));
        assert_eq!(market_for(" "), None);
    }

    #[test]
    fn url_has_query_count_and_market() {
        let url = ApiProvider::new("k", 20).build_url("gatos raros", "es");
        assert_eq!(
            url,
            "https://api.bing.microsoft.com/v7.0/images/search?q=gatos%20raros&count=20&mkt=es-ES"
        );
    }

    #[test]
    fn key_sent_in_header() {
        let fetcher = RecordingFetcher {
            body: r#"{"value":[]}"#.into(),
            headers: RefCell::new(vec![]),
        };
        let mut log = ActivityLog::new();
        let found = ApiProvider::new("secret", 10).search("gatos", &request(), &fetcher, &mut log);
        assert!(found.is_empty());
        assert_eq!(
            fetcher.headers.borrow().as_slice(),
            [(KEY_HEADER.to_string(), "secret".to_string())]
        );
    }

    #[test]
    fn missing_key_is_soft_failure() {
        let fetcher = RecordingFetcher {
            body: String::new(),
            headers: RefCell::new(vec![]),
        };
        let mut log = ActivityLog::new();
        let found = ApiProvider::new("", 10).search("gatos", &request(), &fetcher, &mut log);
        assert!(found.is_empty());
        assert!(fetcher.headers.borrow().is_empty());
        assert_eq!(log.entries().next().unwrap().kind, LogKind::Error);
    }
}
