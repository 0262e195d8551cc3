//! Candidate discovery.
//!
//! A [`SearchRequest`] is built once per item from the title and the config,
//! handed to the configured [`ImageSearchProvider`], and the raw candidates
//! that come back are filtered and ordered by [`rank`](rank::rank).
//!
//! Providers fail soft: network errors, empty bodies and unparseable
//! responses all produce an empty candidate list plus an activity log entry,
//! never an `Err`. The generator treats "no candidates" as the signal to draw
//! a fallback card.
//!
//! | Provider | Source | Dimensions |
//! |---|---|---|
//! | [`ScrapeProvider`] | image search results page | declared, or synthetic 1200×800 |
//! | [`ApiProvider`] | JSON image search API | declared |

pub mod api;
pub mod rank;
pub mod scrape;

pub use api::ApiProvider;
pub use scrape::ScrapeProvider;

use crate::activity_log::LogSink;
use crate::config::GeneratorConfig;
use crate::http::Fetcher;
use serde::{Deserialize, Serialize};

/// A discovered image URL plus its declared size. Not yet downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl Candidate {
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            width,
            height,
        }
    }

    /// Pixel area, used for `best` ordering only.
    pub fn score(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Order in which candidates are tried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionPolicy {
    /// Provider relevance order.
    #[default]
    First,
    /// Largest pixel area first.
    Best,
    /// One random candidate first, the rest in relevance order.
    Random,
}

/// Which provider answers searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Scrape,
    Api,
}

/// Provider-side filters. Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub rights: String,
    pub size: String,
    pub aspect: String,
    pub image_type: String,
    /// File extension, or `all`.
    pub filetype: String,
}

impl SearchFilters {
    /// The file extension filter, if one is active.
    pub fn extension(&self) -> Option<&str> {
        let ext = self.filetype.trim();
        if ext.is_empty() || ext.eq_ignore_ascii_case("all") {
            None
        } else {
            Some(ext)
        }
    }
}

/// Everything a provider and the ranker need for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub title: String,
    pub language: String,
    pub filters: SearchFilters,
    pub blacklist: Vec<String>,
    pub selection: SelectionPolicy,
}

impl SearchRequest {
    pub fn from_config(title: &str, config: &GeneratorConfig) -> Self {
        Self {
            title: title.trim().to_string(),
            language: config.general.language.clone(),
            filters: SearchFilters {
                rights: config.search.rights.clone(),
                size: config.search.size.clone(),
                aspect: config.search.aspect.clone(),
                image_type: config.search.image_type.clone(),
                filetype: config.search.filetype.clone(),
            },
            blacklist: config.search.blacklist.clone(),
            selection: config.general.selection,
        }
    }

    /// The term sent to the provider: the title itself.
    pub fn term(&self) -> &str {
        &self.title
    }
}

/// Something that turns a search term into candidates.
pub trait ImageSearchProvider {
    /// Short name for log messages.
    fn name(&self) -> &'static str;

    /// Search for `term`. Never fails; problems are logged and yield an
    /// empty list.
    fn search(
        &self,
        term: &str,
        request: &SearchRequest,
        fetcher: &dyn Fetcher,
        log: &mut dyn LogSink,
    ) -> Vec<Candidate>;
}

/// Pick the provider the config nominates.
///
/// The API provider needs a key; without one the scraping provider is used
/// instead and the API is never called.
pub fn provider_from_config(config: &GeneratorConfig) -> Box<dyn ImageSearchProvider> {
    match (config.search.provider, config.search.resolved_api_key()) {
        (ProviderKind::Api, Some(key)) => {
            Box::new(ApiProvider::new(key, config.search.api_count))
        }
        (ProviderKind::Api, None) => {
            log::warn!("search.provider = \"api\" but no API key is set, using scrape provider");
            Box::new(ScrapeProvider::new())
        }
        (ProviderKind::Scrape, _) => Box::new(ScrapeProvider::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_area() {
        assert_eq!(Candidate::new("u", 1920, 1080).score(), 2_073_600);
        assert_eq!(Candidate::new("u", 0, 1080).score(), 0);
    }

    #[test]
    fn score_does_not_overflow() {
        let c = Candidate::new("u", u32::MAX, u32::MAX);
        assert_eq!(c.score(), u32::MAX as u64 * u32::MAX as u64);
    }

    #[test]
    fn extension_filter_ignores_all() {
        let mut f = SearchFilters::default();
        assert_eq!(f.extension(), None);
        f.filetype = "all".into();
        assert_eq!(f.extension(), None);
        f.filetype = "png".into();
        assert_eq!(f.extension(), Some("png"));
    }

    #[test]
    fn request_from_config_trims_title() {
        let mut config = GeneratorConfig::default();
        config.general.selection = SelectionPolicy::Best;
        config.search.blacklist = vec!["pinterest.com".into()];
        let request = SearchRequest::from_config("  Gatos Raros ", &config);
        assert_eq!(request.term(), "Gatos Raros");
        assert_eq!(request.selection, SelectionPolicy::Best);
        assert_eq!(request.blacklist, vec!["pinterest.com"]);
    }

    #[test]
    fn api_without_key_uses_scrape() {
        let mut config = GeneratorConfig::default();
        config.search.provider = ProviderKind::Api;
        config.search.api_key = String::new();
        // Only when the environment does not provide one either
        if config.search.resolved_api_key().is_none() {
            assert_eq!(provider_from_config(&config).name(), "scrape");
        }
    }

    #[test]
    fn api_with_key_uses_api() {
        let mut config = GeneratorConfig::default();
        config.search.provider = ProviderKind::Api;
        config.search.api_key = "secret".into();
        assert_eq!(provider_from_config(&config).name(), "api");
    }
}
