//! The orchestrator: one title in, one [`Outcome`] out.
//!
//! ```text
//! preconditions → search → unwrap proxies → extension filter → rank
//!     → for each candidate: HEAD → GET → decode → composite → store
//!     → (nothing stored) fallback card → store
//! ```
//!
//! The first candidate that makes it all the way through wins; later ones
//! are never fetched. Every per-candidate problem becomes a [`SkipReason`],
//! is logged, and the loop moves on. [`Generator::run`] never returns an
//! error: the caller always gets a definite outcome and the activity log
//! explains how it got there.

use crate::activity_log::LogSink;
use crate::config::{ConfigError, GeneratorConfig};
use crate::fonts::FontResolver;
use crate::http::{FetchError, Fetcher, HttpFetcher};
use crate::imaging::compositor::probe;
use crate::imaging::{
    CardOptions, CompositeError, CompositingOptions, Compositor, TitleRender, generate_card,
};
use crate::search::rank::{self, filter_by_extension, is_auth_walled, path_extension};
use crate::search::{Candidate, ImageSearchProvider, SearchRequest, provider_from_config};
use crate::store::{Artifact, ArtifactStore, IMAGE_EXTENSIONS, StoreError, StoredArtifact};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Terminal state of one run.
#[derive(Debug)]
pub enum Outcome {
    /// A downloaded image was stored.
    Success {
        artifact: StoredArtifact,
        source_url: String,
    },
    /// No candidate worked; a fallback card was stored.
    FallbackSuccess {
        artifact: StoredArtifact,
        title: TitleRender,
    },
    Failure(FailureReason),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "SUCCESS",
            Outcome::FallbackSuccess { .. } => "FALLBACK_SUCCESS",
            Outcome::Failure(_) => "FAILURE",
        }
    }

    pub fn artifact(&self) -> Option<&StoredArtifact> {
        match self {
            Outcome::Success { artifact, .. } | Outcome::FallbackSuccess { artifact, .. } => {
                Some(artifact)
            }
            Outcome::Failure(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }
}

/// Why a run produced nothing.
#[derive(Error, Debug)]
pub enum FailureReason {
    #[error("generation is disabled in the configuration")]
    Disabled,
    #[error("the item has no title")]
    NoTitle,
    #[error("no candidate succeeded and the fallback card is disabled")]
    NoImage,
    #[error("fallback card generation failed: {0}")]
    Fallback(#[source] CompositeError),
    #[error("could not store the fallback card: {0}")]
    Store(#[source] StoreError),
}

/// Why one candidate was passed over.
#[derive(Debug)]
pub enum SkipReason {
    AuthWalled,
    HeadFailed(FetchError),
    NotAnImage {
        status: u16,
        content_type: Option<String>,
    },
    Download(FetchError),
    Composite(CompositeError),
    Store(StoreError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AuthWalled => write!(f, "host requires authentication"),
            SkipReason::HeadFailed(e) => write!(f, "HEAD failed: {e}"),
            SkipReason::NotAnImage {
                status,
                content_type,
            } => write!(
                f,
                "HEAD returned {status} with Content-Type {}",
                content_type.as_deref().unwrap_or("(none)")
            ),
            SkipReason::Download(e) => write!(f, "download failed: {e}"),
            SkipReason::Composite(e) => write!(f, "image processing failed: {e}"),
            SkipReason::Store(e) => write!(f, "could not store image: {e}"),
        }
    }
}

/// Sequences search, ranking, download, compositing and fallback for one
/// item at a time.
pub struct Generator {
    config: GeneratorConfig,
    provider: Box<dyn ImageSearchProvider>,
    fetcher: Box<dyn Fetcher>,
    compositor: Compositor,
    options: CompositingOptions,
    card: CardOptions,
}

impl Generator {
    /// Build a generator with explicit collaborators.
    pub fn new(
        config: GeneratorConfig,
        provider: Box<dyn ImageSearchProvider>,
        fetcher: Box<dyn Fetcher>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let options = CompositingOptions::from_config(&config)?;
        let card = CardOptions::from_config(&config)?;
        let compositor = Compositor::new(FontResolver::new(&config.fonts.dir));
        Ok(Self {
            config,
            provider,
            fetcher,
            compositor,
            options,
            card,
        })
    }

    /// Build a generator talking to the real network, with the provider the
    /// config nominates.
    pub fn from_config(config: GeneratorConfig) -> Result<Self, ConfigError> {
        let fetcher = HttpFetcher::new(
            Duration::from_secs(config.search.timeout_secs),
            &config.search.user_agent,
        );
        let provider = provider_from_config(&config);
        Self::new(config, provider, Box::new(fetcher))
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Produce and store a featured image for `title`.
    pub fn run(
        &self,
        title: &str,
        store: &mut dyn ArtifactStore,
        log: &mut dyn LogSink,
    ) -> Outcome {
        log.info(&format!("Starting featured image generation for '{title}'."));

        if !self.config.general.enable {
            log.info("Aborted: generation is disabled in the configuration.");
            return Outcome::Failure(FailureReason::Disabled);
        }
        if title.trim().is_empty() {
            log.error("Aborted: the item has no title.");
            return Outcome::Failure(FailureReason::NoTitle);
        }

        let request = SearchRequest::from_config(title, &self.config);
        log.info(&format!("Search term: '{}'.", request.term()));

        let candidates = self.discover(&request, log);
        for candidate in &candidates {
            match self.try_candidate(candidate, &request, store, log) {
                Ok(success) => return success,
                Err(SkipReason::AuthWalled) => {
                    log.info(&format!("Skipped auth-walled URL: {}", candidate.url));
                }
                Err(reason) => {
                    log.error(&format!("Candidate {} skipped: {reason}", candidate.url));
                }
            }
        }
        if !candidates.is_empty() {
            log.error("No candidate URL could be downloaded and processed.");
        }

        self.fallback(&request, store, log)
    }

    /// Search, filter and rank. An empty result means "go to fallback".
    fn discover(&self, request: &SearchRequest, log: &mut dyn LogSink) -> Vec<Candidate> {
        let found = self
            .provider
            .search(request.term(), request, self.fetcher.as_ref(), log);
        if found.is_empty() {
            return found;
        }
        log.info(&format!("Found {} candidate images.", found.len()));

        // Filters and the blacklist must see the proxied image, not the proxy
        let found: Vec<Candidate> = found
            .into_iter()
            .map(|mut candidate| {
                candidate.url = candidate.url.trim().to_string();
                if let Some(inner) = rank::unwrap_next_image(&candidate.url) {
                    log.info(&format!("Extracted Next.js image URL: {inner}"));
                    candidate.url = inner;
                }
                candidate
            })
            .collect();

        let found = match request.filters.extension() {
            Some(ext) => {
                let kept = filter_by_extension(found, ext);
                log.info(&format!(
                    "After filtering by '.{ext}', {} images remain.",
                    kept.len()
                ));
                if kept.is_empty() {
                    log.error("No candidate passed the file type filter.");
                    return kept;
                }
                kept
            }
            None => found,
        };

        let before = found.len();
        let ranked = rank::rank(found, &request.blacklist, request.selection);
        log.info(&format!(
            "{} of {before} candidates remain after blacklist and size filters.",
            ranked.len()
        ));
        if ranked.is_empty() {
            log.error("All candidates were filtered out.");
        }
        ranked
    }

    fn try_candidate(
        &self,
        candidate: &Candidate,
        request: &SearchRequest,
        store: &mut dyn ArtifactStore,
        log: &mut dyn LogSink,
    ) -> Result<Outcome, SkipReason> {
        let url = candidate.url.clone();
        if is_auth_walled(&url) {
            return Err(SkipReason::AuthWalled);
        }

        log.info(&format!("Trying candidate: {url}"));

        let mut content_type = None;
        if self.config.search.head_check {
            let head = self.fetcher.head(&url).map_err(SkipReason::HeadFailed)?;
            if !head.is_image() {
                return Err(SkipReason::NotAnImage {
                    status: head.status,
                    content_type: head.content_type,
                });
            }
            content_type = head.content_type;
        }

        let download = self.fetcher.get_bytes(&url).map_err(SkipReason::Download)?;
        let content_type = download.content_type.or(content_type);

        let artifact = if self.options.any_enabled() {
            let composited = self
                .compositor
                .composite(&download.bytes, request.term(), &self.options)
                .map_err(SkipReason::Composite)?;
            log_title_render(&composited.title, log);
            Artifact {
                bytes: composited.bytes,
                extension: "jpg".into(),
                title: request.term().to_string(),
                source_url: Some(url.clone()),
            }
        } else {
            probe(&download.bytes).map_err(SkipReason::Composite)?;
            Artifact {
                extension: resolve_extension(&url, content_type.as_deref()),
                bytes: download.bytes,
                title: request.term().to_string(),
                source_url: Some(url.clone()),
            }
        };

        let stored = store.store(&artifact).map_err(SkipReason::Store)?;
        log.success(&format!(
            "Image saved for '{}': {} (source: {url}).",
            request.term(),
            stored.path.display()
        ));
        Ok(Outcome::Success {
            artifact: stored,
            source_url: url,
        })
    }

    fn fallback(
        &self,
        request: &SearchRequest,
        store: &mut dyn ArtifactStore,
        log: &mut dyn LogSink,
    ) -> Outcome {
        if !self.config.fallback.enabled {
            log.error("No image was generated: no candidate succeeded and the fallback card is disabled.");
            return Outcome::Failure(FailureReason::NoImage);
        }

        log.info("No usable candidate, generating fallback card.");
        let card = match generate_card(
            request.term(),
            &self.card,
            &self.options,
            self.compositor.fonts(),
        ) {
            Ok(card) => card,
            Err(err) => {
                log.error(&format!("Fallback card generation failed: {err}"));
                return Outcome::Failure(FailureReason::Fallback(err));
            }
        };
        log_title_render(&card.title, log);

        let artifact = Artifact {
            bytes: card.bytes,
            extension: "jpg".into(),
            title: request.term().to_string(),
            source_url: None,
        };
        match store.store(&artifact) {
            Ok(stored) => {
                log.success(&format!(
                    "Fallback card saved for '{}': {}.",
                    request.term(),
                    stored.path.display()
                ));
                Outcome::FallbackSuccess {
                    artifact: stored,
                    title: card.title,
                }
            }
            Err(err) => {
                log.error(&format!("Could not store the fallback card: {err}"));
                Outcome::Failure(FailureReason::Store(err))
            }
        }
    }
}

fn log_title_render(render: &TitleRender, log: &mut dyn LogSink) {
    if let TitleRender::Diagnostic(message) = render {
        log.error(&format!("{message}; drew a diagnostic instead of the title."));
    }
}

/// File extension for an uncomposited download: the URL's own extension if
/// it is a known image type, else one derived from the content type, else
/// `jpg`.
pub fn resolve_extension(url: &str, content_type: Option<&str>) -> String {
    if let Some(ext) = path_extension(url)
        && IMAGE_EXTENSIONS.contains(&ext.as_str())
    {
        return ext;
    }
    let content_type = content_type.unwrap_or("").to_ascii_lowercase();
    let ext = if content_type.contains("jpeg") {
        "jpg"
    } else if content_type.contains("png") {
        "png"
    } else if content_type.contains("gif") {
        "gif"
    } else if content_type.contains("webp") {
        "webp"
    } else if content_type.contains("bmp") {
        "bmp"
    } else {
        "jpg"
    };
    ext.to_string()
}
