//! Blocking HTTP access for search pages and candidate downloads.
//!
//! Everything that touches the network goes through the [`Fetcher`] trait so
//! the search providers and the generator can be driven by canned responses in
//! tests. [`HttpFetcher`] is the real implementation on top of a shared
//! `ureq` agent with one timeout for every request.

use std::io::Read;
use std::time::Duration;
use thiserror::Error;

/// User agent sent with every request. Mobile Chrome gets the lighter
/// results markup from the scraping provider.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 6.0.1; Nexus 5X Build/MMB29P) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/41.0.2272.96";

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Downloads larger than this are rejected.
pub const MAX_DOWNLOAD_BYTES: u64 = 25 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("empty response body")]
    Empty,
    #[error("response larger than {max} bytes", max = MAX_DOWNLOAD_BYTES)]
    TooLarge,
}

impl From<ureq::Error> for FetchError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => FetchError::Status(code),
            ureq::Error::Transport(transport) => FetchError::Transport(transport.to_string()),
        }
    }
}

/// Result of a HEAD probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadInfo {
    pub status: u16,
    pub content_type: Option<String>,
}

impl HeadInfo {
    /// 200 with an `image/*` content type.
    pub fn is_image(&self) -> bool {
        self.status == 200
            && self
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.to_ascii_lowercase().contains("image/"))
    }
}

/// Body of a successful GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Capability to talk HTTP.
pub trait Fetcher {
    /// GET a text body. Non-2xx statuses are errors.
    fn get_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, FetchError>;

    /// HEAD a URL. Non-2xx statuses are reported, not errors.
    fn head(&self, url: &str) -> Result<HeadInfo, FetchError>;

    /// GET a binary body. Non-2xx statuses and empty bodies are errors.
    fn get_bytes(&self, url: &str) -> Result<Download, FetchError>;
}

/// `ureq`-backed fetcher.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .build();
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            DEFAULT_USER_AGENT,
        )
    }
}

impl Fetcher for HttpFetcher {
    fn get_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, FetchError> {
        let mut request = self.agent.get(url);
        for (name, value) in headers {
            request = request.set(name, value);
        }
        let body = request.call()?.into_string()?;
        if body.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(body)
    }

    fn head(&self, url: &str) -> Result<HeadInfo, FetchError> {
        let response = match self.agent.head(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(err) => return Err(err.into()),
        };
        Ok(HeadInfo {
            status: response.status(),
            content_type: response.header("Content-Type").map(str::to_string),
        })
    }

    fn get_bytes(&self, url: &str) -> Result<Download, FetchError> {
        log::debug!("GET {url}");
        let response = self.agent.get(url).call()?;
        let content_type = response.header("Content-Type").map(str::to_string);

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_DOWNLOAD_BYTES + 1)
            .read_to_end(&mut bytes)?;
        if bytes.len() as u64 > MAX_DOWNLOAD_BYTES {
            return Err(FetchError::TooLarge);
        }
        if bytes.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(Download {
            bytes,
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_image_check() {
        let ok = HeadInfo {
            status: 200,
            content_type: Some("image/jpeg".into()),
        };
        assert!(ok.is_image());

        let upper = HeadInfo {
            status: 200,
            content_type: Some("Image/PNG; charset=binary".into()),
        };
        assert!(upper.is_image());
    }

    #[test]
    fn head_rejects_html_and_non_200() {
        let html = HeadInfo {
            status: 200,
            content_type: Some("text/html".into()),
        };
        assert!(!html.is_image());

        let missing = HeadInfo {
            status: 404,
            content_type: Some("image/jpeg".into()),
        };
        assert!(!missing.is_image());

        let untyped = HeadInfo {
            status: 200,
            content_type: None,
        };
        assert!(!untyped.is_image());
    }

    #[test]
    fn status_error_displays_code() {
        assert_eq!(FetchError::Status(503).to_string(), "HTTP 503");
    }
}
