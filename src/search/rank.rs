//! Candidate filtering and ordering.
//!
//! [`rank`] applies, in order:
//!
//! 1. the domain blacklist (substring match on the host),
//! 2. the minimum-dimension floor ([`MIN_DIMENSION`] on both sides),
//! 3. the selection policy.
//!
//! The URL helpers below ([`unwrap_next_image`], [`path_extension`], …) are
//! used by the generator for per-candidate preparation.

use super::{Candidate, SelectionPolicy};
use rand::Rng;

/// Candidates narrower or shorter than this are dropped.
pub const MIN_DIMENSION: u32 = 200;

/// Hosts that serve login walls instead of images.
pub const AUTH_WALLED_HOSTS: &[&str] = &["lookaside.fbsbx.com"];

/// Filter and order candidates.
///
/// Uses the thread-local RNG for [`SelectionPolicy::Random`].
pub fn rank(
    candidates: Vec<Candidate>,
    blacklist: &[String],
    policy: SelectionPolicy,
) -> Vec<Candidate> {
    rank_with_rng(candidates, blacklist, policy, &mut rand::thread_rng())
}

/// [`rank`] with an explicit RNG.
pub fn rank_with_rng(
    candidates: Vec<Candidate>,
    blacklist: &[String],
    policy: SelectionPolicy,
    rng: &mut impl Rng,
) -> Vec<Candidate> {
    let blacklist: Vec<String> = blacklist
        .iter()
        .map(|entry| normalize_blacklist_entry(entry))
        .filter(|entry| !entry.is_empty())
        .collect();

    let mut kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| !is_blacklisted(&c.url, &blacklist))
        .filter(|c| c.width >= MIN_DIMENSION && c.height >= MIN_DIMENSION)
        .collect();

    match policy {
        SelectionPolicy::First => {}
        // sort_by is stable: equal scores keep discovery order
        SelectionPolicy::Best => kept.sort_by(|a, b| b.score().cmp(&a.score())),
        SelectionPolicy::Random => {
            if kept.len() > 1 {
                let pick = rng.gen_range(0..kept.len());
                let chosen = kept.remove(pick);
                kept.insert(0, chosen);
            }
        }
    }
    kept
}

/// Lowercase, strip the protocol and any trailing slashes.
pub fn normalize_blacklist_entry(entry: &str) -> String {
    let lower = entry.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    without_scheme.trim_end_matches('/').to_string()
}

/// Whether the host of `url` contains any of the normalized entries.
pub fn is_blacklisted(url: &str, normalized: &[String]) -> bool {
    let Some(host) = host_of(url) else {
        return false;
    };
    normalized.iter().any(|entry| host.contains(entry.as_str()))
}

/// Lowercased host of an absolute URL, without userinfo or port.
pub fn host_of(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = match host_port.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => host_port,
    };
    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

/// Lowercased extension of the last path segment, ignoring query and
/// fragment.
pub fn path_extension(url: &str) -> Option<String> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = rest.split(['?', '#']).next()?;
    let (_, path) = path.split_once('/')?;
    let file = path.rsplit('/').next()?;
    let (stem, ext) = file.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Keep only candidates whose URL path ends in `.{extension}`.
pub fn filter_by_extension(candidates: Vec<Candidate>, extension: &str) -> Vec<Candidate> {
    let wanted = extension.trim_start_matches('.').to_lowercase();
    candidates
        .into_iter()
        .filter(|c| path_extension(&c.url).as_deref() == Some(wanted.as_str()))
        .collect()
}

/// Unwrap a Next.js image proxy URL (`…/_next/image?url=<encoded>&w=…`) to
/// the image it proxies. `None` when `url` is not a proxy URL or the inner
/// URL is not absolute http(s).
pub fn unwrap_next_image(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("_next/image?url=")?;
    let encoded = rest.split('&').next()?;
    let decoded = urlencoding::decode(encoded).ok()?;
    let inner = decoded.trim();
    let absolute = inner.starts_with("http://") || inner.starts_with("https://");
    (absolute && host_of(inner).is_some()).then(|| inner.to_string())
}

/// Whether `url` points at a host that never serves images anonymously.
pub fn is_auth_walled(url: &str) -> bool {
    AUTH_WALLED_HOSTS.iter().any(|host| url.contains(host))
}
