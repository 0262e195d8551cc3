//! # featured-thumb
//!
//! Automatic featured images for blog posts. Given a post title, search an
//! image provider for it, pick a candidate, download it, optionally composite
//! the title and some effects onto it, and store the result. When no
//! candidate works, draw a flat-color card with the title instead.
//!
//! # Architecture
//!
//! ```text
//! title ─→ SearchRequest ─→ provider ─→ candidates ─→ rank
//!                                                      │
//!          ┌───────────────────────────────────────────┘
//!          ▼
//!     for each candidate: HEAD → GET → decode → composite → store ──→ SUCCESS
//!          │ (exhausted)
//!          ▼
//!     fallback card → store ──→ FALLBACK_SUCCESS      (disabled) ──→ FAILURE
//! ```
//!
//! Everything the orchestrator needs is injected: the provider, the HTTP
//! [`Fetcher`](http::Fetcher), the [`ArtifactStore`](store::ArtifactStore)
//! and the [`LogSink`](activity_log::LogSink). Tests drive the whole
//! pipeline with in-memory fakes; the CLI wires in `ureq`, a directory and a
//! JSON activity log.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`generator`] | Orchestrator: preconditions, candidate loop, fallback, outcome |
//! | [`search`] | `Candidate`, `SearchRequest`, providers, ranking |
//! | [`imaging`] | Crop, grayscale, overlay + title, frame, fallback card |
//! | [`fonts`] | Font name → local `.ttf` lookup |
//! | [`color`] | Hex color parsing |
//! | [`http`] | `Fetcher` trait and the blocking `ureq` implementation |
//! | [`store`] | `ArtifactStore` trait and the output-directory implementation |
//! | [`activity_log`] | Capped newest-first activity log with JSON persistence |
//! | [`config`] | `featured-thumb.toml` loading, validation, merging, stock file |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Fail Soft, Log Everything
//!
//! Search endpoints, image hosts and scraped markup are all unreliable.
//! Nothing short of "every candidate failed and the fallback is off" is an
//! error for the caller. Each skipped candidate leaves an activity log entry
//! with the reason, which is the operator's main diagnostic tool.
//!
//! ## One Output Type
//!
//! Anything that goes through compositing comes out as JPEG regardless of
//! the input format, so storage only ever deals with one type. Untouched
//! downloads keep their bytes and their own extension.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling and encoding use the `image` crate; text uses
//! `rusttype`. No system libraries are needed. When the configured font is
//! missing, a built-in bitmap font draws a message naming it, so a broken
//! setup is visible on the image itself.

pub mod activity_log;
pub mod color;
pub mod config;
pub mod fonts;
pub mod generator;
pub mod http;
pub mod imaging;
pub mod output;
pub mod search;
pub mod store;
