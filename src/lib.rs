//! # csv-mirror
//!
//! Mirrors a fixed catalog of remote CSV files into a local, dated archive.
//!
//! ## Architecture
//!
//! ```text
//! Catalog → WorkerPool → Fetcher → Archive → MetadataStore
//! ```
//!
//! Each run expands the catalog into one task per URL. A fixed number of
//! workers drain the task queue, issue a conditional GET using the ETag and
//! Last-Modified values remembered from earlier runs, and write new content
//! to `<directory>/<name>-<YYYY-MM-DD>.csv` through a temp file and rename.
//! The metadata store is saved once, after every worker has finished.
//!
//! ## Quick Start
//!
//! ```bash
//! # Mirror everything listed in ./data-sources.yaml
//! csv-mirror
//!
//! # Use another archive root and fewer workers
//! csv-mirror --root /srv/stations --workers 4 run
//!
//! # Show what is known about each URL
//! csv-mirror list
//! ```
//!
//! The process exits non-zero when any URL failed; metadata for the URLs that
//! succeeded is still saved.

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the catalog,
/// metadata store and worker pool.
pub mod app;

/// Dated file naming and atomic temp-file-then-rename writes.
pub mod archive;

/// Command-line interface using clap.
///
/// - `run` - Mirror all catalog URLs (default)
/// - `list` - List catalog URLs with their stored ETag / Last-Modified
pub mod cli;

/// Optional `csv-mirror.toml` settings.
pub mod config;

/// Core domain models.
///
/// - [`Catalog`](domain::Catalog): archive directory → URLs
/// - [`ResourceMetadata`](domain::ResourceMetadata): ETag / Last-Modified per URL
/// - [`FetchTask`](domain::FetchTask): one URL bound for one directory
pub mod domain;

/// HTTP fetching with conditional request support.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for a single conditional GET
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`WorkerPool`](fetcher::pool::WorkerPool): Fixed worker pool over a bounded queue
pub mod fetcher;

/// Persistent URL → metadata map.
pub mod store;
