//! Page fetching for both sites: a `PageSource` seam, the reqwest-backed fetcher
//! and the polite retry loop the crawls go through.

mod client;
mod retry;

#[cfg(test)]
pub use client::MockSource;
pub use client::{FetchConfig, FetchError, HttpFetcher, PageSource};
pub use retry::{Politeness, fetch_document};
