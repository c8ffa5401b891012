//! Outbound calls made on behalf of the browser

pub mod fetcher;
pub mod google;

pub use fetcher::{FetchError, UrlFetcher, FETCH_FAILED};
pub use google::{GoogleRelay, UpstreamResponse};
