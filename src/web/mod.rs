//! HTTP runners for crawling web pages
//!
//! - [`HttpDownloader`]: download runner, emits one scrape task per fetched page
//! - [`LinkExtractor`]: scrape runner, emits download tasks for the links it finds
//! - [`HttpResponse`]: the fetched page as carried between the two

mod downloader;
mod extractor;
mod response;

pub use downloader::HttpDownloader;
pub use extractor::LinkExtractor;
pub use response::HttpResponse;
