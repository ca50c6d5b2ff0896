//! lines-fetcher - keeps the line store in sync with the upstream provider
//!
//! One background task per sport polls `GET {provider}/api/v1/lines/{sport}`
//! on the sport's own interval and writes the result into a `LineStore`.
//! The fetcher is ready once every sport was synchronized at least once.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod provider;

pub use config::FetcherConfig;
pub use error::{FetchError, FetchResult};
pub use fetcher::LinesFetcher;
pub use provider::LinesProvider;
