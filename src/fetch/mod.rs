pub mod client;
pub mod decode;
pub mod error;
pub mod fallback;
pub mod request;

pub use client::MarketDataClient;
pub use decode::{Quote, SearchResult};
pub use error::{classify_failure, FetchError};
pub use request::{HttpTransport, ProviderQuery, ProviderResponse, Transport};

pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
pub(crate) mod testing;
