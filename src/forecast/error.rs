use crate::types::forecast::SeriesError;
use thiserror::Error;

/// Why the forecast of one location could not be fetched.
///
/// URLs in these errors never contain the query string, so the API key does not leak into
/// logs.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse forecast response for {city}")]
    JsonParse {
        city: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Forecast for {city} has {found} upcoming days, expected at least {expected}")]
    ShortForecast {
        city: String,
        expected: usize,
        found: usize,
    },

    #[error("Forecast response contains inconsistent series")]
    InvalidSeries(#[from] SeriesError),
}
