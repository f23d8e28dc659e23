use crate::forecast::error::FetchError;
use crate::storage::error::{LoadError, PublishError};
use crate::table::error::NormalizeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KayakError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("No forecast could be refreshed, all {} locations failed", .failures.len())]
    NothingRefreshed { failures: Vec<crate::FetchFailure> },

    #[error("A weather API key is required to refresh forecasts (set the APIKEY environment variable)")]
    MissingApiKey,

    #[error("Failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("Invalid object store configuration")]
    StorageConfig(#[source] object_store::Error),
}
