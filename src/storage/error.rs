use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading the dataset from a store.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read dataset file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to read object {url}")]
    ObjectStore {
        url: String,
        #[source]
        source: object_store::Error,
    },

    #[error("Failed to decode dataset CSV")]
    Csv(#[source] PolarsError),

    #[error("Dataset is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },
}

/// Errors while writing the dataset to a store.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to encode dataset as CSV")]
    Csv(#[source] PolarsError),

    #[error("Failed to create directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to write dataset file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to replace dataset file '{0}'")]
    Persist(PathBuf, #[source] std::io::Error),

    #[error("Failed to upload object {url}")]
    ObjectStore {
        url: String,
        #[source]
        source: object_store::Error,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
