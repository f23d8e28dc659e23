use crate::table::encoded::ParseError;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Failed to parse column '{column}' of location {id}")]
    Parse {
        id: i64,
        column: &'static str,
        #[source]
        source: ParseError,
    },

    #[error("Column '{column}' of location {id} has {found} values, expected {expected} like '{reference}'")]
    LengthMismatch {
        id: i64,
        column: &'static str,
        reference: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Column '{column}' of location {id} is an empty sequence")]
    EmptySequence { id: i64, column: &'static str },

    #[error("Location {id} has a weather score but no forecast cells")]
    MissingForecast { id: i64 },

    #[error("Location {id} has forecast cells but no weather score")]
    MissingScore { id: i64 },

    #[error("Value '{value}' in column '{column}' of location {id} is not numeric")]
    NotNumeric {
        id: i64,
        column: &'static str,
        value: String,
    },

    #[error("Failed processing DataFrame: {0}")]
    Polars(#[from] PolarsError),
}
