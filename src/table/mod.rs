//! Flattening of the row-per-location dataset into one-measurement-per-row tables.
//!
//! Each location row carries several parallel list cells (one value per day, or one value
//! per hotel). Normalising a table parses those cells, checks that they line up, and emits
//! one output row per list element with the location's scalar columns repeated. The
//! result is sorted by weather score, best first.

pub mod encoded;
pub mod error;
pub mod hotel_table;
pub mod weather_table;

use crate::table::encoded::{EncodedList, ListValue};
use crate::table::error::NormalizeError;
use crate::types::dataset::{DatasetRow, ForecastCells};
use polars::prelude::*;

/// Column every normalised table is sorted by.
pub(crate) const SORT_COLUMN: &str = "score_weather";

/// The forecast cells and score of a row, `None` for a row that was never refreshed.
///
/// A row with only one of the two is inconsistent and rejected.
pub(crate) fn refreshed_parts(
    row: &DatasetRow,
) -> Result<Option<(&ForecastCells, f64)>, NormalizeError> {
    let id = row.location.id;
    match (&row.forecast, row.score_weather) {
        (Some(forecast), Some(score)) => Ok(Some((forecast, score))),
        (None, None) => Ok(None),
        (None, Some(_)) => Err(NormalizeError::MissingForecast { id }),
        (Some(_), None) => Err(NormalizeError::MissingScore { id }),
    }
}

/// Parses the parallel list cells of one location.
///
/// All lists must be non-empty and as long as the first one.
pub(crate) fn explode_cells<const N: usize>(
    id: i64,
    cells: [(&'static str, &EncodedList); N],
) -> Result<[Vec<ListValue>; N], NormalizeError> {
    let mut parsed: [Vec<ListValue>; N] = std::array::from_fn(|_| Vec::new());

    for (slot, &(column, cell)) in parsed.iter_mut().zip(cells.iter()) {
        let values = cell.parse().map_err(|source| NormalizeError::Parse {
            id,
            column,
            source,
        })?;
        if values.is_empty() {
            return Err(NormalizeError::EmptySequence { id, column });
        }
        *slot = values;
    }

    if let Some((&(reference, _), first)) = cells.first().zip(parsed.first()) {
        let expected = first.len();
        for (&(column, _), values) in cells.iter().zip(parsed.iter()) {
            if values.len() != expected {
                return Err(NormalizeError::LengthMismatch {
                    id,
                    column,
                    reference,
                    expected,
                    found: values.len(),
                });
            }
        }
    }

    Ok(parsed)
}

pub(crate) fn numbers(
    id: i64,
    column: &'static str,
    values: Vec<ListValue>,
) -> Result<Vec<f64>, NormalizeError> {
    values
        .into_iter()
        .map(|value| {
            value.as_f64().ok_or_else(|| NormalizeError::NotNumeric {
                id,
                column,
                value: value.into_text(),
            })
        })
        .collect()
}

pub(crate) fn integers(
    id: i64,
    column: &'static str,
    values: Vec<ListValue>,
) -> Result<Vec<i64>, NormalizeError> {
    values
        .into_iter()
        .map(|value| match value.as_f64() {
            Some(n) if n.fract() == 0.0 => Ok(n as i64),
            _ => Err(NormalizeError::NotNumeric {
                id,
                column,
                value: value.into_text(),
            }),
        })
        .collect()
}

pub(crate) fn texts(values: Vec<ListValue>) -> Vec<String> {
    values.into_iter().map(ListValue::into_text).collect()
}

/// Stable ascending sort on the weather score, so the rows of one location stay together
/// and in their original order.
pub(crate) fn sort_by_score(frame: LazyFrame) -> LazyFrame {
    frame.sort(
        [SORT_COLUMN],
        SortMultipleOptions::default().with_maintain_order(true),
    )
}

/// `(min, max)` of a float column, `None` for an empty table.
pub(crate) fn column_range(frame: &DataFrame, name: &str) -> PolarsResult<Option<(f64, f64)>> {
    let values = frame.column(name)?.f64()?;
    Ok(values.min().zip(values.max()))
}
