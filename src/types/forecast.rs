//! Daily forecast values for one location.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SeriesError {
    #[error("Forecast series is empty")]
    Empty,

    #[error("Forecast series have different lengths (felt temperature {felt_temperature}, rain chances {rain_chances}, humidity {humidity})")]
    LengthMismatch {
        felt_temperature: usize,
        rain_chances: usize,
        humidity: usize,
    },
}

/// The upcoming days of forecast for one location, as parallel sequences.
///
/// Index `i` of every sequence refers to day offset `i + 1` (tomorrow is day 1).
/// A series is never empty and all sequences have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    felt_temperature: Vec<f64>,
    rain_chances: Vec<i64>,
    humidity: Vec<f64>,
}

impl ForecastSeries {
    /// # Arguments
    ///
    /// * `felt_temperature` - Daytime "feels like" temperature per day, in °C.
    /// * `rain_chances` - Probability of precipitation per day, in whole percent (0-100).
    /// * `humidity` - Relative humidity per day, in percent.
    ///
    /// # Errors
    ///
    /// [`SeriesError::Empty`] when no day is given, [`SeriesError::LengthMismatch`] when the
    /// three sequences do not cover the same days.
    pub fn new(
        felt_temperature: Vec<f64>,
        rain_chances: Vec<i64>,
        humidity: Vec<f64>,
    ) -> Result<Self, SeriesError> {
        if felt_temperature.len() != rain_chances.len() || felt_temperature.len() != humidity.len()
        {
            return Err(SeriesError::LengthMismatch {
                felt_temperature: felt_temperature.len(),
                rain_chances: rain_chances.len(),
                humidity: humidity.len(),
            });
        }
        if felt_temperature.is_empty() {
            return Err(SeriesError::Empty);
        }
        Ok(Self {
            felt_temperature,
            rain_chances,
            humidity,
        })
    }

    /// Number of forecast days.
    pub fn len(&self) -> usize {
        self.felt_temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.felt_temperature.is_empty()
    }

    /// Day offsets `1..=len`.
    pub fn day_plus(&self) -> Vec<i64> {
        (1..=self.len() as i64).collect()
    }

    pub fn felt_temperature(&self) -> &[f64] {
        &self.felt_temperature
    }

    pub fn rain_chances(&self) -> &[i64] {
        &self.rain_chances
    }

    pub fn humidity(&self) -> &[f64] {
        &self.humidity
    }
}
