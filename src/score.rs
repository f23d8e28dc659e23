//! The composite weather quality index used to rank locations.

use crate::types::forecast::ForecastSeries;

/// Felt temperature (°C) considered perfect weather.
pub const IDEAL_FELT_TEMPERATURE: f64 = 35.0;

/// Scores a forecast series; lower is better.
///
/// `abs((35 - mean(felt_temperature)) * 2) + mean(rain_chances) + mean(humidity) / 2`
///
/// The score is an absolute index over the whole series, it is not normalised across
/// locations and only means something relative to other scores.
///
/// # Examples
///
/// ```
/// use kayak::{weather_score, ForecastSeries};
///
/// let series = ForecastSeries::new(vec![20.0; 7], vec![0; 7], vec![50.0; 7]).unwrap();
/// assert_eq!(weather_score(&series), 55.0);
/// ```
pub fn weather_score(series: &ForecastSeries) -> f64 {
    let felt_temperature = mean(series.felt_temperature().iter().copied());
    let rain_chances = mean(series.rain_chances().iter().map(|&r| r as f64));
    let humidity = mean(series.humidity().iter().copied());

    ((IDEAL_FELT_TEMPERATURE - felt_temperature) * 2.0).abs() + rain_chances + humidity / 2.0
}

// Series are never empty, see `ForecastSeries::new`.
fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let count = values.len() as f64;
    values.sum::<f64>() / count
}
