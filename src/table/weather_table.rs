//! The per-day forecast table behind the "best weather" map.

use crate::table::error::NormalizeError;
use crate::table::{
    column_range, explode_cells, integers, numbers, refreshed_parts, sort_by_score, SORT_COLUMN,
};
use crate::types::dataset::Dataset;
use log::warn;
use polars::prelude::*;

/// Rows shown on the weather map: the 5 best cities, 7 days each.
pub const WEATHER_MAP_ROWS: usize = 35;

/// A city and its weather score, as ranked by [`WeatherTable::ranking`].
#[derive(Debug, Clone, PartialEq)]
pub struct CityScore {
    pub id: i64,
    pub city: String,
    pub score_weather: f64,
}

/// One row per location and forecast day, best weather first.
///
/// Columns: `id`, `city`, `lat`, `lon`, `score_weather`, `day_plus`,
/// `felt_temperature`, `rain_chances`, `humidity`, `inverted_score`.
///
/// `inverted_score` is `max(score_weather) - score_weather` and only exists to size map
/// markers: the best location gets the biggest marker.
#[derive(Debug, Clone)]
pub struct WeatherTable {
    /// The underlying Polars DataFrame.
    pub frame: DataFrame,
    /// Ids of the locations left out because they have never been refreshed.
    pub skipped: Vec<i64>,
}

impl WeatherTable {
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn head(&self, rows: usize) -> WeatherTable {
        WeatherTable {
            frame: self.frame.head(Some(rows)),
            skipped: self.skipped.clone(),
        }
    }

    /// The slice of the table plotted on the weather map.
    pub fn map_rows(&self) -> WeatherTable {
        self.head(WEATHER_MAP_ROWS)
    }

    /// Colour scale bounds for the felt temperature.
    pub fn felt_temperature_range(&self) -> Result<Option<(f64, f64)>, NormalizeError> {
        Ok(column_range(&self.frame, "felt_temperature")?)
    }

    /// Distinct locations in table order, i.e. best weather first.
    pub fn ranking(&self) -> Result<Vec<CityScore>, NormalizeError> {
        let ids = self.frame.column("id")?.i64()?;
        let cities = self.frame.column("city")?.str()?;
        let scores = self.frame.column(SORT_COLUMN)?.f64()?;

        let mut ranking: Vec<CityScore> = Vec::new();
        for ((id, city), score) in ids.into_iter().zip(cities).zip(scores) {
            let (Some(id), Some(city), Some(score_weather)) = (id, city, score) else {
                continue;
            };
            if ranking.last().is_some_and(|last| last.id == id) {
                continue;
            }
            ranking.push(CityScore {
                id,
                city: city.to_string(),
                score_weather,
            });
        }
        Ok(ranking)
    }
}

/// Flattens the forecast cells of every location into one row per day.
///
/// Locations without forecast and score (never refreshed) are left out and listed in
/// [`WeatherTable::skipped`].
///
/// # Errors
///
/// * [`NormalizeError::MissingForecast`] / [`NormalizeError::MissingScore`] if a location
///   has only one of forecast cells and score.
/// * [`NormalizeError::Parse`] for a malformed list cell.
/// * [`NormalizeError::EmptySequence`] / [`NormalizeError::LengthMismatch`] when the day
///   lists are empty or do not line up.
/// * [`NormalizeError::NotNumeric`] for a value that is not a number.
pub fn normalize_weather(dataset: &Dataset) -> Result<WeatherTable, NormalizeError> {
    let mut ids = Vec::new();
    let mut cities = Vec::new();
    let mut lats = Vec::new();
    let mut lons = Vec::new();
    let mut scores = Vec::new();
    let mut day_plus = Vec::new();
    let mut felt_temperature = Vec::new();
    let mut rain_chances = Vec::new();
    let mut humidity = Vec::new();
    let mut skipped = Vec::new();

    for row in dataset.rows() {
        let id = row.location.id;
        let Some((forecast, score)) = refreshed_parts(row)? else {
            skipped.push(id);
            continue;
        };

        let [days, temps, rain, humid] = explode_cells(
            id,
            [
                ("day_plus", &forecast.day_plus),
                ("felt_temperature", &forecast.felt_temperature),
                ("rain_chances", &forecast.rain_chances),
                ("humidity", &forecast.humidity),
            ],
        )?;
        let days = integers(id, "day_plus", days)?;
        let count = days.len();

        day_plus.extend(days);
        felt_temperature.extend(numbers(id, "felt_temperature", temps)?);
        rain_chances.extend(numbers(id, "rain_chances", rain)?);
        humidity.extend(numbers(id, "humidity", humid)?);

        ids.extend(std::iter::repeat(id).take(count));
        cities.extend(std::iter::repeat(row.location.city.clone()).take(count));
        lats.extend(std::iter::repeat(row.location.lat).take(count));
        lons.extend(std::iter::repeat(row.location.lon).take(count));
        scores.extend(std::iter::repeat(score).take(count));
    }

    let frame = df!(
        "id" => ids,
        "city" => cities,
        "lat" => lats,
        "lon" => lons,
        SORT_COLUMN => scores,
        "day_plus" => day_plus,
        "felt_temperature" => felt_temperature,
        "rain_chances" => rain_chances,
        "humidity" => humidity,
    )?;

    let frame = sort_by_score(frame.lazy())
        .with_column((col(SORT_COLUMN).max() - col(SORT_COLUMN)).alias("inverted_score"))
        .collect()?;

    if !skipped.is_empty() {
        warn!(
            "Weather table leaves out {} never refreshed locations: {:?}",
            skipped.len(),
            skipped
        );
    }
    Ok(WeatherTable { frame, skipped })
}
