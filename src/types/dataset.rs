//! The row-per-location dataset that is loaded, enriched and published by a refresh.

use crate::score::weather_score;
use crate::table::encoded::EncodedList;
use crate::types::forecast::ForecastSeries;
use crate::types::location::Location;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// The encoded hotel lists of one location. All six cells are parallel: element `i` of
/// every list describes the same hotel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HotelCells {
    pub lat_hotels: EncodedList,
    pub lon_hotels: EncodedList,
    pub name: EncodedList,
    pub url: EncodedList,
    pub description: EncodedList,
    /// Guest rating per hotel, sometimes written with a decimal comma (`'8,5'`).
    pub score: EncodedList,
}

/// The encoded forecast lists of one location, parallel per day.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastCells {
    pub day_plus: EncodedList,
    pub felt_temperature: EncodedList,
    pub rain_chances: EncodedList,
    pub humidity: EncodedList,
}

impl From<&ForecastSeries> for ForecastCells {
    fn from(series: &ForecastSeries) -> Self {
        Self {
            day_plus: EncodedList::from_integers(&series.day_plus()),
            felt_temperature: EncodedList::from_floats(series.felt_temperature()),
            rain_chances: EncodedList::from_integers(series.rain_chances()),
            humidity: EncodedList::from_floats(series.humidity()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub location: Location,
    pub hotels: HotelCells,
    /// `None` until the location has been refreshed at least once.
    pub forecast: Option<ForecastCells>,
    pub score_weather: Option<f64>,
    /// When the forecast of this row was last refreshed.
    pub updated_at: Option<DateTime<Utc>>,
}

impl DatasetRow {
    pub fn new(location: Location, hotels: HotelCells) -> Self {
        Self {
            location,
            hotels,
            forecast: None,
            score_weather: None,
            updated_at: None,
        }
    }

    /// Replaces the forecast cells and recomputes the weather score from `series`.
    pub fn apply_forecast(&mut self, series: &ForecastSeries) {
        self.forecast = Some(ForecastCells::from(series));
        self.score_weather = Some(weather_score(series));
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn new(rows: Vec<DatasetRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<DatasetRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn locations(&self) -> Vec<Location> {
        self.rows.iter().map(|row| row.location.clone()).collect()
    }

    pub fn get(&self, id: i64) -> Option<&DatasetRow> {
        self.rows.iter().find(|row| row.location.id == id)
    }

    /// Applies freshly fetched forecasts to the rows with a matching id and returns the ids
    /// of the rows that changed, in dataset order. Rows without a new forecast keep their
    /// previous values.
    pub fn apply_forecasts(&mut self, forecasts: &[(i64, ForecastSeries)]) -> Vec<i64> {
        let by_id: HashMap<i64, &ForecastSeries> =
            forecasts.iter().map(|(id, series)| (*id, series)).collect();

        let mut refreshed = Vec::new();
        for row in &mut self.rows {
            if let Some(series) = by_id.get(&row.location.id) {
                row.apply_forecast(series);
                refreshed.push(row.location.id);
            }
        }
        refreshed
    }

    /// Sets `updated_at` on the rows whose id is in `ids`.
    pub fn stamp(&mut self, ids: &[i64], now: DateTime<Utc>) {
        for row in &mut self.rows {
            if ids.contains(&row.location.id) {
                row.updated_at = Some(now);
            }
        }
    }

    /// Newest `updated_at` of all rows, `None` when no row was ever refreshed.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.rows.iter().filter_map(|row| row.updated_at).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(id: i64, city: &str) -> DatasetRow {
        DatasetRow::new(Location::new(id, city, 45.0, 5.0), HotelCells::default())
    }

    #[test]
    fn apply_forecasts_only_touches_matching_rows() {
        let mut dataset = Dataset::new(vec![row(1, "Annecy"), row(2, "Grenoble"), row(3, "Lyon")]);
        let series = ForecastSeries::new(vec![20.0; 7], vec![0; 7], vec![50.0; 7]).unwrap();

        let refreshed = dataset.apply_forecasts(&[(3, series.clone()), (1, series)]);
        assert_eq!(refreshed, vec![1, 3]);

        let annecy = dataset.get(1).unwrap();
        assert_eq!(annecy.score_weather, Some(55.0));
        assert_eq!(
            annecy.forecast.as_ref().unwrap().day_plus.as_str(),
            "[1, 2, 3, 4, 5, 6, 7]"
        );
        assert!(dataset.get(2).unwrap().forecast.is_none());
        assert!(dataset.get(2).unwrap().score_weather.is_none());
    }

    #[test]
    fn stamp_sets_timestamp_on_selected_rows() {
        let mut dataset = Dataset::new(vec![row(1, "Annecy"), row(2, "Grenoble")]);
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
        dataset.stamp(&[2], now);
        assert_eq!(dataset.get(1).unwrap().updated_at, None);
        assert_eq!(dataset.get(2).unwrap().updated_at, Some(now));
    }

    #[test]
    fn last_updated_is_newest_timestamp() {
        let mut dataset = Dataset::new(vec![row(1, "Annecy"), row(2, "Grenoble"), row(3, "Lyon")]);
        assert_eq!(dataset.last_updated(), None);

        let earlier = Utc.with_ymd_and_hms(2026, 10, 15, 8, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
        dataset.stamp(&[1, 2], earlier);
        dataset.stamp(&[3], later);
        dataset.stamp(&[1], later);
        assert_eq!(dataset.last_updated(), Some(later));
    }
}
