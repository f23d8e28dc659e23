//! The per-hotel table behind the "best hotels" map.

use crate::table::error::NormalizeError;
use crate::table::{
    column_range, explode_cells, numbers, refreshed_parts, sort_by_score, texts, SORT_COLUMN,
};
use crate::types::dataset::Dataset;
use log::warn;
use polars::prelude::*;

/// Rows shown on the hotel map.
pub const HOTEL_MAP_ROWS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct HotelSummary {
    pub city: String,
    pub name: String,
    pub url: String,
    pub score: f64,
}

/// One row per hotel, hotels of the best-weather locations first.
///
/// Columns: `id`, `city`, `score_weather`, `name`, `url`, `lat_hotels`, `lon_hotels`,
/// `description`, `score`.
#[derive(Debug, Clone)]
pub struct HotelTable {
    /// The underlying Polars DataFrame.
    pub frame: DataFrame,
    /// Ids of the locations left out because they have never been refreshed.
    pub skipped: Vec<i64>,
}

impl HotelTable {
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn head(&self, rows: usize) -> HotelTable {
        HotelTable {
            frame: self.frame.head(Some(rows)),
            skipped: self.skipped.clone(),
        }
    }

    /// The slice of the table plotted on the hotel map.
    pub fn map_rows(&self) -> HotelTable {
        self.head(HOTEL_MAP_ROWS)
    }

    /// Colour scale bounds for the hotel rating.
    pub fn score_range(&self) -> Result<Option<(f64, f64)>, NormalizeError> {
        Ok(column_range(&self.frame, "score")?)
    }

    /// The `limit` best rated hotels among the rows of this table.
    pub fn best_rated(&self, limit: usize) -> Result<HotelTable, NormalizeError> {
        let frame = self
            .frame
            .clone()
            .lazy()
            .sort(
                ["score"],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .limit(limit as IdxSize)
            .collect()?;
        Ok(HotelTable {
            frame,
            skipped: self.skipped.clone(),
        })
    }

    /// The rows of the locations in `ids`, in table order.
    pub fn in_locations(&self, ids: &[i64]) -> Result<HotelTable, NormalizeError> {
        let mask: BooleanChunked = self
            .frame
            .column("id")?
            .i64()?
            .into_iter()
            .map(|id| id.is_some_and(|id| ids.contains(&id)))
            .collect();
        Ok(HotelTable {
            frame: self.frame.filter(&mask)?,
            skipped: self.skipped.clone(),
        })
    }

    pub fn summaries(&self) -> Result<Vec<HotelSummary>, NormalizeError> {
        let cities = self.frame.column("city")?.str()?;
        let names = self.frame.column("name")?.str()?;
        let urls = self.frame.column("url")?.str()?;
        let scores = self.frame.column("score")?.f64()?;

        Ok(cities
            .into_iter()
            .zip(names)
            .zip(urls)
            .zip(scores)
            .filter_map(|(((city, name), url), score)| {
                Some(HotelSummary {
                    city: city?.to_string(),
                    name: name?.to_string(),
                    url: url?.to_string(),
                    score: score?,
                })
            })
            .collect())
    }
}

/// Flattens the hotel cells of every location into one row per hotel.
///
/// Coordinates and ratings are coerced to numbers (a decimal comma is accepted), newline
/// characters are removed from descriptions.
///
/// # Errors
///
/// Same as [`crate::normalize_weather`]: never refreshed locations are skipped, while
/// inconsistent rows, malformed or misaligned cells and non-numeric coordinates or ratings
/// are rejected.
pub fn normalize_hotels(dataset: &Dataset) -> Result<HotelTable, NormalizeError> {
    let mut ids = Vec::new();
    let mut cities = Vec::new();
    let mut scores_weather = Vec::new();
    let mut names = Vec::new();
    let mut urls = Vec::new();
    let mut lat_hotels = Vec::new();
    let mut lon_hotels = Vec::new();
    let mut descriptions = Vec::new();
    let mut scores = Vec::new();
    let mut skipped = Vec::new();

    for row in dataset.rows() {
        let id = row.location.id;
        let Some((_, score_weather)) = refreshed_parts(row)? else {
            skipped.push(id);
            continue;
        };
        let hotels = &row.hotels;

        let [name, url, lat, lon, description, score] = explode_cells(
            id,
            [
                ("name", &hotels.name),
                ("url", &hotels.url),
                ("lat_hotels", &hotels.lat_hotels),
                ("lon_hotels", &hotels.lon_hotels),
                ("description", &hotels.description),
                ("score", &hotels.score),
            ],
        )?;
        let count = name.len();

        names.extend(texts(name));
        urls.extend(texts(url));
        lat_hotels.extend(numbers(id, "lat_hotels", lat)?);
        lon_hotels.extend(numbers(id, "lon_hotels", lon)?);
        descriptions.extend(texts(description).into_iter().map(|d| d.replace('\n', "")));
        scores.extend(numbers(id, "score", score)?);

        ids.extend(std::iter::repeat(id).take(count));
        cities.extend(std::iter::repeat(row.location.city.clone()).take(count));
        scores_weather.extend(std::iter::repeat(score_weather).take(count));
    }

    let frame = df!(
        "id" => ids,
        "city" => cities,
        SORT_COLUMN => scores_weather,
        "name" => names,
        "url" => urls,
        "lat_hotels" => lat_hotels,
        "lon_hotels" => lon_hotels,
        "description" => descriptions,
        "score" => scores,
    )?;

    let frame = sort_by_score(frame.lazy()).collect()?;
    if !skipped.is_empty() {
        warn!(
            "Hotel table leaves out {} never refreshed locations: {:?}",
            skipped.len(),
            skipped
        );
    }
    Ok(HotelTable { frame, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::encoded::EncodedList;
    use crate::types::dataset::{DatasetRow, HotelCells};
    use crate::types::forecast::ForecastSeries;
    use crate::types::location::Location;

    fn hotel_row(id: i64, city: &str, score_weather: f64, hotels: HotelCells) -> DatasetRow {
        let mut row = DatasetRow::new(Location::new(id, city, 43.0, 3.0), hotels);
        let series = ForecastSeries::new(vec![25.0; 7], vec![0; 7], vec![60.0; 7]).unwrap();
        row.apply_forecast(&series);
        row.score_weather = Some(score_weather);
        row
    }

    fn two_hotels() -> HotelCells {
        HotelCells {
            lat_hotels: EncodedList::from("['43.61', '43.62']"),
            lon_hotels: EncodedList::from("[3.87, 3.88]"),
            name: EncodedList::from("['Hôtel du Parc', \"L'Oustau\"]"),
            url: EncodedList::from("['https://example.org/a', 'https://example.org/b']"),
            description: EncodedList::from("['Calme\\net central', 'Vue mer']"),
            score: EncodedList::from("['8,5', '9,1']"),
        }
    }

    #[test]
    fn explodes_one_row_per_hotel() -> Result<(), NormalizeError> {
        let table = normalize_hotels(&Dataset::new(vec![hotel_row(1, "Montpellier", 30.0, two_hotels())]))?;
        assert_eq!(table.height(), 2);

        let names = table.frame.column("name")?.str()?;
        assert_eq!(names.get(0), Some("Hôtel du Parc"));
        assert_eq!(names.get(1), Some("L'Oustau"));

        let scores = table.frame.column("score")?.f64()?;
        assert_eq!(scores.get(0), Some(8.5));
        assert_eq!(scores.get(1), Some(9.1));

        let lat = table.frame.column("lat_hotels")?.f64()?;
        assert_eq!(lat.get(0), Some(43.61));

        let description = table.frame.column("description")?.str()?;
        assert_eq!(description.get(0), Some("Calmeet central"));

        let city = table.frame.column("city")?.str()?;
        assert_eq!(city.get(1), Some("Montpellier"));
        Ok(())
    }

    #[test]
    fn sorts_hotels_by_location_weather() -> Result<(), NormalizeError> {
        let dataset = Dataset::new(vec![
            hotel_row(1, "Rouen", 80.0, two_hotels()),
            hotel_row(2, "Sète", 12.0, two_hotels()),
        ]);
        let table = normalize_hotels(&dataset)?;
        let cities: Vec<Option<&str>> = table.frame.column("city")?.str()?.into_iter().collect();
        assert_eq!(
            cities,
            vec![Some("Sète"), Some("Sète"), Some("Rouen"), Some("Rouen")]
        );
        Ok(())
    }

    #[test]
    fn mismatched_hotel_lists_are_rejected() {
        let mut hotels = two_hotels();
        hotels.url = EncodedList::from("['https://example.org/a']");
        let err = normalize_hotels(&Dataset::new(vec![hotel_row(4, "Albi", 20.0, hotels)]))
            .unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::LengthMismatch {
                id: 4,
                column: "url",
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_rating_is_rejected() {
        let mut hotels = two_hotels();
        hotels.score = EncodedList::from("['8,5', 'excellent']");
        let err = normalize_hotels(&Dataset::new(vec![hotel_row(5, "Pau", 20.0, hotels)]))
            .unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::NotNumeric { id: 5, column: "score", ref value } if value == "excellent"
        ));
    }

    #[test]
    fn best_rated_orders_by_rating() -> Result<(), NormalizeError> {
        let dataset = Dataset::new(vec![
            hotel_row(1, "Rouen", 80.0, two_hotels()),
            hotel_row(2, "Sète", 12.0, two_hotels()),
        ]);
        let table = normalize_hotels(&dataset)?;
        let best = table.best_rated(3)?.summaries()?;
        assert_eq!(best.len(), 3);
        assert_eq!(best[0].score, 9.1);
        assert_eq!(best[0].city, "Sète");
        assert_eq!(best[1].score, 9.1);
        assert_eq!(best[1].city, "Rouen");
        assert_eq!(best[2].score, 8.5);
        assert_eq!(table.score_range()?, Some((8.5, 9.1)));
        Ok(())
    }

    #[test]
    fn never_refreshed_location_is_skipped() -> Result<(), NormalizeError> {
        let dataset = Dataset::new(vec![
            DatasetRow::new(Location::new(9, "Brest", 48.39, -4.49), two_hotels()),
            hotel_row(2, "Sète", 12.0, two_hotels()),
        ]);
        let table = normalize_hotels(&dataset)?;
        assert_eq!(table.height(), 2);
        assert_eq!(table.skipped, vec![9]);
        assert_eq!(table.best_rated(1)?.skipped, vec![9]);
        Ok(())
    }

    #[test]
    fn in_locations_keeps_selected_cities() -> Result<(), NormalizeError> {
        let dataset = Dataset::new(vec![
            hotel_row(1, "Rouen", 80.0, two_hotels()),
            hotel_row(2, "Sète", 12.0, two_hotels()),
            hotel_row(3, "Agde", 15.0, two_hotels()),
        ]);
        let table = normalize_hotels(&dataset)?.in_locations(&[1, 2])?;
        let cities: Vec<Option<&str>> = table.frame.column("city")?.str()?.into_iter().collect();
        assert_eq!(
            cities,
            vec![Some("Sète"), Some("Sète"), Some("Rouen"), Some("Rouen")]
        );
        Ok(())
    }
}
