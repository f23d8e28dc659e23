//! CSV encoding of the dataset, one row per location with list cells as bracketed text.
//!
//! The reader accepts the raw reference dataset too: forecast, score and timestamp
//! columns may be absent or empty until the first refresh.

use crate::storage::error::LoadError;
use crate::table::encoded::EncodedList;
use crate::types::dataset::{Dataset, DatasetRow, ForecastCells, HotelCells};
use crate::types::location::Location;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use polars::prelude::*;
use std::io::Cursor;

/// Column layout of the persisted dataset.
pub const DATASET_COLUMNS: [&str; 16] = [
    "id",
    "city",
    "lat",
    "lon",
    "lat_hotels",
    "lon_hotels",
    "name",
    "url",
    "description",
    "score",
    "day_plus",
    "felt_temperature",
    "rain_chances",
    "humidity",
    "score_weather",
    "updated_at",
];

const FORECAST_COLUMNS: [&str; 4] = ["day_plus", "felt_temperature", "rain_chances", "humidity"];

pub fn dataset_to_csv(dataset: &Dataset) -> PolarsResult<Vec<u8>> {
    let rows = dataset.rows();
    let text = |cell: fn(&DatasetRow) -> &EncodedList| -> Vec<String> {
        rows.iter().map(|row| cell(row).to_string()).collect()
    };
    let forecast = |cell: fn(&ForecastCells) -> &EncodedList| -> Vec<Option<String>> {
        rows.iter()
            .map(|row| row.forecast.as_ref().map(|f| cell(f).to_string()))
            .collect()
    };

    let mut frame = df!(
        "id" => rows.iter().map(|r| r.location.id).collect::<Vec<_>>(),
        "city" => rows.iter().map(|r| r.location.city.clone()).collect::<Vec<_>>(),
        "lat" => rows.iter().map(|r| r.location.lat).collect::<Vec<_>>(),
        "lon" => rows.iter().map(|r| r.location.lon).collect::<Vec<_>>(),
        "lat_hotels" => text(|r| &r.hotels.lat_hotels),
        "lon_hotels" => text(|r| &r.hotels.lon_hotels),
        "name" => text(|r| &r.hotels.name),
        "url" => text(|r| &r.hotels.url),
        "description" => text(|r| &r.hotels.description),
        "score" => text(|r| &r.hotels.score),
        "day_plus" => forecast(|f| &f.day_plus),
        "felt_temperature" => forecast(|f| &f.felt_temperature),
        "rain_chances" => forecast(|f| &f.rain_chances),
        "humidity" => forecast(|f| &f.humidity),
        "score_weather" => rows.iter().map(|r| r.score_weather).collect::<Vec<_>>(),
        "updated_at" => rows
            .iter()
            .map(|r| r.updated_at.map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
            .collect::<Vec<_>>(),
    )?;

    let mut bytes = Vec::new();
    CsvWriter::new(&mut bytes)
        .include_header(true)
        .finish(&mut frame)?;
    Ok(bytes)
}

pub fn dataset_from_csv(bytes: Vec<u8>) -> Result<Dataset, LoadError> {
    // Every column is read as text; numbers and lists are parsed here.
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(LoadError::Csv)?;

    let id = text_column(&frame, "id")?;
    let city = text_column(&frame, "city")?;
    let lat = text_column(&frame, "lat")?;
    let lon = text_column(&frame, "lon")?;
    let lat_hotels = text_column(&frame, "lat_hotels")?;
    let lon_hotels = text_column(&frame, "lon_hotels")?;
    let name = text_column(&frame, "name")?;
    let url = text_column(&frame, "url")?;
    let description = text_column(&frame, "description")?;
    let score = text_column(&frame, "score")?;

    let forecast_columns = FORECAST_COLUMNS
        .iter()
        .map(|column| optional_text_column(&frame, column))
        .collect::<Result<Vec<_>, _>>()?;
    let score_weather = optional_text_column(&frame, "score_weather")?;
    let updated_at = optional_text_column(&frame, "updated_at")?;

    let mut rows = Vec::with_capacity(frame.height());
    for i in 0..frame.height() {
        let location = Location::new(
            parse_id(required_cell(id, "id", i)?, i)?,
            required_cell(city, "city", i)?,
            parse_number(required_cell(lat, "lat", i)?, "lat", i)?,
            parse_number(required_cell(lon, "lon", i)?, "lon", i)?,
        );
        let hotels = HotelCells {
            lat_hotels: encoded_cell(lat_hotels, i),
            lon_hotels: encoded_cell(lon_hotels, i),
            name: encoded_cell(name, i),
            url: encoded_cell(url, i),
            description: encoded_cell(description, i),
            score: encoded_cell(score, i),
        };

        let mut row = DatasetRow::new(location, hotels);
        row.forecast = forecast_cells(&forecast_columns, i)?;
        row.score_weather = score_weather
            .and_then(|c| c.get(i))
            .map(|s| parse_number(s, "score_weather", i))
            .transpose()?;
        row.updated_at = updated_at
            .and_then(|c| c.get(i))
            .map(|s| parse_timestamp(s, i))
            .transpose()?;
        rows.push(row);
    }

    Ok(Dataset::new(rows))
}

fn text_column<'a>(frame: &'a DataFrame, name: &str) -> Result<&'a StringChunked, LoadError> {
    frame
        .column(name)
        .map_err(|_| LoadError::MissingColumn(name.to_string()))?
        .str()
        .map_err(LoadError::Csv)
}

fn optional_text_column<'a>(
    frame: &'a DataFrame,
    name: &str,
) -> Result<Option<&'a StringChunked>, LoadError> {
    if frame.get_column_index(name).is_none() {
        return Ok(None);
    }
    text_column(frame, name).map(Some)
}

fn required_cell<'a>(
    column: &'a StringChunked,
    name: &str,
    row: usize,
) -> Result<&'a str, LoadError> {
    column.get(row).ok_or_else(|| LoadError::InvalidValue {
        row,
        column: name.to_string(),
        value: String::new(),
    })
}

/// An empty hotel cell is read as an empty list cell, not as an error.
fn encoded_cell(column: &StringChunked, row: usize) -> EncodedList {
    EncodedList::from(column.get(row).unwrap_or_default())
}

/// The forecast cells of a row are either all present or all missing.
fn forecast_cells(
    columns: &[Option<&StringChunked>],
    row: usize,
) -> Result<Option<ForecastCells>, LoadError> {
    let cells: Vec<Option<&str>> = columns
        .iter()
        .map(|column| column.and_then(|c| c.get(row)))
        .collect();

    if cells.iter().all(Option::is_none) {
        return Ok(None);
    }
    if let Some(missing) = cells.iter().position(Option::is_none) {
        return Err(LoadError::InvalidValue {
            row,
            column: FORECAST_COLUMNS[missing].to_string(),
            value: String::new(),
        });
    }

    let cell = |index: usize| EncodedList::from(cells[index].unwrap_or_default());
    Ok(Some(ForecastCells {
        day_plus: cell(0),
        felt_temperature: cell(1),
        rain_chances: cell(2),
        humidity: cell(3),
    }))
}

fn invalid(value: &str, column: &str, row: usize) -> LoadError {
    LoadError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.to_string(),
    }
}

fn parse_id(value: &str, row: usize) -> Result<i64, LoadError> {
    value.trim().parse().map_err(|_| invalid(value, "id", row))
}

fn parse_number(value: &str, column: &str, row: usize) -> Result<f64, LoadError> {
    value
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| invalid(value, column, row))
}

/// RFC 3339, or the naive `YYYY-MM-DD HH:MM:SS[.ffffff]` form taken as UTC.
fn parse_timestamp(value: &str, row: usize) -> Result<DateTime<Utc>, LoadError> {
    let trimmed = value.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f").map(|t| t.and_utc())
        })
        .map_err(|_| invalid(value, "updated_at", row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::forecast::ForecastSeries;
    use chrono::TimeZone;

    const RAW_DATASET: &str = r#"id,city,lat,lon,lat_hotels,lon_hotels,name,url,description,score
1,Mont Saint Michel,48.6359541,-1.5114600,"['48.63', '48.61']","[-1.51, -1.52]","['La Mère Poulard', ""Hôtel l'Abbaye""]","['https://a', 'https://b']","['Face à la baie', 'Calme']","['8,6', '7,9']"
2,Bayeux,49.2764624,-0.7024738,[49.27],[-0.70],['Le Lion d\'Or'],['https://c'],['Centre'],"['9,0']"
"#;

    fn refreshed_dataset() -> Dataset {
        let mut dataset = dataset_from_csv(RAW_DATASET.as_bytes().to_vec()).unwrap();
        let series = ForecastSeries::new(
            vec![14.2, 15.0, 13.9, 12.5, 16.1, 17.0, 15.5],
            vec![20, 0, 85, 40, 10, 0, 5],
            vec![81.0, 75.0, 90.0, 88.0, 70.0, 65.0, 72.0],
        )
        .unwrap();
        let refreshed = dataset.apply_forecasts(&[(1, series)]);
        dataset.stamp(
            &refreshed,
            Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 15).unwrap(),
        );
        dataset
    }

    #[test]
    fn reads_raw_reference_dataset() {
        let dataset = dataset_from_csv(RAW_DATASET.as_bytes().to_vec()).unwrap();
        assert_eq!(dataset.len(), 2);

        let first = &dataset.rows()[0];
        assert_eq!(first.location, Location::new(1, "Mont Saint Michel", 48.6359541, -1.51146));
        assert_eq!(first.hotels.score.as_str(), "['8,6', '7,9']");
        assert!(first.forecast.is_none());
        assert!(first.score_weather.is_none());
        assert!(first.updated_at.is_none());
    }

    #[test]
    fn round_trip_preserves_rows_and_values() {
        let dataset = refreshed_dataset();
        let bytes = dataset_to_csv(&dataset).unwrap();
        let reread = dataset_from_csv(bytes).unwrap();

        assert_eq!(reread.len(), dataset.len());
        assert_eq!(reread, dataset);

        let forecast = reread.rows()[0].forecast.as_ref().unwrap();
        let temps: Vec<f64> = forecast
            .felt_temperature
            .parse()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_f64())
            .collect();
        assert_eq!(temps, vec![14.2, 15.0, 13.9, 12.5, 16.1, 17.0, 15.5]);
    }

    #[test]
    fn header_matches_column_layout() {
        let bytes = dataset_to_csv(&refreshed_dataset()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, DATASET_COLUMNS.join(","));
    }

    #[test]
    fn accepts_naive_timestamps() {
        let parsed = parse_timestamp("2022-03-01 12:34:56.123456", 0).unwrap();
        assert_eq!(
            parsed.to_rfc3339_opts(SecondsFormat::Micros, true),
            "2022-03-01T12:34:56.123456Z"
        );
        assert!(parse_timestamp("yesterday", 3).is_err());
    }

    #[test]
    fn missing_required_column_is_reported() {
        let err = dataset_from_csv(b"id,city,lat\n1,Caen,49.1\n".to_vec()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(ref c) if c == "lon"));
    }

    #[test]
    fn bad_coordinates_are_reported_with_their_row() {
        let csv = RAW_DATASET.replace("49.2764624", "north");
        let err = dataset_from_csv(csv.into_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidValue { row: 1, ref column, .. } if column == "lat"
        ));
    }
}
